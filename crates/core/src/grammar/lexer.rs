/// Classification of a lexer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokKind {
    /// Run of spaces, tabs, or a backtick line continuation.
    Whitespace,
    /// A line feed (CRLF and CR are folded in).
    Newline,
    /// `# ...` line comment or `<# ... #>` block comment.
    Comment,
    /// `;`
    Semicolon,
    /// `|`
    Pipe,
    /// `&&` or `||` pipeline chain operator.
    Chain,
    /// `&` call operator.
    Amp,
    /// `,`
    Comma,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `$(`
    DollarParen,
    /// `@(`
    AtParen,
    /// `@{`
    AtBrace,
    /// `-Name` or `-Name:`; see [`Token::colon`].
    Parameter,
    /// `$name`, `${name}`, or splatted `@name`.
    Variable,
    /// Quoted string (single, double, or here-string).
    String,
    /// `[TypeName]` literal, brackets balanced.
    TypeLiteral,
    /// Redirection operator such as `>`, `2>>`, `2>&1`.
    Redirection,
    /// Any other run of non-delimiter characters (barewords, numbers, operators).
    Word,
}

/// A token that borrows its text directly from the source input.
///
/// `text` is always exactly `&input[start..end]`.
#[derive(Debug, Clone)]
pub struct Token<'a> {
    /// The classification of this token.
    pub kind: TokKind,
    /// Borrowed slice of the source input for this token.
    pub text: &'a str,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
    /// For `Parameter` tokens: the name was written with a trailing `:`.
    pub colon: bool,
    /// For `String` tokens: the closing quote was missing.
    pub unterminated: bool,
}

impl Token<'_> {
    /// Parameter name without the leading dash or trailing colon.
    pub fn parameter_name(&self) -> &str {
        let name = self.text.strip_prefix(is_dash).unwrap_or(self.text);
        if self.colon {
            name.strip_suffix(':').unwrap_or(name)
        } else {
            name
        }
    }

    /// Whitespace and comments carry no syntax.
    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokKind::Whitespace | TokKind::Comment)
    }
}

/// Characters that always end a bareword.
fn is_word_break(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            ';' | '|' | '&' | ',' | '(' | ')' | '{' | '}' | '\'' | '"' | '`' | '>' | '<'
        )
}

fn is_variable_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '?' || c == ':'
}

fn is_dash(c: char) -> bool {
    // PowerShell accepts en/em dashes wherever it accepts '-'.
    matches!(c, '-' | '\u{2013}' | '\u{2014}')
}

/// Tokenize script input into a sequence of borrowed tokens.
///
/// Every byte of the input is covered by exactly one token, so
/// concatenating all `text` fields reproduces the input.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer {
        input,
        pos: 0,
        toks: Vec::new(),
    }
    .run()
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    toks: Vec<Token<'a>>,
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn bump_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn push(&mut self, kind: TokKind, start: usize) {
        self.toks.push(Token {
            kind,
            text: &self.input[start..self.pos],
            start,
            end: self.pos,
            colon: false,
            unterminated: false,
        });
    }

    fn run(mut self) -> Vec<Token<'a>> {
        while let Some(c) = self.peek() {
            let start = self.pos;
            match c {
                '\r' | '\n' => {
                    self.bump();
                    if c == '\r' && self.peek() == Some('\n') {
                        self.bump();
                    }
                    self.push(TokKind::Newline, start);
                }
                '`' if matches!(self.peek_nth(1), Some('\n' | '\r')) => {
                    // Line continuation reads as whitespace.
                    self.bump();
                    let nl = self.bump();
                    if nl == Some('\r') && self.peek() == Some('\n') {
                        self.bump();
                    }
                    self.push(TokKind::Whitespace, start);
                }
                c if c.is_whitespace() => {
                    self.bump_while(|c| c.is_whitespace() && c != '\n' && c != '\r');
                    self.push(TokKind::Whitespace, start);
                }
                '#' => {
                    self.bump_while(|c| c != '\n' && c != '\r');
                    self.push(TokKind::Comment, start);
                }
                '<' if self.peek_nth(1) == Some('#') => {
                    match self.input[self.pos + 2..].find("#>") {
                        Some(rel) => self.pos += 2 + rel + 2,
                        None => self.pos = self.input.len(),
                    }
                    self.push(TokKind::Comment, start);
                }
                ';' => self.single(TokKind::Semicolon),
                ',' => self.single(TokKind::Comma),
                '{' => self.single(TokKind::LBrace),
                '}' => self.single(TokKind::RBrace),
                '(' => self.single(TokKind::LParen),
                ')' => self.single(TokKind::RParen),
                '|' => {
                    self.bump();
                    if self.peek() == Some('|') {
                        self.bump();
                        self.push(TokKind::Chain, start);
                    } else {
                        self.push(TokKind::Pipe, start);
                    }
                }
                '&' => {
                    self.bump();
                    if self.peek() == Some('&') {
                        self.bump();
                        self.push(TokKind::Chain, start);
                    } else {
                        self.push(TokKind::Amp, start);
                    }
                }
                '\'' | '"' => self.string(c, start),
                '@' => self.at_sign(start),
                '$' => self.dollar(start),
                '[' => self.type_literal(start),
                '>' | '<' => self.redirection(start),
                '*' | '1'..='6' if self.is_stream_redirection() => self.redirection(start),
                c if is_dash(c)
                    && self
                        .peek_nth(1)
                        .is_some_and(|n| n.is_alphabetic() || n == '_' || n == '?') =>
                {
                    self.parameter(start)
                }
                _ => {
                    self.bump_while(|c| !is_word_break(c));
                    if self.pos == start {
                        // A lone break character that no rule above claimed.
                        self.bump();
                    }
                    self.push(TokKind::Word, start);
                }
            }
        }
        self.toks
    }

    fn single(&mut self, kind: TokKind) {
        let start = self.pos;
        self.bump();
        self.push(kind, start);
    }

    fn is_stream_redirection(&self) -> bool {
        self.peek_nth(1) == Some('>')
    }

    fn redirection(&mut self, start: usize) {
        if self.peek() != Some('>') && self.peek() != Some('<') {
            self.bump(); // stream number or '*'
        }
        let op = self.bump();
        if op == Some('>') {
            if self.peek() == Some('>') {
                self.bump();
            } else if self.peek() == Some('&') && matches!(self.peek_nth(1), Some('1'..='6')) {
                self.bump();
                self.bump();
            }
        }
        self.push(TokKind::Redirection, start);
    }

    fn parameter(&mut self, start: usize) {
        self.bump(); // dash
        self.bump_while(|c| !is_word_break(c) && c != ':' && c != '.' && c != '[');
        let mut colon = false;
        if self.peek() == Some(':') {
            self.bump();
            colon = true;
        }
        self.push(TokKind::Parameter, start);
        if let Some(tok) = self.toks.last_mut() {
            tok.colon = colon;
        }
    }

    fn dollar(&mut self, start: usize) {
        self.bump();
        match self.peek() {
            Some('(') => {
                self.bump();
                self.push(TokKind::DollarParen, start);
            }
            Some('{') => {
                match self.input[self.pos..].find('}') {
                    Some(rel) => self.pos += rel + 1,
                    None => self.pos = self.input.len(),
                }
                self.push(TokKind::Variable, start);
            }
            Some('$' | '^' | '?') => {
                self.bump();
                self.push(TokKind::Variable, start);
            }
            Some(c) if is_variable_char(c) => {
                self.bump_while(is_variable_char);
                self.push(TokKind::Variable, start);
            }
            _ => self.push(TokKind::Word, start),
        }
    }

    fn at_sign(&mut self, start: usize) {
        self.bump();
        match self.peek() {
            Some('(') => {
                self.bump();
                self.push(TokKind::AtParen, start);
            }
            Some('{') => {
                self.bump();
                self.push(TokKind::AtBrace, start);
            }
            Some(q @ ('"' | '\'')) => self.here_string(q, start),
            Some(c) if c.is_alphanumeric() || c == '_' => {
                self.bump_while(|c| c.is_alphanumeric() || c == '_' || c == ':');
                self.push(TokKind::Variable, start);
            }
            _ => self.push(TokKind::Word, start),
        }
    }

    fn here_string(&mut self, quote: char, start: usize) {
        self.bump(); // opening quote
        let terminator = format!("\n{quote}@");
        let terminated = match self.input[self.pos..].find(&terminator) {
            Some(rel) => {
                self.pos += rel + terminator.len();
                true
            }
            None => {
                self.pos = self.input.len();
                false
            }
        };
        self.push(TokKind::String, start);
        if let Some(tok) = self.toks.last_mut() {
            tok.unterminated = !terminated;
        }
    }

    fn string(&mut self, quote: char, start: usize) {
        self.bump();
        let mut terminated = false;
        while let Some(c) = self.bump() {
            if quote == '"' && c == '`' {
                self.bump();
            } else if c == quote {
                // Doubled quote is an escaped quote.
                if self.peek() == Some(quote) {
                    self.bump();
                } else {
                    terminated = true;
                    break;
                }
            }
        }
        self.push(TokKind::String, start);
        if let Some(tok) = self.toks.last_mut() {
            tok.unterminated = !terminated;
        }
    }

    fn type_literal(&mut self, start: usize) {
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            if c == '\n' || c == '\r' {
                break;
            }
            self.bump();
            match c {
                '[' => depth += 1,
                ']' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
        self.push(TokKind::TypeLiteral, start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokKind> {
        tokenize(input)
            .into_iter()
            .filter(|t| t.kind != TokKind::Whitespace)
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn tokens_cover_the_whole_input() {
        let input = "Copy-Item -Path:'a' \"b`\"c\" | % { $_ } # done\r\n@{a=1}";
        let joined: String = tokenize(input).iter().map(|t| t.text).collect();
        assert_eq!(joined, input);
    }

    #[test]
    fn command_with_parameters_and_strings() {
        assert_eq!(
            kinds("Copy-Item -Destination \"foo\" src"),
            vec![
                TokKind::Word,
                TokKind::Parameter,
                TokKind::String,
                TokKind::Word
            ]
        );
    }

    #[test]
    fn colon_parameter_keeps_name() {
        let toks = tokenize("-Path:$x");
        assert_eq!(toks[0].kind, TokKind::Parameter);
        assert!(toks[0].colon);
        assert_eq!(toks[0].parameter_name(), "Path");
        assert_eq!(toks[1].kind, TokKind::Variable);
    }

    #[test]
    fn negative_numbers_and_double_dash_are_words() {
        assert_eq!(kinds("-5 --"), vec![TokKind::Word, TokKind::Word]);
    }

    #[test]
    fn variables_splats_and_subexpressions() {
        assert_eq!(
            kinds("$env:PATH ${my var} @args $( @( @{"),
            vec![
                TokKind::Variable,
                TokKind::Variable,
                TokKind::Variable,
                TokKind::DollarParen,
                TokKind::AtParen,
                TokKind::AtBrace
            ]
        );
    }

    #[test]
    fn redirections() {
        let toks: Vec<_> = tokenize("a > out 2>&1 2>> log *> all")
            .into_iter()
            .filter(|t| t.kind == TokKind::Redirection)
            .map(|t| t.text)
            .collect();
        assert_eq!(toks, vec![">", "2>&1", "2>>", "*>"]);
    }

    #[test]
    fn comments_and_continuations() {
        assert_eq!(
            kinds("a <# block\n#> b `\n c # tail"),
            vec![
                TokKind::Word,
                TokKind::Comment,
                TokKind::Word,
                TokKind::Word,
                TokKind::Comment
            ]
        );
    }

    #[test]
    fn unterminated_string_is_flagged() {
        let toks = tokenize("'abc");
        assert_eq!(toks.len(), 1);
        assert!(toks[0].unterminated);
        assert!(!tokenize("'it''s'")[0].unterminated);
    }

    #[test]
    fn here_string_spans_lines() {
        let toks = tokenize("@\"\nline $x\n\"@ | Out-Null");
        assert_eq!(toks[0].kind, TokKind::String);
        assert_eq!(toks[0].text, "@\"\nline $x\n\"@");
        assert!(!toks[0].unterminated);
    }

    #[test]
    fn type_literals_balance_brackets() {
        let toks = tokenize("[Parameter(Mandatory)][string[]]$p");
        assert_eq!(toks[0].text, "[Parameter(Mandatory)]");
        assert_eq!(toks[1].text, "[string[]]");
        assert_eq!(toks[2].kind, TokKind::Variable);
    }

    #[test]
    fn chain_operators() {
        assert_eq!(
            kinds("a && b || c"),
            vec![
                TokKind::Word,
                TokKind::Chain,
                TokKind::Word,
                TokKind::Chain,
                TokKind::Word
            ]
        );
    }
}
