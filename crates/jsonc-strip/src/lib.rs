//! JSONC preprocessing shared by the rule-spec build script and catalog loading.
//!
//! Supports:
//! - `//` line comments and `/* ... */` block comments
//! - trailing commas before `}` and `]`
//! - string literal preservation (including escapes)
//!
//! Comments are replaced by whitespace rather than removed, and newlines
//! inside block comments are kept, so `serde_json` error positions still
//! point at the right line of the original file.

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    Str,
    StrEscape,
    LineComment,
    BlockComment,
}

/// Replace `//` and `/* */` comments in JSONC input with whitespace.
///
/// Comment-like sequences inside string literals are left untouched.
#[must_use]
pub fn strip_jsonc(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut state = State::Code;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        state = match state {
            State::Code => match (c, chars.peek()) {
                ('"', _) => {
                    out.push(c);
                    State::Str
                }
                ('/', Some('/')) => {
                    chars.next();
                    out.push_str("  ");
                    State::LineComment
                }
                ('/', Some('*')) => {
                    chars.next();
                    out.push_str("  ");
                    State::BlockComment
                }
                _ => {
                    out.push(c);
                    State::Code
                }
            },
            State::Str => {
                out.push(c);
                match c {
                    '\\' => State::StrEscape,
                    '"' => State::Code,
                    _ => State::Str,
                }
            }
            State::StrEscape => {
                out.push(c);
                State::Str
            }
            State::LineComment => {
                if c == '\n' {
                    out.push('\n');
                    State::Code
                } else {
                    out.push(' ');
                    State::LineComment
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("  ");
                    State::Code
                } else {
                    out.push(if c == '\n' { '\n' } else { ' ' });
                    State::BlockComment
                }
            }
        };
    }
    out
}

/// Remove commas that directly precede a closing `}` or `]` (ignoring
/// whitespace). Input must already be comment-free.
#[must_use]
pub fn strip_trailing_commas(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut in_str = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_str {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_str = false;
            }
            continue;
        }
        if c == '"' {
            in_str = true;
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                out.push(' ');
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Full JSONC to JSON conversion: comments first, then trailing commas.
#[must_use]
pub fn jsonc_to_json(input: &str) -> String {
    strip_trailing_commas(&strip_jsonc(input))
}
