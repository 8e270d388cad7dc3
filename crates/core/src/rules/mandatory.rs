use cmdlint_catalog::ResolvedCommand;

/// Parameters that are mandatory in every parameter set of a command.
///
/// Names keep their declared casing; membership tests ignore ASCII case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MandatorySet {
    names: Vec<String>,
}

impl MandatorySet {
    /// Derive the set from resolved metadata.
    ///
    /// A parameter with fewer declarations than the command has parameter
    /// sets is skipped outright. Otherwise it is included when at least
    /// `parameter_set_count` of its declarations are flagged mandatory.
    pub fn derive(command: &ResolvedCommand) -> Self {
        let required = command.parameter_set_count;
        let names = command
            .parameters
            .iter()
            .filter(|p| p.declaration_count() >= required)
            .filter(|p| p.mandatory_count() >= required)
            .map(|p| p.name.clone())
            .collect();
        Self { names }
    }

    /// `true` when the command requires nothing in every set.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of universally mandatory parameters.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }

    /// Names in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
