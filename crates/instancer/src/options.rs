//! Options for building instances

/// Options for building instances
#[derive(Debug, Clone)]
pub struct Options {
    /// Log a warning when a requested value is clamped into its axis range
    pub warn_on_clamp: bool,

    /// Rewrite the `name` table and RIBBI style bits for each instance
    pub update_names: bool,

    /// File extension for output names, without the dot. Defaults to the
    /// one matching the input flavor.
    pub extension: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self { warn_on_clamp: false, update_names: true, extension: None }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn_on_clamp(mut self, warn: bool) -> Self {
        self.warn_on_clamp = warn;
        self
    }

    pub fn update_names(mut self, update: bool) -> Self {
        self.update_names = update;
        self
    }

    /// Override the output extension (a leading dot is ignored)
    pub fn extension(mut self, extension: impl AsRef<str>) -> Self {
        let extension = extension.as_ref().trim_start_matches('.');
        self.extension = (!extension.is_empty()).then(|| extension.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_updated_by_default() {
        let options = Options::new();
        assert!(options.update_names);
        assert!(!options.warn_on_clamp);
        assert_eq!(options.extension, None);
    }

    #[test]
    fn builder_chains() {
        let options = Options::new().warn_on_clamp(true).update_names(false).extension(".otf");
        assert!(options.warn_on_clamp);
        assert!(!options.update_names);
        assert_eq!(options.extension.as_deref(), Some("otf"));
    }
}
