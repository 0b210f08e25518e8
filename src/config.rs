use serde::{Deserialize, Serialize};

/// How namespaces declared on the root element are registered when a
/// document is built.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoRegister {
    /// Register nothing.
    Off,
    /// Register every prefixed declaration. The default namespace is aliased
    /// under the root element's tag name unless that prefix is taken.
    #[default]
    Auxiliary,
    /// Register every prefixed declaration and alias the default namespace
    /// under the given prefix.
    DefaultAs(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocOptions {
    pub namespaces: AutoRegister,
    /// When false, markup that fails to parse yields an empty document.
    pub strict: bool,
    /// Self-close empty HTML void elements in HTML-flavoured output.
    pub html_void_elements: bool,
}

impl Default for DocOptions {
    fn default() -> Self {
        Self {
            namespaces: AutoRegister::default(),
            strict: true,
            html_void_elements: true,
        }
    }
}

impl DocOptions {
    pub fn with_namespaces(mut self, namespaces: AutoRegister) -> Self {
        self.namespaces = namespaces;
        self
    }

    /// Shorthand for [`AutoRegister::DefaultAs`].
    pub fn with_default_prefix(mut self, prefix: &str) -> Self {
        self.namespaces = AutoRegister::DefaultAs(prefix.to_string());
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_html_void_elements(mut self, enabled: bool) -> Self {
        self.html_void_elements = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = DocOptions::default();
        assert_eq!(options.namespaces, AutoRegister::Auxiliary);
        assert!(options.strict);
        assert!(options.html_void_elements);
    }

    #[test]
    fn test_builders() {
        let options = DocOptions::default()
            .with_default_prefix("atom")
            .with_strict(false)
            .with_html_void_elements(false);
        assert_eq!(options.namespaces, AutoRegister::DefaultAs("atom".into()));
        assert!(!options.strict);
        assert!(!options.html_void_elements);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let options: DocOptions =
            serde_json::from_str(r#"{ "namespaces": { "default_as": "n" } }"#).unwrap();
        assert_eq!(options.namespaces, AutoRegister::DefaultAs("n".into()));
        assert!(options.strict);

        let options: DocOptions = serde_json::from_str(r#"{ "namespaces": "off" }"#).unwrap();
        assert_eq!(options.namespaces, AutoRegister::Off);
    }
}
