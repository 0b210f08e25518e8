use thiserror::Error;

/// A selector that cannot be compiled. Offsets are byte offsets into the
/// selector text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("Empty selector")]
    Empty,

    #[error("Empty selector in list at offset {offset} of '{selector}'")]
    EmptyBranch { selector: String, offset: usize },

    #[error("Selector syntax error at offset {offset} of '{selector}': {message}")]
    Syntax {
        selector: String,
        offset: usize,
        message: String,
    },

    #[error("Unsupported {feature} at offset {offset} of '{selector}'")]
    Unsupported {
        selector: String,
        offset: usize,
        feature: &'static str,
    },
}

impl SelectorError {
    pub fn offset(&self) -> Option<usize> {
        match self {
            SelectorError::Empty => None,
            SelectorError::EmptyBranch { offset, .. }
            | SelectorError::Syntax { offset, .. }
            | SelectorError::Unsupported { offset, .. } => Some(*offset),
        }
    }

    pub(crate) fn syntax(selector: &str, offset: usize, message: impl Into<String>) -> Self {
        SelectorError::Syntax {
            selector: selector.to_string(),
            offset,
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(selector: &str, offset: usize, feature: &'static str) -> Self {
        SelectorError::Unsupported {
            selector: selector.to_string(),
            offset,
            feature,
        }
    }
}
