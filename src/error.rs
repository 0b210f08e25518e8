// src/error.rs
use domq_dom::DomError;
use domq_selector::SelectorError;
use domq_xpath1::XPathError;
use thiserror::Error;

/// Every way a query, a context lookup or an edit on a [`crate::DomDoc`] can fail.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid selector: {0}")]
    SelectorSyntax(#[from] SelectorError),

    #[error("Query '{query}' was rejected: {source}")]
    QuerySyntax {
        query: String,
        #[source]
        source: XPathError,
    },

    #[error("Context could not be resolved: {0}")]
    ContextResolution(String),

    #[error("No prefix is registered for namespace '{0}'")]
    MissingNamespacePrefix(String),

    #[error("Unknown namespace prefix '{0}'. Register it first.")]
    UnknownPrefix(String),

    #[error("Markup could not be parsed: {0}")]
    Parse(DomError),

    #[error("Tree operation failed: {0}")]
    Dom(DomError),
}

impl From<DomError> for Error {
    fn from(e: DomError) -> Self {
        match e {
            DomError::XmlParse(_) | DomError::FragmentRoot(_) => Error::Parse(e),
            other => Error::Dom(other),
        }
    }
}

impl Error {
    pub(crate) fn query(query: &str, source: XPathError) -> Self {
        Error::QuerySyntax {
            query: query.to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
