use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomError {
    #[error("XML parsing error: {0}")]
    XmlParse(#[from] roxmltree::Error),

    #[error("Fragment must contain exactly one root element, found {0}")]
    FragmentRoot(usize),

    #[error("Node {0} does not belong to this document")]
    UnknownNode(u32),

    #[error("Node {0} is not an element")]
    NotAnElement(u32),

    #[error("Hierarchy error: {0}")]
    Hierarchy(String),

    #[error("Invalid edit: {0}")]
    InvalidEdit(String),
}
