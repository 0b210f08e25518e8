pub mod fixtures;

use domq::{DocOptions, DomDoc, ResultList};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn load(xml: &str) -> DomDoc {
    init_logging();
    DomDoc::parse(xml, DocOptions::default()).expect("fixture parses")
}

/// The string value of every node in `list`.
pub fn values(doc: &DomDoc, list: &ResultList) -> Vec<String> {
    list.iter()
        .map(|node| doc.value(node).expect("node of this document"))
        .collect()
}
