//! Compiles CSS-like selectors into XPath 1.0 location paths.
//!
//! Supported: type selectors (`div`, `*`, `ns|tag`), `#id`, chained `.class`,
//! `[attr="v"]`, `[attr~="v"]`, `[attr*="v"]`, the descendant and `>` child
//! combinators, and comma-separated lists. Anything else is rejected with a
//! [`SelectorError`] instead of being approximated.
//!
//! ```
//! let query = domq_selector::compile("ul > li.active").unwrap();
//! assert_eq!(
//!     query.to_xpath(),
//!     "//ul/li[contains(concat(' ', normalize-space(@class), ' '), ' active ')]"
//! );
//! ```

pub mod compiler;
pub mod error;
pub mod lexer;

pub use compiler::{Anchor, CompiledQuery, compile, compile_relative, compile_with};
pub use error::SelectorError;
