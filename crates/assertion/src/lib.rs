//! # idassert assertion
//!
//! Grammar, parser and matcher for identity assertions such as
//! `web://maxk.org && (bb@twitter || fingerprint://aabbcc)`.
//!
//! An assertion is parsed once against a [`ServiceDirectory`] and can then
//! be evaluated any number of times, from any thread, against a
//! [`ProofSet`].
//!
//! [`ServiceDirectory`]: idassert_core::ServiceDirectory
//! [`ProofSet`]: idassert_core::ProofSet

pub mod error;
pub mod expr;
mod lexer;
pub mod parser;
pub mod url;

pub use error::{ParseError, ParseErrorKind, Result};
pub use expr::{collect_assertions, find_best_identify_component, AssertionExpression};
pub use parser::{parse, parse_and_only, parse_strict, parse_with, ParseOptions, MAX_NESTING};
pub use url::{AssertionUrl, UrlKind};
