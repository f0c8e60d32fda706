//! # idassert core
//!
//! Value types shared by the assertion parser and the identify engine.
//!
//! ## Features
//!
//! - **Proofs**: `Proof` and the query-only `ProofSet`
//! - **Service directory**: immutable `ServiceDirectory` with per-service
//!   case and last-writer-wins policy, resolved into `MatchRule`s
//! - **Checks**: hostname, fingerprint and username normalization
//! - **Configuration**: TOML-loaded directory extensions and logging settings

#![warn(missing_docs)]

pub mod checks;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod proof;
pub mod service;
pub mod types;

// Re-export commonly used items
pub use constants::*;
pub use error::{CoreError, Result};
pub use proof::{Proof, ProofSet};
pub use service::{MatchRule, ServiceClass, ServiceDirectory, ServicePolicy, ValueComparison};
pub use types::*;
