//! Census common types, identity, and errors.
//!
//! This crate provides foundational types shared across census-core modules:
//! - Installation identifier derivation (pseudonymous, stable per install)
//! - Common error types
//! - Output format specifications

pub mod error;
pub mod id;
pub mod output;

pub use error::{Error, Result};
pub use id::{derive_identifier, installation_id};
pub use output::OutputFormat;
