//! Cukerun Common Library
//!
//! Shared types and errors for the Cukerun run dispatcher and its HTTP API.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Cukerun version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
