//! Channel configuration
//!
//! Types for the per-channel acquisition settings plus the plain-text
//! `key value` parser that populates them from the config file on the
//! storage medium.

pub mod parser;
pub mod types;

pub use parser::*;
pub use types::*;
