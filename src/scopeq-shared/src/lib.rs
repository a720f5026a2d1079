//! scopeq-shared: Shared types and utilities for scopeq crates
//!
//! This crate contains the runtime value model, the semantic type
//! descriptors attached to bindings and parameters, and the value
//! operations used when a resolved predicate is evaluated.
//!
//! # Features
//!
//! - **Common Result Type**: Standardized Result type alias
//! - **Values**: JSON-like runtime values with field access and indexing
//! - **Type Descriptors**: Exact, non-widening type admission checks
//! - **Operations**: Comparison and arithmetic over values

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::uninlined_format_args
)]

/// Result type alias for value-level operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common error handling utilities
pub mod error {
    /// Create a generic operation error
    pub fn operation_error(msg: impl Into<String>) -> anyhow::Error {
        anyhow::anyhow!("Operation error: {}", msg.into())
    }
}

/// Core value types
pub mod value;

/// Semantic type descriptors
pub mod types;

/// Core operations on values
pub mod ops;

pub use types::ValueType;
pub use value::Value;

/// Common utility functions
pub mod utils {
    /// Check if a string is empty or whitespace-only
    #[must_use]
    pub fn is_blank(s: &str) -> bool {
        s.trim().is_empty()
    }

    /// Check if `c` can appear inside an identifier
    #[must_use]
    pub fn is_identifier_char(c: char) -> bool {
        c.is_alphanumeric() || c == '_'
    }
}

/// Common constants
pub mod constants {
    /// Reserved name of the item parameter in filter predicates
    pub const DEFAULT_ITEM_NAME: &str = "item";

    /// Maximum recursion depth for tree rewriting, resolution and evaluation
    pub const MAX_RECURSION_DEPTH: usize = 256;

    /// Remaining stack below which recursive walks switch to a fresh segment
    pub const STACK_RED_ZONE: usize = 128 * 1024;

    /// Size of each stack segment allocated by recursive walks
    pub const STACK_GROW_SIZE: usize = 2 * 1024 * 1024;

    /// Input size above which filtering runs on the rayon pool
    pub const DEFAULT_PARALLEL_THRESHOLD: usize = 10_000;
}
