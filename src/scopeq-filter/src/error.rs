//! Error types for predicate binding, rewriting and execution
//!
//! Definition-time failures (`UnboundFilter`, `UnrecognizedLookup`,
//! `MalformedTree`, `DepthExceeded`) reach the author wrapped in
//! [`FilterError::Validation`]. Execution-time failures fail only the
//! execution that raised them.

use scopeq_shared::ValueType;

/// Result type for filter operations
pub type Result<T> = std::result::Result<T, FilterError>;

/// Errors raised while defining or executing a filter
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// The predicate source is missing or empty
    #[error(
        "The Where clause must be set. Use the '{item_name}' property to define your expression, \
         e.g. {item_name}.FirstName == \"John\""
    )]
    UnboundFilter {
        /// Reserved item parameter name the author should reference
        item_name: String,
    },

    /// A lookup references a location the binding table does not know
    #[error("Unrecognized lookup of {kind} '{name}'")]
    UnrecognizedLookup {
        /// Looked-up name
        name: String,
        /// Description of the location kind
        kind: String,
    },

    /// The value provider has no value for a bound name
    #[error("No value available for bound name '{name}'")]
    UnresolvedBinding {
        /// Bound name
        name: String,
    },

    /// A value does not belong to the static type it is substituted for
    #[error("Type mismatch for '{name}': expected {expected}, got {actual}")]
    TypeMismatch {
        /// Bound name or expression fragment
        name: String,
        /// Static type
        expected: ValueType,
        /// Runtime type name of the offending value
        actual: String,
    },

    /// The tree handed to the rewriter does not have the expected shape
    #[error("Malformed predicate tree: {0}")]
    MalformedTree(String),

    /// Recursion limit reached while walking a tree
    #[error("Expression nesting exceeds the maximum depth of {limit}")]
    DepthExceeded {
        /// Configured limit
        limit: usize,
    },

    /// Evaluating the resolved predicate against an item failed
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Definition-time failure naming the offending clause
    #[error("Validation failed for '{clause}': {source}")]
    Validation {
        /// Offending clause of the definition
        clause: &'static str,
        /// Underlying failure
        #[source]
        source: Box<FilterError>,
    },

    /// Invalid engine configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FilterError {
    /// Wrap a definition-time failure as a validation error on the `Filter`
    /// clause. Errors that are already validation errors pass through.
    pub fn validation(self) -> Self {
        match self {
            FilterError::Validation { .. } => self,
            other => FilterError::Validation {
                clause: "Filter",
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, looking through validation wrappers
    pub fn root_cause(&self) -> &FilterError {
        match self {
            FilterError::Validation { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// True for failures raised while defining a filter
    pub fn is_definition_error(&self) -> bool {
        matches!(
            self.root_cause(),
            FilterError::UnboundFilter { .. }
                | FilterError::UnrecognizedLookup { .. }
                | FilterError::MalformedTree(_)
                | FilterError::DepthExceeded { .. }
                | FilterError::Config(_)
        )
    }
}

impl From<anyhow::Error> for FilterError {
    fn from(err: anyhow::Error) -> Self {
        FilterError::Evaluation(err.to_string())
    }
}
