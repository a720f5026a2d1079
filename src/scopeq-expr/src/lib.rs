//! scopeq-expr: Expression trees for scopeq predicates
//!
//! This crate defines the tagged expression tree shared by every stage of the
//! predicate pipeline. A tree starts life as a *context-lookup tree*: a
//! [`Expr::Lambda`] over an execution-context parameter whose free references
//! are [`Expr::Lookup`] nodes. Rewriting turns it into a closed tree over a
//! single item [`Parameter`] plus free parameters, and resolution replaces
//! those with [`Expr::Literal`] nodes.
//!
//! # Quick Start
//!
//! ```rust
//! use scopeq_expr::{BinaryOperator, Expr, LocationKind, Parameter};
//! use scopeq_shared::ValueType;
//!
//! // context => item.FirstName == expectedFirstName
//! let tree = Expr::lambda(
//!     Parameter::new("context", ValueType::Any),
//!     Expr::binary(
//!         Expr::lookup("item", ValueType::Object, LocationKind::DelegateArgument)
//!             .field("FirstName"),
//!         BinaryOperator::Eq,
//!         Expr::lookup("expectedFirstName", ValueType::String, LocationKind::Variable),
//!     ),
//! );
//!
//! assert_eq!(tree.lookups().len(), 2);
//! assert_eq!(
//!     tree.to_string(),
//!     "context => ${item}.FirstName == ${expectedFirstName}"
//! );
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::return_self_not_must_use
)]

pub mod ast;
mod rewrite;

pub use ast::*;

pub use scopeq_shared::VERSION;
