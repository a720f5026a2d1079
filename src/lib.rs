//! # scopeq
//!
//! Scope-bound predicate filters. A predicate over a single item may also
//! read named values declared in the scopes around its definition. Those
//! names are bound once when the filter is defined; their values are
//! resolved on every execution.
//!
//! ```
//! use scopeq::expr::{BinaryOperator, Expr, LocationKind, Parameter};
//! use scopeq::{FilterEngine, FilterHandler, Scope, Value, ValueType};
//! use std::collections::HashMap;
//!
//! let tree = Expr::lambda(
//!     Parameter::new("context", ValueType::Any),
//!     Expr::binary(
//!         Expr::lookup("item", ValueType::Object, LocationKind::DelegateArgument).field("FirstName"),
//!         BinaryOperator::Eq,
//!         Expr::lookup("expectedFirstName", ValueType::String, LocationKind::Variable),
//!     ),
//! );
//! let handler = FilterHandler::new("item.FirstName == expectedFirstName", tree);
//! let scopes = [Scope::new().constant("expectedFirstName", ValueType::String)];
//!
//! let engine = FilterEngine::new();
//! let definition = engine.define(&handler, &scopes, &[], ValueType::Object)?;
//!
//! let people = vec![
//!     Value::record([("FirstName", Value::string("Peter"))]),
//!     Value::record([("FirstName", Value::string("Stefan"))]),
//! ];
//! let values = HashMap::from([("expectedFirstName".to_string(), Value::string("Peter"))]);
//! let kept = definition.execute(&engine, Some(people.as_slice()), &values)?;
//! assert_eq!(kept.len(), 1);
//! # Ok::<(), scopeq::FilterError>(())
//! ```

pub use scopeq_filter::*;

/// Expression trees handed to the engine
pub use scopeq_expr as expr;

/// Shared value model and operations
pub use scopeq_shared as shared;
