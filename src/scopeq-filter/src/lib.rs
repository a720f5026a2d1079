//! # scopeq-filter
//!
//! Scoped item filters: predicates that read both the item under test and
//! named values from the scopes enclosing their definition.
//!
//! This crate provides:
//! - Scope binding of the outer names a predicate mentions
//! - Static rewriting of context-lookup trees into closed templates
//! - Runtime resolution of templates against current values
//! - Filtering of source collections, sequentially or on the rayon pool

#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::new_without_default)]

pub mod binder;
pub mod config;
pub mod engine;
pub mod error;
mod evaluator;
pub mod resolver;
pub mod rewriter;

pub use binder::{
    Binding, BindingTable, Direction, Mutability, NamedLocation, RootMember, Scope, ScopeBinder,
};
pub use config::{EngineConfig, ReferenceMatching};
pub use engine::{
    ExecutionResult, ExecutionStats, FilterEngine, FilterHandler, QueryDefinition,
};
pub use error::{FilterError, Result};
pub use resolver::{FnProvider, NoValues, ResolvedPredicate, RuntimeResolver, ValueProvider};
pub use rewriter::{ClosedPredicate, StaticRewriter};

/// Re-export commonly used types from scopeq-shared
pub use scopeq_shared::{Value, ValueType};

/// Define a filter with the default engine and run it once
pub fn filter_items(
    handler: &FilterHandler,
    scope_chain: &[Scope],
    item_type: ValueType,
    source: Option<&[Value]>,
    provider: &dyn ValueProvider,
) -> Result<Vec<Value>> {
    let engine = FilterEngine::new();
    let definition = engine.define(handler, scope_chain, &[], item_type)?;
    definition.execute(&engine, source, provider)
}
