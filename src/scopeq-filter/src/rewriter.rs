//! Static rewriter
//!
//! Turns a context-lookup tree (`context => ... ${name} ...`) into a closed
//! predicate template: one item parameter plus one free parameter per outer
//! name the predicate reads. No lookup node survives rewriting.

use crate::binder::BindingTable;
use crate::config::EngineConfig;
use crate::error::{FilterError, Result};
use indexmap::IndexMap;
use log::{trace, warn};
use scopeq_expr::{Expr, LocationKind, LocationRef, Parameter};
use scopeq_shared::constants::{STACK_GROW_SIZE, STACK_RED_ZONE};
use scopeq_shared::ValueType;

/// Predicate over a single item with outer values still unresolved
///
/// Immutable once built; share it behind an `Arc` across executions.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ClosedPredicate {
    /// The designated item parameter
    pub item_parameter: Parameter,
    /// One parameter per outer name, in first-use order
    pub free_parameters: IndexMap<String, Parameter>,
    /// Predicate body over `item_parameter` and `free_parameters`
    pub body: Expr,
}

impl ClosedPredicate {
    /// The template as a lambda over the item parameter
    pub fn as_lambda(&self) -> Expr {
        Expr::lambda(self.item_parameter.clone(), self.body.clone())
    }

    /// Free parameter for an outer name
    pub fn free_parameter(&self, name: &str) -> Option<&Parameter> {
        self.free_parameters.get(name)
    }
}

/// Rewrites one context-lookup tree against a binding table
pub struct StaticRewriter<'a> {
    bindings: &'a BindingTable,
    item_parameter: Parameter,
    free_parameters: IndexMap<String, Parameter>,
    /// Name of the root lambda's execution-context parameter
    context_name: Option<String>,
    /// Parameters of nested lambdas currently in scope
    nested: Vec<String>,
    max_depth: usize,
}

impl<'a> StaticRewriter<'a> {
    /// Create a rewriter producing an item parameter of `item_type`
    pub fn new(config: &EngineConfig, bindings: &'a BindingTable, item_type: ValueType) -> Self {
        Self {
            bindings,
            item_parameter: Parameter::new(config.item_name.clone(), item_type),
            free_parameters: IndexMap::new(),
            context_name: None,
            nested: Vec::new(),
            max_depth: config.max_depth,
        }
    }

    /// Rewrite `tree`, which must be a lambda over the execution context
    pub fn rewrite(mut self, tree: Expr) -> Result<ClosedPredicate> {
        let Expr::Lambda { parameter, body } = tree else {
            return Err(FilterError::MalformedTree(format!(
                "expected a lambda over the execution context, found `{}`",
                tree
            )));
        };

        // Re-root: the context parameter is replaced by the item parameter
        self.context_name = Some(parameter.name);
        let body = self.visit(*body, 1)?;

        Ok(ClosedPredicate {
            item_parameter: self.item_parameter,
            free_parameters: self.free_parameters,
            body,
        })
    }

    fn visit(&mut self, expr: Expr, depth: usize) -> Result<Expr> {
        if depth > self.max_depth {
            return Err(FilterError::DepthExceeded {
                limit: self.max_depth,
            });
        }
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.visit_node(expr, depth))
    }

    fn visit_node(&mut self, expr: Expr, depth: usize) -> Result<Expr> {
        match expr {
            Expr::Lookup(location) => self.rewrite_lookup(location),
            Expr::Parameter(parameter) => self.check_parameter(parameter),
            Expr::Lambda { parameter, body } => {
                self.nested.push(parameter.name.clone());
                let body = self.visit(*body, depth + 1);
                self.nested.pop();
                Ok(Expr::lambda(parameter, body?))
            }
            other => other.try_map_children(|child| self.visit(child, depth + 1)),
        }
    }

    fn rewrite_lookup(&mut self, location: LocationRef) -> Result<Expr> {
        // The parameter built for this lookup would be captured by the lambda
        if self.nested.contains(&location.name) {
            return Err(FilterError::UnrecognizedLookup {
                kind: format!("{} hidden by a lambda parameter", location.kind),
                name: location.name,
            });
        }

        if location.name == self.item_parameter.name {
            trace!("Lookup of '{}' becomes the item parameter", location.name);
            return Ok(Expr::Parameter(self.item_parameter.clone()));
        }

        if let LocationKind::Unknown(_) = location.kind {
            return Err(unrecognized(&location));
        }

        if let Some(existing) = self.free_parameters.get(&location.name) {
            return Ok(Expr::Parameter(existing.clone()));
        }

        let Some(binding) = self.bindings.get(&location.name) else {
            return Err(unrecognized(&location));
        };
        if binding.ty != location.ty {
            warn!(
                "Lookup of '{}' declares {} but the binding was recorded as {}",
                location.name, location.ty, binding.ty
            );
        }

        trace!(
            "Lookup of {} '{}' becomes free parameter of type {}",
            location.kind,
            location.name,
            location.ty
        );
        let parameter = Parameter::new(location.name, location.ty);
        self.free_parameters
            .insert(parameter.name.clone(), parameter.clone());
        Ok(Expr::Parameter(parameter))
    }

    fn check_parameter(&self, parameter: Parameter) -> Result<Expr> {
        if self.nested.iter().any(|name| *name == parameter.name) {
            return Ok(Expr::Parameter(parameter));
        }

        let kind = if self.context_name.as_deref() == Some(parameter.name.as_str()) {
            "execution context"
        } else {
            "parameter"
        };
        Err(FilterError::UnrecognizedLookup {
            name: parameter.name,
            kind: kind.to_string(),
        })
    }
}

fn unrecognized(location: &LocationRef) -> FilterError {
    FilterError::UnrecognizedLookup {
        name: location.name.clone(),
        kind: location.kind.to_string(),
    }
}

/// Rewrite a context-lookup tree into a closed predicate template
pub fn rewrite(
    tree: Expr,
    item_type: ValueType,
    bindings: &BindingTable,
    config: &EngineConfig,
) -> Result<ClosedPredicate> {
    StaticRewriter::new(config, bindings, item_type).rewrite(tree)
}
