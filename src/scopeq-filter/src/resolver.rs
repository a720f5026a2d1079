//! Runtime resolution of closed predicate templates
//!
//! Every free parameter of a template is replaced by a literal holding the
//! value the provider reports for that name at execution time. The template
//! itself is never modified.

use crate::error::{FilterError, Result};
use crate::evaluator;
use crate::rewriter::ClosedPredicate;
use indexmap::IndexMap;
use log::trace;
use scopeq_expr::{Expr, Parameter};
use scopeq_shared::constants::{MAX_RECURSION_DEPTH, STACK_GROW_SIZE, STACK_RED_ZONE};
use scopeq_shared::Value;
use std::collections::HashMap;

/// Supplies current values for bound outer names
pub trait ValueProvider {
    /// Current value of `name`, or `None` when the name is unknown
    fn value_of(&self, name: &str) -> Option<Value>;
}

impl ValueProvider for HashMap<String, Value> {
    fn value_of(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl ValueProvider for IndexMap<String, Value> {
    fn value_of(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl<P: ValueProvider + ?Sized> ValueProvider for &P {
    fn value_of(&self, name: &str) -> Option<Value> {
        (**self).value_of(name)
    }
}

/// Adapts a closure into a [`ValueProvider`]
pub struct FnProvider<F>(pub F);

impl<F> ValueProvider for FnProvider<F>
where
    F: Fn(&str) -> Option<Value>,
{
    fn value_of(&self, name: &str) -> Option<Value> {
        (self.0)(name)
    }
}

/// Provider with no values; resolves only templates without free parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct NoValues;

impl ValueProvider for NoValues {
    fn value_of(&self, _name: &str) -> Option<Value> {
        None
    }
}

/// A predicate with every outer value substituted
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPredicate {
    /// The item parameter the body reads
    pub item_parameter: Parameter,
    /// Body containing no free parameters
    pub body: Expr,
    max_depth: usize,
}

impl ResolvedPredicate {
    /// Apply the predicate to one item
    pub fn evaluate(&self, item: &Value) -> Result<bool> {
        evaluator::evaluate_predicate(&self.item_parameter, &self.body, item, self.max_depth)
    }
}

/// Substitutes provider values into closed predicate templates
#[derive(Debug, Clone, Copy)]
pub struct RuntimeResolver {
    max_depth: usize,
}

impl Default for RuntimeResolver {
    fn default() -> Self {
        Self {
            max_depth: MAX_RECURSION_DEPTH,
        }
    }
}

impl RuntimeResolver {
    /// Create a resolver with the default nesting limit
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver that rejects bodies nested deeper than `max_depth`
    ///
    /// The limit also applies when the resolved predicate is evaluated.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Resolve `template` against `provider`
    ///
    /// Fails with `UnresolvedBinding` when the provider lacks a value and
    /// with `TypeMismatch` when a value does not fit the parameter's type.
    pub fn resolve(
        &self,
        template: &ClosedPredicate,
        provider: &dyn ValueProvider,
    ) -> Result<ResolvedPredicate> {
        let mut values = HashMap::with_capacity(template.free_parameters.len());
        for (name, parameter) in &template.free_parameters {
            let value = provider
                .value_of(name)
                .ok_or_else(|| FilterError::UnresolvedBinding { name: name.clone() })?;
            if !parameter.ty.admits(&value) {
                return Err(FilterError::TypeMismatch {
                    name: name.clone(),
                    expected: parameter.ty.clone(),
                    actual: value.type_name().to_string(),
                });
            }
            trace!("Resolved '{}' to {}", name, value);
            values.insert(name.as_str(), value);
        }

        let mut substitution = Substitution {
            values: &values,
            shadowed: Vec::new(),
            max_depth: self.max_depth,
        };
        let body = substitution.apply(template.body.clone(), 1)?;

        Ok(ResolvedPredicate {
            item_parameter: template.item_parameter.clone(),
            body,
            max_depth: self.max_depth,
        })
    }
}

struct Substitution<'v> {
    values: &'v HashMap<&'v str, Value>,
    /// Nested lambda parameters hiding outer names
    shadowed: Vec<String>,
    max_depth: usize,
}

impl Substitution<'_> {
    fn apply(&mut self, expr: Expr, depth: usize) -> Result<Expr> {
        if depth > self.max_depth {
            return Err(FilterError::DepthExceeded {
                limit: self.max_depth,
            });
        }
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.apply_node(expr, depth))
    }

    fn apply_node(&mut self, expr: Expr, depth: usize) -> Result<Expr> {
        match expr {
            Expr::Parameter(parameter) => {
                if self.shadowed.contains(&parameter.name) {
                    return Ok(Expr::Parameter(parameter));
                }
                match self.values.get(parameter.name.as_str()) {
                    Some(value) => Ok(Expr::typed_literal(value.clone(), parameter.ty)),
                    None => Ok(Expr::Parameter(parameter)),
                }
            }
            Expr::Lambda { parameter, body } => {
                self.shadowed.push(parameter.name.clone());
                let body = self.apply(*body, depth + 1);
                self.shadowed.pop();
                Ok(Expr::lambda(parameter, body?))
            }
            Expr::Lookup(location) => Err(FilterError::MalformedTree(format!(
                "template still contains a lookup of '{}'",
                location.name
            ))),
            other => other.try_map_children(|child| self.apply(child, depth + 1)),
        }
    }
}

/// Resolve `template` with a default resolver
pub fn resolve(template: &ClosedPredicate, provider: &dyn ValueProvider) -> Result<ResolvedPredicate> {
    RuntimeResolver::new().resolve(template, provider)
}
