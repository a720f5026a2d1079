//! Filter engine
//!
//! Ties the pipeline together: [`FilterEngine::define`] binds and rewrites a
//! handler once, [`FilterEngine::execute`] resolves the template against
//! current values and filters a source collection.

use crate::binder::{BindingTable, RootMember, Scope, ScopeBinder};
use crate::config::EngineConfig;
use crate::error::{FilterError, Result};
use crate::resolver::{ResolvedPredicate, RuntimeResolver, ValueProvider};
use crate::rewriter::{ClosedPredicate, StaticRewriter};
use log::debug;
use rayon::prelude::*;
use scopeq_expr::Expr;
use scopeq_shared::{Value, ValueType};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Predicate as supplied by the host: source text plus the compiled tree
///
/// The tree is a lambda over the execution context whose body reads outer
/// names through lookup nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterHandler {
    /// Predicate source text, used for reference detection
    pub expression_text: Option<String>,
    /// Context-lookup tree compiled from the source
    pub tree: Option<Expr>,
}

impl FilterHandler {
    /// Create a handler from source text and its compiled tree
    pub fn new(expression_text: impl Into<String>, tree: Expr) -> Self {
        Self {
            expression_text: Some(expression_text.into()),
            tree: Some(tree),
        }
    }
}

/// Outcome of defining a filter: its bindings and its shared template
#[derive(Debug, Clone)]
pub struct QueryDefinition {
    /// Outer names the predicate reads
    pub bindings: BindingTable,
    /// Closed template, shared by every execution
    pub template: Arc<ClosedPredicate>,
}

/// Items kept by one execution, with optional statistics
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Matching items in source order
    pub items: Vec<Value>,
    /// Execution statistics (if collected)
    pub stats: Option<ExecutionStats>,
}

/// Execution statistics
#[derive(Debug, Clone, Default)]
pub struct ExecutionStats {
    /// Number of source items tested
    pub items_scanned: usize,
    /// Number of items kept
    pub items_matched: usize,
    /// Whether the rayon pool was used
    pub parallel: bool,
    /// Total execution time, resolution included
    pub execution_time: Duration,
}

/// Defines and executes scoped filters
#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    config: EngineConfig,
}

impl FilterEngine {
    /// Create an engine with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with a validated configuration
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Bind and rewrite `handler` against the enclosing scopes
    ///
    /// `scope_chain` is ordered innermost first. Failures are reported as
    /// validation errors on the `Filter` clause.
    pub fn define(
        &self,
        handler: &FilterHandler,
        scope_chain: &[Scope],
        root_members: &[RootMember],
        item_type: ValueType,
    ) -> Result<QueryDefinition> {
        self.define_inner(handler, scope_chain, root_members, item_type)
            .map_err(FilterError::validation)
    }

    fn define_inner(
        &self,
        handler: &FilterHandler,
        scope_chain: &[Scope],
        root_members: &[RootMember],
        item_type: ValueType,
    ) -> Result<QueryDefinition> {
        let bindings = ScopeBinder::new(&self.config).bind(
            handler.expression_text.as_deref(),
            scope_chain,
            root_members,
        )?;

        let tree = handler
            .tree
            .clone()
            .ok_or_else(|| FilterError::UnboundFilter {
                item_name: self.config.item_name.clone(),
            })?;
        let template = StaticRewriter::new(&self.config, &bindings, item_type).rewrite(tree)?;

        debug!(
            "Defined filter with {} binding(s) and {} free parameter(s)",
            bindings.len(),
            template.free_parameters.len()
        );
        Ok(QueryDefinition {
            bindings,
            template: Arc::new(template),
        })
    }

    /// Filter `source` with `template` resolved against `provider`
    ///
    /// An absent source yields an empty result. Kept items appear in
    /// source order.
    pub fn execute(
        &self,
        source: Option<&[Value]>,
        template: &ClosedPredicate,
        provider: &dyn ValueProvider,
    ) -> Result<Vec<Value>> {
        self.execute_with_stats(source, template, provider)
            .map(|result| result.items)
    }

    /// Like [`FilterEngine::execute`], also reporting statistics when
    /// `collect_stats` is enabled
    pub fn execute_with_stats(
        &self,
        source: Option<&[Value]>,
        template: &ClosedPredicate,
        provider: &dyn ValueProvider,
    ) -> Result<ExecutionResult> {
        let start_time = Instant::now();

        let Some(items) = source else {
            debug!("No source collection; returning an empty result");
            return Ok(self.finish(Vec::new(), 0, false, start_time));
        };

        let predicate =
            RuntimeResolver::with_max_depth(self.config.max_depth).resolve(template, provider)?;
        let parallel = items.len() > self.config.parallel_threshold;
        let kept = if parallel {
            debug!("Filtering {} items on the rayon pool", items.len());
            items
                .par_iter()
                .map(|item| keep(&predicate, item))
                .collect::<Result<Vec<_>>>()?
        } else {
            items
                .iter()
                .map(|item| keep(&predicate, item))
                .collect::<Result<Vec<_>>>()?
        };

        let kept: Vec<Value> = kept.into_iter().flatten().collect();
        Ok(self.finish(kept, items.len(), parallel, start_time))
    }

    fn finish(
        &self,
        items: Vec<Value>,
        scanned: usize,
        parallel: bool,
        start_time: Instant,
    ) -> ExecutionResult {
        let stats = self.config.collect_stats.then(|| ExecutionStats {
            items_scanned: scanned,
            items_matched: items.len(),
            parallel,
            execution_time: start_time.elapsed(),
        });
        ExecutionResult { items, stats }
    }
}

fn keep(predicate: &ResolvedPredicate, item: &Value) -> Result<Option<Value>> {
    let item_parameter = &predicate.item_parameter;
    if !item_parameter.ty.admits(item) {
        return Err(FilterError::TypeMismatch {
            name: item_parameter.name.clone(),
            expected: item_parameter.ty.clone(),
            actual: item.type_name().to_string(),
        });
    }
    Ok(predicate.evaluate(item)?.then(|| item.clone()))
}

impl QueryDefinition {
    /// Execute this definition on `engine`
    pub fn execute(
        &self,
        engine: &FilterEngine,
        source: Option<&[Value]>,
        provider: &dyn ValueProvider,
    ) -> Result<Vec<Value>> {
        engine.execute(source, &self.template, provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::NoValues;
    use pretty_assertions::assert_eq;
    use scopeq_expr::{BinaryOperator, LocationKind, Parameter};

    fn person(first: &str, last: &str) -> Value {
        Value::record([
            ("FirstName", Value::string(first)),
            ("LastName", Value::string(last)),
        ])
    }

    fn people() -> Vec<Value> {
        vec![
            person("Peter", "Goodman"),
            person("Peter", "Rabbit"),
            person("Stefan", "Sewell"),
        ]
    }

    fn first_name_is_peter() -> FilterHandler {
        FilterHandler::new(
            "item.FirstName == \"Peter\"",
            Expr::lambda(
                Parameter::new("context", ValueType::Any),
                Expr::binary(
                    Expr::lookup("item", ValueType::Object, LocationKind::DelegateArgument)
                        .field("FirstName"),
                    BinaryOperator::Eq,
                    Expr::literal("Peter"),
                ),
            ),
        )
    }

    #[test]
    fn test_define_and_execute() {
        let engine = FilterEngine::new();
        let definition = engine
            .define(&first_name_is_peter(), &[], &[], ValueType::Object)
            .unwrap();
        assert!(definition.bindings.is_empty());

        let source = people();
        let kept = definition
            .execute(&engine, Some(source.as_slice()), &NoValues)
            .unwrap();
        assert_eq!(kept, vec![source[0].clone(), source[1].clone()]);
    }

    #[test]
    fn test_definition_serializes() {
        let engine = FilterEngine::new();
        let scopes = [Scope::new().variable("expectedFirstName", ValueType::String)];
        let handler = FilterHandler::new(
            "item.FirstName == expectedFirstName",
            Expr::lambda(
                Parameter::new("context", ValueType::Any),
                Expr::binary(
                    Expr::lookup("item", ValueType::Object, LocationKind::DelegateArgument)
                        .field("FirstName"),
                    BinaryOperator::Eq,
                    Expr::lookup("expectedFirstName", ValueType::String, LocationKind::Variable),
                ),
            ),
        );
        let definition = engine
            .define(&handler, &scopes, &[], ValueType::Object)
            .unwrap();

        let bindings = serde_json::to_value(&definition.bindings).unwrap();
        assert_eq!(
            bindings,
            serde_json::json!({
                "bindings": [
                    {"name": "expectedFirstName", "ty": "string", "direction": "read_write"}
                ]
            })
        );

        let template = serde_json::to_value(definition.template.as_ref()).unwrap();
        assert_eq!(template["item_parameter"]["name"], "item");
        assert_eq!(
            template["free_parameters"]["expectedFirstName"]["ty"],
            "string"
        );
    }

    #[test]
    fn test_missing_tree_is_unbound() {
        let handler = FilterHandler {
            expression_text: Some("item.Active".to_string()),
            tree: None,
        };
        let err = FilterEngine::new()
            .define(&handler, &[], &[], ValueType::Object)
            .unwrap_err();
        assert!(matches!(
            err.root_cause(),
            FilterError::UnboundFilter { .. }
        ));
        assert!(matches!(err, FilterError::Validation { clause: "Filter", .. }));
    }

    #[test]
    fn test_stats() {
        let config = EngineConfig {
            collect_stats: true,
            ..EngineConfig::default()
        };
        let engine = FilterEngine::with_config(config).unwrap();
        let definition = engine
            .define(&first_name_is_peter(), &[], &[], ValueType::Object)
            .unwrap();

        let source = people();
        let result = engine
            .execute_with_stats(Some(source.as_slice()), &definition.template, &NoValues)
            .unwrap();
        let stats = result.stats.unwrap();
        assert_eq!(stats.items_scanned, 3);
        assert_eq!(stats.items_matched, 2);
        assert!(!stats.parallel);

        let absent = engine
            .execute_with_stats(None, &definition.template, &NoValues)
            .unwrap();
        assert!(absent.items.is_empty());
        assert_eq!(absent.stats.unwrap().items_scanned, 0);
    }

    #[test]
    fn test_stats_disabled_by_default() {
        let engine = FilterEngine::new();
        let definition = engine
            .define(&first_name_is_peter(), &[], &[], ValueType::Object)
            .unwrap();
        let result = engine
            .execute_with_stats(Some(people().as_slice()), &definition.template, &NoValues)
            .unwrap();
        assert!(result.stats.is_none());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let config = EngineConfig {
            parallel_threshold: 4,
            collect_stats: true,
            ..EngineConfig::default()
        };
        let parallel_engine = FilterEngine::with_config(config).unwrap();
        let engine = FilterEngine::new();
        let definition = engine
            .define(&first_name_is_peter(), &[], &[], ValueType::Object)
            .unwrap();

        let source: Vec<Value> = (0..50)
            .map(|i| person(if i % 3 == 0 { "Peter" } else { "Stefan" }, &i.to_string()))
            .collect();

        let sequential = engine
            .execute(Some(source.as_slice()), &definition.template, &NoValues)
            .unwrap();
        let result = parallel_engine
            .execute_with_stats(Some(source.as_slice()), &definition.template, &NoValues)
            .unwrap();

        assert_eq!(result.items, sequential);
        assert!(result.stats.unwrap().parallel);
    }

    #[test]
    fn test_item_type_is_checked() {
        let engine = FilterEngine::new();
        let definition = engine
            .define(&first_name_is_peter(), &[], &[], ValueType::Object)
            .unwrap();
        let err = engine
            .execute(Some(&[Value::int(3)][..]), &definition.template, &NoValues)
            .unwrap_err();
        assert!(matches!(err, FilterError::TypeMismatch { ref name, .. } if name == "item"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig {
            max_depth: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            FilterEngine::with_config(config),
            Err(FilterError::Config(_))
        ));
    }

    #[test]
    fn test_execution_honours_engine_depth_limit() {
        let definition = FilterEngine::new()
            .define(&first_name_is_peter(), &[], &[], ValueType::Object)
            .unwrap();
        let shallow = FilterEngine::with_config(EngineConfig {
            max_depth: 2,
            ..EngineConfig::default()
        })
        .unwrap();

        let err = shallow
            .execute(Some(people().as_slice()), &definition.template, &NoValues)
            .unwrap_err();
        assert!(matches!(err, FilterError::DepthExceeded { limit: 2 }));
    }
}
