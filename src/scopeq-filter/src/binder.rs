//! Scope binder
//!
//! Decides which outer names a predicate references by walking the scope
//! chain from the innermost scope outward, then the root members of the
//! enclosing definition. The first occurrence of a name wins, so inner
//! declarations shadow outer ones.
//!
//! Reference detection works on the unparsed source text and is a
//! conservative over-approximation: binding an unused name is harmless,
//! missing a used one would leave a dangling free parameter.

use crate::config::{EngineConfig, ReferenceMatching};
use crate::error::{FilterError, Result};
use log::{debug, trace};
use scopeq_shared::utils::{is_blank, is_identifier_char};
use scopeq_shared::ValueType;
use std::fmt;

/// Access direction of a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// The predicate may only read the location
    ReadOnly,
    /// The location is mutable in its declaring scope
    ReadWrite,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ReadOnly => write!(f, "in"),
            Direction::ReadWrite => write!(f, "in/out"),
        }
    }
}

/// Mutability of a location declared in a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutability {
    /// Assignable
    Mutable,
    /// Read-only after initialization
    ReadOnly,
}

impl From<Mutability> for Direction {
    fn from(mutability: Mutability) -> Self {
        match mutability {
            Mutability::Mutable => Direction::ReadWrite,
            Mutability::ReadOnly => Direction::ReadOnly,
        }
    }
}

/// A named location declared locally in a scope
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NamedLocation {
    /// Location name
    pub name: String,
    /// Declared type
    pub ty: ValueType,
    /// Declared mutability
    pub mutability: Mutability,
}

/// One level of the scope chain
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Scope {
    /// Optional label used in diagnostics
    pub label: Option<String>,
    /// Locations declared directly in this scope
    pub locations: Vec<NamedLocation>,
}

impl Scope {
    /// Create an empty scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty labelled scope
    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            locations: Vec::new(),
        }
    }

    /// Declare a mutable variable
    pub fn variable(mut self, name: impl Into<String>, ty: ValueType) -> Self {
        self.locations.push(NamedLocation {
            name: name.into(),
            ty,
            mutability: Mutability::Mutable,
        });
        self
    }

    /// Declare a read-only variable
    pub fn constant(mut self, name: impl Into<String>, ty: ValueType) -> Self {
        self.locations.push(NamedLocation {
            name: name.into(),
            ty,
            mutability: Mutability::ReadOnly,
        });
        self
    }
}

/// A declared argument or property of the enclosing definition
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RootMember {
    /// Member name
    pub name: String,
    /// Declared type
    pub ty: ValueType,
    /// Access direction
    pub direction: Direction,
}

impl RootMember {
    /// Create a new root member
    pub fn new(name: impl Into<String>, ty: ValueType, direction: Direction) -> Self {
        Self {
            name: name.into(),
            ty,
            direction,
        }
    }
}

/// An outer name referenced by the predicate
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Binding {
    /// Bound name, unique within its table
    pub name: String,
    /// Type of the declaring location
    pub ty: ValueType,
    /// Access direction
    pub direction: Direction,
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.name, self.ty, self.direction)
    }
}

/// Ordered, de-duplicated bindings in discovery order
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct BindingTable {
    bindings: Vec<Binding>,
}

impl BindingTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a binding unless its name is already bound
    fn insert(&mut self, binding: Binding) {
        if !self.contains(&binding.name) {
            self.bindings.push(binding);
        }
    }

    /// Look up a binding by name
    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.name == name)
    }

    /// Check whether a name is bound
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Bound names in discovery order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|b| b.name.as_str())
    }

    /// Iterate bindings in discovery order
    pub fn iter(&self) -> std::slice::Iter<'_, Binding> {
        self.bindings.iter()
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// True when nothing is bound
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<'a> IntoIterator for &'a BindingTable {
    type Item = &'a Binding;
    type IntoIter = std::slice::Iter<'a, Binding>;

    fn into_iter(self) -> Self::IntoIter {
        self.bindings.iter()
    }
}

/// Builds the binding table for a predicate
#[derive(Debug, Clone)]
pub struct ScopeBinder {
    item_name: String,
    matching: ReferenceMatching,
}

impl ScopeBinder {
    /// Create a binder using the engine's item name and matching strategy
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            item_name: config.item_name.clone(),
            matching: config.reference_matching,
        }
    }

    /// Bind every outer name the predicate source mentions.
    ///
    /// `scope_chain` is ordered innermost first. Fails with
    /// [`FilterError::UnboundFilter`] when the source is absent or blank.
    pub fn bind(
        &self,
        source: Option<&str>,
        scope_chain: &[Scope],
        root_members: &[RootMember],
    ) -> Result<BindingTable> {
        let source = match source {
            Some(text) if !is_blank(text) => text,
            _ => {
                return Err(FilterError::UnboundFilter {
                    item_name: self.item_name.clone(),
                })
            }
        };

        let mut table = BindingTable::new();

        for (depth, scope) in scope_chain.iter().enumerate() {
            for location in &scope.locations {
                self.consider(
                    &mut table,
                    source,
                    Binding {
                        name: location.name.clone(),
                        ty: location.ty.clone(),
                        direction: location.mutability.into(),
                    },
                    || match &scope.label {
                        Some(label) => format!("scope '{}'", label),
                        None => format!("scope #{}", depth),
                    },
                );
            }
        }

        for member in root_members {
            self.consider(
                &mut table,
                source,
                Binding {
                    name: member.name.clone(),
                    ty: member.ty.clone(),
                    direction: member.direction,
                },
                || "root".to_string(),
            );
        }

        Ok(table)
    }

    fn consider(
        &self,
        table: &mut BindingTable,
        source: &str,
        binding: Binding,
        origin: impl FnOnce() -> String,
    ) {
        if binding.name.is_empty() || binding.name == self.item_name {
            return;
        }
        if !self.references(source, &binding.name) {
            return;
        }
        if table.contains(&binding.name) {
            trace!(
                "'{}' from {} is shadowed by an inner declaration",
                binding.name,
                origin()
            );
            return;
        }
        debug!("Binding {} from {}", binding, origin());
        table.insert(binding);
    }

    /// Whether `name` appears in `source` under the configured strategy
    pub fn references(&self, source: &str, name: &str) -> bool {
        match self.matching {
            ReferenceMatching::Substring => source.contains(name),
            ReferenceMatching::Identifier => contains_identifier(source, name),
        }
    }
}

/// True if `name` occurs in `source` with no identifier character directly
/// before or after it
fn contains_identifier(source: &str, name: &str) -> bool {
    source.match_indices(name).any(|(start, _)| {
        let before = source[..start].chars().next_back();
        let after = source[start + name.len()..].chars().next();
        !before.is_some_and(is_identifier_char) && !after.is_some_and(is_identifier_char)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn binder() -> ScopeBinder {
        ScopeBinder::new(&EngineConfig::default())
    }

    fn identifier_binder() -> ScopeBinder {
        ScopeBinder::new(&EngineConfig {
            reference_matching: ReferenceMatching::Identifier,
            ..EngineConfig::default()
        })
    }

    #[test]
    fn test_empty_source_is_unbound() {
        let err = binder().bind(Some(""), &[], &[]).unwrap_err();
        assert!(matches!(err, FilterError::UnboundFilter { ref item_name } if item_name == "item"));

        let err = binder().bind(Some("   "), &[], &[]).unwrap_err();
        assert!(matches!(err, FilterError::UnboundFilter { .. }));

        let err = binder().bind(None, &[], &[]).unwrap_err();
        assert!(matches!(err, FilterError::UnboundFilter { .. }));
    }

    #[test]
    fn test_item_only_binds_nothing() {
        let scopes = [Scope::new().variable("resultData", ValueType::Any)];
        let table = binder()
            .bind(Some("item.FirstName == \"Peter\""), &scopes, &[])
            .unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_binds_read_only_variable() {
        let scopes = [Scope::new()
            .variable("resultData", ValueType::Any)
            .constant("expectedFirstName", ValueType::String)];
        let table = binder()
            .bind(Some("item.FirstName == expectedFirstName"), &scopes, &[])
            .unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(
            table.get("expectedFirstName"),
            Some(&Binding {
                name: "expectedFirstName".to_string(),
                ty: ValueType::String,
                direction: Direction::ReadOnly,
            })
        );
    }

    #[test]
    fn test_mutable_variable_is_read_write() {
        let scopes = [Scope::new().variable("limit", ValueType::Int)];
        let table = binder().bind(Some("item.Age < limit"), &scopes, &[]).unwrap();
        assert_eq!(table.get("limit").unwrap().direction, Direction::ReadWrite);
    }

    #[test]
    fn test_innermost_scope_shadows() {
        let scopes = [
            Scope::labelled("inner").constant("threshold", ValueType::Int),
            Scope::labelled("outer").variable("threshold", ValueType::Float),
        ];
        let roots = [RootMember::new(
            "threshold",
            ValueType::String,
            Direction::ReadWrite,
        )];
        let table = binder()
            .bind(Some("item.Score > threshold"), &scopes, &roots)
            .unwrap();

        assert_eq!(table.len(), 1);
        let binding = table.get("threshold").unwrap();
        assert_eq!(binding.ty, ValueType::Int);
        assert_eq!(binding.direction, Direction::ReadOnly);
    }

    #[test]
    fn test_discovery_order_scopes_then_roots() {
        let scopes = [
            Scope::new().constant("b", ValueType::Int),
            Scope::new().constant("a", ValueType::Int),
        ];
        let roots = [RootMember::new("c", ValueType::Int, Direction::ReadOnly)];
        let table = binder()
            .bind(Some("item.X == a + b + c"), &scopes, &roots)
            .unwrap();

        let names: Vec<&str> = table.names().collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_item_name_is_never_bound() {
        let scopes = [Scope::new().variable("item", ValueType::Object)];
        let roots = [RootMember::new("item", ValueType::Object, Direction::ReadOnly)];
        let table = binder()
            .bind(Some("item.Active"), &scopes, &roots)
            .unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_substring_matching_over_binds() {
        // "name" occurs inside "FirstName"; the default strategy binds it anyway
        let scopes = [Scope::new().constant("Name", ValueType::String)];
        let table = binder()
            .bind(Some("item.FirstName == \"Peter\""), &scopes, &[])
            .unwrap();
        assert!(table.contains("Name"));
    }

    #[test]
    fn test_identifier_matching_requires_boundaries() {
        let scopes = [Scope::new()
            .constant("Name", ValueType::String)
            .constant("minAge", ValueType::Int)];
        let table = identifier_binder()
            .bind(Some("item.FirstName != \"\" and item.Age >= minAge"), &scopes, &[])
            .unwrap();

        let names: Vec<&str> = table.names().collect();
        assert_eq!(names, vec!["minAge"]);
    }

    #[test]
    fn test_contains_identifier() {
        assert!(contains_identifier("a + limit", "limit"));
        assert!(contains_identifier("(limit)", "limit"));
        assert!(contains_identifier("limit", "limit"));
        assert!(!contains_identifier("limits", "limit"));
        assert!(!contains_identifier("my_limit", "limit"));
        assert!(contains_identifier("my_limit + limit", "limit"));
        assert!(contains_identifier("x == émile", "émile"));
    }

    #[test]
    fn test_empty_names_are_ignored() {
        let scopes = [Scope::new().constant("", ValueType::Int)];
        let table = binder().bind(Some("item.X"), &scopes, &[]).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_binding_display() {
        let binding = Binding {
            name: "expectedFirstName".to_string(),
            ty: ValueType::String,
            direction: Direction::ReadOnly,
        };
        assert_eq!(binding.to_string(), "expectedFirstName: string (in)");
    }
}
