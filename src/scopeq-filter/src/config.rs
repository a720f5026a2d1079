//! Configuration for the filter engine
//!
//! Configuration is plain serde data so hosts can embed it in their own
//! configuration files; [`EngineConfig::from_toml_str`] reads a standalone
//! TOML table.

use crate::error::{FilterError, Result};
use scopeq_shared::constants::{DEFAULT_ITEM_NAME, DEFAULT_PARALLEL_THRESHOLD, MAX_RECURSION_DEPTH};
use scopeq_shared::utils::{is_blank, is_identifier_char};
use serde::{Deserialize, Serialize};

/// How the scope binder decides that the predicate source mentions a name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceMatching {
    /// Plain substring containment. May bind names that only occur inside
    /// longer identifiers or string literals; never misses a used name.
    #[default]
    Substring,
    /// The name must occur delimited by non-identifier characters
    Identifier,
}

/// Filter engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Reserved name of the item parameter
    pub item_name: String,
    /// Reference detection strategy used by the scope binder
    pub reference_matching: ReferenceMatching,
    /// Maximum expression nesting accepted by the rewriter, resolver and evaluator
    pub max_depth: usize,
    /// Inputs larger than this are filtered on the rayon pool
    pub parallel_threshold: usize,
    /// Whether to collect execution statistics
    pub collect_stats: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            item_name: DEFAULT_ITEM_NAME.to_string(),
            reference_matching: ReferenceMatching::default(),
            max_depth: MAX_RECURSION_DEPTH,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            collect_stats: false,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(text).map_err(|e| FilterError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if is_blank(&self.item_name) {
            return Err(FilterError::Config("item_name must not be empty".to_string()));
        }
        if !self.item_name.chars().all(is_identifier_char) {
            return Err(FilterError::Config(format!(
                "item_name '{}' is not an identifier",
                self.item_name
            )));
        }
        if self.max_depth == 0 {
            return Err(FilterError::Config(
                "max_depth must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.item_name, "item");
        assert_eq!(config.reference_matching, ReferenceMatching::Substring);
        assert_eq!(config.max_depth, 256);
        assert_eq!(config.parallel_threshold, 10_000);
        assert!(!config.collect_stats);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = EngineConfig::from_toml_str(
            r#"
item_name = "row"
reference_matching = "identifier"
"#,
        )
        .unwrap();

        assert_eq!(config.item_name, "row");
        assert_eq!(config.reference_matching, ReferenceMatching::Identifier);
        assert_eq!(config.max_depth, 256);
    }

    #[test]
    fn test_from_toml_rejects_invalid() {
        assert!(matches!(
            EngineConfig::from_toml_str("item_name = \"\""),
            Err(FilterError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("item_name = \"the item\""),
            Err(FilterError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("max_depth = 0"),
            Err(FilterError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("reference_matching = \"fuzzy\""),
            Err(FilterError::Config(_))
        ));
    }
}
