//! Engine configuration.
//!
//! JSON shape (every field optional):
//! { "max_depth": 32, "strict_measurements": false }

use crate::error::SchemaError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Deepest specification nesting accepted; roots are depth 1.
    pub max_depth: usize,

    /// Reject measurement bags that name the same measurement twice.
    /// Otherwise the last occurrence wins.
    pub strict_measurements: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            strict_measurements: false,
        }
    }
}

impl EngineConfig {
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_fields_take_defaults() {
        let cfg = EngineConfig::from_json(r#"{ "max_depth": 4 }"#).unwrap();
        assert_eq!(
            cfg,
            EngineConfig {
                max_depth: 4,
                strict_measurements: false
            }
        );
        assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(EngineConfig::from_json(r#"{ "max_dept": 4 }"#).is_err());
    }
}
