use anyhow::{Context, Result};
use serde::Deserialize;

/// Tunables shared by the parser and the value coercer
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryBuilderConfig {
    /// Maximum group nesting accepted by the parser
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Marker turning a string value into a pattern match
    #[serde(default = "default_wildcard")]
    pub wildcard: char,
    /// chrono formats tried for date fields without an explicit format, after RFC 3339
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,
}

/// Upper bound for `max_depth`; the parser recurses once per group level.
pub const MAX_DEPTH_LIMIT: usize = 256;

/// Characters the FIQL grammar gives a meaning of its own
const RESERVED_CHARS: &[char] = &['(', ')', ';', ',', '\'', '"', '\\', '=', '!', '<', '>'];

fn default_max_depth() -> usize {
    32
}

fn default_wildcard() -> char {
    '*'
}

fn default_date_formats() -> Vec<String> {
    vec!["%Y-%m-%d".to_string()]
}

impl Default for QueryBuilderConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            wildcard: default_wildcard(),
            date_formats: default_date_formats(),
        }
    }
}

impl QueryBuilderConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: QueryBuilderConfig =
            serde_yaml_ng::from_str(yaml).context("Failed to parse query builder config")?;
        config.validate()?;
        Ok(config)
    }

    /// Checked by every entry point that accepts a config
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 || self.max_depth > MAX_DEPTH_LIMIT {
            anyhow::bail!(
                "max_depth must be between 1 and {}, got {}",
                MAX_DEPTH_LIMIT,
                self.max_depth
            );
        }
        if self.wildcard.is_whitespace() || RESERVED_CHARS.contains(&self.wildcard) {
            anyhow::bail!("wildcard {:?} is reserved by the filter grammar", self.wildcard);
        }
        Ok(())
    }
}
