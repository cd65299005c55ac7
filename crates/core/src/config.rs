//! Runtime limits and matching options shared by the tokenizer, the
//! value resolver and the binder.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Reserved "any substring" marker for wildcard name matching.
pub const DEFAULT_WILDCARD: char = '¤';

/// Default nesting bound for contexts and binder recursion.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Default bound on chained operators folded into one another.
pub const DEFAULT_MAX_FOLD_DEPTH: usize = 512;

/// Default bound, in bytes, on text built by an operator.
pub const DEFAULT_MAX_TEXT_LEN: usize = 1 << 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Deepest allowed context nesting / binder recursion.
    pub max_depth: usize,
    /// Deepest allowed chain of operator results, e.g. `1 + 1 + ... + 1`.
    pub max_fold_depth: usize,
    pub max_text_len: usize,
    pub wildcard: char,
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig {
            max_depth: DEFAULT_MAX_DEPTH,
            max_fold_depth: DEFAULT_MAX_FOLD_DEPTH,
            max_text_len: DEFAULT_MAX_TEXT_LEN,
            wildcard: DEFAULT_WILDCARD,
        }
    }
}

impl ParseConfig {
    /// Load from JSON; absent fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: ParseConfig = serde_json::from_str(json)?;
        config.validated()
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self, ConfigError> {
        let config = ParseConfig::deserialize(value)?;
        config.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.max_depth == 0 || self.max_fold_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        Ok(self)
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_fold_depth(mut self, max_fold_depth: usize) -> Self {
        self.max_fold_depth = max_fold_depth;
        self
    }

    pub fn with_max_text_len(mut self, max_text_len: usize) -> Self {
        self.max_text_len = max_text_len;
        self
    }

    pub fn with_wildcard(mut self, wildcard: char) -> Self {
        self.wildcard = wildcard;
        self
    }
}
