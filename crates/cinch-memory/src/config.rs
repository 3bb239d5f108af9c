//! Window configuration with sensible defaults.
//!
//! [`WindowConfig`] captures everything needed to stand up a
//! [`TokenWindowMemory`] and can be loaded from a JSON file:
//!
//! ```json
//! {
//!   "id": "support-bot",
//!   "max_tokens": 8192,
//!   "estimator": { "kind": "openai", "model": "gpt-4o" }
//! }
//! ```
//!
//! Omitted fields fall back to their defaults.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{MemoryError, Result};
use crate::estimate::{
    CharRatioEstimator, DEFAULT_CHARS_PER_TOKEN, OpenAiEstimator, TokenEstimator,
};
use crate::memory::{DEFAULT_MEMORY_ID, TokenWindowMemory};

/// Default token budget.
pub const DEFAULT_MAX_TOKENS: usize = 4096;

/// Which estimator prices the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EstimatorConfig {
    /// Character-ratio heuristic. Default.
    Heuristic {
        #[serde(default = "default_chars_per_token")]
        chars_per_token: f64,
    },
    /// Exact BPE counts for an OpenAI model.
    #[serde(rename = "openai")]
    OpenAi { model: String },
}

fn default_chars_per_token() -> f64 {
    DEFAULT_CHARS_PER_TOKEN
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        EstimatorConfig::Heuristic {
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
        }
    }
}

/// Configuration for one token-bounded memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Memory id. Default: `"default"`.
    pub id: String,
    /// Token budget. Default: `4096`.
    pub max_tokens: usize,
    /// Token estimator. Default: heuristic at 3.5 chars/token.
    pub estimator: EstimatorConfig,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            id: DEFAULT_MEMORY_ID.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            estimator: EstimatorConfig::default(),
        }
    }
}

impl WindowConfig {
    /// Load a config from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MemoryError::Config(format!("failed to read config '{}': {e}", path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            MemoryError::Config(format!("failed to parse config '{}': {e}", path.display()))
        })
    }

    /// Instantiate the configured estimator.
    pub fn build_estimator(&self) -> Result<Arc<dyn TokenEstimator>> {
        let estimator: Arc<dyn TokenEstimator> = match &self.estimator {
            EstimatorConfig::Heuristic { chars_per_token } => {
                Arc::new(CharRatioEstimator::default().with_chars_per_token(*chars_per_token))
            }
            EstimatorConfig::OpenAi { model } => Arc::new(OpenAiEstimator::for_model(model)?),
        };
        Ok(estimator)
    }

    /// Build an empty memory from this config.
    pub fn build(&self) -> Result<TokenWindowMemory> {
        TokenWindowMemory::builder()
            .id(self.id.clone())
            .max_tokens(self.max_tokens, self.build_estimator()?)
            .build()
    }
}
