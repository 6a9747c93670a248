use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use crate::error::AppError;

/// Per-document-type token budget, overridable via `<TYPE>_{MIN,TARGET,MAX}_TOKENS`
/// and `<TYPE>_OVERLAP_RATIO` environment variables (spec.md §4.3.1, §6.5).
#[derive(Clone, Debug, Deserialize)]
pub struct ChunkBudget {
    pub min_tokens: usize,
    pub target_tokens: usize,
    pub max_tokens: usize,
    pub overlap_ratio: f32,
}

impl ChunkBudget {
    pub const fn scotus_default() -> Self {
        Self {
            min_tokens: 500,
            target_tokens: 600,
            max_tokens: 800,
            overlap_ratio: 0.15,
        }
    }

    pub const fn eo_default() -> Self {
        Self {
            min_tokens: 240,
            target_tokens: 340,
            max_tokens: 400,
            overlap_ratio: 0.10,
        }
    }

    /// `overlap_tokens = floor(target_tokens * overlap_ratio)` (spec.md §4.3.1).
    pub fn overlap_tokens(&self) -> usize {
        ((self.target_tokens as f32) * self.overlap_ratio).floor() as usize
    }

    /// Construction-time validation per spec.md §4.3.1.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.min_tokens == 0 || self.target_tokens == 0 || self.max_tokens == 0 {
            return Err(AppError::Config(
                "chunk budget token counts must be positive".into(),
            ));
        }
        if !(self.min_tokens <= self.target_tokens && self.target_tokens <= self.max_tokens) {
            return Err(AppError::Config(
                "chunk budget must satisfy min <= target <= max".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.overlap_ratio) {
            return Err(AppError::Config(
                "chunk overlap_ratio must be in [0, 1)".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub court_listener_api_token: Option<String>,
    pub openai_api_key: Option<String>,
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_vector_store_url")]
    pub vector_store_url: String,

    #[serde(default)]
    pub scotus_min_tokens: Option<usize>,
    #[serde(default)]
    pub scotus_target_tokens: Option<usize>,
    #[serde(default)]
    pub scotus_max_tokens: Option<usize>,
    #[serde(default)]
    pub scotus_overlap_ratio: Option<f32>,

    #[serde(default)]
    pub eo_min_tokens: Option<usize>,
    #[serde(default)]
    pub eo_target_tokens: Option<usize>,
    #[serde(default)]
    pub eo_max_tokens: Option<usize>,
    #[serde(default)]
    pub eo_overlap_ratio: Option<f32>,
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_vector_store_url() -> String {
    "surrealkv://./data/vectors.db".to_string()
}

impl AppConfig {
    pub fn scotus_budget(&self) -> ChunkBudget {
        let mut budget = ChunkBudget::scotus_default();
        if let Some(v) = self.scotus_min_tokens {
            budget.min_tokens = v;
        }
        if let Some(v) = self.scotus_target_tokens {
            budget.target_tokens = v;
        }
        if let Some(v) = self.scotus_max_tokens {
            budget.max_tokens = v;
        }
        if let Some(v) = self.scotus_overlap_ratio {
            budget.overlap_ratio = v;
        }
        budget
    }

    pub fn eo_budget(&self) -> ChunkBudget {
        let mut budget = ChunkBudget::eo_default();
        if let Some(v) = self.eo_min_tokens {
            budget.min_tokens = v;
        }
        if let Some(v) = self.eo_target_tokens {
            budget.target_tokens = v;
        }
        if let Some(v) = self.eo_max_tokens {
            budget.max_tokens = v;
        }
        if let Some(v) = self.eo_overlap_ratio {
            budget.overlap_ratio = v;
        }
        budget
    }

    /// Fails fast with the missing variable named, per spec.md §6.5.
    pub fn require_court_listener_token(&self) -> Result<&str, AppError> {
        self.court_listener_api_token
            .as_deref()
            .ok_or_else(|| AppError::Config("COURT_LISTENER_API_TOKEN".into()))
    }

    pub fn require_openai_key(&self) -> Result<&str, AppError> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("OPENAI_API_KEY".into()))
    }
}

fn load_raw() -> Result<Config, ConfigError> {
    Config::builder()
        .add_source(Environment::default())
        .build()
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    load_raw()?.try_deserialize()
}
