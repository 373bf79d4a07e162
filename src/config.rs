use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::corpus::DEFAULT_MAX_ROWS;
use crate::semantic::matches::{DEFAULT_THRESHOLD, DEFAULT_TOP_K};
use crate::semantic::{SearchSettings, DEFAULT_MODEL};

const DEFAULT_CORPUS_PATH: &str = "FIR_Details.csv";
const DEFAULT_CACHE_DIR: &str = ".cache";
const DEFAULT_BIND: &str = "127.0.0.1:5000";
/// Uploads are short reports; anything bigger only burns embedding time
const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024;

/// Where the records come from
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// CSV file with the FIR columns
    #[serde(default = "default_corpus_path")]
    pub path: PathBuf,

    /// Rows read from the top of the file
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: default_corpus_path(),
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

/// Configuration for the embedding model and the query
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SemanticSearchConfig {
    /// Model name for embeddings (e.g., "all-MiniLM-L6-v2")
    #[serde(default = "default_semantic_model")]
    pub model: String,

    /// Downloaded models are kept under `<cache_dir>/models`
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Minimum similarity score [0.0, 1.0]
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Nearest neighbours fetched per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for SemanticSearchConfig {
    fn default() -> Self {
        Self {
            model: default_semantic_model(),
            cache_dir: default_cache_dir(),
            threshold: DEFAULT_THRESHOLD,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl SemanticSearchConfig {
    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            threshold: self.threshold,
            top_k: self.top_k,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

fn default_corpus_path() -> PathBuf {
    PathBuf::from(DEFAULT_CORPUS_PATH)
}

fn default_max_rows() -> usize {
    DEFAULT_MAX_ROWS
}

fn default_semantic_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_DIR)
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub semantic_search: SemanticSearchConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    pub(crate) fn validate(&self) -> anyhow::Result<()> {
        if self.corpus.max_rows == 0 {
            bail!("corpus.max_rows must be greater than 0");
        }

        let sem = &self.semantic_search;
        if !(0.0..=1.0).contains(&sem.threshold) {
            bail!(
                "semantic_search.threshold must be between 0.0 and 1.0, got {}",
                sem.threshold
            );
        }

        if sem.top_k == 0 {
            bail!("semantic_search.top_k must be greater than 0");
        }

        if self.server.max_upload_bytes == 0 {
            bail!("server.max_upload_bytes must be greater than 0");
        }

        Ok(())
    }

    /// Parse and validate a YAML config.
    pub fn from_yaml(config_str: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yml::from_str(config_str).context("config is malformed")?;
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line corpus overrides and validate the result again.
    pub fn with_corpus_overrides(
        mut self,
        path: Option<PathBuf>,
        max_rows: Option<usize>,
    ) -> anyhow::Result<Self> {
        if let Some(path) = path {
            self.corpus.path = path;
        }
        if let Some(max_rows) = max_rows {
            self.corpus.max_rows = max_rows;
        }

        self.validate()?;
        Ok(self)
    }

    /// Load from `path`, or fall back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            log::debug!("no config file given, using defaults");
            return Ok(Self::default());
        };

        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;

        Self::from_yaml(&config_str).with_context(|| format!("invalid config {}", path.display()))
    }
}
