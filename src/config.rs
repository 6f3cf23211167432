//! Configuration module for the knowledge lookup engine.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `FMEA_` and use double underscores
//! to separate nested levels:
//! - `FMEA_RETRIEVAL__THRESHOLD=0.3` sets `retrieval.threshold`
//! - `FMEA_EMBEDDING__MODEL=hash` sets `embedding.model`
//! - `FMEA_KNOWLEDGE__PATH=data/ct_scan.csv` sets `knowledge.path`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::chunking::ChunkingParams;
use crate::error::RetrievalError;
use crate::vector::{IndexKind, IvfParams};

/// Directory holding the settings file, searched upward from the cwd.
pub const CONFIG_DIR: &str = ".fmea";

/// Settings file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "settings.toml";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Global debug mode (verbose logging)
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Knowledge source settings
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Segmenter settings
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Embedding model settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Nearest-neighbor index settings
    #[serde(default)]
    pub index: IndexConfig,

    /// Query-time settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct KnowledgeConfig {
    /// CSV file with the FMEA records
    #[serde(default = "default_knowledge_path")]
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct ChunkingConfig {
    /// Maximum words per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Words shared by consecutive chunks of one document
    #[serde(default = "default_overlap")]
    pub overlap: usize,

    /// Windows shorter than this are dropped
    #[serde(default = "default_min_chunk_words")]
    pub min_chunk_words: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EmbeddingConfig {
    /// fastembed model name, or "hash" for the offline hashing embedder
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector dimension of the hashing embedder
    #[serde(default = "default_hash_dimension")]
    pub hash_dimension: usize,

    /// Chunks embedded per model call while building the index
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Model cache directory (defaults to the user cache dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Show progress bars while downloading a model
    #[serde(default = "default_false")]
    pub show_download_progress: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IndexConfig {
    /// "flat" (exact) or "ivf_flat" (approximate)
    #[serde(default)]
    pub kind: IndexKind,

    /// Number of IVF cells; unset means ceil(sqrt(chunks))
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clusters: Option<usize>,

    /// IVF cells scanned per query
    #[serde(default = "default_search_cells")]
    pub search_cells: usize,

    /// K-means seed
    #[serde(default = "default_seed")]
    pub seed: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RetrievalConfig {
    /// Number of chunks requested from the index
    #[serde(default = "default_k")]
    pub k: usize,

    /// Minimum relevance, where relevance = 1 / (1 + distance)
    #[serde(default = "default_threshold")]
    pub threshold: f32,

    /// Separator placed between chunks in the assembled context
    #[serde(default = "default_separator")]
    pub separator: String,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_false() -> bool {
    false
}
fn default_knowledge_path() -> PathBuf {
    PathBuf::from("fmea_example.csv")
}
fn default_chunk_size() -> usize {
    128
}
fn default_overlap() -> usize {
    32
}
fn default_min_chunk_words() -> usize {
    4
}
fn default_embedding_model() -> String {
    "AllMiniLML6V2".to_string()
}
fn default_hash_dimension() -> usize {
    384
}
fn default_batch_size() -> usize {
    64
}
fn default_search_cells() -> usize {
    4
}
fn default_seed() -> u64 {
    42
}
fn default_k() -> usize {
    3
}
fn default_threshold() -> f32 {
    0.25
}
fn default_separator() -> String {
    "\n---\n".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            debug: false,
            knowledge: KnowledgeConfig::default(),
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            index: IndexConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            path: default_knowledge_path(),
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
            min_chunk_words: default_min_chunk_words(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            hash_dimension: default_hash_dimension(),
            batch_size: default_batch_size(),
            cache_dir: None,
            show_download_progress: false,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            kind: IndexKind::default(),
            clusters: None,
            search_cells: default_search_cells(),
            seed: default_seed(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            threshold: default_threshold(),
            separator: default_separator(),
        }
    }
}

impl IndexConfig {
    /// IVF build parameters derived from these settings.
    #[must_use]
    pub fn ivf_params(&self) -> IvfParams {
        IvfParams {
            clusters: self.clusters,
            search_cells: self.search_cells,
            seed: self.seed,
        }
    }
}

/// Checks a relevance threshold.
///
/// Thresholds above 1.0 are accepted and simply unreachable.
pub fn validate_threshold(threshold: f32) -> Result<(), RetrievalError> {
    if threshold.is_nan() || threshold < 0.0 {
        return Err(RetrievalError::config(format!(
            "relevance threshold must be a non-negative number, got {threshold}"
        )));
    }
    Ok(())
}

/// Checks a result count.
pub fn validate_k(k: usize) -> Result<(), RetrievalError> {
    if k == 0 {
        return Err(RetrievalError::config("k must be at least 1"));
    }
    Ok(())
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(path))
            // Double underscore separates nested levels, single underscores stay
            .merge(Env::prefixed("FMEA_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find the settings file by looking for a `.fmea` directory
    /// from the current directory up to the filesystem root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join(CONFIG_FILE));
            }
        }

        None
    }

    /// Validate every tunable before any work is done.
    pub fn validate(&self) -> Result<(), RetrievalError> {
        ChunkingParams::from_config(&self.chunking)?;
        if self.embedding.batch_size == 0 {
            return Err(RetrievalError::config("embedding batch_size must be at least 1"));
        }
        if self.index.search_cells == 0 {
            return Err(RetrievalError::config("index search_cells must be at least 1"));
        }
        if self.index.clusters == Some(0) {
            return Err(RetrievalError::config("index clusters must be at least 1"));
        }
        validate_k(self.retrieval.k)?;
        validate_threshold(self.retrieval.threshold)
    }

    /// Save current configuration to file
    pub fn save(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(CONFIG_DIR).join(CONFIG_FILE);
        Self::write_template(&config_path, force)?;
        Ok(config_path)
    }

    /// Write the commented settings template to `path`
    pub fn write_template(
        path: &std::path::Path,
        force: bool,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if !force && path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, SETTINGS_TEMPLATE)?;
        Ok(())
    }
}

const SETTINGS_TEMPLATE: &str = r#"# fmea-rag configuration

# Version of the configuration schema
version = 1

# Verbose logging
debug = false

[knowledge]
# CSV export of the FMEA sheet. Required columns:
# Item/Function, Failure Mode, Effects of Failure, Potential Cause(s), Recommended Actions
path = "fmea_example.csv"

[chunking]
# Words per chunk
chunk_size = 128
# Words shared by consecutive chunks (must be smaller than chunk_size)
overlap = 32
# Shorter trailing fragments are dropped
min_chunk_words = 4

[embedding]
# fastembed model name, or "hash" for the offline hashing embedder
model = "AllMiniLML6V2"
# Dimension used by the "hash" embedder
hash_dimension = 384
# Chunks per embedding call while building the index
batch_size = 64
show_download_progress = false

[index]
# "flat" = exact scan, "ivf_flat" = k-means cells (approximate)
kind = "flat"
# Cells scanned per query for ivf_flat
search_cells = 4
seed = 42

[retrieval]
# Chunks requested per query
k = 3
# Minimum relevance, relevance = 1 / (1 + squared distance)
threshold = 0.25
separator = "\n---\n"
"#;
