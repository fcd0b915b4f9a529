//! Engine configuration for docstruct.
//!
//! User config lives at `~/.docstruct/docstruct.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocStructError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docstruct.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docstruct";

// ---------------------------------------------------------------------------
// Config structs (matching docstruct.toml schema)
// ---------------------------------------------------------------------------

/// Top-level engine config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Confidence gates.
    #[serde(default)]
    pub thresholds: ThresholdsConfig,

    /// Fallback word-chunking bounds.
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// TOC-driven splitting gate.
    #[serde(default)]
    pub toc: TocConfig,

    /// Output formatting.
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[thresholds]` section.
///
/// Upload-derived signals are weaker than program-derived ones, so the
/// upload gate sits lower.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    /// Canonicalizer gate on the document-upload path.
    #[serde(default = "default_upload_threshold")]
    pub upload: f64,

    /// Canonicalizer gate on the program-build path.
    #[serde(default = "default_program_threshold")]
    pub program: f64,

    /// Confidence above which a rendering rule is switched on.
    #[serde(default = "default_rendering_threshold")]
    pub rendering: f64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            upload: default_upload_threshold(),
            program: default_program_threshold(),
            rendering: default_rendering_threshold(),
        }
    }
}

fn default_upload_threshold() -> f64 {
    0.5
}
fn default_program_threshold() -> f64 {
    0.6
}
fn default_rendering_threshold() -> f64 {
    0.6
}

/// `[chunking]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Below this many words the text stays one chunk.
    #[serde(default = "default_min_words")]
    pub min_words: usize,

    /// Upper bound of words per chunk.
    #[serde(default = "default_max_words")]
    pub max_words: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            min_words: default_min_words(),
            max_words: default_max_words(),
        }
    }
}

fn default_min_words() -> usize {
    800
}
fn default_max_words() -> usize {
    1200
}

/// `[toc]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TocConfig {
    /// Minimum TOC detector confidence before the TOC drives splitting.
    #[serde(default = "default_toc_confidence")]
    pub min_confidence: f64,

    /// Minimum number of entries (and resulting sections) to accept a TOC split.
    #[serde(default = "default_toc_entries")]
    pub min_entries: usize,
}

impl Default for TocConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_toc_confidence(),
            min_entries: default_toc_entries(),
        }
    }
}

fn default_toc_confidence() -> f64 {
    0.9
}
fn default_toc_entries() -> usize {
    4
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Pretty-print JSON output.
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty: default_true(),
        }
    }
}

fn default_true() -> bool {
    true
}

impl EngineConfig {
    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("thresholds.upload", self.thresholds.upload),
            ("thresholds.program", self.thresholds.program),
            ("thresholds.rendering", self.thresholds.rendering),
            ("toc.min_confidence", self.toc.min_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DocStructError::config(format!(
                    "{name} must be within 0..=1, got {value}"
                )));
            }
        }

        if self.chunking.max_words == 0 {
            return Err(DocStructError::config("chunking.max_words must be positive"));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docstruct/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocStructError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docstruct/docstruct.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the engine config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<EngineConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(EngineConfig::default());
    }

    load_config_from(&path)
}

/// Load the engine config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<EngineConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocStructError::io(path, e))?;

    let config: EngineConfig = toml::from_str(&content).map_err(|e| {
        DocStructError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;

    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocStructError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = EngineConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocStructError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocStructError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = EngineConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("upload"));
        assert!(toml_str.contains("max_words"));
    }

    #[test]
    fn config_roundtrip() {
        let config = EngineConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: EngineConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.thresholds.upload, 0.5);
        assert_eq!(parsed.thresholds.program, 0.6);
        assert_eq!(parsed.chunking.max_words, 1200);
        assert_eq!(parsed.toc.min_entries, 4);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[thresholds]
upload = 0.55

[chunking]
max_words = 500
"#;
        let config: EngineConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.thresholds.upload, 0.55);
        assert_eq!(config.thresholds.program, 0.6);
        assert_eq!(config.chunking.min_words, 800);
        assert_eq!(config.chunking.max_words, 500);
        assert!(config.output.pretty);
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        let mut config = EngineConfig::default();
        config.thresholds.program = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("thresholds.program"));
    }

    #[test]
    fn load_config_from_missing_file_is_io_error() {
        let result = load_config_from(Path::new("/nonexistent/docstruct.toml"));
        assert!(matches!(result, Err(DocStructError::Io { .. })));
    }
}
