//! Shared types, error model, and configuration for docstruct.
//!
//! This crate is the foundation depended on by all other docstruct crates.
//! It provides:
//! - [`DocStructError`] as the unified error type
//! - The [`DocumentStructure`] data model and its inputs ([`FundingProgram`],
//!   [`ParsedDocumentData`], [`DetectionMap`])
//! - Configuration ([`EngineConfig`], config loading)
//! - Injectable ID generation ([`IdGenerator`])

pub mod config;
pub mod error;
pub mod ids;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    ChunkingConfig, EngineConfig, OutputConfig, ThresholdsConfig, TocConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{DocStructError, Result};
pub use ids::{IdGenerator, SequentialIdGenerator, TimestampIdGenerator};
pub use types::*;
