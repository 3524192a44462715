//! Shared types, error model, and configuration for PressPipe.
//!
//! This crate is the foundation depended on by all other PressPipe crates.
//! It provides:
//! - [`PressPipeError`] — the unified error type
//! - [`Document`] / [`ListResponse`] — the canonical store response shapes
//! - Configuration ([`AppConfig`], credential loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CollectionsConfig, Credentials, FieldsConfig, StoreConfig, UploadConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from, load_credentials,
};
pub use error::{PressPipeError, Result};
pub use types::{Document, ListResponse};
