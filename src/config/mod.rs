// src/config/mod.rs

//! Configuration loading and validation for sitepipe.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk, falling back to built-in defaults
//!   reproducing the conventional src/ + public/ + dist/ layout (`loader.rs`).
//! - Validate basic invariants like glob syntax and distinct output
//!   locations (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{
    BuildSection, ConfigFile, PathsSection, PipelineConfig, ReloadMode, ServerSection,
    WatchSection,
};
pub use validate::validate_config;
