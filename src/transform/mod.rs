// src/transform/mod.rs

//! Transform adapters.
//!
//! A [`Transform`] wraps exactly one external transformation (template
//! render, style compile, script compile, image optimize) behind a uniform
//! content-in/content-out contract; the [`TransformAdapter`] applies it over
//! a whole source set, preserving relative path structure.
//!
//! What the transformation actually does is entirely the external tool's
//! business; this crate only sequences it.

pub mod adapter;
pub mod command;

use std::path::Path;

use async_trait::async_trait;

use crate::errors::TransformError;

pub use adapter::{BatchReport, TransformAdapter};
pub use command::CommandTransform;

/// One external transformation applied to a single file's content.
#[async_trait]
pub trait Transform: Send + Sync {
    /// Transform the content of `source`. The path is provided for error
    /// reporting and for tools that care about the input name.
    async fn apply(&self, source: &Path, input: Vec<u8>) -> Result<Vec<u8>, TransformError>;
}

/// Identity transform: content passes through unchanged.
///
/// Used for asset copying and as the fallback when no external command is
/// configured for a pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct CopyTransform;

#[async_trait]
impl Transform for CopyTransform {
    async fn apply(&self, _source: &Path, input: Vec<u8>) -> Result<Vec<u8>, TransformError> {
        Ok(input)
    }
}
