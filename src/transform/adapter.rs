// src/transform/adapter.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio::fs;
use tracing::debug;

use crate::errors::TransformError;
use crate::transform::Transform;
use crate::watch::SourceSet;

/// Per-batch report: which files were written and which failed, per file.
///
/// Failures are collected, not fatal: the rest of the batch is still
/// processed, keeping the dev loop alive across a broken file.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Destination-relative paths of the files written.
    pub written: Vec<PathBuf>,
    /// Source paths that failed, with their errors.
    pub failures: Vec<(PathBuf, TransformError)>,
}

/// Applies one [`Transform`] over a [`SourceSet`], writing results under a
/// destination directory while preserving relative path structure, with an
/// optional output extension rename.
pub struct TransformAdapter {
    /// Directory the include patterns are relative to.
    root: PathBuf,
    sources: SourceSet,
    dest: PathBuf,
    /// Output extension without the dot (e.g. `"html"`).
    ext: Option<String>,
    transform: Arc<dyn Transform>,
}

impl TransformAdapter {
    pub fn new(
        root: impl Into<PathBuf>,
        sources: SourceSet,
        dest: impl Into<PathBuf>,
        ext: Option<String>,
        transform: Arc<dyn Transform>,
    ) -> Self {
        Self {
            root: root.into(),
            sources,
            dest: dest.into(),
            ext,
            transform,
        }
    }

    /// Run the batch: read every selected file, transform it, write the
    /// result. Returns `Err` only for process-level problems (enumerating
    /// the source tree); per-file problems land in the report.
    pub async fn run(&self) -> Result<BatchReport> {
        let files = self.sources.resolve(&self.root)?;
        debug!(root = ?self.root, files = files.len(), "transform batch starting");

        let mut report = BatchReport::default();

        for rel in files {
            let source = self.root.join(&rel);

            let input = match fs::read(&source).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    report.failures.push((
                        source.clone(),
                        TransformError::Read {
                            path: source,
                            source: err,
                        },
                    ));
                    continue;
                }
            };

            let output = match self.transform.apply(&source, input).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    report.failures.push((source, err));
                    continue;
                }
            };

            let out_rel = match &self.ext {
                Some(ext) => rel.with_extension(ext),
                None => rel.clone(),
            };
            let out_path = self.dest.join(&out_rel);

            if let Err(err) = write_output(&out_path, &output).await {
                report.failures.push((
                    source,
                    TransformError::Write {
                        path: out_path,
                        source: err,
                    },
                ));
                continue;
            }

            report.written.push(out_rel);
        }

        Ok(report)
    }
}

async fn write_output(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, bytes).await
}
