// src/config/validate.rs

use std::collections::HashMap;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};

use crate::config::model::ConfigFile;
use crate::engine::OnBusy;
use crate::watch::SourceSet;

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - there is at least one pipeline
/// - every pipeline has at least one include pattern
/// - all glob patterns compile
/// - pipelines write to distinct destinations (no cross-class overlap)
/// - `[watch].on_busy` is valid ("queue" or "drop")
/// - the server port is nonzero
///
/// It does **not** check that external commands exist; a missing tool
/// surfaces as a per-file transform failure at run time.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    ensure_has_pipelines(cfg)?;
    validate_globs(cfg)?;
    validate_output_locations(cfg)?;
    validate_watch_section(cfg)?;
    validate_server_section(cfg)?;
    Ok(())
}

fn ensure_has_pipelines(cfg: &ConfigFile) -> Result<()> {
    if cfg.pipeline.is_empty() {
        return Err(anyhow!(
            "config must contain at least one [pipeline.<name>] section"
        ));
    }

    for (name, pipeline) in cfg.pipeline.iter() {
        if pipeline.src.is_empty() {
            return Err(anyhow!(
                "pipeline '{}' must have at least one `src` pattern",
                name
            ));
        }
    }

    Ok(())
}

fn validate_globs(cfg: &ConfigFile) -> Result<()> {
    for (name, pipeline) in cfg.pipeline.iter() {
        SourceSet::new(&pipeline.src, &pipeline.exclude)
            .with_context(|| format!("compiling glob patterns for pipeline '{}'", name))?;
    }
    Ok(())
}

/// Each pipeline owns its destination directory; two pipelines writing to the
/// same place would let one artifact class clobber another.
fn validate_output_locations(cfg: &ConfigFile) -> Result<()> {
    let mut seen: HashMap<&str, &str> = HashMap::new();

    for (name, pipeline) in cfg.pipeline.iter() {
        if let Some(other) = seen.insert(pipeline.dest.as_str(), name.as_str()) {
            return Err(anyhow!(
                "pipelines '{}' and '{}' share the destination '{}'",
                other,
                name,
                pipeline.dest
            ));
        }
    }

    Ok(())
}

fn validate_watch_section(cfg: &ConfigFile) -> Result<()> {
    OnBusy::from_str(&cfg.watch.on_busy)
        .map_err(|e| anyhow!(e))
        .context("invalid [watch].on_busy")?;
    Ok(())
}

fn validate_server_section(cfg: &ConfigFile) -> Result<()> {
    if cfg.server.port == 0 {
        return Err(anyhow!("[server].port must be nonzero"));
    }
    Ok(())
}
