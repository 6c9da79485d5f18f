// src/errors.rs

//! Crate-wide error types.
//!
//! The transform layer uses a structured error so per-file failures can be
//! collected into a batch report; everything above that uses `anyhow`.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single file inside a transform batch.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("writing {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("spawning `{cmd}`: {source}")]
    Spawn {
        cmd: String,
        #[source]
        source: std::io::Error,
    },

    #[error("running `{cmd}`: {source}")]
    Io {
        cmd: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{cmd}` exited with status {}: {stderr}", display_code(*code))]
    CommandFailed {
        cmd: String,
        /// `None` when the process was terminated by a signal.
        code: Option<i32>,
        stderr: String,
    },
}

fn display_code(code: Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    }
}
