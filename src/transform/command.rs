// src/transform/command.rs

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::errors::TransformError;
use crate::transform::Transform;

/// Transform that pipes file content through an external shell command,
/// stdin to stdout.
///
/// This is how the heavy lifting (sass, tsc, terser, image codecs) is
/// delegated: the command line is configuration, the exchange format is
/// bytes.
#[derive(Debug, Clone)]
pub struct CommandTransform {
    cmd: String,
}

impl CommandTransform {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self { cmd: cmd.into() }
    }
}

#[async_trait]
impl Transform for CommandTransform {
    async fn apply(&self, source: &Path, input: Vec<u8>) -> Result<Vec<u8>, TransformError> {
        debug!(cmd = %self.cmd, source = ?source, "piping file through command");

        // Build a shell command appropriate for the platform.
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        };

        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| TransformError::Spawn {
            cmd: self.cmd.clone(),
            source,
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&input)
                .await
                .map_err(|source| TransformError::Io {
                    cmd: self.cmd.clone(),
                    source,
                })?;
            // Dropping stdin closes the pipe so the tool sees EOF.
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| TransformError::Io {
                cmd: self.cmd.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(TransformError::CommandFailed {
                cmd: self.cmd.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}
