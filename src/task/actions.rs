// src/task/actions.rs

//! Side-effecting leaf tasks: arbitrary actions and output deletion.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use crate::task::{Task, TaskOutcome, TaskResult};
use crate::watch::SourceSet;

type ActionFuture = Pin<Box<dyn Future<Output = TaskResult> + Send>>;

/// Leaf task wrapping an async closure (start server, broadcast reload, ...).
pub struct ActionTask {
    name: String,
    action: Box<dyn Fn() -> ActionFuture + Send + Sync>,
}

impl ActionTask {
    pub fn new<F, Fut>(name: impl Into<String>, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TaskResult> + Send + 'static,
    {
        Self {
            name: name.into(),
            action: Box::new(move || Box::pin(action())),
        }
    }
}

#[async_trait]
impl Task for ActionTask {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> TaskResult {
        (self.action)().await
    }
}

/// Leaf task that deletes generated output.
///
/// Deletion is fire-and-forget: failures are logged and never fail the task,
/// matching the error policy for clean steps.
pub struct CleanTask {
    name: String,
    /// Directories removed recursively.
    dirs: Vec<PathBuf>,
    /// Root + patterns for individual files to remove (e.g. built pages
    /// scattered through the serve root).
    files: Option<(PathBuf, SourceSet)>,
}

impl CleanTask {
    pub fn new(
        name: impl Into<String>,
        dirs: Vec<PathBuf>,
        files: Option<(PathBuf, SourceSet)>,
    ) -> Self {
        Self {
            name: name.into(),
            dirs,
            files,
        }
    }
}

#[async_trait]
impl Task for CleanTask {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> TaskResult {
        for dir in &self.dirs {
            match fs::remove_dir_all(dir).await {
                Ok(()) => debug!(task = %self.name, dir = ?dir, "removed directory"),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => warn!(task = %self.name, dir = ?dir, error = %err, "failed to remove directory"),
            }
        }

        if let Some((root, sources)) = &self.files {
            let matched = match sources.resolve(root) {
                Ok(m) => m,
                Err(err) => {
                    warn!(task = %self.name, root = ?root, error = %err, "failed to enumerate files to clean");
                    Vec::new()
                }
            };

            for rel in matched {
                let path = root.join(&rel);
                match fs::remove_file(&path).await {
                    Ok(()) => debug!(task = %self.name, path = ?path, "removed file"),
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                    Err(err) => warn!(task = %self.name, path = ?path, error = %err, "failed to remove file"),
                }
            }
        }

        Ok(TaskOutcome::Success)
    }
}
