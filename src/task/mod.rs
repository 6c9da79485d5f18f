// src/task/mod.rs

//! Tasks and their composition.
//!
//! A [`Task`] is a named unit of work with an awaited completion: `execute`
//! resolves only once the underlying I/O has finished, so composite barriers
//! in [`compose`] wait on real completion rather than on a premature "done"
//! signal.
//!
//! Contained failures (single files failing to transform) are carried in
//! [`TaskOutcome`] and never abort composition; only process-level errors
//! (server bind, channel wiring) propagate as `Err`.

pub mod actions;
pub mod compose;

pub use actions::{ActionTask, CleanTask};
pub use compose::{parallel, series};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use crate::notifier::{Notifier, FAILURE_MESSAGE, FAILURE_TITLE};
use crate::transform::TransformAdapter;

/// Outcome of a task run whose failures were contained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    /// The task ran to completion but some files failed to transform.
    Failed { failures: usize },
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success)
    }

    pub fn failures(&self) -> usize {
        match self {
            TaskOutcome::Success => 0,
            TaskOutcome::Failed { failures } => *failures,
        }
    }

    /// Merge two outcomes, summing contained failures.
    pub fn combine(self, other: TaskOutcome) -> TaskOutcome {
        let failures = self.failures() + other.failures();
        if failures == 0 {
            TaskOutcome::Success
        } else {
            TaskOutcome::Failed { failures }
        }
    }
}

/// Result of executing a task: `Err` is reserved for fatal, process-level
/// errors; contained failures are reported through [`TaskOutcome`].
pub type TaskResult = anyhow::Result<TaskOutcome>;

/// A named unit of work.
///
/// Composites produced by [`compose::series`] and [`compose::parallel`] are
/// indistinguishable from leaves, so composition can nest freely.
#[async_trait]
pub trait Task: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(&self) -> TaskResult;
}

/// Leaf task that runs a [`TransformAdapter`] batch once.
///
/// Per-file failures are surfaced through the notifier and the log; the
/// batch itself never aborts, so one broken file doesn't take the dev loop
/// down with it.
pub struct TransformTask {
    name: String,
    adapter: TransformAdapter,
    notifier: Arc<dyn Notifier>,
}

impl TransformTask {
    pub fn new(
        name: impl Into<String>,
        adapter: TransformAdapter,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            name: name.into(),
            adapter,
            notifier,
        }
    }
}

#[async_trait]
impl Task for TransformTask {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> TaskResult {
        let report = self.adapter.run().await?;

        for (path, err) in &report.failures {
            error!(task = %self.name, path = ?path, error = %err, "transform failed");
            self.notifier.notify(FAILURE_TITLE, FAILURE_MESSAGE);
        }

        info!(
            task = %self.name,
            written = report.written.len(),
            failed = report.failures.len(),
            "transform batch finished"
        );

        if report.failures.is_empty() {
            Ok(TaskOutcome::Success)
        } else {
            Ok(TaskOutcome::Failed {
                failures: report.failures.len(),
            })
        }
    }
}
