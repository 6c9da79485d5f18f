// src/task/compose.rs

//! Series and parallel composition of tasks.
//!
//! Composites are tasks themselves, so composition can nest arbitrarily; the
//! task graph is fully determined by these calls and cannot contain cycles.

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::task::JoinSet;
use tracing::debug;

use crate::task::{Task, TaskOutcome, TaskResult};

/// Compose tasks into strict listed order: each member starts only after the
/// previous one has completed. A member's contained failures do not stop the
/// series; only fatal errors do.
pub fn series(name: impl Into<String>, members: Vec<Arc<dyn Task>>) -> Arc<dyn Task> {
    Arc::new(SeriesTask {
        name: name.into(),
        members,
    })
}

/// Compose tasks to start concurrently; the composite completes only once
/// every member has completed (a join barrier), whatever the finish order.
pub fn parallel(name: impl Into<String>, members: Vec<Arc<dyn Task>>) -> Arc<dyn Task> {
    Arc::new(ParallelTask {
        name: name.into(),
        members,
    })
}

struct SeriesTask {
    name: String,
    members: Vec<Arc<dyn Task>>,
}

#[async_trait]
impl Task for SeriesTask {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> TaskResult {
        let mut outcome = TaskOutcome::Success;

        for member in &self.members {
            debug!(series = %self.name, member = %member.name(), "starting member");
            let result = member.execute().await?;
            outcome = outcome.combine(result);
        }

        Ok(outcome)
    }
}

struct ParallelTask {
    name: String,
    members: Vec<Arc<dyn Task>>,
}

#[async_trait]
impl Task for ParallelTask {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> TaskResult {
        let mut set = JoinSet::new();

        for member in &self.members {
            let member = Arc::clone(member);
            set.spawn(async move { member.execute().await });
        }

        // Drain every member before returning so the barrier holds even when
        // one of them errors fatally.
        let mut outcome = TaskOutcome::Success;
        let mut fatal: Option<anyhow::Error> = None;

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(member_outcome)) => outcome = outcome.combine(member_outcome),
                Ok(Err(err)) => fatal = Some(fatal.unwrap_or(err)),
                Err(join_err) => {
                    fatal = Some(fatal.unwrap_or_else(|| anyhow!("joining member task: {join_err}")))
                }
            }
        }

        match fatal {
            Some(err) => Err(err),
            None => Ok(outcome),
        }
    }
}
