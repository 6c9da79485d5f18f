// src/engine/runtime.rs

use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::task::{Task, TaskOutcome};
use crate::watch::SourceSet;

/// Policy for a trigger that arrives while the bound task is already running.
///
/// - `Queue` (default): remember at most one pending rerun, coalescing any
///   number of triggers into it, and start it when the in-flight run
///   completes.
/// - `Drop`: ignore the trigger entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnBusy {
    #[default]
    Queue,
    Drop,
}

impl FromStr for OnBusy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queue" => Ok(OnBusy::Queue),
            "drop" => Ok(OnBusy::Drop),
            other => Err(format!(
                "invalid on_busy: {other} (expected \"queue\" or \"drop\")"
            )),
        }
    }
}

/// Maps a source set to the task executed when a matching file changes.
pub struct WatchBinding {
    pub sources: SourceSet,
    pub task: Arc<dyn Task>,
}

/// Events sent into the runtime from the watcher, finished task runs, or
/// external signals.
#[derive(Debug, Clone, Copy)]
pub enum RuntimeEvent {
    /// A file matching the binding's source set changed.
    BindingTriggered { binding: usize },
    /// The binding's in-flight task run finished.
    BindingFinished {
        binding: usize,
        outcome: TaskOutcome,
    },
    ShutdownRequested,
}

/// Per-binding state: Idle -> (trigger) -> Triggered -> (completion) -> Idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BindingState {
    Idle,
    Triggered,
}

struct BindingSlot {
    binding: WatchBinding,
    state: BindingState,
    /// A trigger arrived while Triggered and the policy is Queue; exactly one
    /// rerun is pending regardless of how many triggers coalesced into it.
    pending: bool,
}

/// The watch scheduler event loop.
///
/// Responsibilities:
/// - Consume `RuntimeEvent`s from the watcher and fired-off task runs.
/// - Apply the on-busy policy per binding.
/// - Execute each binding's task, one run in flight per binding at a time.
pub struct Runtime {
    slots: Vec<BindingSlot>,
    on_busy: OnBusy,

    events_rx: mpsc::Receiver<RuntimeEvent>,
    /// Cloned into spawned task runs so they can report completion.
    events_tx: mpsc::Sender<RuntimeEvent>,
}

impl Runtime {
    pub fn new(
        bindings: Vec<WatchBinding>,
        on_busy: OnBusy,
        events_rx: mpsc::Receiver<RuntimeEvent>,
        events_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Self {
        let slots = bindings
            .into_iter()
            .map(|binding| BindingSlot {
                binding,
                state: BindingState::Idle,
                pending: false,
            })
            .collect();

        Self {
            slots,
            on_busy,
            events_rx,
            events_tx,
        }
    }

    /// Main event loop. Runs until shutdown is requested or every sender is
    /// gone.
    pub async fn run(mut self) -> Result<()> {
        info!(bindings = self.slots.len(), "watch scheduler started");

        while let Some(event) = self.events_rx.recv().await {
            debug!(?event, "runtime received event");

            match event {
                RuntimeEvent::BindingTriggered { binding } => self.handle_trigger(binding),
                RuntimeEvent::BindingFinished { binding, outcome } => {
                    self.handle_finished(binding, outcome)
                }
                RuntimeEvent::ShutdownRequested => {
                    info!("shutdown requested, stopping watch scheduler");
                    break;
                }
            }
        }

        info!("watch scheduler exiting");
        Ok(())
    }

    fn handle_trigger(&mut self, index: usize) {
        let Some(slot) = self.slots.get_mut(index) else {
            warn!(binding = index, "trigger for unknown binding; ignoring");
            return;
        };

        match slot.state {
            BindingState::Idle => {
                slot.state = BindingState::Triggered;
                Self::spawn_run(index, &slot.binding, self.events_tx.clone());
            }
            BindingState::Triggered => match self.on_busy {
                OnBusy::Queue => {
                    slot.pending = true;
                    debug!(
                        task = %slot.binding.task.name(),
                        "trigger while running; rerun queued"
                    );
                }
                OnBusy::Drop => {
                    debug!(
                        task = %slot.binding.task.name(),
                        "trigger while running; dropped"
                    );
                }
            },
        }
    }

    fn handle_finished(&mut self, index: usize, outcome: TaskOutcome) {
        let Some(slot) = self.slots.get_mut(index) else {
            warn!(binding = index, "completion for unknown binding; ignoring");
            return;
        };

        match outcome {
            TaskOutcome::Success => {
                info!(task = %slot.binding.task.name(), "bound task completed")
            }
            TaskOutcome::Failed { failures } => {
                warn!(
                    task = %slot.binding.task.name(),
                    failures,
                    "bound task completed with failures"
                );
            }
        }

        if slot.pending {
            slot.pending = false;
            debug!(task = %slot.binding.task.name(), "starting queued rerun");
            Self::spawn_run(index, &slot.binding, self.events_tx.clone());
        } else {
            slot.state = BindingState::Idle;
        }
    }

    /// Fire off one execution of the binding's task. The run reports back via
    /// `BindingFinished`; a fatal task error is contained here so the watch
    /// loop survives (it is logged and counted as one failure).
    fn spawn_run(index: usize, binding: &WatchBinding, events_tx: mpsc::Sender<RuntimeEvent>) {
        let task = Arc::clone(&binding.task);

        tokio::spawn(async move {
            info!(task = %task.name(), "watch trigger: executing bound task");

            let outcome = match task.execute().await {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(task = %task.name(), error = %err, "bound task errored");
                    TaskOutcome::Failed { failures: 1 }
                }
            };

            if events_tx
                .send(RuntimeEvent::BindingFinished {
                    binding: index,
                    outcome,
                })
                .await
                .is_err()
            {
                debug!("runtime gone before completion could be reported");
            }
        });
    }
}
