#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use sitepipe::task::{Task, TaskOutcome, TaskResult};

/// Task that records start/end markers into a shared log, optionally
/// sleeping in between, and finishes with a fixed outcome.
pub struct StepTask {
    name: String,
    log: Arc<Mutex<Vec<String>>>,
    delay: Duration,
    outcome: TaskOutcome,
}

impl StepTask {
    pub fn new(name: &str, log: Arc<Mutex<Vec<String>>>, delay: Duration) -> Arc<dyn Task> {
        Arc::new(Self {
            name: name.to_string(),
            log,
            delay,
            outcome: TaskOutcome::Success,
        })
    }

    pub fn failing(
        name: &str,
        log: Arc<Mutex<Vec<String>>>,
        delay: Duration,
        failures: usize,
    ) -> Arc<dyn Task> {
        Arc::new(Self {
            name: name.to_string(),
            log,
            delay,
            outcome: TaskOutcome::Failed { failures },
        })
    }
}

#[async_trait]
impl Task for StepTask {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> TaskResult {
        self.log.lock().unwrap().push(format!("{} start", self.name));
        tokio::time::sleep(self.delay).await;
        self.log.lock().unwrap().push(format!("{} end", self.name));
        Ok(self.outcome)
    }
}

/// Read back every file under `root` as a map of relative path -> content.
pub fn snapshot_tree(root: &std::path::Path) -> std::collections::BTreeMap<String, Vec<u8>> {
    let mut map = std::collections::BTreeMap::new();
    if !root.exists() {
        return map;
    }

    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir).unwrap() {
            let entry = entry.unwrap();
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let rel = path
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/");
                map.insert(rel, std::fs::read(&path).unwrap());
            }
        }
    }

    map
}
