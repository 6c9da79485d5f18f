mod common;

use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::StepTask;
use sitepipe::task::{parallel, series, TaskOutcome};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn series_runs_members_in_listed_order() -> TestResult {
    let log = Arc::new(Mutex::new(Vec::new()));
    // First member is slower than the second; order must still hold.
    let a = StepTask::new("a", Arc::clone(&log), Duration::from_millis(40));
    let b = StepTask::new("b", Arc::clone(&log), Duration::from_millis(5));

    let outcome = series("pair", vec![a, b]).execute().await?;

    assert!(outcome.is_success());
    let events = log.lock().unwrap().clone();
    assert_eq!(events, vec!["a start", "a end", "b start", "b end"]);
    Ok(())
}

#[tokio::test]
async fn parallel_waits_for_every_member() -> TestResult {
    for (fast, slow) in [("a", "b"), ("b", "a")] {
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = StepTask::new(fast, Arc::clone(&log), Duration::from_millis(5));
        let second = StepTask::new(slow, Arc::clone(&log), Duration::from_millis(50));

        let outcome = parallel("both", vec![first, second]).execute().await?;

        assert!(outcome.is_success());
        let events = log.lock().unwrap().clone();
        assert!(events.contains(&format!("{fast} end")));
        assert!(events.contains(&format!("{slow} end")));
    }
    Ok(())
}

#[tokio::test]
async fn series_continues_past_contained_failure() -> TestResult {
    let log = Arc::new(Mutex::new(Vec::new()));
    let a = StepTask::failing("a", Arc::clone(&log), Duration::from_millis(1), 2);
    let b = StepTask::new("b", Arc::clone(&log), Duration::from_millis(1));

    let outcome = series("pair", vec![a, b]).execute().await?;

    assert_eq!(outcome, TaskOutcome::Failed { failures: 2 });
    let events = log.lock().unwrap().clone();
    assert!(events.contains(&"b end".to_string()));
    Ok(())
}

#[tokio::test]
async fn parallel_aggregates_failures_across_members() -> TestResult {
    let log = Arc::new(Mutex::new(Vec::new()));
    let a = StepTask::failing("a", Arc::clone(&log), Duration::from_millis(1), 1);
    let b = StepTask::failing("b", Arc::clone(&log), Duration::from_millis(1), 2);
    let c = StepTask::new("c", Arc::clone(&log), Duration::from_millis(1));

    let outcome = parallel("all", vec![a, b, c]).execute().await?;

    assert_eq!(outcome, TaskOutcome::Failed { failures: 3 });
    Ok(())
}

#[tokio::test]
async fn nested_series_starts_after_parallel_stage_drains() -> TestResult {
    let log = Arc::new(Mutex::new(Vec::new()));
    let a = StepTask::new("a", Arc::clone(&log), Duration::from_millis(40));
    let b = StepTask::new("b", Arc::clone(&log), Duration::from_millis(5));
    let c = StepTask::new("c", Arc::clone(&log), Duration::from_millis(1));

    let graph = series("build", vec![parallel("stage", vec![a, b]), c]);
    let outcome = graph.execute().await?;

    assert!(outcome.is_success());
    let events = log.lock().unwrap().clone();
    let c_start = events.iter().position(|e| e == "c start").unwrap();
    let a_end = events.iter().position(|e| e == "a end").unwrap();
    let b_end = events.iter().position(|e| e == "b end").unwrap();
    assert!(c_start > a_end);
    assert!(c_start > b_end);
    Ok(())
}
