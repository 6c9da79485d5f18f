use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use sitepipe::errors::TransformError;
use sitepipe::notifier::Notifier;
use sitepipe::task::{Task, TaskOutcome, TransformTask};
use sitepipe::transform::{CopyTransform, Transform, TransformAdapter};
use sitepipe::watch::SourceSet;

type TestResult = Result<(), Box<dyn Error>>;

/// Fails on any input containing the marker string, passes the rest through.
struct TrippingTransform;

#[async_trait]
impl Transform for TrippingTransform {
    async fn apply(&self, source: &Path, input: Vec<u8>) -> Result<Vec<u8>, TransformError> {
        if input.windows(4).any(|w| w == b"boom") {
            return Err(TransformError::CommandFailed {
                cmd: "tripping".to_string(),
                code: Some(1),
                stderr: format!("refused {}", source.display()),
            });
        }
        Ok(input)
    }
}

struct CountingNotifier {
    calls: AtomicUsize,
}

impl Notifier for CountingNotifier {
    fn notify(&self, _title: &str, _message: &str) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn one_bad_file_does_not_block_the_rest_of_the_batch() -> TestResult {
    let dir = tempfile::tempdir()?;
    let src = dir.path().join("src");
    let dest = dir.path().join("out");
    fs::create_dir_all(&src)?;
    fs::write(src.join("one.txt"), "fine")?;
    fs::write(src.join("two.txt"), "boom")?;
    fs::write(src.join("three.txt"), "also fine")?;

    let adapter = TransformAdapter::new(
        &src,
        SourceSet::new(&["**/*.txt".to_string()], &[])?,
        &dest,
        None,
        Arc::new(TrippingTransform),
    );

    let report = adapter.run().await?;

    assert_eq!(report.written.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, src.join("two.txt"));
    assert_eq!(fs::read_to_string(dest.join("one.txt"))?, "fine");
    assert_eq!(fs::read_to_string(dest.join("three.txt"))?, "also fine");
    assert!(!dest.join("two.txt").exists());
    Ok(())
}

#[tokio::test]
async fn task_reports_each_failure_through_the_notifier() -> TestResult {
    let dir = tempfile::tempdir()?;
    let src = dir.path().join("src");
    let dest = dir.path().join("out");
    fs::create_dir_all(&src)?;
    fs::write(src.join("a.txt"), "boom")?;
    fs::write(src.join("b.txt"), "boom")?;
    fs::write(src.join("c.txt"), "ok")?;

    let adapter = TransformAdapter::new(
        &src,
        SourceSet::new(&["**/*.txt".to_string()], &[])?,
        &dest,
        None,
        Arc::new(TrippingTransform),
    );
    let notifier = Arc::new(CountingNotifier {
        calls: AtomicUsize::new(0),
    });
    let task = TransformTask::new("texts", adapter, Arc::clone(&notifier) as _);

    let outcome = task.execute().await?;

    assert_eq!(outcome, TaskOutcome::Failed { failures: 2 });
    assert_eq!(notifier.calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn partials_are_excluded_and_outputs_keep_structure() -> TestResult {
    let dir = tempfile::tempdir()?;
    let src = dir.path().join("ejs");
    let dest = dir.path().join("public");
    fs::create_dir_all(src.join("blog"))?;
    fs::write(src.join("index.ejs"), "<p>home</p>")?;
    fs::write(src.join("_layout.ejs"), "<p>layout</p>")?;
    fs::write(src.join("blog/post.ejs"), "<p>post</p>")?;

    let adapter = TransformAdapter::new(
        &src,
        SourceSet::new(
            &["**/*.ejs".to_string()],
            &["**/_*.ejs".to_string()],
        )?,
        &dest,
        Some("html".to_string()),
        Arc::new(CopyTransform),
    );

    let report = adapter.run().await?;

    assert!(report.failures.is_empty());
    assert!(dest.join("index.html").exists());
    assert!(dest.join("blog/post.html").exists());
    assert!(!dest.join("_layout.html").exists());
    assert!(!dest.join("_layout.ejs").exists());
    Ok(())
}

#[test]
fn desktop_notifier_degrades_cleanly_without_a_desktop_session() {
    use sitepipe::notifier::{DesktopNotifier, FAILURE_MESSAGE, FAILURE_TITLE};

    // On a headless runner there is no notification daemon to reach; the
    // call must come back without panicking or hanging, falling through to
    // the log.
    DesktopNotifier.notify(FAILURE_TITLE, FAILURE_MESSAGE);
}

#[cfg(unix)]
mod shell {
    use super::*;
    use sitepipe::transform::CommandTransform;

    #[tokio::test]
    async fn command_transform_pipes_stdin_to_stdout() -> TestResult {
        let transform = CommandTransform::new("tr 'a-z' 'A-Z'");

        let out = transform
            .apply(Path::new("sample.txt"), b"hello".to_vec())
            .await?;

        assert_eq!(out, b"HELLO");
        Ok(())
    }

    #[tokio::test]
    async fn command_transform_surfaces_nonzero_exit() -> TestResult {
        let transform = CommandTransform::new("echo oops >&2; exit 3");

        let err = transform
            .apply(Path::new("sample.txt"), Vec::new())
            .await
            .unwrap_err();

        match err {
            TransformError::CommandFailed { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert!(stderr.contains("oops"));
            }
            other => panic!("unexpected error: {other}"),
        }
        Ok(())
    }
}
