use std::error::Error;
use std::fs;

use sitepipe::watch::ChangeCache;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn unchanged_content_is_reported_only_once() -> TestResult {
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("main.scss");
    fs::write(&file, "body { color: red }")?;

    let mut cache = ChangeCache::new();

    // First observation counts as a change; an identical rewrite does not.
    assert!(cache.is_changed(&file));
    fs::write(&file, "body { color: red }")?;
    assert!(!cache.is_changed(&file));

    fs::write(&file, "body { color: blue }")?;
    assert!(cache.is_changed(&file));
    Ok(())
}

#[test]
fn deleted_then_recreated_file_counts_as_changed() -> TestResult {
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("app.ts");
    fs::write(&file, "console.log('hi')")?;

    let mut cache = ChangeCache::new();
    assert!(cache.is_changed(&file));

    fs::remove_file(&file)?;
    assert!(cache.is_changed(&file));

    // Recreation with the old content is still a change: the cache entry was
    // dropped when the file went away.
    fs::write(&file, "console.log('hi')")?;
    assert!(cache.is_changed(&file));
    Ok(())
}
