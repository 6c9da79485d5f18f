use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use sitepipe::config::model::ConfigFile;
use sitepipe::notifier::{LogNotifier, Notifier};
use sitepipe::pipeline::{build_graph, PipelineGraph};
use sitepipe::serve::ReloadHub;
use sitepipe::watch::{matching_bindings, WatchProfile};

type TestResult = Result<(), Box<dyn Error>>;

/// Graph + profiles the way the dev entrypoint wires them, with the source
/// root placed at an absolute path outside the cwd.
fn absolute_root_fixture(dir: &Path) -> anyhow::Result<(ConfigFile, PipelineGraph)> {
    let mut cfg = ConfigFile::default();
    cfg.paths.source = dir.join("src").to_string_lossy().into_owned();
    cfg.paths.serve = dir.join("public").to_string_lossy().into_owned();
    cfg.paths.dist = dir.join("dist").to_string_lossy().into_owned();

    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
    let graph = build_graph(&cfg, notifier, ReloadHub::new())?;
    Ok((cfg, graph))
}

fn profiles_for(graph: &PipelineGraph) -> Vec<WatchProfile> {
    graph
        .bindings
        .iter()
        .enumerate()
        .map(|(index, binding)| WatchProfile {
            binding: index,
            sources: binding.sources.clone(),
        })
        .collect()
}

#[test]
fn bindings_trigger_for_changes_under_an_absolute_source_root() -> TestResult {
    let dir = tempfile::tempdir()?;
    let (cfg, graph) = absolute_root_fixture(dir.path())?;
    let root = cfg.paths.source_root();
    let profiles = profiles_for(&graph);

    // The watcher observes the source root and hands over absolute event
    // paths; each must land on exactly its own binding.
    let hit = matching_bindings(&root, &profiles, &root.join("ejs/index.ejs"));
    assert_eq!(hit.len(), 1);
    assert_eq!(graph.bindings[hit[0]].task.name(), "pages+reload");

    let hit = matching_bindings(&root, &profiles, &root.join("scss/main.scss"));
    assert_eq!(hit.len(), 1);
    assert_eq!(graph.bindings[hit[0]].task.name(), "styles+reload");

    let hit = matching_bindings(&root, &profiles, &root.join("ts/sub/app.ts"));
    assert_eq!(hit.len(), 1);
    assert_eq!(graph.bindings[hit[0]].task.name(), "scripts+reload");
    Ok(())
}

#[test]
fn partials_and_foreign_paths_trigger_nothing() -> TestResult {
    let dir = tempfile::tempdir()?;
    let (cfg, graph) = absolute_root_fixture(dir.path())?;
    let root = cfg.paths.source_root();
    let profiles = profiles_for(&graph);

    assert!(matching_bindings(&root, &profiles, &root.join("ejs/_layout.ejs")).is_empty());
    assert!(matching_bindings(&root, &profiles, &root.join("notes.txt")).is_empty());

    // Paths outside the watched root never trigger a binding.
    assert!(matching_bindings(&root, &profiles, dir.path()).is_empty());
    assert!(matching_bindings(&root, &profiles, Path::new("/etc/hosts")).is_empty());
    Ok(())
}

#[test]
fn binding_patterns_are_source_root_relative() -> TestResult {
    let dir = tempfile::tempdir()?;
    let (_, graph) = absolute_root_fixture(dir.path())?;

    // Binding patterns carry only the base prefix, not the configured root,
    // so matching works however the root is spelled.
    let pages = graph
        .bindings
        .iter()
        .find(|b| b.task.name() == "pages+reload")
        .expect("pages binding present");
    assert!(pages.sources.matches("ejs/index.ejs"));
    assert!(!pages.sources.matches("ejs/_layout.ejs"));
    Ok(())
}
