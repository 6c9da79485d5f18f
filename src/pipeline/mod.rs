// src/pipeline/mod.rs

//! Explicit construction of the task graph.
//!
//! The whole graph (one-shot build, clean, production build, webp
//! conversions, and the watch bindings) is built here as a plain value from
//! the loaded config and handed to the entrypoints, so it can be exercised in
//! isolation without any process-wide registry.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::config::model::{ConfigFile, ReloadMode};
use crate::engine::WatchBinding;
use crate::notifier::Notifier;
use crate::serve::ReloadHub;
use crate::task::actions::{ActionTask, CleanTask};
use crate::task::compose::{parallel, series};
use crate::task::{Task, TaskOutcome, TransformTask};
use crate::transform::{CommandTransform, CopyTransform, Transform, TransformAdapter};
use crate::watch::SourceSet;

/// Raster image extensions handled by the production/webp paths.
const RASTER_GLOB: &str = "**/*.{jpg,jpeg,png,gif}";

/// The fully wired task graph.
pub struct PipelineGraph {
    /// All source transforms, started together (the dev pipeline's one-shot
    /// build).
    pub build_once: Arc<dyn Task>,
    /// Delete generated output and the dist root.
    pub clean: Arc<dyn Task>,
    /// Production bundle: copy assets, minify scripts, optimize images.
    pub build: Arc<dyn Task>,
    /// Raster-to-webp conversion in place under the serve root.
    pub webp: Arc<dyn Task>,
    /// Raster-to-webp conversion in place under the dist root.
    pub webp_build: Arc<dyn Task>,
    /// Source set -> rebuild+reload composites installed by the dev pipeline.
    pub bindings: Vec<WatchBinding>,
}

/// Build the task graph from a validated config.
pub fn build_graph(
    cfg: &ConfigFile,
    notifier: Arc<dyn Notifier>,
    hub: ReloadHub,
) -> Result<PipelineGraph> {
    let source_root = cfg.paths.source_root();
    let serve_root = cfg.paths.serve_root();
    let dist_root = cfg.paths.dist_root();

    let reload = reload_task(hub);

    let mut transforms: Vec<Arc<dyn Task>> = Vec::new();
    let mut bindings = Vec::new();

    for (name, pc) in cfg.pipeline.iter() {
        let sources = SourceSet::new(&pc.src, &pc.exclude)?;

        let adapter = TransformAdapter::new(
            source_root.join(&pc.base),
            sources,
            serve_root.join(&pc.dest),
            pc.ext.clone(),
            transform_for(pc.cmd.as_deref()),
        );

        let task: Arc<dyn Task> =
            Arc::new(TransformTask::new(name.clone(), adapter, Arc::clone(&notifier)));
        transforms.push(Arc::clone(&task));

        // The watcher observes the source root and matches paths relative
        // to it, so the binding's patterns carry only the base prefix. The
        // source root itself may be absolute or outside the cwd.
        let watch_sources = SourceSet::new(
            &based(&pc.base, &pc.src),
            &based(&pc.base, &pc.exclude),
        )?;

        let rebuild_and_reload = match pc.reload {
            ReloadMode::Series => series(
                format!("{name}+reload"),
                vec![task, Arc::clone(&reload)],
            ),
            ReloadMode::Parallel => parallel(
                format!("{name}+reload"),
                vec![task, Arc::clone(&reload)],
            ),
        };

        bindings.push(WatchBinding {
            sources: watch_sources,
            task: rebuild_and_reload,
        });
    }

    let build_once = parallel("build-once", transforms);

    Ok(PipelineGraph {
        build_once,
        clean: clean_task(cfg, &serve_root, &dist_root)?,
        build: build_task(cfg, &serve_root, &dist_root, &notifier)?,
        webp: webp_task("webp", cfg, &serve_root, &notifier)?,
        webp_build: webp_task("webp-build", cfg, &dist_root, &notifier)?,
        bindings,
    })
}

/// Shift base-relative patterns to source-root-relative form for the
/// watcher (`**/*.ejs` with base `ejs` becomes `ejs/**/*.ejs`).
fn based(base: &str, patterns: &[String]) -> Vec<String> {
    if base.is_empty() {
        return patterns.to_vec();
    }
    patterns.iter().map(|p| format!("{base}/{p}")).collect()
}

fn transform_for(cmd: Option<&str>) -> Arc<dyn Transform> {
    match cmd {
        Some(cmd) => Arc::new(CommandTransform::new(cmd)),
        None => Arc::new(CopyTransform),
    }
}

fn reload_task(hub: ReloadHub) -> Arc<dyn Task> {
    Arc::new(ActionTask::new("reload", move || {
        let hub = hub.clone();
        async move {
            hub.broadcast();
            Ok(TaskOutcome::Success)
        }
    }))
}

/// Clean removes the dist root, each pipeline's destination directory under
/// the serve root, and, for pipelines writing into the serve root itself,
/// the files carrying their output extension.
fn clean_task(cfg: &ConfigFile, serve_root: &Path, dist_root: &Path) -> Result<Arc<dyn Task>> {
    let mut dirs = vec![dist_root.to_path_buf()];
    let mut file_patterns = Vec::new();

    for pc in cfg.pipeline.values() {
        if pc.dest.is_empty() {
            if let Some(ext) = &pc.ext {
                file_patterns.push(format!("**/*.{ext}"));
            }
        } else {
            dirs.push(serve_root.join(&pc.dest));
        }
    }

    let files = if file_patterns.is_empty() {
        None
    } else {
        Some((serve_root.to_path_buf(), SourceSet::new(&file_patterns, &[])?))
    };

    Ok(Arc::new(CleanTask::new("clean", dirs, files)))
}

/// Production bundle: copy everything except scripts and images, minify
/// scripts, then optimize raster and vector images, mirroring the dev
/// output tree under the dist root.
fn build_task(
    cfg: &ConfigFile,
    serve_root: &Path,
    dist_root: &Path,
    notifier: &Arc<dyn Notifier>,
) -> Result<Arc<dyn Task>> {
    let copy_assets: Arc<dyn Task> = Arc::new(TransformTask::new(
        "copy-assets",
        TransformAdapter::new(
            serve_root.to_path_buf(),
            SourceSet::new(
                &["**/*".to_string()],
                &[
                    "**/*.js".to_string(),
                    "**/*.{svg,jpg,jpeg,png,gif,webp}".to_string(),
                ],
            )?,
            dist_root.to_path_buf(),
            None,
            Arc::new(CopyTransform),
        ),
        Arc::clone(notifier),
    ));

    let minify_scripts: Arc<dyn Task> = Arc::new(TransformTask::new(
        "minify-scripts",
        TransformAdapter::new(
            serve_root.to_path_buf(),
            SourceSet::new(&["**/*.js".to_string()], &[])?,
            dist_root.to_path_buf(),
            None,
            transform_for(cfg.build.minify_cmd.as_deref()),
        ),
        Arc::clone(notifier),
    ));

    let optimize_raster: Arc<dyn Task> = Arc::new(TransformTask::new(
        "optimize-images",
        TransformAdapter::new(
            serve_root.to_path_buf(),
            SourceSet::new(&[RASTER_GLOB.to_string()], &[])?,
            dist_root.to_path_buf(),
            None,
            transform_for(cfg.build.image_cmd.as_deref()),
        ),
        Arc::clone(notifier),
    ));

    let optimize_svg: Arc<dyn Task> = Arc::new(TransformTask::new(
        "optimize-svg",
        TransformAdapter::new(
            serve_root.to_path_buf(),
            SourceSet::new(&["**/*.svg".to_string()], &[])?,
            dist_root.to_path_buf(),
            None,
            transform_for(cfg.build.svg_cmd.as_deref()),
        ),
        Arc::clone(notifier),
    ));

    Ok(series(
        "build",
        vec![
            parallel("bundle", vec![copy_assets, minify_scripts]),
            parallel("images", vec![optimize_raster, optimize_svg]),
        ],
    ))
}

/// In-place raster-to-webp conversion under `root`.
fn webp_task(
    name: &str,
    cfg: &ConfigFile,
    root: &Path,
    notifier: &Arc<dyn Notifier>,
) -> Result<Arc<dyn Task>> {
    Ok(Arc::new(TransformTask::new(
        name,
        TransformAdapter::new(
            root.to_path_buf(),
            SourceSet::new(&[RASTER_GLOB.to_string()], &[])?,
            root.to_path_buf(),
            Some("webp".to_string()),
            transform_for(cfg.build.webp_cmd.as_deref()),
        ),
        Arc::clone(notifier),
    )))
}
