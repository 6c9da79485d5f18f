// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

/// Top-level configuration as read from `Sitepipe.toml`.
///
/// Every section is optional; the defaults reproduce the conventional layout:
///
/// ```toml
/// [paths]
/// source = "src"
/// serve = "public"
/// dist = "dist"
///
/// [pipeline.pages]
/// src = ["ejs/**/*.ejs"]
/// exclude = ["ejs/**/_*.ejs"]
/// dest = ""
/// ext = "html"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// Root directories from `[paths]`.
    #[serde(default)]
    pub paths: PathsSection,

    /// Dev server settings from `[server]`.
    #[serde(default)]
    pub server: ServerSection,

    /// Watch scheduler settings from `[watch]`.
    #[serde(default)]
    pub watch: WatchSection,

    /// Source transforms from `[pipeline.<name>]`.
    ///
    /// Keys are the pipeline names (e.g. `"pages"`, `"styles"`). When the
    /// section is absent entirely, the built-in pages/styles/scripts trio is
    /// used; defining any `[pipeline.<name>]` replaces the whole set.
    #[serde(default = "default_pipelines")]
    pub pipeline: BTreeMap<String, PipelineConfig>,

    /// Production bundling settings from `[build]`.
    #[serde(default)]
    pub build: BuildSection,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            paths: PathsSection::default(),
            server: ServerSection::default(),
            watch: WatchSection::default(),
            pipeline: default_pipelines(),
            build: BuildSection::default(),
        }
    }
}

/// `[paths]` section: the three top-level roots.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    /// Source root, subdivided by artifact kind (templates, styles, ...).
    #[serde(default = "default_source")]
    pub source: String,

    /// Intermediate root: dev-mode output lands here and the dev server
    /// serves from it.
    #[serde(default = "default_serve")]
    pub serve: String,

    /// Production root for the final minified/optimized artifacts.
    #[serde(default = "default_dist")]
    pub dist: String,
}

fn default_source() -> String {
    "src".to_string()
}

fn default_serve() -> String {
    "public".to_string()
}

fn default_dist() -> String {
    "dist".to_string()
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            source: default_source(),
            serve: default_serve(),
            dist: default_dist(),
        }
    }
}

impl PathsSection {
    pub fn source_root(&self) -> PathBuf {
        PathBuf::from(&self.source)
    }

    pub fn serve_root(&self) -> PathBuf {
        PathBuf::from(&self.serve)
    }

    pub fn dist_root(&self) -> PathBuf {
        PathBuf::from(&self.dist)
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    /// Port for the dev server. Binding failure is fatal.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

/// `[watch]` section.
///
/// Controls what the watch scheduler does with filesystem triggers that
/// arrive while a bound task is already running, and how bursts of events
/// are coalesced.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// `"queue"` or `"drop"`.
    ///
    /// - `"queue"` (default): remember at most one pending rerun and start it
    ///   when the in-flight run completes.
    /// - `"drop"`: ignore triggers while the bound task is running.
    #[serde(default = "default_on_busy")]
    pub on_busy: String,

    /// Quiet window in milliseconds before a burst of filesystem events is
    /// turned into triggers.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Skip triggers whose changed files hash identically to the last
    /// observed content (suppresses spurious editor events).
    #[serde(default = "default_use_hash")]
    pub use_hash: bool,
}

fn default_on_busy() -> String {
    "queue".to_string()
}

fn default_debounce_ms() -> u64 {
    150
}

fn default_use_hash() -> bool {
    true
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            on_busy: default_on_busy(),
            debounce_ms: default_debounce_ms(),
            use_hash: default_use_hash(),
        }
    }
}

/// How the rebuild and the browser reload are composed in a watch binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadMode {
    /// Reload after the rebuild completes.
    #[default]
    Series,
    /// Reload concurrently with the rebuild.
    Parallel,
}

/// `[pipeline.<name>]` section: one source transform.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Directory under the source root the patterns are anchored to. Output
    /// paths preserve structure relative to this base, so `ejs/sub/a.ejs`
    /// with base `"ejs"` lands at `sub/a.html`.
    #[serde(default)]
    pub base: String,

    /// Include glob patterns, relative to the base.
    pub src: Vec<String>,

    /// Exclude glob patterns, evaluated after the includes. A file matching
    /// both is excluded (this is how `_partial` files are kept out of direct
    /// compilation).
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Destination directory relative to the serve root; `""` is the serve
    /// root itself.
    #[serde(default)]
    pub dest: String,

    /// External command the file content is piped through (stdin to stdout).
    ///
    /// When absent the file is copied unchanged, which keeps `dev` usable
    /// without any external tooling installed.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Output extension rename, without the dot (e.g. `"html"`).
    #[serde(default)]
    pub ext: Option<String>,

    /// Whether the watch binding reloads the browser in series with or in
    /// parallel to the rebuild.
    #[serde(default)]
    pub reload: ReloadMode,
}

/// `[build]` section: commands for the production bundling path.
///
/// Each command is optional; absence means copy-through, so `build` degrades
/// to a plain copy when an optimizer is not installed.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct BuildSection {
    /// Script minifier (stdin to stdout), e.g. `"terser --compress --mangle"`.
    #[serde(default)]
    pub minify_cmd: Option<String>,

    /// Raster image optimizer (stdin to stdout).
    #[serde(default)]
    pub image_cmd: Option<String>,

    /// SVG optimizer (stdin to stdout).
    #[serde(default)]
    pub svg_cmd: Option<String>,

    /// Raster-to-webp converter (stdin to stdout).
    #[serde(default)]
    pub webp_cmd: Option<String>,
}

/// The built-in pages/styles/scripts pipelines, mirroring the conventional
/// src/ejs + src/scss + src/ts layout.
fn default_pipelines() -> BTreeMap<String, PipelineConfig> {
    let mut map = BTreeMap::new();

    map.insert(
        "pages".to_string(),
        PipelineConfig {
            base: "ejs".to_string(),
            src: vec!["**/*.ejs".to_string()],
            exclude: vec!["**/_*.ejs".to_string()],
            dest: String::new(),
            cmd: None,
            ext: Some("html".to_string()),
            reload: ReloadMode::Series,
        },
    );

    map.insert(
        "styles".to_string(),
        PipelineConfig {
            base: "scss".to_string(),
            src: vec!["**/*.scss".to_string()],
            exclude: vec!["**/_*.scss".to_string()],
            dest: "css".to_string(),
            cmd: None,
            ext: Some("css".to_string()),
            reload: ReloadMode::Parallel,
        },
    );

    map.insert(
        "scripts".to_string(),
        PipelineConfig {
            base: "ts".to_string(),
            src: vec!["**/*.ts".to_string()],
            exclude: vec!["**/_*.ts".to_string()],
            dest: "js".to_string(),
            cmd: None,
            ext: Some("js".to_string()),
            reload: ReloadMode::Series,
        },
    );

    map
}
