// src/watch/patterns.rs

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// An ordered set of include glob patterns with optional exclusions.
///
/// Exclusions are evaluated after inclusions: a path matching both is
/// excluded. Patterns are matched against paths relative to some root
/// directory, with forward slashes (e.g. `"ejs/index.ejs"`).
#[derive(Clone)]
pub struct SourceSet {
    include: Vec<String>,
    include_set: GlobSet,
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for SourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSet")
            .field("include", &self.include)
            .finish_non_exhaustive()
    }
}

impl SourceSet {
    /// Compile include and exclude patterns into a `SourceSet`.
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        let include_set = build_globset(include).context("building include globset")?;

        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude).context("building exclude globset")?)
        };

        Ok(Self {
            include: include.to_vec(),
            include_set,
            exclude_set,
        })
    }

    /// The raw include patterns this set was built from.
    pub fn include_patterns(&self) -> &[String] {
        &self.include
    }

    /// Returns true if the given root-relative path is selected by this set,
    /// i.e. it matches an include pattern and no exclude pattern.
    pub fn matches(&self, rel: impl AsRef<Path>) -> bool {
        let rel = rel.as_ref();
        if !self.include_set.is_match(rel) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel) {
                return false;
            }
        }
        true
    }

    /// Enumerate the files under `root` selected by this set.
    ///
    /// Returns paths relative to `root`, sorted for stable processing order.
    /// A missing root yields an empty set (nothing to build yet).
    pub fn resolve(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        walk_files(root, root, &mut |rel| {
            if self.matches(rel) {
                files.push(rel.to_path_buf());
            }
        })
        .with_context(|| format!("walking source tree at {:?}", root))?;

        files.sort();
        Ok(files)
    }
}

/// Recursively visit every regular file under `dir`, calling `f` with the
/// path relative to `root`. Symlinks are skipped.
fn walk_files(root: &Path, dir: &Path, f: &mut impl FnMut(&Path)) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let path = entry.path();

        if file_type.is_dir() {
            walk_files(root, &path, f)?;
        } else if file_type.is_file() {
            if let Ok(rel) = path.strip_prefix(root) {
                f(rel);
            }
        }
    }
    Ok(())
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
