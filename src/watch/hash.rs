// src/watch/hash.rs

//! Content hashing for change suppression.
//!
//! Editors and some platforms fire filesystem events without the file content
//! actually changing. The watcher keeps a [`ChangeCache`] and only forwards a
//! trigger when at least one of the affected files hashes differently from
//! the last observed content.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

/// Compute a content hash for a single file.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();

    let mut file =
        File::open(path).with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

/// In-memory map of the last observed content hash per path.
#[derive(Debug, Default)]
pub struct ChangeCache {
    hashes: HashMap<PathBuf, String>,
}

impl ChangeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the file's content differs from the last observation
    /// (or has not been observed before), updating the cache.
    ///
    /// Unreadable or deleted files are treated as changed; the cache entry is
    /// dropped so a later recreation is seen as a change too.
    pub fn is_changed(&mut self, path: &Path) -> bool {
        match hash_file(path) {
            Ok(hash) => {
                let prev = self.hashes.insert(path.to_path_buf(), hash.clone());
                let changed = prev.as_deref() != Some(hash.as_str());
                if !changed {
                    debug!(path = ?path, "content hash unchanged");
                }
                changed
            }
            Err(_) => {
                self.hashes.remove(path);
                true
            }
        }
    }
}
