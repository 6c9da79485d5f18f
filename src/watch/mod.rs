// src/watch/mod.rs

//! File matching and change detection.
//!
//! This module is responsible for:
//! - Compiling include/exclude glob patterns into [`SourceSet`]s and
//!   resolving them against the filesystem.
//! - Wiring up a cross-platform filesystem watcher (`notify`) with a
//!   debounce window.
//! - Content hashing to suppress triggers when watched files haven't
//!   actually changed.
//!
//! It does **not** know about tasks or composition; it only turns filesystem
//! changes into binding-level triggers.

pub mod hash;
pub mod patterns;
pub mod watcher;

pub use hash::ChangeCache;
pub use patterns::SourceSet;
pub use watcher::{matching_bindings, spawn_watcher, WatchProfile, WatcherHandle, WatcherOptions};
