// src/engine/mod.rs

//! Watch scheduler runtime.
//!
//! This module ties together:
//! - the watch bindings (source set -> task)
//! - the per-binding Idle/Triggered state machine
//! - the policy for triggers arriving while a bound task is running
//! - the main event loop that reacts to file-watch triggers, task
//!   completions, and shutdown signals

pub mod runtime;

pub use runtime::{OnBusy, Runtime, RuntimeEvent, WatchBinding};
