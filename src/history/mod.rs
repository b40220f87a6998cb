//! # Run History Module
//!
//! Tracks target executions per project: exit codes, durations and a simple
//! performance-regression check against the rolling average of prior
//! successful runs.
//!
//! ## Storage
//!
//! History is stored in XDG-compliant locations:
//! - Linux: `~/.local/share/makescope/history/`
//! - macOS: `~/Library/Application Support/makescope/history/`
//! - Windows: `%APPDATA%\makescope\history\`
//!
//! Each project has its own history file, keyed by a hash of the project
//! path. Only the most recent runs per target are retained.

mod storage;

pub use storage::{
    HistoryStore, ProjectHistory, RunRecord, TargetHistory, MAX_RUNS_PER_TARGET,
};
