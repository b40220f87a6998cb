//! # Run History Storage
//!
//! Handles persistent storage of target run history using XDG-compliant
//! paths.
//!
//! ## Storage Location
//!
//! ```text
//! ~/.local/share/makescope/history/
//! ├── <project-hash-1>.json
//! ├── <project-hash-2>.json
//! └── ...
//! ```
//!
//! Each project has its own JSON file, identified by a hash of the project
//! path. Per target only the most recent runs are retained; durations feed
//! the performance-regression check.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of runs retained per target.
pub const MAX_RUNS_PER_TARGET: usize = 20;

/// Minimum prior successful runs before regression detection kicks in.
const MIN_RUNS_FOR_REGRESSION: usize = 3;

/// A run is flagged as a regression when it exceeds the rolling average of
/// prior successful runs by this factor.
const REGRESSION_FACTOR: f64 = 1.5;

/// One recorded execution of a target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub exit_code: i32,
    pub success: bool,
    pub duration_ms: u64,
    pub finished_at: DateTime<Utc>,
}

/// Retained runs for one target, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetHistory {
    pub runs: Vec<RunRecord>,
}

impl TargetHistory {
    /// Append a run, trimming the oldest entries beyond the retention cap.
    pub fn push(&mut self, record: RunRecord) {
        self.runs.push(record);
        if self.runs.len() > MAX_RUNS_PER_TARGET {
            let excess = self.runs.len() - MAX_RUNS_PER_TARGET;
            self.runs.drain(..excess);
        }
    }

    /// Rolling average duration over successful runs, if any.
    pub fn average_duration_ms(&self) -> Option<f64> {
        let durations: Vec<u64> = self
            .runs
            .iter()
            .filter(|r| r.success)
            .map(|r| r.duration_ms)
            .collect();
        if durations.is_empty() {
            return None;
        }
        Some(durations.iter().sum::<u64>() as f64 / durations.len() as f64)
    }

    /// Whether a new duration would count as a performance regression
    /// against the current history.
    pub fn is_regression(&self, duration_ms: u64) -> bool {
        let successful = self.runs.iter().filter(|r| r.success).count();
        if successful < MIN_RUNS_FOR_REGRESSION {
            return false;
        }
        match self.average_duration_ms() {
            Some(avg) => duration_ms as f64 > avg * REGRESSION_FACTOR,
            None => false,
        }
    }

    pub fn last_run(&self) -> Option<&RunRecord> {
        self.runs.last()
    }
}

/// Run history for a specific project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectHistory {
    /// The absolute path to the project directory.
    pub project_path: PathBuf,
    /// Map of target name -> retained runs.
    pub targets: HashMap<String, TargetHistory>,
}

impl ProjectHistory {
    pub fn new(project_path: PathBuf) -> Self {
        Self {
            project_path,
            targets: HashMap::new(),
        }
    }
}

/// Manages run history with persistent storage.
#[derive(Debug)]
pub struct HistoryStore {
    project_path: PathBuf,
    storage_dir: PathBuf,
    history: ProjectHistory,
}

impl HistoryStore {
    /// Create a history store for a project, loading existing data if
    /// available.
    pub fn new(project_path: PathBuf) -> Result<Self> {
        let storage_dir = get_storage_dir()?;
        Self::with_storage_dir(project_path, storage_dir)
    }

    /// Create a history store with a custom storage directory.
    pub fn with_storage_dir(project_path: PathBuf, storage_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&storage_dir).with_context(|| {
            format!(
                "Failed to create history storage directory: {}",
                storage_dir.display()
            )
        })?;

        let history_file = get_history_file_path(&storage_dir, &project_path);
        let history = if history_file.exists() {
            load_history(&history_file)
                .unwrap_or_else(|_| ProjectHistory::new(project_path.clone()))
        } else {
            ProjectHistory::new(project_path.clone())
        };

        Ok(Self {
            project_path,
            storage_dir,
            history,
        })
    }

    /// Record a run and save to disk. Returns whether the run counts as a
    /// performance regression against the target's prior history.
    pub fn record(&mut self, target_name: &str, exit_code: i32, duration: Duration) -> Result<bool> {
        let duration_ms = duration.as_millis() as u64;
        let entry = self.history.targets.entry(target_name.to_string()).or_default();

        let regression = entry.is_regression(duration_ms);
        entry.push(RunRecord {
            exit_code,
            success: exit_code == 0,
            duration_ms,
            finished_at: Utc::now(),
        });

        self.save()?;
        Ok(regression)
    }

    /// History for one target, if any runs were recorded.
    pub fn target_history(&self, target_name: &str) -> Option<&TargetHistory> {
        self.history.targets.get(target_name)
    }

    pub fn has_history(&self) -> bool {
        !self.history.targets.is_empty()
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    fn save(&self) -> Result<()> {
        let history_file = get_history_file_path(&self.storage_dir, &self.project_path);
        let json = serde_json::to_string_pretty(&self.history)
            .context("Failed to serialize run history")?;

        fs::write(&history_file, json)
            .with_context(|| format!("Failed to write history file: {}", history_file.display()))?;

        Ok(())
    }
}

/// Get the XDG-compliant storage directory for history data.
fn get_storage_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("", "", "makescope")
        .context("Failed to determine application data directory")?;

    Ok(proj_dirs.data_dir().join("history"))
}

/// Generate a unique filename for a project based on its path.
fn get_history_file_path(storage_dir: &Path, project_path: &Path) -> PathBuf {
    let hash = simple_hash(project_path.to_string_lossy().as_ref());
    storage_dir.join(format!("{hash:016x}.json"))
}

/// Simple hash function for generating project file names.
fn simple_hash(s: &str) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

/// Load history data from a file.
fn load_history(path: &Path) -> Result<ProjectHistory> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read history file: {}", path.display()))?;

    let history: ProjectHistory = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse history file: {}", path.display()))?;

    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record_ms(duration_ms: u64) -> RunRecord {
        RunRecord {
            exit_code: 0,
            success: true,
            duration_ms,
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn test_target_history_push_and_trim() {
        let mut history = TargetHistory::default();
        for i in 0..(MAX_RUNS_PER_TARGET + 5) {
            history.push(record_ms(i as u64));
        }

        assert_eq!(history.runs.len(), MAX_RUNS_PER_TARGET);
        // The oldest entries were trimmed.
        assert_eq!(history.runs[0].duration_ms, 5);
    }

    #[test]
    fn test_average_duration_over_successful_runs_only() {
        let mut history = TargetHistory::default();
        history.push(record_ms(100));
        history.push(record_ms(200));
        history.push(RunRecord {
            exit_code: 2,
            success: false,
            duration_ms: 9000,
            finished_at: Utc::now(),
        });

        assert_eq!(history.average_duration_ms(), Some(150.0));
    }

    #[test]
    fn test_average_duration_none_without_successes() {
        let history = TargetHistory::default();
        assert!(history.average_duration_ms().is_none());
    }

    #[test]
    fn test_regression_requires_minimum_runs() {
        let mut history = TargetHistory::default();
        history.push(record_ms(100));
        history.push(record_ms(100));

        // Only two prior runs: never a regression.
        assert!(!history.is_regression(10_000));
    }

    #[test]
    fn test_regression_detection() {
        let mut history = TargetHistory::default();
        for _ in 0..4 {
            history.push(record_ms(100));
        }

        assert!(history.is_regression(200));
        assert!(!history.is_regression(120));
    }

    #[test]
    fn test_store_record_and_persist() {
        let temp_dir = TempDir::new().unwrap();
        let project_path = temp_dir.path().join("my-project");
        let storage_dir = temp_dir.path().join("storage");

        {
            let mut store =
                HistoryStore::with_storage_dir(project_path.clone(), storage_dir.clone()).unwrap();
            store.record("build", 0, Duration::from_millis(250)).unwrap();
            store.record("build", 1, Duration::from_millis(50)).unwrap();
        }

        {
            let store = HistoryStore::with_storage_dir(project_path, storage_dir).unwrap();
            assert!(store.has_history());

            let history = store.target_history("build").unwrap();
            assert_eq!(history.runs.len(), 2);
            assert!(history.runs[0].success);
            assert!(!history.runs[1].success);
            assert_eq!(history.last_run().unwrap().exit_code, 1);
        }
    }

    #[test]
    fn test_store_record_reports_regression() {
        let temp_dir = TempDir::new().unwrap();
        let project_path = temp_dir.path().to_path_buf();
        let storage_dir = temp_dir.path().join("storage");

        let mut store = HistoryStore::with_storage_dir(project_path, storage_dir).unwrap();
        for _ in 0..3 {
            assert!(!store.record("test", 0, Duration::from_millis(100)).unwrap());
        }

        assert!(store.record("test", 0, Duration::from_millis(500)).unwrap());
    }

    #[test]
    fn test_corrupted_history_file() {
        let temp_dir = TempDir::new().unwrap();
        let project_path = temp_dir.path().join("my-project");
        let storage_dir = temp_dir.path().join("storage");

        fs::create_dir_all(&storage_dir).unwrap();
        let history_file = get_history_file_path(&storage_dir, &project_path);
        fs::write(&history_file, "not valid json").unwrap();

        // Should gracefully handle corrupted file
        let store = HistoryStore::with_storage_dir(project_path, storage_dir).unwrap();
        assert!(!store.has_history());
    }

    #[test]
    fn test_simple_hash() {
        let hash1 = simple_hash("/home/user/project1");
        let hash2 = simple_hash("/home/user/project2");
        let hash3 = simple_hash("/home/user/project1");

        assert_ne!(hash1, hash2);
        assert_eq!(hash1, hash3);
    }
}
