//! # Target Executor
//!
//! Runs a make target interactively with full terminal access. This is a
//! thin subprocess wrapper: it inherits stdin, stdout and stderr from the
//! parent process so that colored output and interactive tools inside
//! recipes keep working, and reports the exit code and wall-clock duration
//! back to the caller for history tracking.
//!
//! The command pattern is:
//!
//! ```bash
//! make --file <makefile> <target>
//! ```
//!
//! run from the Makefile's directory so relative paths in recipes resolve
//! correctly.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

/// Outcome of one target execution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOutcome {
    pub exit_code: i32,
    pub duration: Duration,
    pub success: bool,
}

/// Execute a make target interactively with inherited stdio.
pub fn execute_target(makefile_path: &Path, target_name: &str) -> Result<RunOutcome> {
    if !makefile_path.exists() {
        anyhow::bail!("Makefile not found: {}", makefile_path.display());
    }
    if !makefile_path.is_file() {
        anyhow::bail!("Path is not a file: {}", makefile_path.display());
    }
    if target_name.is_empty() {
        anyhow::bail!("Target name cannot be empty");
    }

    let dir = makefile_path.parent().with_context(|| {
        format!(
            "Failed to get parent directory of: {}",
            makefile_path.display()
        )
    })?;

    let started = Instant::now();
    let status = Command::new("make")
        .arg("--file")
        .arg(makefile_path)
        .arg(target_name)
        .current_dir(dir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| {
            format!(
                "Failed to execute target '{}' from {}",
                target_name,
                makefile_path.display()
            )
        })?;
    let duration = started.elapsed();

    let exit_code = status.code().unwrap_or(1);
    Ok(RunOutcome {
        exit_code,
        duration,
        success: exit_code == 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_execute_target_success() {
        let temp_dir = TempDir::new().unwrap();
        let makefile = temp_dir.path().join("Makefile");
        fs::write(&makefile, "ok:\n\t@true\n").unwrap();

        let outcome = execute_target(&makefile, "ok").unwrap();
        assert_eq!(outcome.exit_code, 0);
        assert!(outcome.success);
    }

    #[test]
    fn test_execute_target_failure_exit_code() {
        let temp_dir = TempDir::new().unwrap();
        let makefile = temp_dir.path().join("Makefile");
        fs::write(&makefile, "bad:\n\t@exit 3\n").unwrap();

        let outcome = execute_target(&makefile, "bad").unwrap();
        assert!(!outcome.success);
        assert_ne!(outcome.exit_code, 0);
    }

    #[test]
    fn test_execute_target_missing_makefile() {
        let temp_dir = TempDir::new().unwrap();
        let makefile = temp_dir.path().join("Makefile");

        let result = execute_target(&makefile, "ok");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn test_execute_target_empty_name() {
        let temp_dir = TempDir::new().unwrap();
        let makefile = temp_dir.path().join("Makefile");
        fs::write(&makefile, "ok:\n\t@true\n").unwrap();

        let result = execute_target(&makefile, "");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_execute_target_directory_instead_of_file() {
        let temp_dir = TempDir::new().unwrap();

        let result = execute_target(temp_dir.path(), "ok");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not a file"));
    }
}
