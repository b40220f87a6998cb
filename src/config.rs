//! # Configuration Persistence
//!
//! Manages user configuration stored in `~/.config/makescope/config.json`,
//! optionally overlaid with a project-local `.makescope.json`.
//!
//! ## Overview
//!
//! The [`Config`] struct is serialized to / deserialized from JSON. The
//! user-level file carries defaults for every project; a `.makescope.json`
//! in the project directory is merged over it so a repository can ship its
//! own safety exclusions and custom rules.
//!
//! ## Merge Semantics
//!
//! Simple union/override:
//!
//! - `safety.enabled`: disabled anywhere means disabled
//! - `safety.allowed_rules`: the project list replaces the user list when
//!   non-empty
//! - `safety.excluded_targets` / `safety.custom_rules`: union (project
//!   entries win on duplicate rule IDs)
//!
//! ## File Locations
//!
//! ```text
//! ~/.config/makescope/config.json   (user)
//! <project>/.makescope.json         (project)
//! ```
//!
//! The `directories` crate is used to resolve the platform-appropriate
//! config directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::SafetyConfig;

/// Name of the optional project-local config file.
pub const PROJECT_CONFIG_NAME: &str = ".makescope.json";

/// Persisted configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Safety rule engine configuration (§ rule surface: enable flag,
    /// allow-list, exclusions, custom rules).
    pub safety: SafetyConfig,
}

impl Config {
    /// Load the effective configuration for a project: the user config
    /// overlaid with the project-local file, if present. Unreadable files
    /// degrade to defaults with a warning.
    pub fn load(project_dir: &Path) -> Self {
        let user = match Self::user_config_path() {
            Ok(path) => Self::load_from(&path).unwrap_or_else(|err| {
                eprintln!("Warning: Could not load user config: {err:#}");
                Self::default()
            }),
            Err(_) => Self::default(),
        };

        let project_path = project_dir.join(PROJECT_CONFIG_NAME);
        match Self::load_from(&project_path) {
            Ok(project) => user.merged_with(project),
            Err(err) => {
                eprintln!("Warning: Could not load project config: {err:#}");
                user
            }
        }
    }

    /// Load configuration from a specific path. Returns `Config::default()`
    /// if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Overlay `project` onto `self` using the documented union/override
    /// semantics.
    pub fn merged_with(self, project: Self) -> Self {
        let mut safety = SafetyConfig {
            enabled: self.safety.enabled && project.safety.enabled,
            allowed_rules: if project.safety.allowed_rules.is_empty() {
                self.safety.allowed_rules
            } else {
                project.safety.allowed_rules
            },
            excluded_targets: self.safety.excluded_targets,
            custom_rules: self.safety.custom_rules,
        };

        for target in project.safety.excluded_targets {
            if !safety.excluded_targets.contains(&target) {
                safety.excluded_targets.push(target);
            }
        }
        for rule in project.safety.custom_rules {
            safety.custom_rules.retain(|existing| existing.id != rule.id);
            safety.custom_rules.push(rule);
        }

        Self { safety }
    }

    /// Save the configuration to a specific path, creating parent
    /// directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Return the path to the user config file.
    fn user_config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "makescope")
            .context("Could not determine config directory")?;
        Ok(dirs.config_dir().join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{RuleSpec, Severity};
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.safety.enabled);
        assert!(config.safety.allowed_rules.is_empty());
        assert!(config.safety.excluded_targets.is_empty());
    }

    #[test]
    fn test_load_from_missing_file_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("does_not_exist.json");

        let loaded = Config::load_from(&path).unwrap();
        assert!(loaded.safety.enabled);
    }

    #[test]
    fn test_load_from_invalid_json_errors() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "not valid json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_save_to_load_from_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("subdir").join("config.json");

        let config = Config {
            safety: SafetyConfig {
                excluded_targets: vec!["clean".to_string()],
                ..SafetyConfig::default()
            },
        };

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.safety.excluded_targets, vec!["clean".to_string()]);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{"safety": {"excluded_targets": ["clean"]}}"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert!(config.safety.enabled);
        assert_eq!(config.safety.excluded_targets, vec!["clean".to_string()]);
    }

    #[test]
    fn test_merge_disabled_anywhere_wins() {
        let user = Config::default();
        let project = Config {
            safety: SafetyConfig {
                enabled: false,
                ..SafetyConfig::default()
            },
        };

        assert!(!user.merged_with(project).safety.enabled);
    }

    #[test]
    fn test_merge_unions_excluded_targets() {
        let user = Config {
            safety: SafetyConfig {
                excluded_targets: vec!["clean".to_string()],
                ..SafetyConfig::default()
            },
        };
        let project = Config {
            safety: SafetyConfig {
                excluded_targets: vec!["clean".to_string(), "dist".to_string()],
                ..SafetyConfig::default()
            },
        };

        let merged = user.merged_with(project);
        assert_eq!(
            merged.safety.excluded_targets,
            vec!["clean".to_string(), "dist".to_string()]
        );
    }

    #[test]
    fn test_merge_project_custom_rule_wins_on_same_id() {
        let rule = |id: &str, pattern: &str| RuleSpec {
            id: id.to_string(),
            severity: Severity::Warning,
            patterns: vec![pattern.to_string()],
            description: String::new(),
            suggestion: String::new(),
        };

        let user = Config {
            safety: SafetyConfig {
                custom_rules: vec![rule("shared", "old")],
                ..SafetyConfig::default()
            },
        };
        let project = Config {
            safety: SafetyConfig {
                custom_rules: vec![rule("shared", "new")],
                ..SafetyConfig::default()
            },
        };

        let merged = user.merged_with(project);
        assert_eq!(merged.safety.custom_rules.len(), 1);
        assert_eq!(merged.safety.custom_rules[0].patterns, vec!["new".to_string()]);
    }

    #[test]
    fn test_merge_project_allow_list_replaces_when_non_empty() {
        let user = Config {
            safety: SafetyConfig {
                allowed_rules: vec!["git-reset-hard".to_string()],
                ..SafetyConfig::default()
            },
        };
        let project = Config {
            safety: SafetyConfig {
                allowed_rules: vec!["rm-rf-root".to_string()],
                ..SafetyConfig::default()
            },
        };

        let merged = user.merged_with(project);
        assert_eq!(merged.safety.allowed_rules, vec!["rm-rf-root".to_string()]);
    }
}
