//! # Built-in Safety Rule Catalog
//!
//! The append-only catalog of recipe-line safety rules, plus the serde shape
//! used for user-supplied custom rules in the config file.
//!
//! Rules are matched case-sensitively unless a pattern opts into `(?i)`.
//! Every rule carries a human-readable description and a remediation
//! suggestion surfaced in the TUI details panel and in reports.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::safety::Severity;

/// A compiled, immutable safety rule.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Unique identifier, e.g. `rm-rf-root`.
    pub id: String,
    /// Base severity before context adjustment.
    pub severity: Severity,
    /// OR-matched against each recipe line.
    pub patterns: Vec<Regex>,
    pub description: String,
    pub suggestion: String,
}

/// The serializable shape of a rule, used for custom rules in the config
/// file and as the source for the built-in catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSpec {
    pub id: String,
    pub severity: Severity,
    pub patterns: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub suggestion: String,
}

impl RuleSpec {
    /// Compile the spec into a [`Rule`]. Fails on the first invalid pattern.
    pub fn compile(&self) -> Result<Rule> {
        let mut patterns = Vec::with_capacity(self.patterns.len());
        for pattern in &self.patterns {
            let compiled = Regex::new(pattern)
                .with_context(|| format!("Invalid pattern '{}' in rule '{}'", pattern, self.id))?;
            patterns.push(compiled);
        }
        Ok(Rule {
            id: self.id.clone(),
            severity: self.severity,
            patterns,
            description: self.description.clone(),
            suggestion: self.suggestion.clone(),
        })
    }
}

/// Compile a list of rule specs, dropping (and warning about) any rule whose
/// patterns fail to compile. A bad custom rule never aborts the rule set.
pub fn compile_rules(specs: &[RuleSpec]) -> Vec<Rule> {
    let mut rules = Vec::with_capacity(specs.len());
    for spec in specs {
        match spec.compile() {
            Ok(rule) => rules.push(rule),
            Err(err) => eprintln!("Warning: Skipping safety rule '{}': {:#}", spec.id, err),
        }
    }
    rules
}

fn spec(
    id: &str,
    severity: Severity,
    patterns: &[&str],
    description: &str,
    suggestion: &str,
) -> RuleSpec {
    RuleSpec {
        id: id.to_string(),
        severity,
        patterns: patterns.iter().map(|p| (*p).to_string()).collect(),
        description: description.to_string(),
        suggestion: suggestion.to_string(),
    }
}

/// The built-in rule catalog. Append-only: rule IDs are stable once
/// published because configs reference them in allow-lists.
pub fn builtin_rule_specs() -> Vec<RuleSpec> {
    vec![
        spec(
            "rm-rf-root",
            Severity::Critical,
            &[
                r"rm\s+-[a-zA-Z]*r[a-zA-Z]*\s+/",
                r"rm\s+--recursive(\s+--force)?\s+/",
            ],
            "Recursive removal of an absolute path",
            "Double-check the path; prefer project-relative paths and keep a leading variable out of the root position",
        ),
        spec(
            "sudo-rm",
            Severity::Critical,
            &[r"sudo\s+rm\s"],
            "File removal with elevated privileges",
            "Run the removal as the project user, or scope sudo to the narrowest possible command",
        ),
        spec(
            "drop-database",
            Severity::Critical,
            &[r"(?i)drop\s+database", r"(?i)drop\s+schema"],
            "Drops an entire database or schema",
            "Gate behind an explicit confirmation and verify the connection string points at the intended environment",
        ),
        spec(
            "truncate-table",
            Severity::Critical,
            &[r"(?i)truncate\s+table"],
            "Irreversibly empties a database table",
            "Take a backup first, or use a reversible soft-delete migration",
        ),
        spec(
            "terraform-destroy",
            Severity::Critical,
            &[r"terraform\s+destroy", r"tofu\s+destroy"],
            "Destroys managed infrastructure",
            "Review the plan output and restrict the workspace before destroying",
        ),
        spec(
            "kubectl-delete-all",
            Severity::Critical,
            &[r"kubectl\s+delete\s+[^\n]*--all\b"],
            "Bulk deletion of Kubernetes resources",
            "Name the resources explicitly, or at least pin the namespace with -n",
        ),
        spec(
            "dd-device-write",
            Severity::Critical,
            &[r"dd\s+[^\n]*of=/dev/"],
            "Raw write to a block device",
            "Triple-check the of= device; writing to the wrong disk is unrecoverable",
        ),
        spec(
            "mkfs",
            Severity::Critical,
            &[r"mkfs(\.[a-z0-9]+)?\s"],
            "Formats a filesystem",
            "Confirm the device is the intended one and unmounted",
        ),
        spec(
            "redis-flush",
            Severity::Critical,
            &[r"(?i)\bflushall\b", r"(?i)\bflushdb\b"],
            "Flushes all keys from a Redis instance",
            "Point the client at a scratch database index, never the shared instance",
        ),
        spec(
            "docker-system-prune",
            Severity::Warning,
            &[r"docker\s+system\s+prune", r"docker\s+volume\s+prune"],
            "Prunes Docker data, including volumes other projects may use",
            "Prune specific images/volumes instead, or keep the --volumes flag off",
        ),
        spec(
            "git-reset-hard",
            Severity::Warning,
            &[r"git\s+reset\s+--hard"],
            "Discards uncommitted work tree changes",
            "Stash first (git stash) so the discarded state stays recoverable",
        ),
        spec(
            "git-clean-force",
            Severity::Warning,
            &[r"git\s+clean\s+-[a-zA-Z]*f"],
            "Deletes untracked files",
            "Run with -n first to preview what would be removed",
        ),
        spec(
            "git-force-push",
            Severity::Warning,
            &[r"git\s+push\s+[^\n]*--force\b", r"git\s+push\s+[^\n]*\s-f\b"],
            "Rewrites remote branch history",
            "Prefer --force-with-lease so concurrent pushes are not silently overwritten",
        ),
        spec(
            "curl-pipe-shell",
            Severity::Warning,
            &[r"curl\s+[^|\n]*\|\s*(sudo\s+)?(ba|z)?sh"],
            "Pipes a downloaded script straight into a shell",
            "Download to a file, review it, then execute",
        ),
        spec(
            "chmod-world-writable",
            Severity::Warning,
            &[r"chmod\s+(-[a-zA-Z]+\s+)*777\b"],
            "Makes files world-writable",
            "Grant the narrowest permissions that work, e.g. 755 or 644",
        ),
        spec(
            "process-kill-by-name",
            Severity::Info,
            &[r"\bkillall\s", r"\bpkill\s"],
            "Terminates processes by name match",
            "Match on a PID file where possible to avoid killing unrelated processes",
        ),
    ]
}

/// Compiled built-in catalog.
pub fn builtin_rules() -> Vec<Rule> {
    compile_rules(&builtin_rule_specs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_rules_all_compile() {
        let specs = builtin_rule_specs();
        let rules = builtin_rules();
        assert_eq!(specs.len(), rules.len(), "every built-in pattern must compile");
    }

    #[test]
    fn test_builtin_rule_ids_unique() {
        let specs = builtin_rule_specs();
        let mut ids: Vec<&str> = specs.iter().map(|s| s.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), specs.len());
    }

    #[test]
    fn test_rm_rf_root_matches_absolute_paths_only() {
        let rules = builtin_rules();
        let rule = rules.iter().find(|r| r.id == "rm-rf-root").unwrap();

        assert!(rule.patterns.iter().any(|p| p.is_match("rm -rf /tmp")));
        assert!(rule.patterns.iter().any(|p| p.is_match("rm -rf / ")));
        assert!(!rule.patterns.iter().any(|p| p.is_match("rm -f build/out.o")));
        assert!(!rule.patterns.iter().any(|p| p.is_match("rm -rf build/")));
    }

    #[test]
    fn test_compile_rules_drops_invalid_regex() {
        let specs = vec![
            spec("good", Severity::Info, &["ok"], "", ""),
            spec("bad", Severity::Critical, &["(unclosed"], "", ""),
        ];

        let rules = compile_rules(&specs);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id, "good");
    }

    #[test]
    fn test_custom_rule_spec_roundtrip() {
        let json = r#"{
            "id": "no-npm-force",
            "severity": "Warning",
            "patterns": ["npm\\s+install\\s+--force"],
            "description": "Forced npm install",
            "suggestion": "Fix the peer dependency conflict instead"
        }"#;

        let parsed: RuleSpec = serde_json::from_str(json).unwrap();
        let rule = parsed.compile().unwrap();
        assert_eq!(rule.id, "no-npm-force");
        assert_eq!(rule.severity, Severity::Warning);
        assert!(rule.patterns[0].is_match("npm install --force"));
    }
}
