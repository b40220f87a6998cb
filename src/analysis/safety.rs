//! # Safety Checker
//!
//! Matches recipe lines against the safety rule catalog and computes a
//! context-adjusted danger level per target.
//!
//! ## Overview
//!
//! Every enabled rule's patterns are tested against every recipe line of a
//! target; the first matching line wins per rule. A match starts at the
//! rule's base severity and is then adjusted for context:
//!
//! - Clean-like target names (`clean`, `purge`, `reset`, ...) downgrade one
//!   step, unless the target name or matched line mentions critical-system
//!   keywords (`db`, `prod`, `backup`, ...).
//! - An interactive-confirmation flag (`-i`, `--interactive`) on the matched
//!   line downgrades one step.
//! - A development/test-context target name (`dev`, `test`, `local`, ...)
//!   downgrades Critical to Warning, unless the matched line contains a
//!   production keyword as a whole word.
//!
//! Adjustment is downgrade-only: production keywords never escalate a
//! Warning to Critical. The highest resulting severity across all matched
//! rules becomes the target's danger level.
//!
//! ## Key Types
//!
//! - [`Severity`] - Ordered danger classification
//! - [`SafetyConfig`] - The §6 configuration surface consumed by the checker
//! - [`Checker`] - Compiled rule set plus context adjustment
//! - [`SafetyCheckResult`] / [`MatchResult`] - Per-target findings

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::rules::{builtin_rule_specs, compile_rules, Rule, RuleSpec};
use crate::makefile::Target;

/// Target names containing these substrings are treated as cleanup targets.
const CLEAN_KEYWORDS: &[&str] = &[
    "clean", "purge", "reset", "nuke", "remove", "delete", "wipe", "clear",
];

/// Keywords that veto the cleanup downgrade when present in the target name
/// or the matched line.
const CRITICAL_CONTEXT_KEYWORDS: &[&str] = &[
    "db", "database", "prod", "schema", "migration", "backup", "restore",
];

/// Target names containing these substrings suggest a development/test
/// context.
const DEV_KEYWORDS: &[&str] = &[
    "dev", "test", "local", "docker", "demo", "staging", "sandbox",
];

/// Whole-word production keywords that veto the dev-context downgrade.
const PRODUCTION_KEYWORDS: &[&str] = &["prod", "production", "master", "main", "live", "release"];

/// Ordered danger classification for a matched recipe line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    /// One step down: Critical → Warning → Info → Info.
    pub fn downgrade(self) -> Self {
        match self {
            Severity::Critical => Severity::Warning,
            Severity::Warning => Severity::Info,
            Severity::Info => Severity::Info,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Safety configuration, merged from the user and project config files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Master switch; when false no target is ever checked.
    pub enabled: bool,
    /// Built-in rule IDs to enable. Empty means all built-ins.
    pub allowed_rules: Vec<String>,
    /// Target names that are never checked.
    pub excluded_targets: Vec<String>,
    /// User-supplied rules, appended to the built-in catalog.
    pub custom_rules: Vec<RuleSpec>,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_rules: Vec::new(),
            excluded_targets: Vec::new(),
            custom_rules: Vec::new(),
        }
    }
}

/// One rule that matched a recipe line, with its adjusted severity.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub rule_id: String,
    /// Context-adjusted severity for this match.
    pub severity: Severity,
    /// Zero-based index of the matched line within the recipe.
    pub line_index: usize,
    /// The matched recipe line, verbatim.
    pub line: String,
    pub description: String,
    pub suggestion: String,
}

/// All findings for one target.
#[derive(Debug, Clone, Serialize)]
pub struct SafetyCheckResult {
    pub target: String,
    pub matches: Vec<MatchResult>,
    /// Maximum severity across all matches.
    pub danger_level: Severity,
}

/// Compiled rule set plus context adjustment. Immutable once constructed;
/// build a fresh checker to pick up config changes.
pub struct Checker {
    enabled: bool,
    rules: Vec<Rule>,
    excluded_targets: HashSet<String>,
}

impl Checker {
    pub fn new(config: &SafetyConfig) -> Self {
        let builtin: Vec<RuleSpec> = if config.allowed_rules.is_empty() {
            builtin_rule_specs()
        } else {
            builtin_rule_specs()
                .into_iter()
                .filter(|spec| config.allowed_rules.iter().any(|id| id == &spec.id))
                .collect()
        };

        let mut specs = builtin;
        specs.extend(config.custom_rules.iter().cloned());

        Self {
            enabled: config.enabled,
            rules: compile_rules(&specs),
            excluded_targets: config.excluded_targets.iter().cloned().collect(),
        }
    }

    /// Check one target. `None` means no rule matched (or the target was
    /// skipped): absence of danger, not an empty result.
    pub fn check_target(&self, target: &Target) -> Option<SafetyCheckResult> {
        if !self.enabled
            || self.excluded_targets.contains(&target.name)
            || target.recipe.is_empty()
        {
            return None;
        }

        let mut matches = Vec::new();
        for rule in &self.rules {
            // First matching line wins per rule, OR across its patterns.
            'lines: for (line_index, line) in target.recipe.iter().enumerate() {
                for pattern in &rule.patterns {
                    if pattern.is_match(line) {
                        matches.push(MatchResult {
                            rule_id: rule.id.clone(),
                            severity: adjust_severity(&target.name, line, rule.severity),
                            line_index,
                            line: line.clone(),
                            description: rule.description.clone(),
                            suggestion: rule.suggestion.clone(),
                        });
                        break 'lines;
                    }
                }
            }
        }

        let danger_level = matches.iter().map(|m| m.severity).max()?;
        Some(SafetyCheckResult {
            target: target.name.clone(),
            matches,
            danger_level,
        })
    }

    /// Check every target; only dangerous targets are present as keys.
    pub fn check_all_targets(&self, targets: &[Target]) -> HashMap<String, SafetyCheckResult> {
        let mut results = HashMap::new();
        for target in targets {
            if let Some(result) = self.check_target(target) {
                results.insert(target.name.clone(), result);
            }
        }
        results
    }
}

/// Apply the context downgrades in a fixed order; each is independently
/// applicable and downgrades compound step-wise. Severity is never raised.
fn adjust_severity(target_name: &str, line: &str, base: Severity) -> Severity {
    let mut severity = base;
    let name_lower = target_name.to_lowercase();
    let line_lower = line.to_lowercase();

    let clean_context = CLEAN_KEYWORDS.iter().any(|kw| name_lower.contains(kw));
    let critical_context = CRITICAL_CONTEXT_KEYWORDS
        .iter()
        .any(|kw| name_lower.contains(kw) || line_lower.contains(kw));
    if clean_context && !critical_context {
        severity = severity.downgrade();
    }

    if has_interactive_flag(line) {
        severity = severity.downgrade();
    }

    if severity == Severity::Critical
        && DEV_KEYWORDS.iter().any(|kw| name_lower.contains(kw))
        && !contains_word(&line_lower, PRODUCTION_KEYWORDS)
    {
        severity = Severity::Warning;
    }

    severity
}

/// Detect an interactive-confirmation flag on the line: `--interactive`, or
/// a single-dash short-flag cluster containing `i` (e.g. `-i`, `-ri`).
fn has_interactive_flag(line: &str) -> bool {
    line.split_whitespace().any(|token| {
        if token == "--interactive" {
            return true;
        }
        match token.strip_prefix('-') {
            Some(flags) if !flags.starts_with('-') => {
                !flags.is_empty() && flags.chars().all(|c| c.is_ascii_alphabetic()) && flags.contains('i')
            }
            _ => false,
        }
    })
}

/// Whole-word containment: `main` matches in `git push origin main` but not
/// in `maintenance`.
fn contains_word(text: &str, words: &[&str]) -> bool {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| words.contains(&token))
}
