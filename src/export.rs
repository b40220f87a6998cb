//! # Report Export
//!
//! Renders the analysis (targets, graph annotations, safety findings) as a
//! plain-text report or as JSON, for the `--report` / `--json` CLI modes and
//! for writing to a file with `--output`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::analysis::{Graph, SafetyCheckResult, Severity, TreeRenderer};
use crate::makefile::Target;

/// One target row in the JSON report.
#[derive(Debug, Serialize)]
struct ReportTarget<'a> {
    name: &'a str,
    description: &'a str,
    dependencies: &'a [String],
    recipe: &'a [String],
    order: usize,
    is_critical: bool,
    can_parallel: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    danger_level: Option<Severity>,
}

/// The JSON report document.
#[derive(Debug, Serialize)]
struct Report<'a> {
    makefile: String,
    has_cycle: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    cycle: Vec<String>,
    targets: Vec<ReportTarget<'a>>,
    missing_dependencies: &'a std::collections::BTreeMap<String, Vec<String>>,
    safety: &'a HashMap<String, SafetyCheckResult>,
}

/// Render the analysis as a plain-text report.
pub fn render_text_report(
    makefile: &Path,
    targets: &[Target],
    graph: &Graph,
    safety: &HashMap<String, SafetyCheckResult>,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("Makefile: {}\n", makefile.display()));
    out.push_str(&format!("Targets:  {}\n\n", targets.len()));

    if graph.has_cycle {
        out.push_str(&format!(
            "Dependency cycle detected: {}\n\n",
            graph.cycle_nodes.join(" → ")
        ));
    }

    for target in targets {
        let node = graph.nodes.get(&target.name);
        out.push_str(&target.name);
        if let Some(node) = node {
            if node.order > 0 {
                out.push_str(&format!("  [order {}]", node.order));
            }
            if node.is_critical {
                out.push_str("  [critical]");
            }
            if node.can_parallel {
                out.push_str("  [parallel]");
            }
        }
        out.push('\n');

        if !target.description.is_empty() {
            out.push_str(&format!("    {}\n", target.description));
        }
        if !target.dependencies.is_empty() {
            out.push_str(&format!("    depends on: {}\n", target.dependencies.join(", ")));
        }
        if let Some(gaps) = graph.missing_deps.get(&target.name) {
            out.push_str(&format!("    unresolved: {}\n", gaps.join(", ")));
        }
        if let Some(result) = safety.get(&target.name) {
            out.push_str(&format!("    danger: {}\n", result.danger_level));
            for m in &result.matches {
                out.push_str(&format!(
                    "      [{}] {} ({}): {}\n",
                    m.severity, m.rule_id, m.description, m.line
                ));
                if !m.suggestion.is_empty() {
                    out.push_str(&format!("        suggestion: {}\n", m.suggestion));
                }
            }
        }
        out.push('\n');
    }

    out.push_str("Dependency tree:\n");
    let tree = graph.render_tree(&TreeRenderer {
        show_order: true,
        show_critical: true,
        show_parallel: true,
    });
    out.push_str(&tree);

    out
}

/// Render the analysis as pretty-printed JSON.
pub fn render_json_report(
    makefile: &Path,
    targets: &[Target],
    graph: &Graph,
    safety: &HashMap<String, SafetyCheckResult>,
) -> Result<String> {
    let rows: Vec<ReportTarget> = targets
        .iter()
        .map(|target| {
            let node = graph.nodes.get(&target.name);
            ReportTarget {
                name: &target.name,
                description: &target.description,
                dependencies: &target.dependencies,
                recipe: &target.recipe,
                order: node.map_or(0, |n| n.order),
                is_critical: node.is_some_and(|n| n.is_critical),
                can_parallel: node.is_some_and(|n| n.can_parallel),
                danger_level: safety.get(&target.name).map(|r| r.danger_level),
            }
        })
        .collect();

    let report = Report {
        makefile: makefile.display().to_string(),
        has_cycle: graph.has_cycle,
        cycle: graph.cycle_nodes.clone(),
        targets: rows,
        missing_dependencies: &graph.missing_deps,
        safety,
    };

    serde_json::to_string_pretty(&report).context("Failed to serialize analysis report")
}

/// Write a report to a file, creating parent directories as needed.
pub fn write_report(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create report directory: {}", parent.display())
            })?;
        }
    }
    fs::write(path, contents)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    Ok(())
}
