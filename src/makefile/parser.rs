//! # Makefile Target Parser
//!
//! This module parses Makefile text and extracts target definitions with
//! their dependencies, recipes and comment-derived descriptions.
//!
//! ## Overview
//!
//! The parser is a single forward scan over the file. It does not invoke
//! `make` and does not implement GNU Make semantics (variable expansion,
//! includes, conditionals, pattern-rule instantiation); ambiguous constructs
//! are absorbed by heuristics rather than reported as errors. The output is
//! an ordered list of [`Target`] records, the sole contract consumed by the
//! dependency graph and the safety checker.
//!
//! ## Key Types
//!
//! - [`Target`] - A parsed target with dependencies and recipe
//! - [`CommentKind`] - Which comment style produced the description
//! - [`parse_makefile`] - Parse a Makefile from disk
//! - [`parse_makefile_content`] - Parse Makefile text directly (for testing)
//!
//! ## Comment Conventions
//!
//! Descriptions come from the nearest preceding comment or from an inline
//! comment on the target line; inline wins, and `##` wins over `#`:
//!
//! ```makefile
//! # Build the project
//! build: deps
//! 	cargo build
//!
//! test: build ## Run the test suite
//! 	cargo test
//! ```
//!
//! ## Dependency Heuristics
//!
//! Prerequisite fields that cannot be resolved without real Make evaluation
//! are dropped from the dependency list: `$(VAR)` references, `%` pattern
//! placeholders, and path-like fields such as `src/main.o`. Order-only
//! prerequisites (everything after `|`) affect rebuild staleness, not
//! execution ordering, and are dropped as well.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};

/// Which comment style produced a target's description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentKind {
    /// No comment was associated with the target.
    #[default]
    None,
    /// A plain `#` comment.
    Single,
    /// A `##` doc comment (wins over `#`).
    Double,
}

/// A parsed Makefile target.
///
/// Multiple names on one header line (`a b: deps`) produce one `Target` per
/// name, sharing identical dependencies and recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// The target name as written in the Makefile.
    pub name: String,
    /// Description from the nearest preceding or inline comment.
    pub description: String,
    /// Which comment style the description came from.
    pub comment_kind: CommentKind,
    /// Prerequisite names, in declaration order, after heuristic filtering.
    pub dependencies: Vec<String>,
    /// Recipe lines, verbatim including leading `@` / `-` markers.
    pub recipe: Vec<String>,
}

/// Forward-scan state shared by the file and in-memory entry points.
#[derive(Default)]
struct ParseState {
    targets: Vec<Target>,
    /// Indices of the targets currently collecting a recipe.
    pending: Vec<usize>,
    recipe: Vec<String>,
    last_comment: Option<(String, CommentKind)>,
}

impl ParseState {
    fn feed(&mut self, line: &str) {
        // Recipe lines are checked before anything else: a recipe line may
        // contain ':' and must never be mistaken for a target header.
        if let Some(rest) = line.strip_prefix('\t') {
            if !self.pending.is_empty() {
                self.recipe.push(rest.to_string());
            }
            return;
        }

        if line.trim().is_empty() {
            self.commit_recipe();
            self.pending.clear();
            self.last_comment = None;
            return;
        }

        let trimmed = line.trim_start();
        if trimmed.starts_with('#') {
            self.commit_recipe();
            self.pending.clear();
            let kind = if trimmed.starts_with("##") {
                CommentKind::Double
            } else {
                CommentKind::Single
            };
            let text = trimmed.trim_start_matches('#').trim().to_string();
            self.last_comment = Some((text, kind));
            return;
        }

        if is_target_header(line) {
            self.handle_header(line);
        }
        // Anything else (variable assignments, include/conditional
        // directives) carries no target information and is skipped.
    }

    fn handle_header(&mut self, line: &str) {
        self.commit_recipe();
        self.pending.clear();

        let colon = match line.find(':') {
            Some(pos) => pos,
            None => return, // unreachable: header detection requires ':'
        };
        let names_part = &line[..colon];
        // Strip the second ':' of double-colon rules.
        let rest = line[colon + 1..].trim_start_matches(':');

        let (deps_part, inline_comment) = split_inline_comment(rest);
        if let Some(comment) = inline_comment {
            self.last_comment = Some(comment);
        }

        // Special targets like .PHONY are scanned for their side effects on
        // parser state but produce no Target records.
        if names_part.trim_start().starts_with('.') {
            self.last_comment = None;
            return;
        }

        let dependencies = extract_dependencies(deps_part);
        let (description, comment_kind) = self.last_comment.take().unwrap_or_default();

        for name in names_part.split_whitespace() {
            self.targets.push(Target {
                name: name.to_string(),
                description: description.clone(),
                comment_kind,
                dependencies: dependencies.clone(),
                recipe: Vec::new(),
            });
            self.pending.push(self.targets.len() - 1);
        }
    }

    /// Assign the accumulated recipe to every pending target and clear the
    /// buffer. Recipes never leak across block boundaries.
    fn commit_recipe(&mut self) {
        if !self.recipe.is_empty() {
            for &idx in &self.pending {
                self.targets[idx].recipe = self.recipe.clone();
            }
            self.recipe.clear();
        }
    }

    fn finish(mut self) -> Vec<Target> {
        // Files without a trailing blank line must not lose the last recipe.
        self.commit_recipe();
        self.targets
    }
}

/// Parse a Makefile from disk.
///
/// Fails if the file cannot be opened or if an I/O error occurs mid-read.
/// Malformed Make syntax is never fatal.
pub fn parse_makefile(path: &Path) -> Result<Vec<Target>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open Makefile: {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut state = ParseState::default();
    for line in reader.lines() {
        let line =
            line.with_context(|| format!("Failed while reading Makefile: {}", path.display()))?;
        state.feed(&line);
    }
    Ok(state.finish())
}

/// Parse Makefile text directly. Used by tests and by callers that already
/// hold the file contents.
pub fn parse_makefile_content(content: &str) -> Vec<Target> {
    let mut state = ParseState::default();
    for line in content.lines() {
        state.feed(line);
    }
    state.finish()
}

/// A non-tab line is a target header when it contains `:` outside of a
/// variable-assignment pattern.
fn is_target_header(line: &str) -> bool {
    let colon = match line.find(':') {
        Some(pos) => pos,
        None => return false,
    };

    // `:=` is an assignment even though the '=' sits after the ':'.
    if line[colon..].starts_with(":=") {
        return false;
    }
    if line.contains("?=") || line.contains("+=") {
        return false;
    }
    // A bare '=' before the first ':' makes this a variable assignment
    // (e.g. `FLAGS = a:b`).
    if let Some(eq) = line.find('=') {
        if eq < colon {
            return false;
        }
    }

    true
}

/// Split a header's right-hand side into the dependency text and an optional
/// inline comment. `##` is checked before `#`.
fn split_inline_comment(rest: &str) -> (&str, Option<(String, CommentKind)>) {
    if let Some(pos) = rest.find("##") {
        let text = rest[pos + 2..].trim().to_string();
        return (&rest[..pos], Some((text, CommentKind::Double)));
    }
    if let Some(pos) = rest.find('#') {
        let text = rest[pos + 1..].trim().to_string();
        return (&rest[..pos], Some((text, CommentKind::Single)));
    }
    (rest, None)
}

/// Extract dependency names from the text after the header colon.
///
/// Order-only prerequisites (after `|`) are dropped, as are fields that
/// cannot name a target without real Make evaluation: `$` variable
/// references, `%` pattern placeholders and path-like fields.
fn extract_dependencies(deps_part: &str) -> Vec<String> {
    let before_pipe = match deps_part.find('|') {
        Some(pos) => &deps_part[..pos],
        None => deps_part,
    };

    before_pipe
        .split_whitespace()
        .filter(|field| !field.starts_with('$'))
        .filter(|field| !field.contains('%'))
        .filter(|field| !looks_like_path(field))
        .map(str::to_string)
        .collect()
}

/// Heuristic for file-path prerequisites: more than one `/`, or a `/`
/// together with a `.` (e.g. `src/main.o`). Plain names like `docker/build`
/// survive, which matches how such targets are commonly written.
fn looks_like_path(field: &str) -> bool {
    let slashes = field.matches('/').count();
    slashes > 1 || (slashes == 1 && field.contains('.'))
}
