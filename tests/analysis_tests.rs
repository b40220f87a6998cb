//! End-to-end analysis tests
//!
//! Exercises the full pipeline on real files: discovery → parse → graph →
//! safety, the way the CLI drives it.

use std::fs;

use tempfile::TempDir;

use makescope::analysis::{Checker, Graph, SafetyConfig, Severity, TreeRenderer};
use makescope::makefile::{find_makefile, parse_makefile};

const SCENARIO: &str = r#"# Build everything
all: build test

## Compile the project
build: deps
	cargo build

# Run the test suite
test: build
	cargo test

deps:
	cargo fetch
"#;

fn write_makefile(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("Makefile");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_end_to_end_ordering_and_critical_chain() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_makefile(&temp_dir, SCENARIO);

    let targets = parse_makefile(&path).unwrap();
    assert_eq!(targets.len(), 4);

    let graph = Graph::build(&targets);
    assert!(!graph.has_cycle);

    // deps has no prerequisites, build waits on it, test waits on build,
    // and all waits on both.
    assert_eq!(graph.nodes["deps"].order, 1);
    assert_eq!(graph.nodes["build"].order, 2);
    assert_eq!(graph.nodes["test"].order, 3);
    assert!(graph.nodes["all"].order > graph.nodes["build"].order);
    assert!(graph.nodes["all"].order > graph.nodes["test"].order);

    // There is no branching: the single longest chain
    // all → test → build → deps is fully critical.
    for name in ["all", "test", "build", "deps"] {
        assert!(graph.nodes[name].is_critical, "{name} should be critical");
    }

    // `all` is the only root.
    assert_eq!(graph.roots, vec!["all".to_string()]);
}

#[test]
fn test_end_to_end_descriptions_from_comments() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_makefile(&temp_dir, SCENARIO);

    let targets = parse_makefile(&path).unwrap();
    let build = targets.iter().find(|t| t.name == "build").unwrap();
    let test = targets.iter().find(|t| t.name == "test").unwrap();
    let deps = targets.iter().find(|t| t.name == "deps").unwrap();

    assert_eq!(build.description, "Compile the project");
    assert_eq!(test.description, "Run the test suite");
    assert_eq!(deps.description, "");
}

#[test]
fn test_end_to_end_discovery_feeds_parser() {
    let temp_dir = TempDir::new().unwrap();
    write_makefile(&temp_dir, SCENARIO);

    let found = find_makefile(temp_dir.path()).expect("Makefile should be discovered");
    let targets = parse_makefile(&found).unwrap();
    assert!(targets.iter().any(|t| t.name == "all"));
}

#[test]
fn test_end_to_end_cycle_reporting() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_makefile(
        &temp_dir,
        "a: b\n\t@echo a\n\nb: c\n\t@echo b\n\nc: a\n\t@echo c\n",
    );

    let targets = parse_makefile(&path).unwrap();
    let graph = Graph::build(&targets);

    assert!(graph.has_cycle);
    assert_eq!(graph.cycle_nodes.first(), graph.cycle_nodes.last());

    // The cycle renders as a readable path instead of a tree.
    let tree = graph.render_tree(&TreeRenderer::default());
    assert!(tree.contains("Dependency cycle detected"));
}

#[test]
fn test_end_to_end_missing_dependency_placeholder() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_makefile(&temp_dir, "install: dist.tar\n\tcp dist.tar /opt/\n");

    let targets = parse_makefile(&path).unwrap();
    let graph = Graph::build(&targets);

    let placeholder = &graph.nodes["dist.tar"];
    assert!(placeholder.is_placeholder());
    assert_eq!(placeholder.description(), "(external or file dependency)");
    assert_eq!(graph.missing_deps["install"], vec!["dist.tar".to_string()]);
}

#[test]
fn test_end_to_end_safety_blocks_dangerous_targets() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_makefile(
        &temp_dir,
        "build:\n\tcargo build\n\nclean:\n\trm -rf /tmp/scratch\n\ndestroy-prod:\n\tterraform destroy\n",
    );

    let targets = parse_makefile(&path).unwrap();
    let checker = Checker::new(&SafetyConfig::default());
    let results = checker.check_all_targets(&targets);

    // Only dangerous targets are present as keys.
    assert!(!results.contains_key("build"));

    // Cleanup context softens the recursive delete one step.
    assert_eq!(results["clean"].danger_level, Severity::Warning);

    // The production-sounding destroy stays critical.
    assert_eq!(results["destroy-prod"].danger_level, Severity::Critical);
}

#[test]
fn test_end_to_end_subgraph_focused_view() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_makefile(&temp_dir, SCENARIO);

    let targets = parse_makefile(&path).unwrap();
    let graph = Graph::build(&targets);

    let focused = graph.subgraph("test", -1);
    assert_eq!(focused.nodes.len(), 3); // test, build, deps
    assert!(focused.nodes.contains_key("test"));
    assert!(!focused.nodes.contains_key("all"));

    let single = graph.subgraph("test", 0);
    assert_eq!(single.nodes.len(), 1);
}

#[test]
fn test_end_to_end_parallel_marking() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_makefile(
        &temp_dir,
        "all: lint test\n\t@echo done\n\nlint: deps\n\tcargo clippy\n\ntest: deps\n\tcargo test\n\ndeps:\n\tcargo fetch\n",
    );

    let targets = parse_makefile(&path).unwrap();
    let graph = Graph::build(&targets);

    // lint and test both wait on deps and share a level.
    assert!(graph.nodes["lint"].can_parallel);
    assert!(graph.nodes["test"].can_parallel);
    // deps is a standalone leaf and is never marked.
    assert!(!graph.nodes["deps"].can_parallel);
}
