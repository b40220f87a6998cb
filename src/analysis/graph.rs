//! # Dependency Graph Builder
//!
//! Builds a dependency graph from parsed targets and annotates it with
//! ordering, critical-path and parallelism analysis.
//!
//! ## Overview
//!
//! Construction never fails: dependency names with no matching target become
//! placeholder nodes and are surfaced through [`Graph::missing_deps`] for
//! advisory display. A cyclic graph is a valid, fully constructed value with
//! [`Graph::has_cycle`] set; ordering, critical-path and parallelism fields
//! are left at their zero values in that case, since those analyses require
//! a DAG.
//!
//! ## Analysis Phases
//!
//! 1. Node creation, one per target
//! 2. Symmetric edge wiring (dependencies and dependents are always
//!    consistent inverses), with placeholder synthesis for unknown names
//! 3. Cycle detection (3-color DFS with a parent map)
//! 4. Topological leveling (Kahn's algorithm, whole-level batches)
//! 5. Critical-path marking (memoized longest-path depth, propagated down
//!    every co-equal longest chain)
//! 6. Parallelism marking over dependency-bearing order groups
//! 7. Root identification (nodes nothing depends on)
//!
//! ## Key Types
//!
//! - [`Graph`] - The annotated dependency graph
//! - [`Node`] / [`NodeKind`] - Graph members, real or placeholder
//! - [`TreeRenderer`] - Options for the text tree view

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::makefile::Target;

/// Description shown for nodes synthesized from unresolved dependency names.
pub const PLACEHOLDER_DESCRIPTION: &str = "(external or file dependency)";

/// Internal cap applied when a subgraph is requested with unlimited depth.
const MAX_SUBGRAPH_DEPTH: usize = 4096;

/// Whether a node wraps a parsed target or stands in for an unresolved
/// dependency name. Keeping the distinction in the type prevents consumers
/// from treating a placeholder as a fully described target.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Real(Target),
    Placeholder,
}

/// One member of the dependency graph.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    /// Outgoing edges: targets that must run before this one.
    pub dependencies: Vec<String>,
    /// Incoming edges: targets whose dependencies include this one.
    pub dependents: Vec<String>,
    /// Topological level, starting at 1. Zero means unassigned (cyclic graph
    /// or unreached).
    pub order: usize,
    /// Whether this node lies on a longest dependency chain.
    pub is_critical: bool,
    /// Whether this node can run alongside others at the same level.
    pub can_parallel: bool,
}

impl Node {
    fn real(target: &Target) -> Self {
        Self {
            name: target.name.clone(),
            kind: NodeKind::Real(target.clone()),
            dependencies: Vec::new(),
            dependents: Vec::new(),
            order: 0,
            is_critical: false,
            can_parallel: false,
        }
    }

    fn placeholder(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: NodeKind::Placeholder,
            dependencies: Vec::new(),
            dependents: Vec::new(),
            order: 0,
            is_critical: false,
            can_parallel: false,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, NodeKind::Placeholder)
    }

    /// The target's description, or the placeholder marker text.
    pub fn description(&self) -> &str {
        match &self.kind {
            NodeKind::Real(target) => &target.description,
            NodeKind::Placeholder => PLACEHOLDER_DESCRIPTION,
        }
    }
}

/// Options for [`Graph::render_tree`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeRenderer {
    pub show_order: bool,
    pub show_critical: bool,
    pub show_parallel: bool,
}

/// The annotated dependency graph built from a slice of parsed targets.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// All nodes keyed by name.
    pub nodes: BTreeMap<String, Node>,
    /// Nodes with zero dependents; they run last, nothing is gated on them.
    /// Multiple roots are normal for multi-target Makefiles.
    pub roots: Vec<String>,
    pub has_cycle: bool,
    /// Closed walk when a cycle exists: first element equals last.
    pub cycle_nodes: Vec<String>,
    /// Target name to the dependency names that resolved to placeholders.
    pub missing_deps: BTreeMap<String, Vec<String>>,
}

impl Graph {
    /// Build and analyze a graph. Never fails; unresolved dependencies
    /// degrade into placeholders.
    pub fn build(targets: &[Target]) -> Self {
        let mut graph = Self::default();

        // Phase 1: one node per target. The first definition of a name wins
        // if the Makefile repeats it.
        for target in targets {
            graph
                .nodes
                .entry(target.name.clone())
                .or_insert_with(|| Node::real(target));
        }

        // Phase 2: edge wiring, always symmetric. Unknown names get a
        // placeholder node (created once, however often the name recurs).
        for target in targets {
            for dep in &target.dependencies {
                if !graph.nodes.contains_key(dep) {
                    graph.nodes.insert(dep.clone(), Node::placeholder(dep));
                }
                if graph.nodes[dep].is_placeholder() {
                    let gaps = graph.missing_deps.entry(target.name.clone()).or_default();
                    if !gaps.contains(dep) {
                        gaps.push(dep.clone());
                    }
                }
                graph.add_edge(&target.name, dep);
            }
        }

        // Phase 3: cycle detection gates everything that requires a DAG.
        if let Some(cycle) = graph.find_cycle() {
            graph.has_cycle = true;
            graph.cycle_nodes = cycle;
        } else {
            graph.assign_levels();
            graph.mark_critical_path();
            graph.mark_parallel_groups();
        }

        graph.roots = graph
            .nodes
            .values()
            .filter(|node| node.dependents.is_empty())
            .map(|node| node.name.clone())
            .collect();

        graph
    }

    fn add_edge(&mut self, from: &str, to: &str) {
        if let Some(node) = self.nodes.get_mut(from) {
            if !node.dependencies.iter().any(|d| d == to) {
                node.dependencies.push(to.to_string());
            }
        }
        if let Some(node) = self.nodes.get_mut(to) {
            if !node.dependents.iter().any(|d| d == from) {
                node.dependents.push(from.to_string());
            }
        }
    }

    /// 3-color DFS over all nodes. Returns the cycle as a closed walk
    /// (first element equals last) when one exists.
    fn find_cycle(&self) -> Option<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        let mut color: HashMap<&str, Color> = self
            .nodes
            .keys()
            .map(|name| (name.as_str(), Color::White))
            .collect();
        let mut parent: HashMap<String, String> = HashMap::new();

        for start in self.nodes.keys() {
            if color[start.as_str()] != Color::White {
                continue;
            }

            // Iterative DFS: each frame tracks how many outgoing edges have
            // been explored so far.
            let mut stack: Vec<(String, usize)> = vec![(start.clone(), 0)];
            color.insert(start.as_str(), Color::Gray);

            while let Some((name, edge_idx)) = stack.pop() {
                let deps = &self.nodes[&name].dependencies;
                if edge_idx < deps.len() {
                    let dep = deps[edge_idx].clone();
                    stack.push((name.clone(), edge_idx + 1));

                    match color[dep.as_str()] {
                        Color::White => {
                            parent.insert(dep.clone(), name.clone());
                            // Re-key by the node's own string so the borrow
                            // stays valid for the map's lifetime.
                            let key = self.nodes[&dep].name.as_str();
                            color.insert(key, Color::Gray);
                            stack.push((dep, 0));
                        }
                        Color::Gray => {
                            // Found a back edge: walk the parent chain from
                            // the current node up to the in-progress node,
                            // then reverse and close the walk.
                            let mut path = vec![name.clone()];
                            let mut cur = name.clone();
                            while cur != dep {
                                cur = parent[&cur].clone();
                                path.push(cur.clone());
                            }
                            path.reverse();
                            path.push(dep);
                            return Some(path);
                        }
                        Color::Black => {}
                    }
                } else {
                    let key = self.nodes[&name].name.as_str();
                    color.insert(key, Color::Black);
                }
            }
        }

        None
    }

    /// Kahn's algorithm, processed in whole-level batches: every node
    /// dequeued in the same round receives the same order value, modeling
    /// "can start simultaneously" rather than a sequence number.
    fn assign_levels(&mut self) {
        let mut in_degree: HashMap<String, usize> = self
            .nodes
            .values()
            .map(|node| (node.name.clone(), node.dependencies.len()))
            .collect();

        let mut level_nodes: Vec<String> = self
            .nodes
            .values()
            .filter(|node| node.dependencies.is_empty())
            .map(|node| node.name.clone())
            .collect();

        let mut level = 1;
        while !level_nodes.is_empty() {
            let mut next_level = Vec::new();
            for name in &level_nodes {
                if let Some(node) = self.nodes.get_mut(name) {
                    node.order = level;
                }
                let dependents = self.nodes[name].dependents.clone();
                for dependent in dependents {
                    if let Some(remaining) = in_degree.get_mut(&dependent) {
                        *remaining -= 1;
                        if *remaining == 0 {
                            next_level.push(dependent);
                        }
                    }
                }
            }
            level_nodes = next_level;
            level += 1;
        }
    }

    /// Longest-path depth per node, computed iteratively with an explicit
    /// stack so pathologically deep chains cannot exhaust the call stack.
    fn compute_depths(&self) -> HashMap<String, usize> {
        let mut depth: HashMap<String, usize> = HashMap::new();

        for start in self.nodes.keys() {
            if depth.contains_key(start) {
                continue;
            }
            let mut stack = vec![start.clone()];
            while let Some(name) = stack.last().cloned() {
                if depth.contains_key(&name) {
                    stack.pop();
                    continue;
                }
                let deps = &self.nodes[&name].dependencies;
                let unresolved: Vec<String> = deps
                    .iter()
                    .filter(|dep| !depth.contains_key(*dep))
                    .cloned()
                    .collect();
                if unresolved.is_empty() {
                    let value = deps
                        .iter()
                        .map(|dep| depth[dep] + 1)
                        .max()
                        .unwrap_or(0);
                    depth.insert(name, value);
                    stack.pop();
                } else {
                    stack.extend(unresolved);
                }
            }
        }

        depth
    }

    /// Mark every node on any longest dependency chain. Seeds are the
    /// deepest nodes that actually have dependencies; criticality then
    /// propagates down each chain through dependencies exactly one level
    /// shallower, so co-equal longest paths are all marked.
    fn mark_critical_path(&mut self) {
        let has_edges = self.nodes.values().any(|node| !node.dependencies.is_empty());
        if !has_edges {
            return;
        }

        let depth = self.compute_depths();
        let max_depth = depth.values().copied().max().unwrap_or(0);
        if max_depth == 0 {
            return;
        }

        let mut stack: Vec<String> = Vec::new();
        for node in self.nodes.values() {
            if depth[&node.name] == max_depth && !node.dependencies.is_empty() {
                stack.push(node.name.clone());
            }
        }

        while let Some(name) = stack.pop() {
            if self.nodes[&name].is_critical {
                continue;
            }
            if let Some(node) = self.nodes.get_mut(&name) {
                node.is_critical = true;
            }
            let node_depth = depth[&name];
            let deps = self.nodes[&name].dependencies.clone();
            for dep in deps {
                if depth[&dep] + 1 == node_depth && !self.nodes[&dep].is_critical {
                    stack.push(dep);
                }
            }
        }
    }

    /// Nodes that have at least one dependency and share an order level with
    /// another such node can run in parallel. Standalone targets are never
    /// marked: parallelism is only a meaningful label inside an actual
    /// dependency chain.
    fn mark_parallel_groups(&mut self) {
        let mut groups: HashMap<usize, Vec<String>> = HashMap::new();
        for node in self.nodes.values() {
            if !node.dependencies.is_empty() {
                groups.entry(node.order).or_default().push(node.name.clone());
            }
        }

        for members in groups.values() {
            if members.len() > 1 {
                for name in members {
                    if let Some(node) = self.nodes.get_mut(name) {
                        node.can_parallel = true;
                    }
                }
            }
        }
    }

    /// BFS from the named node along dependency edges, up to `max_depth`
    /// hops. A negative depth means unlimited (capped internally). An
    /// unknown name yields an empty graph, not an error.
    pub fn subgraph(&self, target_name: &str, max_depth: isize) -> Self {
        let mut result = Self {
            has_cycle: self.has_cycle,
            cycle_nodes: self.cycle_nodes.clone(),
            ..Self::default()
        };

        if !self.nodes.contains_key(target_name) {
            return result;
        }

        let limit = if max_depth < 0 {
            MAX_SUBGRAPH_DEPTH
        } else {
            max_depth as usize
        };

        let mut members: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        members.insert(target_name.to_string());
        queue.push_back((target_name.to_string(), 0));

        while let Some((name, hops)) = queue.pop_front() {
            if hops >= limit {
                continue;
            }
            for dep in &self.nodes[&name].dependencies {
                if members.insert(dep.clone()) {
                    queue.push_back((dep.clone(), hops + 1));
                }
            }
        }

        for name in &members {
            result.nodes.insert(name.clone(), self.nodes[name].clone());
            if let Some(gaps) = self.missing_deps.get(name) {
                result.missing_deps.insert(name.clone(), gaps.clone());
            }
        }

        result.roots = result
            .nodes
            .values()
            .filter(|node| !node.dependents.iter().any(|d| members.contains(d)))
            .map(|node| node.name.clone())
            .collect();

        result
    }

    /// Render the graph as an indented tree, one line per node.
    ///
    /// Each node is printed once; later encounters of an already rendered
    /// node (shared dependencies, diamond patterns) print a back-reference
    /// marker instead of re-expanding, which keeps output linear on graphs
    /// with shared subtrees. A cyclic graph renders only the cycle path.
    pub fn render_tree(&self, options: &TreeRenderer) -> String {
        if self.has_cycle {
            return format!(
                "Dependency cycle detected: {}\n",
                self.cycle_nodes.join(" → ")
            );
        }

        let mut out = String::new();
        let mut rendered: HashSet<String> = HashSet::new();
        for root in &self.roots {
            self.render_node(root, "", "", &mut rendered, options, &mut out);
        }
        out
    }

    fn render_node(
        &self,
        name: &str,
        connector: &str,
        child_prefix: &str,
        rendered: &mut HashSet<String>,
        options: &TreeRenderer,
        out: &mut String,
    ) {
        let node = match self.nodes.get(name) {
            Some(node) => node,
            // Depth-capped subgraphs can reference nodes outside the member
            // set; those edges are simply not drawn.
            None => return,
        };

        let first_visit = rendered.insert(name.to_string());

        out.push_str(connector);
        out.push_str(name);
        if node.is_placeholder() {
            out.push(' ');
            out.push_str(PLACEHOLDER_DESCRIPTION);
        }
        if !first_visit {
            out.push_str(" (see above)");
            out.push('\n');
            return;
        }
        if options.show_order && node.order > 0 {
            out.push_str(&format!(" [order {}]", node.order));
        }
        if options.show_critical && node.is_critical {
            out.push_str(" [critical]");
        }
        if options.show_parallel && node.can_parallel {
            out.push_str(" [parallel]");
        }
        out.push('\n');

        let deps: Vec<&String> = node
            .dependencies
            .iter()
            .filter(|dep| self.nodes.contains_key(*dep))
            .collect();
        for (i, dep) in deps.iter().enumerate() {
            let last = i == deps.len() - 1;
            let next_connector = if last {
                format!("{child_prefix}└── ")
            } else {
                format!("{child_prefix}├── ")
            };
            let next_prefix = if last {
                format!("{child_prefix}    ")
            } else {
                format!("{child_prefix}│   ")
            };
            self.render_node(dep, &next_connector, &next_prefix, rendered, options, out);
        }
    }
}
