use std::collections::HashMap;

use crate::analysis::{Graph, SafetyCheckResult, Severity, TreeRenderer};
use crate::makefile::Target;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FocusPane {
    TargetList,
    Details,
}

/// What should happen after the user presses Enter on a target.
#[derive(Debug, Clone, PartialEq)]
pub enum RunDecision {
    /// Safe to start immediately.
    Start(String),
    /// Critical danger level: execution is blocked pending confirmation.
    Confirm(String),
}

pub struct App {
    pub targets: Vec<Target>,
    pub graph: Graph,
    pub safety: HashMap<String, SafetyCheckResult>,
    pub project_name: String,
    pub selected_index: usize,
    pub focus: FocusPane,
    pub should_quit: bool,
    pub search_mode: bool,
    pub search_query: String,
    pub show_info: bool,
    pub show_tree: bool,
    pub tree_scroll: usize,
    /// Target awaiting confirmation before a dangerous run.
    pub pending_run: Option<String>,
    /// One-line outcome of the last execution, shown in the footer.
    pub status: Option<String>,
}

impl App {
    pub fn new(
        targets: Vec<Target>,
        graph: Graph,
        safety: HashMap<String, SafetyCheckResult>,
        project_name: String,
    ) -> Self {
        Self {
            targets,
            graph,
            safety,
            project_name,
            selected_index: 0,
            focus: FocusPane::TargetList,
            should_quit: false,
            search_mode: false,
            search_query: String::new(),
            show_info: false,
            show_tree: false,
            tree_scroll: 0,
            pending_run: None,
            status: None,
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            FocusPane::TargetList => FocusPane::Details,
            FocusPane::Details => FocusPane::TargetList,
        };
    }

    pub fn toggle_info(&mut self) {
        self.show_info = !self.show_info;
    }

    pub fn toggle_tree(&mut self) {
        self.show_tree = !self.show_tree;
        self.tree_scroll = 0;
    }

    /// The rendered dependency tree for the tree pane.
    pub fn tree_text(&self) -> String {
        self.graph.render_tree(&TreeRenderer {
            show_order: true,
            show_critical: true,
            show_parallel: true,
        })
    }

    pub fn scroll_tree_up(&mut self) {
        self.tree_scroll = self.tree_scroll.saturating_sub(1);
    }

    pub fn scroll_tree_down(&mut self) {
        let lines = self.tree_text().lines().count();
        if self.tree_scroll + 1 < lines {
            self.tree_scroll += 1;
        }
    }

    pub fn visible_targets(&self) -> Vec<&Target> {
        self.targets
            .iter()
            .filter(|t| self.matches_search(t))
            .collect()
    }

    fn matches_search(&self, target: &Target) -> bool {
        if !self.search_mode || self.search_query.is_empty() {
            return true;
        }

        let query = self.search_query.to_lowercase();
        target.name.to_lowercase().contains(&query)
            || target.description.to_lowercase().contains(&query)
    }

    pub fn selected_target(&self) -> Option<&Target> {
        let visible = self.visible_targets();
        visible.get(self.selected_index).copied()
    }

    pub fn next(&mut self) {
        let count = self.visible_targets().len();
        if count > 0 {
            self.selected_index = (self.selected_index + 1) % count;
        }
    }

    pub fn previous(&mut self) {
        let count = self.visible_targets().len();
        if count > 0 {
            if self.selected_index > 0 {
                self.selected_index -= 1;
            } else {
                self.selected_index = count - 1;
            }
        }
    }

    pub fn enter_search_mode(&mut self) {
        self.search_mode = true;
        self.search_query.clear();
        self.selected_index = 0;
    }

    pub fn exit_search_mode(&mut self) {
        self.search_mode = false;
        self.search_query.clear();
        self.selected_index = 0;
    }

    pub fn search_push_char(&mut self, c: char) {
        self.search_query.push(c);
        self.selected_index = 0; // Reset selection when search changes
    }

    pub fn search_pop_char(&mut self) {
        self.search_query.pop();
        self.selected_index = 0; // Reset selection when search changes
    }

    /// Danger level for a target, if the safety checker flagged it.
    pub fn danger_for(&self, target_name: &str) -> Option<Severity> {
        self.safety.get(target_name).map(|r| r.danger_level)
    }

    /// Decide how to handle Enter on the current selection. Critical targets
    /// are blocked behind a confirmation modal; everything else starts
    /// immediately.
    pub fn request_run(&mut self) -> Option<RunDecision> {
        let name = self.selected_target()?.name.clone();
        if self.danger_for(&name) == Some(Severity::Critical) {
            self.pending_run = Some(name.clone());
            Some(RunDecision::Confirm(name))
        } else {
            Some(RunDecision::Start(name))
        }
    }

    /// Take the pending run after the user confirmed it.
    pub fn confirm_pending_run(&mut self) -> Option<String> {
        self.pending_run.take()
    }

    pub fn cancel_pending_run(&mut self) {
        self.pending_run = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Checker, SafetyConfig};
    use crate::makefile::parse_makefile_content;

    fn test_app(content: &str) -> App {
        let targets = parse_makefile_content(content);
        let graph = Graph::build(&targets);
        let checker = Checker::new(&SafetyConfig::default());
        let safety = checker.check_all_targets(&targets);
        App::new(targets, graph, safety, "Test Project".to_string())
    }

    const BASIC: &str =
        "all: build\n\t@echo done\n\nbuild:\n\tcargo build\n\nnuke-prod:\n\tterraform destroy\n";

    #[test]
    fn test_navigation_wraps() {
        let mut app = test_app(BASIC);
        assert_eq!(app.selected_index, 0);

        app.next();
        app.next();
        app.next();
        assert_eq!(app.selected_index, 0, "next should wrap to the top");

        app.previous();
        assert_eq!(app.selected_index, 2, "previous should wrap to the bottom");
    }

    #[test]
    fn test_search_filters_targets() {
        let mut app = test_app(BASIC);
        app.enter_search_mode();
        app.search_push_char('b');
        app.search_push_char('u');

        let visible = app.visible_targets();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "build");

        app.exit_search_mode();
        assert_eq!(app.visible_targets().len(), 3);
    }

    #[test]
    fn test_search_resets_selection() {
        let mut app = test_app(BASIC);
        app.next();
        app.enter_search_mode();
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_toggle_focus_cycles_panes() {
        let mut app = test_app(BASIC);
        assert_eq!(app.focus, FocusPane::TargetList);
        app.toggle_focus();
        assert_eq!(app.focus, FocusPane::Details);
        app.toggle_focus();
        assert_eq!(app.focus, FocusPane::TargetList);
    }

    #[test]
    fn test_request_run_safe_target_starts() {
        let mut app = test_app(BASIC);
        // First visible target is `all`, which is harmless.
        let decision = app.request_run().unwrap();
        assert_eq!(decision, RunDecision::Start("all".to_string()));
        assert!(app.pending_run.is_none());
    }

    #[test]
    fn test_request_run_critical_target_needs_confirmation() {
        let mut app = test_app(BASIC);
        app.next();
        app.next(); // nuke-prod
        assert_eq!(app.selected_target().unwrap().name, "nuke-prod");

        let decision = app.request_run().unwrap();
        assert_eq!(decision, RunDecision::Confirm("nuke-prod".to_string()));
        assert_eq!(app.pending_run, Some("nuke-prod".to_string()));

        assert_eq!(app.confirm_pending_run(), Some("nuke-prod".to_string()));
        assert!(app.pending_run.is_none());
    }

    #[test]
    fn test_cancel_pending_run() {
        let mut app = test_app(BASIC);
        app.next();
        app.next();
        app.request_run();
        app.cancel_pending_run();
        assert!(app.pending_run.is_none());
    }

    #[test]
    fn test_tree_scroll_bounds() {
        let mut app = test_app(BASIC);
        app.toggle_tree();
        assert!(app.show_tree);

        app.scroll_tree_up();
        assert_eq!(app.tree_scroll, 0, "scrolling up at the top stays at 0");

        let lines = app.tree_text().lines().count();
        for _ in 0..(lines + 10) {
            app.scroll_tree_down();
        }
        assert!(app.tree_scroll < lines);
    }

    #[test]
    fn test_danger_for_reflects_safety_results() {
        let app = test_app(BASIC);
        assert_eq!(app.danger_for("nuke-prod"), Some(Severity::Critical));
        assert_eq!(app.danger_for("build"), None);
    }
}
