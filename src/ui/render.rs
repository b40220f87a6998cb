use crate::analysis::Severity;
use crate::ui::app::{App, FocusPane};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

pub fn render(frame: &mut Frame, app: &App) {
    // Main layout: Header + Body + Footer
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Body
            Constraint::Length(1), // Footer
        ])
        .split(frame.area());

    render_header(frame, app, main_chunks[0]);

    // Split body into left (targets) and right (details or tree)
    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(main_chunks[1]);

    render_target_list(frame, app, body_chunks[0]);

    if app.show_tree {
        render_tree(frame, app, body_chunks[1]);
    } else {
        render_details(frame, app, body_chunks[1]);
    }

    render_footer(frame, app, main_chunks[2]);

    if app.show_info {
        render_info_modal(frame, frame.area());
    }
    if app.pending_run.is_some() {
        render_confirm_modal(frame, app, frame.area());
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Info => Color::Blue,
        Severity::Warning => Color::Yellow,
        Severity::Critical => Color::Red,
    }
}

fn severity_marker(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "·",
        Severity::Warning => "⚠",
        Severity::Critical => "✗",
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.graph.has_cycle {
        format!(
            "  MAKESCOPE - {}  (dependency cycle detected)  ",
            app.project_name
        )
    } else {
        format!("  MAKESCOPE - {}  ", app.project_name)
    };

    let header_text = vec![Line::from(vec![Span::styled(
        title,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )])];

    let header = Paragraph::new(header_text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    frame.render_widget(header, area);
}

fn render_target_list(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .visible_targets()
        .iter()
        .enumerate()
        .map(|(i, target)| {
            let is_selected = i == app.selected_index;
            let danger = app.danger_for(&target.name);

            let style = if is_selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else if let Some(severity) = danger {
                Style::default().fg(severity_color(severity))
            } else {
                Style::default().fg(Color::White)
            };

            let marker = danger.map_or(" ", severity_marker);
            let critical_mark = app
                .graph
                .nodes
                .get(&target.name)
                .filter(|node| node.is_critical)
                .map_or("", |_| " ★");
            let content = format!("{} {}{}", marker, target.name, critical_mark);
            ListItem::new(content).style(style)
        })
        .collect();

    let border_color = if app.focus == FocusPane::TargetList {
        Color::Cyan
    } else {
        Color::Gray
    };

    let title = if app.search_mode {
        format!("Targets (search: {})", app.search_query)
    } else {
        format!("Targets ({})", app.visible_targets().len())
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(border_color)),
        )
        .style(Style::default().fg(Color::White));

    frame.render_widget(list, area);
}

fn render_details(frame: &mut Frame, app: &App, area: Rect) {
    let border_color = if app.focus == FocusPane::Details {
        Color::Cyan
    } else {
        Color::Gray
    };

    let text = match app.selected_target() {
        Some(target) => {
            let mut lines = vec![
                Line::from(vec![Span::styled(
                    target.name.clone(),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )]),
                Line::from(""),
            ];

            if !target.description.is_empty() {
                lines.push(Line::from(target.description.clone()));
                lines.push(Line::from(""));
            }

            if let Some(node) = app.graph.nodes.get(&target.name) {
                if node.order > 0 {
                    lines.push(Line::from(vec![
                        Span::styled("Order: ", Style::default().fg(Color::Gray)),
                        Span::raw(format!("{}", node.order)),
                    ]));
                }
                lines.push(Line::from(vec![
                    Span::styled("Critical path: ", Style::default().fg(Color::Gray)),
                    Span::raw(if node.is_critical { "yes" } else { "no" }),
                ]));
                lines.push(Line::from(vec![
                    Span::styled("Parallelizable: ", Style::default().fg(Color::Gray)),
                    Span::raw(if node.can_parallel { "yes" } else { "no" }),
                ]));
                lines.push(Line::from(""));
            }

            if !target.dependencies.is_empty() {
                lines.push(Line::from(Span::styled(
                    "Dependencies:",
                    Style::default().fg(Color::Gray),
                )));
                for dep in &target.dependencies {
                    let external = app
                        .graph
                        .nodes
                        .get(dep)
                        .is_some_and(|node| node.is_placeholder());
                    if external {
                        lines.push(Line::from(format!(
                            "  {dep} (external or file dependency)"
                        )));
                    } else {
                        lines.push(Line::from(format!("  {dep}")));
                    }
                }
                lines.push(Line::from(""));
            }

            if !target.recipe.is_empty() {
                lines.push(Line::from(Span::styled(
                    "Recipe:",
                    Style::default().fg(Color::Gray),
                )));
                for line in &target.recipe {
                    lines.push(Line::from(format!("  {line}")));
                }
                lines.push(Line::from(""));
            }

            if let Some(result) = app.safety.get(&target.name) {
                lines.push(Line::from(vec![
                    Span::styled("Safety: ", Style::default().fg(Color::Gray)),
                    Span::styled(
                        result.danger_level.to_string(),
                        Style::default()
                            .fg(severity_color(result.danger_level))
                            .add_modifier(Modifier::BOLD),
                    ),
                ]));
                for m in &result.matches {
                    lines.push(Line::from(vec![
                        Span::styled(
                            format!("  [{}] ", m.severity),
                            Style::default().fg(severity_color(m.severity)),
                        ),
                        Span::raw(m.description.clone()),
                    ]));
                    lines.push(Line::from(format!("    line: {}", m.line)));
                    if !m.suggestion.is_empty() {
                        lines.push(Line::from(format!("    hint: {}", m.suggestion)));
                    }
                }
                lines.push(Line::from(""));
            }

            lines.push(Line::from("────────────────────────────────────────"));
            lines.push(Line::from("Press Enter to run this target"));
            lines
        }
        None => vec![
            Line::from("No target selected"),
            Line::from(""),
            Line::from("Use ↑↓ or j/k to navigate"),
        ],
    };

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Target Details")
                .border_style(Style::default().fg(border_color)),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn render_tree(frame: &mut Frame, app: &App, area: Rect) {
    let text: Vec<Line> = app
        .tree_text()
        .lines()
        .skip(app.tree_scroll)
        .map(|line| Line::from(line.to_string()))
        .collect();

    let paragraph = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Dependency Tree")
            .border_style(Style::default().fg(Color::Magenta)),
    );

    frame.render_widget(paragraph, area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = if app.search_mode {
        "[Esc] Cancel Search  [Enter] Run  [↑↓] Navigate".to_string()
    } else if let Some(status) = &app.status {
        format!("{status}  |  [Enter] Run  [t] Tree  [/] Search  [i] Info  [q] Quit")
    } else {
        "[↑↓/jk] Navigate  [Enter] Run  [t] Tree  [/] Search  [Tab] Switch  [i] Info  [q] Quit"
            .to_string()
    };

    let footer = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default());

    frame.render_widget(footer, area);
}

fn render_info_modal(frame: &mut Frame, area: Rect) {
    let modal = centered_rect(60, 50, area);
    frame.render_widget(Clear, modal);

    let text = vec![
        Line::from(Span::styled(
            "makescope",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Explore, analyze and safely run Makefile targets."),
        Line::from(""),
        Line::from("  ↑↓ / jk   navigate targets"),
        Line::from("  Enter     run the selected target"),
        Line::from("  t         toggle the dependency tree view"),
        Line::from("  /         search targets"),
        Line::from("  Tab       switch panes"),
        Line::from("  i         toggle this help"),
        Line::from("  q         quit"),
        Line::from(""),
        Line::from("Critical targets ask for confirmation before running."),
    ];

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help")
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, modal);
}

fn render_confirm_modal(frame: &mut Frame, app: &App, area: Rect) {
    let name = app.pending_run.clone().unwrap_or_default();
    let modal = centered_rect(60, 30, area);
    frame.render_widget(Clear, modal);

    let mut text = vec![
        Line::from(Span::styled(
            format!("Run '{name}'?"),
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    if let Some(result) = app.safety.get(&name) {
        for m in &result.matches {
            text.push(Line::from(vec![
                Span::styled(
                    format!("[{}] ", m.severity),
                    Style::default().fg(severity_color(m.severity)),
                ),
                Span::raw(m.description.clone()),
            ]));
        }
        text.push(Line::from(""));
    }

    text.push(Line::from("[y/Enter] Run anyway    [n/Esc] Cancel"));

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("⚠ Dangerous Target")
                .border_style(Style::default().fg(Color::Red)),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, modal);
}

/// Centered sub-rectangle taking the given percentage of the area.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
