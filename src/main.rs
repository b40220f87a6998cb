//! # Makescope CLI Entry Point
//!
//! This is the main entry point for the makescope TUI application.
//!
//! ## Overview
//!
//! Makescope turns a Makefile into browsable, analyzable data. It parses
//! target definitions, builds a dependency graph with ordering, critical-path
//! and parallelism analysis, and flags dangerous recipe commands with
//! context-aware severity.
//!
//! ## Usage
//!
//! ```bash
//! # Use the Makefile in the current directory
//! makescope
//!
//! # Use a specific directory
//! makescope --path /path/to/project
//!
//! # Use a specific Makefile
//! makescope --file ./build/Makefile
//!
//! # Headless one-shot analysis
//! makescope --report
//! makescope --tree
//! makescope --json --output analysis.json
//! ```
//!
//! ## Architecture
//!
//! 1. **Discovery**: Locates the Makefile (`Makefile`, `makefile`,
//!    `GNUmakefile`)
//! 2. **Parsing**: Extracts targets, dependencies and recipes
//! 3. **Analysis**: Builds the dependency graph and runs the safety checker
//! 4. **UI**: Presents targets in an interactive TUI with search, a
//!    dependency-tree view and safety details
//! 5. **Execution**: Runs `make <target>` with the terminal temporarily
//!    restored; Critical targets require confirmation first
//!
//! ## Key Bindings
//!
//! - `q` - Quit the application
//! - `j` / `Down`, `k` / `Up` - Move selection
//! - `Enter` - Run the selected target (confirmation modal for Critical)
//! - `t` - Toggle the dependency-tree view
//! - `/` - Enter search mode
//! - `Tab` - Toggle focus between panes
//! - `i` - Show/hide the help modal

use makescope::analysis::{Checker, Graph};
use makescope::config::Config;
use makescope::export;
use makescope::history::HistoryStore;
use makescope::makefile::{self, execute_target};
use makescope::ui::{self, App};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::panic;
use std::path::PathBuf;
use std::time::Duration;

/// Trait for reading terminal events (allows dependency injection for testing)
trait EventReader {
    fn read_event(&mut self, timeout: Duration) -> Result<Option<Event>>;
}

/// Production event reader that uses crossterm's event polling + read
struct CrosstermEventReader;

impl EventReader for CrosstermEventReader {
    fn read_event(&mut self, timeout: Duration) -> Result<Option<Event>> {
        if event::poll(timeout).context("Failed to poll for events")? {
            Ok(Some(
                event::read().context("Failed to read keyboard event")?,
            ))
        } else {
            Ok(None)
        }
    }
}

/// Makescope - a TUI for exploring, analyzing and safely running Makefile targets
#[derive(Parser, Debug)]
#[command(name = "makescope")]
#[command(author = "Luckystrike561")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Explore, analyze and safely run Makefile targets", long_about = None)]
struct Args {
    /// Path to the project directory containing the Makefile
    #[arg(short, long, value_name = "DIR", conflicts_with = "file")]
    path: Option<PathBuf>,

    /// Path to a specific Makefile
    #[arg(
        short = 'f',
        long = "file",
        value_name = "FILE",
        conflicts_with = "path"
    )]
    file: Option<PathBuf>,

    /// Print a full analysis report and exit
    #[arg(long)]
    report: bool,

    /// Print the dependency tree and exit
    #[arg(long)]
    tree: bool,

    /// Print the analysis as JSON and exit
    #[arg(long)]
    json: bool,

    /// Write headless output to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up panic hook to ensure terminal is restored on panic
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);

        original_hook(panic_info);
    }));

    let result = run_application(args).await;

    let _ = panic::take_hook();

    result
}

async fn run_application(args: Args) -> Result<()> {
    // Locate the Makefile: explicit file, or discovery in the project dir
    let makefile_path = if let Some(file_path) = args.file {
        file_path
            .canonicalize()
            .with_context(|| format!("Failed to access file: {}", file_path.display()))?
    } else {
        let project_dir = if let Some(path) = args.path {
            path.canonicalize()
                .with_context(|| format!("Failed to access directory: {}", path.display()))?
        } else {
            std::env::current_dir().context("Failed to get current working directory")?
        };

        match makefile::find_makefile(&project_dir) {
            Some(path) => path,
            None => {
                eprintln!("Warning: No Makefile found");
                eprintln!("Searched in: {}", project_dir.display());
                eprintln!("Looked for: Makefile, makefile, GNUmakefile");
                anyhow::bail!("No Makefile found in {}", project_dir.display());
            }
        }
    };

    let project_dir = makefile_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    // Parse and analyze
    let targets = makefile::parse_makefile(&makefile_path)
        .with_context(|| format!("Failed to parse: {}", makefile_path.display()))?;

    if targets.is_empty() {
        eprintln!("Warning: No targets found in {}", makefile_path.display());
        eprintln!("\nExample Makefile format:");
        eprintln!("  # Build the project");
        eprintln!("  build: deps");
        eprintln!("  \tcargo build");
        anyhow::bail!("No targets to display");
    }

    let config = Config::load(&project_dir);
    let checker = Checker::new(&config.safety);
    let graph = Graph::build(&targets);
    let safety = checker.check_all_targets(&targets);

    // Headless modes: print (or write) the analysis and exit
    if args.json || args.report || args.tree {
        let contents = if args.json {
            export::render_json_report(&makefile_path, &targets, &graph, &safety)?
        } else if args.tree {
            graph.render_tree(&makescope::analysis::TreeRenderer {
                show_order: true,
                show_critical: true,
                show_parallel: true,
            })
        } else {
            export::render_text_report(&makefile_path, &targets, &graph, &safety)
        };

        match args.output {
            Some(path) => export::write_report(&path, &contents)?,
            None => print!("{contents}"),
        }
        return Ok(());
    }

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode for terminal")?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to setup terminal")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let project_name = project_dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("Project")
        .to_string();

    let mut app = App::new(targets, graph, safety, project_name);

    // Initialize run-history tracking (gracefully handle errors)
    let mut history = match HistoryStore::new(project_dir.clone()) {
        Ok(store) => Some(store),
        Err(e) => {
            eprintln!("Warning: Could not initialize run history: {e}");
            None
        }
    };

    let mut event_reader = CrosstermEventReader;
    let run_result = run_app(
        &mut terminal,
        &mut app,
        &makefile_path,
        &mut event_reader,
        &mut history,
    )
    .await;

    // Restore terminal (always runs, even if run_app failed)
    let cleanup_result = cleanup_terminal(&mut terminal);

    run_result?;
    cleanup_result?;

    Ok(())
}

/// Clean up terminal state
fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;

    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to restore terminal")?;

    terminal.show_cursor().context("Failed to show cursor")?;

    Ok(())
}

/// Run a target with the terminal temporarily restored, then record the
/// outcome in the run history and the footer status line.
fn execute_with_suspended_tui(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    makefile_path: &std::path::Path,
    target_name: &str,
    history: &mut Option<HistoryStore>,
) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to leave alternate screen")?;

    println!("→ make {target_name}");
    let outcome = execute_target(makefile_path, target_name);

    enable_raw_mode().context("Failed to re-enable raw mode")?;
    execute!(
        terminal.backend_mut(),
        EnterAlternateScreen,
        EnableMouseCapture
    )
    .context("Failed to re-enter alternate screen")?;
    terminal.clear().context("Failed to redraw terminal")?;

    match outcome {
        Ok(outcome) => {
            let mut regression = false;
            if let Some(store) = history {
                match store.record(target_name, outcome.exit_code, outcome.duration) {
                    Ok(flag) => regression = flag,
                    Err(e) => eprintln!("Warning: Failed to record run history: {e}"),
                }
            }

            let verdict = if outcome.success { "ok" } else { "failed" };
            let mut status = format!(
                "'{}' {} (exit {}, {:.1}s)",
                target_name,
                verdict,
                outcome.exit_code,
                outcome.duration.as_secs_f64()
            );
            if regression {
                status.push_str(" (slower than usual)");
            }
            app.status = Some(status);
        }
        Err(e) => {
            app.status = Some(format!("'{target_name}' could not be started: {e}"));
        }
    }

    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    makefile_path: &std::path::Path,
    event_reader: &mut dyn EventReader,
    history: &mut Option<HistoryStore>,
) -> Result<()> {
    loop {
        terminal
            .draw(|f| ui::render(f, app))
            .context("Failed to draw terminal UI")?;

        let event = event_reader.read_event(Duration::from_millis(100))?;

        let event = match event {
            Some(e) => e,
            None => continue,
        };

        if let Event::Key(key) = event {
            // Confirmation modal takes precedence over everything else
            if app.pending_run.is_some() {
                match key.code {
                    KeyCode::Char('y') | KeyCode::Enter => {
                        if let Some(name) = app.confirm_pending_run() {
                            execute_with_suspended_tui(
                                terminal,
                                app,
                                makefile_path,
                                &name,
                                history,
                            )?;
                        }
                    }
                    KeyCode::Char('n') | KeyCode::Esc => {
                        app.cancel_pending_run();
                    }
                    _ => {}
                }
                continue;
            }

            // Handle info modal close
            if app.show_info {
                match key.code {
                    KeyCode::Char('i') | KeyCode::Esc => {
                        app.toggle_info();
                    }
                    _ => {}
                }
                continue;
            }

            // Handle search mode separately
            if app.search_mode {
                match key.code {
                    KeyCode::Esc => {
                        app.exit_search_mode();
                    }
                    KeyCode::Down => {
                        app.next();
                    }
                    KeyCode::Up => {
                        app.previous();
                    }
                    KeyCode::Backspace => {
                        app.search_pop_char();
                    }
                    KeyCode::Enter => {
                        if let Some(ui::app::RunDecision::Start(name)) = app.request_run() {
                            app.exit_search_mode();
                            execute_with_suspended_tui(
                                terminal,
                                app,
                                makefile_path,
                                &name,
                                history,
                            )?;
                        } else {
                            // Confirmation modal renders on the next draw
                            app.exit_search_mode();
                        }
                    }
                    KeyCode::Char(c) => {
                        app.search_push_char(c);
                    }
                    _ => {}
                }
                continue;
            }

            // Tree view keybindings
            if app.show_tree {
                match key.code {
                    KeyCode::Char('t') | KeyCode::Esc => {
                        app.toggle_tree();
                    }
                    KeyCode::Char('j') | KeyCode::Down => {
                        app.scroll_tree_down();
                    }
                    KeyCode::Char('k') | KeyCode::Up => {
                        app.scroll_tree_up();
                    }
                    KeyCode::Char('q') => {
                        app.should_quit = true;
                    }
                    _ => {}
                }
                if app.should_quit {
                    break;
                }
                continue;
            }

            // Normal mode keybindings
            match key.code {
                KeyCode::Char('q') | KeyCode::Char('Q') => {
                    app.should_quit = true;
                }
                KeyCode::Char('i') => {
                    app.toggle_info();
                }
                KeyCode::Char('t') => {
                    app.toggle_tree();
                }
                KeyCode::Char('/') => {
                    app.enter_search_mode();
                }
                KeyCode::Tab => {
                    app.toggle_focus();
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    app.next();
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    app.previous();
                }
                KeyCode::Enter => {
                    if let Some(ui::app::RunDecision::Start(name)) = app.request_run() {
                        execute_with_suspended_tui(terminal, app, makefile_path, &name, history)?;
                    }
                    // RunDecision::Confirm leaves pending_run set; the modal
                    // renders on the next draw.
                }
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
