//! userbook binary entry point.
//!
//! Parses configuration, starts logging and the backend worker, initializes
//! the terminal in raw mode, runs the TUI event loop, and restores the
//! terminal state on exit.
//!
use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use userbook::app::{self, AppState};
use userbook::backend;
use userbook::cli::Cli;
use userbook::gateway::UserGateway;
use userbook::logging;

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) {
    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();
}

/// Program entry point: run the TUI and report any top-level error to stderr.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_dir = cli.config_dir();
    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("create config dir {}", config_dir.display()))?;
    logging::init(&cli.log_file(), &cli.log_level)?;
    tracing::info!(base_url = %cli.base_url, config_dir = %config_dir.display(), "starting userbook");

    let gateway = UserGateway::new(&cli.base_url)?;
    let mut worker = backend::spawn(gateway, cli.refresh_interval())?;
    let mut state = AppState::from_config_dir(cli.base_url.clone(), &config_dir);

    let mut terminal = init_terminal().context("init terminal")?;
    let res = app::run(&mut terminal, &mut state, &worker);
    restore_terminal(&mut terminal);
    worker.shutdown();

    if let Err(err) = res {
        tracing::error!(error = %err, "application error");
        eprintln!("application error: {err}");
    }
    tracing::info!("userbook stopped");
    Ok(())
}
