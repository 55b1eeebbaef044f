use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use neura::config::AppConfig;
use neura::tui::app::AppState;
use neura::tui::events::Action;
use neura::tui::services::Services;

#[derive(Parser)]
#[command(author, version, about = "Terminal client for Neura study guides", long_about = None)]
struct Cli {
    /// Backend base URL (overrides config and NEURA_API_URL)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Open this workspace's uploads page on start
    #[arg(long, value_name = "ID")]
    workspace: Option<String>,

    /// Config file (default: ~/.config/neura/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logging needs the data dir, so config errors are reported after init.
    let (mut config, config_error) = match AppConfig::try_load(cli.config.as_deref()) {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    if let Some(url) = cli.api_url {
        config.backend.base_url = Some(url);
        config.validate()?;
    }

    if cli.print_config {
        if let Some(e) = config_error {
            eprintln!("{e}; using defaults");
        }
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let _log_guard = neura::core::logging::init_tui(&config.data_dir());
    log::info!("Neura v{} starting", neura::VERSION);
    if let Some(e) = config_error {
        log::warn!("{e}; using defaults");
    }

    let tick_rate = Duration::from_millis(config.tui.tick_rate_ms.max(1));
    let mouse = config.tui.mouse_enabled;

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let services = Services::init(config, event_tx.clone())?;
    let mut app = AppState::new(event_rx, event_tx, services);
    if let Some(id) = cli.workspace.filter(|id| !id.trim().is_empty()) {
        app.dispatch(Action::SelectWorkspace(id));
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    if mouse {
        execute!(stdout, EnableMouseCapture)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app.run(&mut terminal, tick_rate).await;

    // Restore terminal
    disable_raw_mode()?;
    if mouse {
        execute!(terminal.backend_mut(), DisableMouseCapture)?;
    }
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        log::error!("Event loop failed: {e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    log::info!("Neura exiting");
    Ok(())
}
