//! Live Session TUI Entry Point
//!
//! Launches the terminal surface: chat on the left, the live media panel on
//! the right once it is opened.
//!
//! Usage:
//!   live-session-tui [OPTIONS]
//!
//! Keys:
//!   Enter     send the draft message
//!   F2        open/close the media panel
//!   F3 / F4   mute / camera on-off
//!   F5 / F6   chat / settings popup
//!   F7        gift
//!   Esc       close the media panel, or quit

use std::io;
use std::panic;
use std::path::PathBuf;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use live_session_core::config::{default_config_path, load_config_from_path};
use live_session_core::{ConfigOverrides, SessionConfigFile, SimulatedOutcome};
use live_session_tui::App;

/// Live session terminal surface
#[derive(Parser, Debug)]
#[command(name = "live-session-tui")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "LIVE_SESSION_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Delay before the simulated reply, in milliseconds
    #[arg(long, value_name = "MS")]
    reply_delay_ms: Option<u64>,

    /// Text of the simulated reply
    #[arg(long, value_name = "TEXT")]
    reply_text: Option<String>,

    /// Capture the camera only (no microphone)
    #[arg(long)]
    video_only: bool,

    /// Simulated acquisition latency, in milliseconds
    #[arg(long, value_name = "MS")]
    device_latency_ms: Option<u64>,

    /// Simulated permission answer (grant, deny, unavailable)
    #[arg(long, value_name = "OUTCOME", value_parser = parse_outcome)]
    device_outcome: Option<SimulatedOutcome>,

    /// Write logs to this file (nothing is logged otherwise)
    #[arg(long, env = "LIVE_SESSION_LOG", value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

fn parse_outcome(s: &str) -> Result<SimulatedOutcome, String> {
    SimulatedOutcome::parse(s).ok_or_else(|| format!("unknown outcome '{s}'"))
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(ms) = self.reply_delay_ms {
            overrides = overrides.with_reply_delay_ms(ms);
        }
        if let Some(ref text) = self.reply_text {
            overrides = overrides.with_reply_text(text.clone());
        }
        if self.video_only {
            overrides = overrides.with_video_only(true);
        }
        if let Some(ms) = self.device_latency_ms {
            overrides = overrides.with_device_latency_ms(ms);
        }
        if let Some(outcome) = self.device_outcome {
            overrides = overrides.with_device_outcome(outcome);
        }
        overrides
    }
}

/// Install the file logger; the screen belongs to the UI
fn init_logging(log_file: Option<&PathBuf>, level: &str) -> anyhow::Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "live_session_tui={level},live_session_core={level}"
        ))
    });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file)),
        )
        .with(filter)
        .init();
    Ok(())
}

fn load_session_config(args: &Args) -> anyhow::Result<SessionConfigFile> {
    let path = args.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(path)?;
    args.overrides().apply(&mut config);
    config.validate()?;

    tracing::info!(
        source = %config.source(),
        outcome = ?config.device_outcome,
        "Configuration loaded"
    );
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_ref(), &args.log_level)?;
    let config = load_session_config(&args)?;

    // Check if we have a TTY before attempting initialization
    use std::io::IsTerminal;

    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: live-session-tui requires a terminal (TTY)");
        eprintln!();
        eprintln!("This usually means:");
        eprintln!("  • Running in a non-interactive environment (CI, container)");
        eprintln!("  • SSH without -t flag");
        eprintln!("  • Piped stdin/stdout");
        std::process::exit(1);
    }

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Restore terminal before printing panic
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut app = App::new(&config);
    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Some(goodbye) = app.goodbye() {
        println!("\n\x1b[35mAssistant:\x1b[0m {goodbye}\n");
    }

    // Propagate any errors
    result
}
