use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    cursor::Show,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use worktally::{
    app::{App, Flow, Status},
    app_dirs::AppDirs,
    clock::Clock,
    config::{Config, ConfigStore, FileConfigStore},
    history::HistoryStore,
    manager::SessionManager,
    runtime::{CrosstermEventSource, EventSource, FixedTicker, Runner, Ticker},
    storage::{BlobStore, MemoryBlobStore, SqliteBlobStore},
};

const LOG_ENV: &str = "WORKTALLY_LOG";
const MIN_REFRESH_MS: u64 = 50;

/// terminal work-time tracker with pausable sessions and a persistent history
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Track work sessions from the terminal: start, pause, resume and stop a timer, then rename or delete past sessions. History survives restarts."
)]
pub struct Cli {
    /// history database location (default: ~/.local/state/worktally/history.db)
    #[clap(long, value_name = "PATH")]
    history: Option<PathBuf>,

    /// keep history in memory only, nothing is written to disk
    #[clap(long, conflicts_with = "history")]
    ephemeral: bool,

    /// timer refresh interval in milliseconds
    #[clap(long, value_name = "MS")]
    refresh_ms: Option<u64>,

    /// delete history entries without a confirmation step
    #[clap(long)]
    no_confirm_delete: bool,

    /// config file to read instead of the default location
    #[clap(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Config file values with command line overrides applied
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    refresh_interval: Duration,
    confirm_delete: bool,
    default_task_name: String,
    log_filter: String,
    history_db: Option<PathBuf>,
    ephemeral: bool,
}

impl Settings {
    fn resolve(cli: &Cli, config: Config) -> Self {
        let refresh_ms = cli
            .refresh_ms
            .unwrap_or(config.refresh_interval_ms)
            .max(MIN_REFRESH_MS);

        Self {
            refresh_interval: Duration::from_millis(refresh_ms),
            confirm_delete: config.confirm_delete && !cli.no_confirm_delete,
            default_task_name: config.default_task_name,
            log_filter: config.log_filter,
            history_db: cli.history.clone().or(config.history_db),
            ephemeral: cli.ephemeral,
        }
    }
}

/// Raw mode and the alternate screen, released on drop so every exit path
/// (errors and panics included) restores the terminal
struct TerminalGuard;

impl TerminalGuard {
    fn acquire() -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let config_store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let settings = Settings::resolve(&cli, config_store.load());
    let _log_guard = init_logging(&settings.log_filter);
    info!(?settings, "starting worktally");

    let (storage, storage_warning) = open_storage(&settings);
    let manager = SessionManager::new().with_default_task_name(settings.default_task_name.clone());
    let mut app = App::new(manager, HistoryStore::load(storage))
        .with_confirm_delete(settings.confirm_delete);
    app.status = storage_warning.map(|message| Status {
        message,
        is_error: true,
    });

    let guard = TerminalGuard::acquire()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(settings.refresh_interval),
    );

    let result = run_tui(&mut terminal, &mut app, &runner);
    // a failed draw must not lose the running session
    app.shutdown();
    drop(guard);

    info!("worktally exited");
    result
}

fn run_tui<B, C, S, E, T>(
    terminal: &mut Terminal<B>,
    app: &mut App<C, S>,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>>
where
    B: Backend,
    C: Clock,
    S: BlobStore,
    E: EventSource,
    T: Ticker,
{
    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        // ticks only while a session is active; idle waits on input
        let Some(event) = runner.step(app.wants_refresh()) else {
            warn!("terminal event source closed");
            break;
        };

        if app.handle_event(event) == Flow::Quit {
            break;
        }
    }

    Ok(())
}

/// Open the configured history medium. Storage that cannot be opened
/// degrades to an in-memory history with a warning for the status line.
fn open_storage(settings: &Settings) -> (Box<dyn BlobStore>, Option<String>) {
    if settings.ephemeral {
        info!("using in-memory history");
        return (Box::new(MemoryBlobStore::new()), None);
    }

    let opened = match &settings.history_db {
        Some(path) => SqliteBlobStore::open(path),
        None => SqliteBlobStore::new(),
    };

    match opened {
        Ok(store) => (Box::new(store), None),
        Err(err) => {
            warn!(error = %err, "history storage unavailable, keeping history in memory");
            (
                Box::new(MemoryBlobStore::new()),
                Some(format!("history will not be saved: {err}")),
            )
        }
    }
}

/// Log to a file in the state directory; the terminal belongs to the UI.
/// `WORKTALLY_LOG` takes precedence over the configured filter.
fn init_logging(filter: &str) -> Option<WorkerGuard> {
    let dir = AppDirs::log_dir()?;
    std::fs::create_dir_all(&dir).ok()?;

    let appender = tracing_appender::rolling::never(&dir, "worktally.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Some(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::try_parse_from(["worktally"]).unwrap();
        assert_eq!(cli.history, None);
        assert!(!cli.ephemeral);
        assert_eq!(cli.refresh_ms, None);
        assert!(!cli.no_confirm_delete);
    }

    #[test]
    fn test_cli_history_path() {
        let cli = Cli::try_parse_from(["worktally", "--history", "/tmp/h.db"]).unwrap();
        assert_eq!(cli.history, Some(PathBuf::from("/tmp/h.db")));
    }

    #[test]
    fn test_cli_ephemeral_conflicts_with_history() {
        let result = Cli::try_parse_from(["worktally", "--ephemeral", "--history", "/tmp/h.db"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_use_config_defaults() {
        let cli = Cli::try_parse_from(["worktally"]).unwrap();
        let settings = Settings::resolve(&cli, Config::default());
        assert_eq!(settings.refresh_interval, Duration::from_millis(1000));
        assert!(settings.confirm_delete);
        assert_eq!(settings.default_task_name, "Untitled Task");
        assert_eq!(settings.history_db, None);
    }

    #[test]
    fn test_settings_cli_overrides_config() {
        let cli = Cli::try_parse_from([
            "worktally",
            "--refresh-ms",
            "250",
            "--no-confirm-delete",
            "--history",
            "/tmp/cli.db",
        ])
        .unwrap();
        let config = Config {
            history_db: Some(PathBuf::from("/tmp/config.db")),
            ..Config::default()
        };

        let settings = Settings::resolve(&cli, config);
        assert_eq!(settings.refresh_interval, Duration::from_millis(250));
        assert!(!settings.confirm_delete);
        assert_eq!(settings.history_db, Some(PathBuf::from("/tmp/cli.db")));
    }

    #[test]
    fn test_settings_clamp_refresh_interval() {
        let cli = Cli::try_parse_from(["worktally", "--refresh-ms", "0"]).unwrap();
        let settings = Settings::resolve(&cli, Config::default());
        assert_eq!(settings.refresh_interval, Duration::from_millis(MIN_REFRESH_MS));
    }

    #[test]
    fn test_ephemeral_storage_starts_empty() {
        let cli = Cli::try_parse_from(["worktally", "--ephemeral"]).unwrap();
        let settings = Settings::resolve(&cli, Config::default());
        let (storage, warning) = open_storage(&settings);
        assert!(warning.is_none());
        assert!(HistoryStore::load(storage).is_empty());
    }
}
