use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::sync::mpsc;

use pressdesk::api::ApiClient;
use pressdesk::app::{App, AppEvent, Route};
use pressdesk::config::{Config, API_BASE_ENV};
use pressdesk::session::SessionStore;
use pressdesk::ui;

/// Get the config directory path (~/.config/pressdesk/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("pressdesk"))
}

#[derive(Parser, Debug)]
#[command(
    name = "pressdesk",
    about = "Terminal content-management console for an article publishing platform"
)]
struct Args {
    /// Config file (default: ~/.config/pressdesk/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// API root URL, overrides the config file and PRESSDESK_API_BASE
    #[arg(long, value_name = "URL")]
    api_base: Option<String>,

    /// Clear the saved session and exit
    #[arg(long)]
    logout: bool,

    /// Print the logged-in user and exit
    #[arg(long)]
    whoami: bool,
}

/// Log to `<config_dir>/pressdesk.log` when `RUST_LOG` is set. Stdout belongs
/// to the TUI, so nothing is logged otherwise.
fn init_logging(config_dir: &std::path::Path) -> Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        return Ok(());
    }
    let log_path = config_dir.join("pressdesk.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Restrict the config directory to the current user; it holds the session token.
#[cfg(unix)]
fn restrict_permissions(config_dir: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    match std::fs::metadata(config_dir) {
        Ok(metadata) => {
            let mut perms = metadata.permissions();
            perms.set_mode(0o700);
            if let Err(e) = std::fs::set_permissions(config_dir, perms) {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to set config directory permissions to 0700"
                );
            }
        }
        Err(e) => {
            tracing::warn!(
                path = %config_dir.display(),
                error = %e,
                "Failed to read config directory metadata"
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }
    init_logging(&config_dir)?;
    #[cfg(unix)]
    restrict_permissions(&config_dir);

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    config.resolve_api_base(args.api_base.as_deref(), std::env::var(API_BASE_ENV).ok());

    let session = SessionStore::open(config_dir.join("session.json"));

    if args.logout {
        session.clear().context("Failed to remove saved session")?;
        println!("Logged out.");
        return Ok(());
    }

    if args.whoami {
        match session.user() {
            Some(user) => println!("{}", user.display_name()),
            None => println!("Not logged in."),
        }
        return Ok(());
    }

    let api = ApiClient::new(&config.api_base_url, session)
        .with_context(|| format!("Invalid API base URL '{}'", config.api_base_url))?;
    tracing::info!(api_base = %api.base_url(), "Starting pressdesk");

    let mut app = App::new(config, api);
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    // Protected routes fall back to login when there is no saved session
    app.navigate(Route::Articles, &event_tx);

    ui::run(&mut app, event_tx, event_rx).await?;
    Ok(())
}
