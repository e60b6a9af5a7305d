//! Terminal driver for the location screen.
//!
//! # Responsibility
//! - Run the "get current" / "get saved" actions against the real cache.
//! - Simulate the device location service from command-line flags.

use clap::{Args, Parser, Subcommand};
use locsnap_core::{
    init_logging, CoreConfig, LocationScreen, LocationView, Position, PushLocationProvider,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const DEVICE_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Parser)]
#[command(name = "locsnap", version, about = "Location screen with cached fallback")]
struct Cli {
    /// Cache database file (overrides LOCSNAP_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Absolute directory for rolling log files
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Press "get current location" with a simulated device
    Current(CurrentArgs),

    /// Press "get saved location"
    Saved,
}

#[derive(Args)]
struct CurrentArgs {
    /// Latitude the simulated device reports
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    lat: Option<f64>,

    /// Longitude the simulated device reports
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    lon: Option<f64>,

    /// Delay before the simulated device answers
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,

    /// Make the simulated device report a failure
    #[arg(long, conflicts_with = "lat")]
    fail: bool,

    /// Deny the location permission prompt
    #[arg(long)]
    deny: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match CoreConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(log_dir) = cli.log_dir.as_deref() {
        if let Err(err) = init_logging(&config.log_level, log_dir) {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    }

    let provider = Arc::new(PushLocationProvider::new());
    let mut screen = LocationScreen::from_config(&config, Arc::clone(&provider));
    if let Err(err) = screen.mount() {
        eprintln!("error: cannot open {}: {err}", config.db_path.display());
        return ExitCode::FAILURE;
    }

    let view: LocationView = match cli.command {
        Command::Current(args) => {
            provider.set_permission(!args.deny);
            let device = simulate_device(Arc::clone(&provider), &args);
            let view = screen.get_current().await.clone();
            device.abort();
            view
        }
        Command::Saved => screen.get_saved().await.clone(),
    };

    for line in view.render_lines() {
        println!("{line}");
    }

    if let Err(err) = screen.unmount() {
        log::warn!("event=cli_exit module=cli status=error error={err}");
    }
    if view.coordinate.is_some() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Answers the parked position request the way the flags describe.
///
/// Without coordinates and without `--fail` the device never answers, so the
/// action runs into the acquire timeout. The answer is addressed to whichever
/// request is parked once the delay has passed.
fn simulate_device(provider: Arc<PushLocationProvider>, args: &CurrentArgs) -> JoinHandle<bool> {
    let delay = Duration::from_millis(args.delay_ms);
    let fix = args.lat.zip(args.lon).map(|(lat, lon)| Position::new(lat, lon));
    let fail = args.fail;

    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let request_id = loop {
            if let Some(request_id) = provider.pending_request() {
                break request_id;
            }
            tokio::time::sleep(DEVICE_POLL_INTERVAL).await;
        };
        match (fail, fix) {
            (true, _) => provider.report_failure(request_id, "simulated device failure"),
            (false, Some(position)) => provider.report_fix(request_id, position),
            (false, None) => false,
        }
    })
}
