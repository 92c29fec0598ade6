use anyhow::{Context, Result};
use clap::Parser;
use heatboard::{
    config::{self, Choice, Settings},
    display::TextBoard,
    fetch::{LiveSource, MockSource, Source, DEMO_CSV},
    poll::Poller,
};
use std::{fs, path::PathBuf, time::Duration};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Big-number event/heat board fed from a published spreadsheet.
#[derive(Parser)]
struct Cli {
    /// Sheet id, or the sheet's URL as copied from the browser
    #[arg(short, long)]
    sheet: Option<String>,

    /// Full CSV export URL; overrides --sheet
    #[arg(long)]
    url: Option<String>,

    /// Skip the network and show mock data straight away
    #[arg(long)]
    offline: bool,

    /// CSV file to serve in offline mode instead of the packaged demo
    #[arg(long)]
    mock_file: Option<PathBuf>,

    /// Seconds between polls
    #[arg(short, long)]
    interval: Option<u64>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Settings file remembering the sheet between runs
    #[arg(long, default_value = config::DEFAULT_SETTINGS_FILE)]
    settings: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    // stdout belongs to the board
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    let cli = Cli::parse();

    // ─── 2) settings ─────────────────────────────────────────────────
    let mut settings = Settings::load(&cli.settings)?;
    let given = config::sheet_to_remember(cli.offline, cli.url.as_deref(), cli.sheet.as_deref());
    if let Some(id) = given {
        if settings.sheet_id.as_deref() != Some(id.as_str()) {
            settings.sheet_id = Some(id);
            if let Err(e) = settings.save(&cli.settings) {
                warn!(error = %e, "could not remember sheet id");
            }
        }
    }

    let interval = cli
        .interval
        .filter(|s| *s > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| settings.poll_interval());
    let timeout = cli
        .timeout
        .filter(|s| *s > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| settings.fetch_timeout());

    // ─── 3) pick a source and poll ───────────────────────────────────
    match config::choose_source(cli.offline, cli.url.as_deref(), cli.sheet.as_deref(), &settings)? {
        Choice::Live(url) => {
            info!(%url, "live mode");
            let source = LiveSource::new(url, timeout).context("building HTTP client")?;
            run_board(source, interval).await
        }
        Choice::Offline { demo } => {
            if demo {
                warn!("no sheet configured (use --sheet); showing demo data");
            }
            let csv = match &cli.mock_file {
                Some(path) => fs::read_to_string(path)
                    .with_context(|| format!("reading mock data {}", path.display()))?,
                None => DEMO_CSV.to_string(),
            };
            run_board(MockSource::new(csv), interval).await
        }
    }
}

async fn run_board<S: Source>(source: S, interval: Duration) -> Result<()> {
    let mut poller = Poller::new(source, TextBoard::stdout(), interval);
    tokio::select! {
        _ = poller.run() => {}
        res = tokio::signal::ctrl_c() => {
            res.context("listening for ctrl-c")?;
            info!("shutting down");
        }
    }
    Ok(())
}
