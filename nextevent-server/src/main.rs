mod fetch;
mod routes;
mod server;
mod state;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nextevent_core::{DisplayOptions, Settings};

use crate::routes::next_event::BaseResponse;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "nextevent")]
#[command(about = "Pick the next calendar event to show on a small display")]
struct Cli {
    /// Config file (defaults to ~/.config/nextevent/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the next event of a feed as JSON
    Next {
        /// ICS feed URL (http, https or webcal)
        #[arg(long, required_unless_present = "file", conflicts_with = "file")]
        url: Option<String>,

        /// Read the feed from a local .ics file instead
        #[arg(long)]
        file: Option<PathBuf>,

        /// Viewer time zone, e.g. "America/New_York"
        #[arg(long)]
        tz: String,

        /// Skip events that have already started
        #[arg(long)]
        hide_in_progress: bool,

        #[arg(long)]
        exclude_all_day: bool,

        #[arg(long)]
        only_all_day: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port } => {
            let state = AppState::new(settings)?;
            let host = host.unwrap_or_else(|| state.settings().host.clone());
            let port = port.unwrap_or(state.settings().port);
            server::serve(state, &host, port).await
        }
        Commands::Next {
            url,
            file,
            tz,
            hide_in_progress,
            exclude_all_day,
            only_all_day,
        } => {
            let state = AppState::new(settings)?;
            let options = DisplayOptions {
                include_all_day: !exclude_all_day,
                only_all_day,
                show_in_progress: !hide_in_progress,
            };
            let response = next(&state, url, file, &tz, &options).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
    }
}

async fn next(
    state: &AppState,
    url: Option<String>,
    file: Option<PathBuf>,
    tz: &str,
    options: &DisplayOptions,
) -> Result<BaseResponse> {
    let viewer = state.zone(tz)?;

    let content = match (url, file) {
        (_, Some(path)) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Could not read {}", path.display()))?,
        (Some(url), None) => {
            let url = fetch::feed_url(&url).map_err(|e| anyhow::anyhow!(e))?;
            state.download(&url).await?
        }
        (None, None) => anyhow::bail!("Either --url or --file is required"),
    };

    Ok(state.respond(&content, viewer, options, Utc::now())?)
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}=info,nextevent_core=info,tower_http=debug",
                    env!("CARGO_CRATE_NAME")
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
