//! ladder-view - Main Entry Point
//!
//! Terminal front end: prints a window of a ladder and runs ladder actions.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use ladder_view::constants::LOG_FILE_NAME;
use ladder_view::domain::{Ladder, LadderId};
use ladder_view::domain::config::AppConfig;
use ladder_view::helpers::{get_or_create_data_dir, is_development};
use ladder_view::services::HttpLadderApi;
use ladder_view::state::{LadderView, SlotRequest, Viewport};
use ladder_view::utils::config_store::{default_config_path, load_config, save_config};
use ladder_view::utils::format::{format_header, format_row};

#[derive(Parser)]
#[command(name = "ladder-view", version, about = "Browse and act on Go server ladders")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override `server.base_url`
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Also write logs to the data directory
    #[arg(long, global = true)]
    log_file: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the ladder header and a window of rows
    Show {
        ladder: LadderId,
        /// First rank to show; without it the window centres on your rank
        #[arg(long)]
        top: Option<u64>,
        /// Number of rows to print
        #[arg(long)]
        rows: Option<usize>,
    },
    /// Join a ladder
    Join { ladder: LadderId },
    /// Leave a ladder
    Leave { ladder: LadderId },
    /// Challenge a player
    Challenge { ladder: LadderId, player_id: u64 },
    /// Move a player to another rank (moderators)
    Adjust {
        ladder: LadderId,
        player_id: u64,
        rank: u64,
    },
    /// Print the effective configuration
    Config {
        /// Also write it back to the config file
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.log_file)?;

    let (path, config) = effective_config(&cli)?;
    tracing::debug!("Using {}", config.server.base_url);
    let page_size = config.list.page_size;

    match cli.command {
        Command::Config { write } => {
            print!("{}", toml::to_string_pretty(&config)?);
            if write {
                save_config(&path, &config)?;
                eprintln!("Saved {}", path.display());
            }
        }
        Command::Show { ladder, top, rows } => {
            show(client(&config)?, &config, ladder, top, rows).await?;
        }
        Command::Join { ladder } => {
            let mut view = LadderView::new(client(&config)?, ladder, page_size);
            print_header(view.join().await?);
        }
        Command::Leave { ladder } => {
            let mut view = LadderView::new(client(&config)?, ladder, page_size);
            print_header(view.leave().await?);
        }
        Command::Challenge { ladder, player_id } => {
            let mut view = LadderView::new(client(&config)?, ladder, page_size);
            print_header(view.challenge(player_id).await?);
        }
        Command::Adjust {
            ladder,
            player_id,
            rank,
        } => {
            let mut view = LadderView::new(client(&config)?, ladder, page_size);
            print_header(view.adjust_position(player_id, rank).await?);
        }
    }

    Ok(())
}

fn client(config: &AppConfig) -> Result<Arc<HttpLadderApi>> {
    Ok(Arc::new(HttpLadderApi::new(&config.server)?))
}

/// Install the stderr subscriber, plus a daily log file when asked
///
/// The returned guard flushes the file writer on drop.
fn init_logging(log_file: bool) -> Result<Option<WorkerGuard>> {
    let level = if is_development() {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let (file_layer, guard) = if log_file {
        let appender = tracing_appender::rolling::daily(get_or_create_data_dir()?, LOG_FILE_NAME);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (
            Some(fmt::layer().with_ansi(false).with_writer(writer)),
            Some(guard),
        )
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(guard)
}

fn effective_config(cli: &Cli) -> Result<(PathBuf, AppConfig)> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let mut config =
        load_config(&path).with_context(|| format!("loading {}", path.display()))?;

    if let Some(base_url) = &cli.base_url {
        config.set_base_url(base_url);
    }
    config
        .validate()
        .with_context(|| format!("checking {}", path.display()))?;
    Ok((path, config))
}

async fn show(
    api: Arc<HttpLadderApi>,
    config: &AppConfig,
    ladder: LadderId,
    top: Option<u64>,
    rows: Option<usize>,
) -> Result<()> {
    let mut view = LadderView::new(api, ladder, config.list.page_size);
    print_header(view.resolve().await?);
    println!();

    let viewport = Viewport::with_rows(
        config.list.row_height,
        rows.unwrap_or(config.list.viewport_rows),
        config.list.overscan,
    );
    let mut list = view.virtual_list(viewport);
    let requests = match top {
        Some(rank) => {
            let offset = rank
                .saturating_sub(1)
                .saturating_mul(u64::from(viewport.row_height));
            list.scroll_to(offset, false)
        }
        None => list.scroll_to_index(view.scroll_to_index().unwrap_or(0)),
    };

    let updates = futures::future::join_all(requests.into_iter().map(SlotRequest::resolve)).await;
    for update in updates {
        if let Err(err) = &update.update.result {
            tracing::warn!("Row {} not loaded: {}", update.update.index, err);
        }
        list.apply(update);
    }

    for row in list.rows() {
        println!("{}", format_row(&row));
    }
    Ok(())
}

fn print_header(ladder: &Ladder) {
    for line in format_header(ladder) {
        println!("{line}");
    }
}
