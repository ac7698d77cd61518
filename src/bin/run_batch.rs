//! Run a single batch over all rooms and exit. Intended for cron.

use std::path::PathBuf;

use anyhow::Result;
use article_digest_bot::{
    config::{load_settings_default, settings::load_settings_from, AppConfig},
    telemetry, Services,
};
use clap::Parser;
use tracing::warn;

#[derive(Debug, Parser)]
#[command(name = "run-batch", about = "Post one unseen article to every registered room")]
struct Args {
    /// Settings TOML (defaults to $DIGEST_CONFIG_PATH, then config/digest.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read rooms, interests and history as usual, but print the messages
    /// instead of posting them and write nothing back.
    #[arg(long)]
    dry_run: bool,

    /// Print the run report as JSON on stdout.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => load_settings_from(path)?,
        None => load_settings_default()?,
    };

    let cfg = AppConfig::from_env();
    let missing = cfg.missing();
    if !missing.is_empty() {
        warn!(?missing, "required settings are unset; affected calls will fail");
    }
    let services = Services::from_config(&cfg)?;
    let (services, preview) = if args.dry_run {
        let (services, chat) = services.into_dry_run();
        (services, Some(chat))
    } else {
        (services, None)
    };

    let report = services.runner(&settings).run_once().await?;

    if let Some(chat) = preview {
        for (room_id, body) in chat.posted() {
            println!("--- room {room_id}\n{body}");
        }
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "rooms={} delivered={} not_found={} failed={}",
            report.rooms.len(),
            report.delivered(),
            report.not_found(),
            report.failed()
        );
    }
    Ok(())
}
