//! Planetary AI - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use planetary_ai::{
    app::AppContext,
    cli::{Args, Commands},
    config::Config,
    server, telemetry,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    telemetry::init_tracing(args.verbosity());

    let mut config = Config::load(args.config.as_deref())?;
    args.apply_overrides(&mut config);
    config.validate()?;

    match args.command() {
        Commands::Serve { .. } => {
            let addr = config.bind_addr();
            let state = load_context(config).await?;
            server::serve(&addr, state).await
        }
        Commands::Ask { query, .. } => {
            let spinner = args.verbosity().show_progress().then(|| {
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.cyan} {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                pb.set_message("Loading models...");
                pb.enable_steady_tick(Duration::from_millis(100));
                pb
            });

            let state = load_context(config).await?;
            if let Some(pb) = &spinner {
                pb.set_message("Answering...");
            }

            let answer = tokio::task::spawn_blocking(move || state.pipeline().answer(&query))
                .await
                .context("Answer task failed")??;

            if let Some(pb) = spinner {
                pb.finish_and_clear();
            }
            println!("{}", serde_json::to_string_pretty(&answer)?);
            Ok(())
        }
    }
}

/// Model loading blocks for a while; keep it off the async workers
async fn load_context(config: Config) -> Result<Arc<AppContext>> {
    let context = tokio::task::spawn_blocking(move || AppContext::load(&config))
        .await
        .context("Startup task failed")??;
    Ok(Arc::new(context))
}
