use anyhow::Result;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transcript_fetch::cli::{Cli, Commands};
use transcript_fetch::config::Config;
use transcript_fetch::extractors::page::HtmlPage;
use transcript_fetch::fetch::ReqwestFetcher;
use transcript_fetch::{output, utils, TranscriptError, TranscriptPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "transcript_fetch=debug"
    } else {
        "transcript_fetch=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::load().await?;

    match cli.command {
        Commands::Fetch {
            video,
            output,
            format,
            languages,
            format_priority,
            no_page,
        } => {
            let video_id = utils::extract_video_id(&video)?;

            if !languages.is_empty() {
                config.acquisition.preferred_track_languages = languages.clone();
                config.acquisition.preferred_languages = languages;
            }
            if !format_priority.is_empty() {
                config.acquisition.format_priority = format_priority;
            }
            config.validate()?;

            let pipeline = TranscriptPipeline::for_video(&config, &video_id, !no_page).await?;

            let progress = if cli.quiet {
                ProgressBar::hidden()
            } else {
                let progress = ProgressBar::new_spinner();
                progress.set_style(
                    ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
                );
                progress.enable_steady_tick(Duration::from_millis(120));
                progress
            };
            progress.set_message(format!("Fetching captions for {}...", video_id));

            let result = pipeline.acquire_transcript(&video_id).await;
            progress.finish_and_clear();

            let transcript = match result {
                Ok(transcript) => transcript,
                Err(TranscriptError::NoCaptionsAvailable { video_id, failures }) => {
                    eprintln!(
                        "{}",
                        style(format!(
                            "Captions could not be found or retrieved for video {}",
                            video_id
                        ))
                        .red()
                        .bold()
                    );
                    for failure in failures {
                        eprintln!("   • {}: {}", failure.strategy, failure.reason);
                    }
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            };

            match output {
                Some(path) => {
                    output::save_to_file(&transcript, &path, &format).await?;
                    println!("Transcript saved to: {}", path.display());
                }
                None => {
                    output::print_to_console(&transcript, &format)?;
                }
            }
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                let path = config.save().await?;
                println!("Configuration written to: {}", path.display());
            }
        }
        Commands::Strategies => {
            let fetcher = Arc::new(ReqwestFetcher::new(&config.http)?);
            let pipeline =
                TranscriptPipeline::with_sources(&config, fetcher, Arc::new(HtmlPage::default()));

            println!("Caption sources, in the order they are tried:");
            for (index, name) in pipeline.strategy_names().iter().enumerate() {
                println!("  {}. {}", index + 1, name);
            }
        }
    }

    Ok(())
}
