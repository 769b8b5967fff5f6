//! chanstat CLI
//!
//! Reads channel links, collects statistics and writes the report.

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use chanstat::{
    cache::{LocalCache, StatsCache},
    enrichment::EngagementMetrics,
    error::Result,
    input::read_links,
    models::{ChannelInfo, Config},
    pipeline::{
        self, LinkProcessor,
        processor::{CHANNEL_NAMESPACE, ENGAGEMENT_NAMESPACE},
    },
    report,
};

/// chanstat - Channel Statistics Collector
#[derive(Parser, Debug)]
#[command(
    name = "chanstat",
    version,
    about = "Social media channel statistics and registration report"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process links and write the report
    Process {
        /// File with links (.csv or plain text)
        #[arg(short, long)]
        input: PathBuf,

        /// Report file (.csv or .json)
        #[arg(short, long, default_value = "results.csv")]
        output: PathBuf,

        /// Ignore cached statistics for this run
        #[arg(long)]
        no_cache: bool,
    },

    /// Estimate how long processing the links will take
    Estimate {
        /// File with links (.csv or plain text)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Validate the configuration file
    Validate,

    /// Delete expired cache entries
    PurgeCache,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    config.apply_env();

    match cli.command {
        Command::Process {
            input,
            output,
            no_cache,
        } => {
            config.validate()?;
            let links = read_links(&input)?;

            let estimate = pipeline::estimate_processing_time(&links);
            log::info!(
                "Estimated processing time: {}s for {} links",
                estimate.as_secs(),
                links.len()
            );

            let processor = LinkProcessor::from_config(&config, !no_cache)?;
            let report = processor.process(&links).await;
            report::save_report(&report, &output)?;

            if let Some(secs) = report.stats.elapsed_secs() {
                log::info!("Finished in {}s", secs);
            }
        }

        Command::Estimate { input } => {
            let links = read_links(&input)?;
            let estimate = pipeline::estimate_processing_time(&links);
            log::info!(
                "{} links, estimated processing time {}m {}s",
                links.len(),
                estimate.as_secs() / 60,
                estimate.as_secs() % 60
            );
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("Config OK ({})", cli.config.display());
        }

        Command::PurgeCache => {
            let now = Utc::now();
            let channels: LocalCache<ChannelInfo> =
                LocalCache::new(&config.cache.dir, CHANNEL_NAMESPACE);
            let engagement: LocalCache<EngagementMetrics> =
                LocalCache::new(&config.cache.dir, ENGAGEMENT_NAMESPACE);

            let removed =
                channels.purge_expired(now).await? + engagement.purge_expired(now).await?;
            log::info!("Removed {} expired cache entries", removed);
        }
    }

    log::info!("Done!");

    Ok(())
}
