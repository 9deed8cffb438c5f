mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use common::{get_env_usize, ConfigLoader, FsExt};
use corpus::{create_database, CreateDatabaseOptions};
use dotenv::dotenv;
use env_logger::Env;
use log::info;
use scoring::{run_score_children, ScoreChildrenOptions};

fn main() -> Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut builder = tokio::runtime::Builder::new_multi_thread();

    builder.enable_all();

    if let Some(worker_threads) = get_env_usize("TOKIO_THREADS")? {
        builder.worker_threads(worker_threads);
    }

    info!("{:?}", builder);

    builder
        .build()
        .context("Failed to start the tokio runtime")?
        .block_on(async_main())?;

    Ok(())
}

async fn async_main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::CreateDatabase(args) => {
            let config_path = args.config.relative_to_cwd()?;
            let config = ConfigLoader::new(config_path, "create_database".to_string())?;
            let options: CreateDatabaseOptions = config.load()?;

            let summary = tokio::task::spawn_blocking(move || create_database(&options))
                .await
                .context("The database task panicked")??;

            info!(
                "Aggregated {} games ({} malformed) into {} boards",
                summary.stats.games, summary.stats.malformed_games, summary.entries
            );

            for split in &summary.splits {
                info!(
                    "Wrote {} records for {} boards to {:?}",
                    split.records, split.entries, split.path
                );
            }
        }
        Commands::ScoreChildren(args) => {
            let config_path = args.config.relative_to_cwd()?;
            let config = ConfigLoader::new(config_path, "score_children".to_string())?;
            let options: ScoreChildrenOptions = config.load()?;

            let summary = run_score_children(&options).await?;

            info!(
                "Wrote {} scored boards to {:?}",
                summary.records, options.output_file
            );
        }
    }

    Ok(())
}
