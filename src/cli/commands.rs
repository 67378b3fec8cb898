use chrono::Utc;
use tracing::info;

use crate::cli::args::{Cli, Commands};
use crate::error::Result;
use crate::processors::{
    generate_summary, generate_survey_summary, survey_store, FieldNormalizer, NormalizationReport,
};
use crate::settings::NormalizerConfig;
use crate::store::{DocumentStore, MemoryStore, MongoStore};
use crate::utils::logging::init_logging;
use crate::utils::progress::ProgressReporter;

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let config = NormalizerConfig::load(cli.config.as_deref(), &cli.overrides())?;
    info!(
        "Tracking {} fields with placeholder \"{}\"",
        config.fields.len(),
        config.placeholder
    );

    match cli.snapshot {
        Some(ref path) => {
            let store = MemoryStore::load_json(path)?;
            execute(&cli.command, &store, &config, cli.quiet).await?;

            if cli.command.is_mutating() {
                store.save_json(path).await?;
                info!("Snapshot written back to {}", path.display());
            }
        }
        None => {
            info!(
                "Target collection: {}.{}",
                config.database, config.collection
            );
            let store = MongoStore::connect(&config).await?;
            execute(&cli.command, &store, &config, cli.quiet).await?;
        }
    }

    Ok(())
}

/// Run one command against an already opened store.
pub async fn execute<S: DocumentStore>(
    command: &Commands,
    store: &S,
    config: &NormalizerConfig,
    quiet: bool,
) -> Result<()> {
    let normalizer = FieldNormalizer::from_config(store, config);

    match command {
        Commands::Run => {
            let progress = ProgressReporter::new(0, "Normalizing...", quiet);
            let report = normalizer.run(Some(&progress)).await?;
            progress.finish_with_message("Normalization complete");
            print_report(&report, quiet);
        }

        Commands::Backfill => {
            let started_at = Utc::now();
            let progress = ProgressReporter::new_spinner("Backfilling missing fields...", quiet);
            let backfill = normalizer.backfill(Some(&progress)).await?;
            progress.finish_with_message(&format!(
                "Backfilled {} fields",
                backfill.total_backfilled()
            ));

            print_report(
                &NormalizationReport {
                    target: store.describe(),
                    started_at,
                    finished_at: Utc::now(),
                    backfill: Some(backfill),
                    conversion: None,
                },
                quiet,
            );
        }

        Commands::Convert => {
            let started_at = Utc::now();
            let progress = ProgressReporter::new(0, "Converting documents...", quiet);
            let conversion = normalizer.convert(Some(&progress)).await?;
            progress.finish_with_message(&format!(
                "Converted {} documents",
                conversion.documents_scanned
            ));

            print_report(
                &NormalizationReport {
                    target: store.describe(),
                    started_at,
                    finished_at: Utc::now(),
                    backfill: None,
                    conversion: Some(conversion),
                },
                quiet,
            );
        }

        Commands::Inspect { samples } => {
            let progress = ProgressReporter::new_spinner("Surveying collection...", quiet);
            let survey = survey_store(store, normalizer.fields(), *samples).await?;
            progress.finish_with_message(&format!("Surveyed {} documents", survey.documents));

            if !quiet {
                println!("\n{}", generate_survey_summary(&survey));
            }
        }
    }

    Ok(())
}

fn print_report(report: &NormalizationReport, quiet: bool) {
    if !quiet {
        println!("\n{}", generate_summary(report));
    }
}
