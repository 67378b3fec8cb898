use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::settings::ConfigOverrides;
use crate::utils::constants::DEFAULT_SAMPLE_COUNT;

#[derive(Parser)]
#[command(name = "aemet-normalizer")]
#[command(about = "Backfill and convert comma-decimal measurements in AEMET climatological documents")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Configuration file (TOML, JSON or YAML)")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "MongoDB connection string")]
    pub uri: Option<String>,

    #[arg(long, global = true, help = "Database name [default: aemet]")]
    pub database: Option<String>,

    #[arg(long, global = true, help = "Collection name [default: climatologicos]")]
    pub collection: Option<String>,

    #[arg(
        long,
        global = true,
        help = "Operate on a mongoexport --jsonArray file instead of a server"
    )]
    pub snapshot: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Hide progress bars and summaries")]
    pub quiet: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            uri: self.uri.clone(),
            database: self.database.clone(),
            collection: self.collection.clone(),
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Backfill missing fields, then convert text values to numbers
    Run,

    /// Set missing tracked fields to the placeholder only
    Backfill,

    /// Convert text values of tracked fields to numbers only
    Convert,

    /// Survey tracked fields without modifying anything
    Inspect {
        #[arg(
            short,
            long,
            default_value_t = DEFAULT_SAMPLE_COUNT,
            help = "Unparseable text samples to show per field"
        )]
        samples: usize,
    },
}

impl Commands {
    /// Whether the command writes to the collection.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Commands::Inspect { .. })
    }
}
