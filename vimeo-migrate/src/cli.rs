///
/// This module implements the CLI interface for vimeo-migrate: command parsing, the async
/// `run` entrypoint and the user-visible summary output.
///
/// All migration logic (API client, pipeline, data models) lives in the
/// [`vimeo-migrate-core`] crate. This module is strictly CLI glue.
///
/// ## How To Use
/// - For command-line users: use the installed `vimeo-migrate` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`vimeo-migrate-core`]: ../../vimeo-migrate-core/
use crate::load_config::load_config;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vimeo_migrate_core::client::VimeoClient;
use vimeo_migrate_core::contract::SourceLibrary;
use vimeo_migrate_core::migrate::{migrate, ItemOutcome, MigrationReport};

/// CLI for vimeo-migrate: copy every video of one Vimeo folder into another account's folder.
#[derive(Parser)]
#[clap(
    name = "vimeo-migrate",
    version,
    about = "Migrate videos between Vimeo accounts by download and tus re-upload"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download every video in the source folder and re-upload it to the destination folder
    Migrate {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// List the videos in the source folder without migrating anything
    List {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Migrate { config } => {
            let config = load_config(config)?;
            config.trace_loaded();
            tracing::info!(command = "migrate", "Starting migration");

            let source = VimeoClient::from_config(&config, &config.source)?;
            let destination = VimeoClient::from_config(&config, &config.destination)?;

            println!("Migration starting...");
            match migrate(&config, &source, &destination).await {
                Ok(report) => {
                    tracing::info!(command = "migrate", migrated = report.migrated(), "Migration complete");
                    print_report(&report);
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "migrate", error = %e, "Migration failed");
                    Err(e.into())
                }
            }
        }
        Commands::List { config } => {
            let config = load_config(config)?;
            config.trace_loaded();
            tracing::info!(command = "list", "Listing source folder");

            let source = VimeoClient::from_config(&config, &config.source)?;
            let videos = source.list_folder_videos(&config.source.folder_id).await?;
            for video in &videos {
                println!(
                    "{}\t{}",
                    video.uri.as_deref().unwrap_or("-"),
                    video.name.as_deref().unwrap_or("-")
                );
            }
            println!("{} videos in folder {}", videos.len(), config.source.folder_id);
            Ok(())
        }
    }
}

fn print_report(report: &MigrationReport) {
    println!("Migration complete.");
    for item in &report.items {
        let label = item
            .name
            .as_deref()
            .or(item.source_uri.as_deref())
            .unwrap_or("<unnamed>");
        match &item.outcome {
            ItemOutcome::Migrated { new_uri } => println!("  migrated      {label} -> {new_uri}"),
            ItemOutcome::MoveFailed { new_uri, error } => {
                println!("  not moved     {label} -> {new_uri} ({error})")
            }
            ItemOutcome::Skipped { reason } => println!("  skipped       {label} ({reason})"),
            ItemOutcome::DownloadFailed { error } => {
                println!("  download fail {label} ({error})")
            }
            ItemOutcome::UploadFailed { error } => println!("  upload fail   {label} ({error})"),
        }
    }
    println!(
        "Summary: {} migrated, {} failed, {} skipped, {} temporary files removed",
        report.migrated(),
        report.failed(),
        report.skipped(),
        report.temp_files_removed
    );
    let unmoved: Vec<_> = report.needs_reconciliation().collect();
    if !unmoved.is_empty() {
        println!(
            "{} uploaded videos are outside the destination folder and need to be moved manually.",
            unmoved.len()
        );
    }
}
