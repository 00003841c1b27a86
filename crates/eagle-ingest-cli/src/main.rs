mod commands;
mod logging;
mod progress;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use eagle_ingest_core::{AppConfig, ImportEngine, Library, NewAsset};
use progress::CliReporter;
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let guard = logging::init_logger();

    let args = Cli::parse();
    let Some(command) = args.command else {
        let _ = Cli::command().print_long_help();
        return Ok(());
    };

    let config = match eagle_ingest_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            drop(guard);
            process::exit(1);
        }
    };

    // Ok(false): the command ran, but some item failed.
    let clean = run(command, config)?;
    if !clean {
        drop(guard);
        process::exit(1);
    }
    Ok(())
}

fn run(command: Commands, config: AppConfig) -> anyhow::Result<bool> {
    match command {
        Commands::Init => {
            let library = Library::init(config)?;
            println!("Library ready at {}", library.root().display().to_string().green());
            Ok(true)
        }
        Commands::Import {
            folder,
            name,
            url,
            annotation,
            tags,
            star,
            files,
        } => {
            let library = Library::open(config);
            let folder_id = library
                .resolve_folder(&folder)
                .with_context(|| format!("Unknown destination folder '{}'", folder))?;

            let names = asset_names(name.as_deref(), &files);
            let assets: Vec<NewAsset> = files
                .iter()
                .zip(names)
                .map(|(file, name)| NewAsset {
                    url: url.clone(),
                    annotation: annotation.clone(),
                    tags: tags.clone(),
                    star,
                    ..NewAsset::new(file, &name, &folder_id)
                })
                .collect();

            run_import(&library, &assets)
        }
        Commands::CreateFolder {
            parent,
            description,
            name,
        } => {
            let library = Library::open(config);
            let id = match parent {
                Some(parent) => {
                    let parent_id = library.resolve_folder(&parent)?;
                    library.insert_folder(&parent_id, &name, &description)?
                }
                None => library.insert_root_folder(&name, &description)?,
            };
            println!("{}", id);
            Ok(true)
        }
        Commands::ListFolders => {
            let library = Library::open(config);
            let tree = library.load_folders()?;
            tree.walk(|folder, depth| {
                println!(
                    "{}{} {}",
                    "  ".repeat(depth),
                    folder.name,
                    format!("({})", folder.id).dimmed()
                );
            });
            Ok(true)
        }
        Commands::RebuildIndex => {
            let library = Library::open(config);
            let entries = library.rebuild_index()?;
            println!("Index rebuilt: {} entries", format!("{}", entries).cyan());
            Ok(true)
        }
        Commands::Validate { ids } => {
            let library = Library::open(config);
            run_validate(&library, &ids)
        }
        Commands::Trash { id } => {
            let library = Library::open(config);
            let metadata = library.soft_delete(&id)?;
            library.rebuild_index()?;
            println!("Moved '{}' ({}) to trash", metadata.name, metadata.id.red());
            Ok(true)
        }
        Commands::PrintConfig => {
            println!("Configuration: {:?}", config);
            Ok(true)
        }
    }
}

fn run_import(library: &Library, assets: &[NewAsset]) -> anyhow::Result<bool> {
    let reporter = CliReporter::new();
    let report = ImportEngine::new(library).import_batch(assets, &reporter)?;

    println!();
    for metadata in &report.imported {
        println!(
            "  {} {} {}",
            "imported".green(),
            metadata.id,
            metadata.file_name()
        );
    }
    for failure in &report.failed {
        println!(
            "  {} {} ({:?}): {}",
            "failed".red(),
            failure.source.display(),
            failure.kind(),
            failure.error
        );
    }
    info!(
        "Import: {}, Index: {}",
        format!("{:.2}s", report.import_duration.as_secs_f64()).green(),
        format!("{:.2}s", report.index_duration.as_secs_f64()).green(),
    );
    info!(
        "{} imported, {} failed, {} index entries",
        format!("{}", report.imported.len()).green(),
        format!("{}", report.failed.len()).red(),
        format!("{}", report.index_entries).cyan(),
    );

    Ok(report.is_complete_success())
}

fn run_validate(library: &Library, ids: &[String]) -> anyhow::Result<bool> {
    let reports = if ids.is_empty() {
        library.validate_all()?
    } else {
        ids.iter()
            .map(|id| (id.clone(), library.validate_asset(id)))
            .collect()
    };

    let mut invalid = 0;
    for (id, report) in &reports {
        if report.valid {
            println!("  {} {}", "ok".green(), id);
        } else {
            invalid += 1;
            println!("  {} {}", "invalid".red(), id);
            for err in &report.errors {
                println!("      {}", err.red());
            }
        }
        for warning in &report.warnings {
            println!("      {}", warning.yellow());
        }
    }
    info!(
        "{} checked, {} invalid",
        format!("{}", reports.len()).cyan(),
        format!("{}", invalid).red(),
    );

    Ok(invalid == 0)
}

/// Display names for a batch: each file's stem, or `name` itself for one
/// file, or `"<name> - <n>"` (1-based) when several files share `name`.
fn asset_names(name: Option<&str>, files: &[PathBuf]) -> Vec<String> {
    match name {
        Some(name) if files.len() == 1 => vec![name.to_string()],
        Some(name) => (1..=files.len())
            .map(|i| format!("{} - {}", name, i))
            .collect(),
        None => files.iter().map(|file| file_stem(file)).collect(),
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
