use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "eagle-ingest")]
#[command(about = "Write images into an Eagle-style asset library", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the library layout if it is missing
    Init,
    /// Import image files into a folder, then rebuild the index
    Import {
        /// Destination folder: a configured name or a folder id
        #[arg(short, long)]
        folder: String,
        /// Display name; defaults to the file stem. Numbered when several files share it
        #[arg(short, long)]
        name: Option<String>,
        /// Source URL recorded with every image
        #[arg(long, default_value = "")]
        url: String,
        /// Free-text annotation recorded with every image
        #[arg(long, default_value = "")]
        annotation: String,
        /// Tag to attach (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        /// Star rating, 0 for unrated
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=5))]
        star: u8,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Create a folder and print its id
    CreateFolder {
        /// Parent folder (configured name or id); top level when omitted
        #[arg(short, long)]
        parent: Option<String>,
        #[arg(short, long, default_value = "")]
        description: String,
        name: String,
    },
    /// Print the folder tree with ids
    ListFolders,
    /// Rebuild mtime.json from the asset directories
    RebuildIndex,
    /// Audit the given assets, or every asset when none are given
    Validate { ids: Vec<String> },
    /// Mark an asset as deleted without removing its files
    Trash { id: String },
    /// Print configuration values
    PrintConfig,
}
