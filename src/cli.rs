use clap::{Parser, Subcommand, ValueEnum};
use reelmatch_common::ContentKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reelmatch")]
#[command(author, version, about = "Match media files against TMDB and StashDB")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage libraries
    Library {
        #[command(subcommand)]
        action: LibraryCommand,
    },

    /// Scan a library and match its files
    Scan {
        /// Library id
        library: String,
    },

    /// Refresh one record from its provider
    Enrich {
        /// Record id
        record: String,
    },

    /// List the records of a library
    Records {
        /// Library id
        library: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how a file name is parsed into title and year
    Parse {
        /// File name to parse
        #[arg(required = true)]
        file_name: String,
    },

    /// Show a TMDB collection and its parts
    Collection {
        /// TMDB collection id
        id: String,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[derive(Subcommand)]
pub enum LibraryCommand {
    /// Create a library
    Add {
        /// Library name
        name: String,

        /// Content kind, which selects the provider
        #[arg(long, value_enum)]
        kind: KindArg,

        /// Root directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// List libraries
    List,

    /// Remove a library and its records
    Remove {
        /// Library id
        id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Movie,
    Scene,
}

impl From<KindArg> for ContentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Movie => ContentKind::Movie,
            KindArg::Scene => ContentKind::Scene,
        }
    }
}
