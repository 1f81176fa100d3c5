//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Curriculum program-tree toolkit: inspect, edit and postpone program trees
#[derive(Parser, Debug)]
#[command(name = "cursus")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-d, -dd, -ddd)
    #[arg(short = 'd', long = "debug", action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Store directory (default: from config)
    #[arg(short = 'C', long, global = true)]
    pub store_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a program tree
    Show {
        /// Root code of the tree
        code: String,
        /// Academic year
        year: i32,
    },

    /// List stored trees
    List,

    /// Attach a catalog node under a node of a tree
    Attach {
        /// Root code of the tree
        code: String,
        /// Academic year
        year: i32,
        /// Code of the node to attach (looked up in the catalog)
        node: String,
        /// Path of the parent node, element ids joined by '|'
        #[arg(long)]
        path: String,
        /// Block digits, e.g. "12"
        #[arg(long)]
        block: Option<String>,
        /// Mark the link as mandatory
        #[arg(long)]
        mandatory: bool,
        /// Relative credits of the child in this context
        #[arg(long)]
        relative_credits: Option<i32>,
        /// Validate only, do not persist
        #[arg(long)]
        dry_run: bool,
    },

    /// Detach the link addressed by a path
    Detach {
        /// Root code of the tree
        code: String,
        /// Academic year
        year: i32,
        /// Path of the node to detach
        #[arg(long)]
        path: String,
        /// Validate only, do not persist
        #[arg(long)]
        dry_run: bool,
    },

    /// Cut or copy a node to a new position
    Paste {
        /// Root code of the tree
        code: String,
        /// Academic year
        year: i32,
        /// Code of the node to paste
        node: String,
        /// Path to detach from first (cut); omit for a catalog copy
        #[arg(long)]
        from: Option<String>,
        /// Path of the new parent node
        #[arg(long)]
        to: String,
        /// Validate only, do not persist
        #[arg(long)]
        dry_run: bool,
    },

    /// Copy a yearly record forward up to the postponement horizon
    Postpone {
        /// Entity code
        code: String,
        /// Year to copy from
        from_year: i32,
        /// End year override (default: entity/config horizon)
        #[arg(long)]
        end_year: Option<i32>,
    },

    /// List versions of an offer for a year
    Versions {
        /// Offer acronym
        offer: String,
        /// Academic year
        year: i32,
    },

    /// Show effective configuration
    Config,

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
