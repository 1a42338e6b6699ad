//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum, ValueHint};
use knowtree_core::DropPosition;
use std::path::PathBuf;

/// Ordered note trees captured from conversations.
#[derive(Parser, Debug)]
#[command(name = "knowtree")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Database file
    #[arg(long, env = "KNOWTREE_DB", global = true, default_value = "knowtree.db", value_hint = ValueHint::FilePath)]
    pub db: PathBuf,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, env = "KNOWTREE_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Directory for rotated log files (logging is off when unset)
    #[arg(long, env = "KNOWTREE_LOG_DIR", global = true, value_hint = ValueHint::DirPath)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List trees, most recently updated first
    Trees,

    /// Create a tree and make it active
    NewTree {
        /// Tree name
        name: Option<String>,
    },

    /// Make a tree the active one
    Use {
        /// Tree id or unique id prefix
        tree: String,
    },

    /// Print a tree as an indented outline
    Show {
        #[arg(long)]
        tree: Option<String>,
    },

    /// Add a node at the end of the root level or under a parent
    Add {
        title: String,
        /// Parent node id or prefix
        #[arg(long)]
        parent: Option<String>,
        #[arg(long)]
        tree: Option<String>,
    },

    /// Capture snippets (one per line) into a tree
    Capture {
        /// Snippet file; stdin when omitted
        #[arg(value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
        #[arg(long)]
        tree: Option<String>,
    },

    /// Capture snippets into the tree linked to a conversation
    Sync {
        /// External conversation id
        session: String,
        /// Name for the tree if it has to be created
        #[arg(long)]
        title: Option<String>,
        /// Snippet file; stdin when omitted
        #[arg(value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
    },

    /// Move a node relative to another node
    Move {
        /// Node to move
        node: String,
        /// Node to drop on
        target: String,
        #[arg(value_enum)]
        position: PositionArg,
        #[arg(long)]
        tree: Option<String>,
    },

    /// Delete a node with its subtree
    Delete {
        node: String,
        #[arg(long)]
        tree: Option<String>,
    },

    /// Export a tree (or every tree) as JSON
    Export {
        #[arg(long, conflicts_with = "all")]
        tree: Option<String>,
        /// Export the whole library
        #[arg(long)]
        all: bool,
        /// Output file; stdout when omitted
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Import a tree exported as JSON
    Import {
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
    },

    /// Search node titles in a tree
    Search {
        query: String,
        #[arg(long)]
        tree: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PositionArg {
    Before,
    After,
    Inside,
}

impl From<PositionArg> for DropPosition {
    fn from(value: PositionArg) -> Self {
        match value {
            PositionArg::Before => DropPosition::Before,
            PositionArg::After => DropPosition::After,
            PositionArg::Inside => DropPosition::Inside,
        }
    }
}
