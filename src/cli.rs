// src/cli.rs

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "Content Directory persistence core, driven from the command line.")]
pub struct Cli {
    /// Path to the SQLite database file. Defaults to the XDG data directory.
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the children of a container (0 = root).
    Ls {
        #[arg(default_value_t = 0)]
        parent_id: i64,
    },
    /// Create (or reuse) a chain of virtual containers.
    Mkdir {
        path: String,
        #[arg(long, default_value = "object.container.storageFolder")]
        upnp_class: String,
    },
    /// Print an object's stored metadata.
    Meta { object_id: i64 },
    /// Remove an object, purging any container left empty as a result.
    Rm {
        object_id: i64,
        /// Also remove virtual aliases referencing this object, instead of
        /// just orphaning them.
        #[arg(long)]
        all: bool,
    },
    /// Report the schema and row-count summary.
    Stat,
}
