use std::path::PathBuf;

use clap::{Parser, Subcommand};
use typed_bytesize::ByteSizeIec;

#[derive(Parser)]
#[command(version, about = "Build and inspect flat-fs disk images")]
pub struct Cli {
    /// Disk image backing the filesystem
    #[arg(long, short, global = true, default_value = ".disk")]
    pub image: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create (or truncate) the image and initialize the root and bitmap
    Format {
        /// Image size in bytes
        #[arg(long, short, default_value_t = ByteSizeIec::mib(5).0)]
        size: u64,
    },

    /// Show the attributes of a path
    Stat { path: String },

    /// List the root or a subdirectory
    Ls {
        #[arg(default_value = "/")]
        path: String,
    },

    /// Create a subdirectory under the root
    Mkdir { path: String },

    /// Accepted, nothing is removed
    Rmdir { path: String },

    /// Create an empty file
    Touch { path: String },

    /// Accepted, nothing is removed
    Rm { path: String },

    /// Print a file to stdout
    Cat { path: String },

    /// Write a host file (or stdin) into a file
    Write {
        path: String,

        #[arg(long, short, default_value_t = 0)]
        offset: u64,

        /// Host file to read from, stdin when absent
        #[arg(long, short)]
        file: Option<PathBuf>,
    },

    /// Copy every 8.3-named file of a host directory into a subdirectory
    Pack {
        /// Host source directory
        #[arg(long, short)]
        source: PathBuf,

        /// Target subdirectory, created when missing
        #[arg(long)]
        into: String,
    },

    /// Dump the allocation bitmap
    Bitmap,
}
