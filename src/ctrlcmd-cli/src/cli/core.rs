//! Core CLI definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::OutputFormat;

#[derive(Parser)]
#[command(name = "ctrlcmd")]
#[command(about = "Driver control-command table tools", long_about = None)]
pub struct Cli {
    /// Root of the driver source tree (overrides the configured one)
    #[arg(long, global = true, env = "CTRLCMD_SOURCE_ROOT")]
    pub source_root: Option<PathBuf>,

    /// Show debug logging (per-candidate rejections, per-file counts)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze the exported control commands of one class
    #[command(visible_alias = "a")]
    Analyze {
        /// Class name (e.g. Subdevice, Device)
        class: String,

        /// Only list commands whose function, id or parameter type contains this
        #[arg(short, long)]
        pattern: Option<String>,

        /// Show a single command (e.g. 0x20803601)
        #[arg(short, long, conflicts_with_all = ["pattern", "stats"])]
        method_id: Option<String>,

        /// Show command counts grouped by id prefix
        #[arg(short, long, conflicts_with = "pattern")]
        stats: bool,

        /// Output format: table (default), csv, json
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,

        /// Directory holding the generated g_*_nvoc.c files
        #[arg(long)]
        generated_dir: Option<PathBuf>,
    },

    /// List generated classes that export control commands
    #[command(visible_alias = "l")]
    Classes {
        /// Directory holding the generated g_*_nvoc.c files
        #[arg(long)]
        generated_dir: Option<PathBuf>,

        /// Output format: table (default), csv, json
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Regenerate the command table in nv_ctrl_cmd_table.h
    #[command(visible_alias = "g")]
    Generate {
        /// Directory of control headers to scan
        #[arg(long)]
        ctrl_dir: Option<PathBuf>,

        /// Header holding the table anchors
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not write; exit non-zero if the table is out of date
        #[arg(long)]
        check: bool,
    },

    /// Configure default settings
    ///
    /// Pass --source-root to store it as the default root.
    #[command(visible_alias = "c")]
    Configure {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}
