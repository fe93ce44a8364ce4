use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "feedrelay")]
#[command(about = "Feed relay bot: forwards every new feed item to registered chats exactly once")]
#[command(version)]
pub struct Cli {
    /// Directory holding db.json and evolution.txt
    #[arg(long, global = true, env = "FEEDRELAY_STATE_DIR", default_value = ".")]
    pub state_dir: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Recover state, then poll feeds and serve bot commands (default)
    Run,

    /// Recover state, write a fresh snapshot, empty the recovery log and exit
    Compact,

    /// Show subscribed sources and state counters without modifying any file
    Status,

    /// Export subscribed sources as OPML
    Export {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
