use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tidings")]
#[command(about = "Feed-polling notification daemon", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the daemon: periodic polling plus the command handler (default)
    Run,
    /// Run a single poll cycle and exit
    Once,
    /// Validate the configuration and print the working set
    CheckConfig,
}
