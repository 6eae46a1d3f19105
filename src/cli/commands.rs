use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hcp-scorecard")]
#[command(author, version, about = "Housecall Pro scorecard metrics for agents", long_about = None)]
pub struct Cli {
    /// Settings file (default: config/$CONFIG_ENV, then SCORECARD__* variables)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the MCP server on stdin/stdout
    Serve,

    /// Revenue from completed jobs for one week
    Revenue {
        /// Weeks back (0 = current week)
        #[arg(short, long, default_value = "1")]
        weeks_back: u32,
    },

    /// Value of all pending estimates
    Pipeline,

    /// Close rate over a trailing period
    CloseRate {
        #[arg(short, long, default_value = "30")]
        days_back: u32,
    },

    /// Jobs scheduled over the coming days
    Scheduled {
        #[arg(short = 'f', long, default_value = "14")]
        days_forward: u32,
    },

    /// Every scorecard metric in one report
    Scorecard,

    /// List the tools the MCP server exposes
    Tools,
}
