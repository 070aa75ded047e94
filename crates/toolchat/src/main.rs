//! toolchat - a tool-using conversational agent

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{ask_command, call_command, init_command, serve_command, status_command, tools_command};

/// toolchat - chat with an agent that can call tools
#[derive(Parser)]
#[command(name = "toolchat")]
#[command(about = "A tool-using conversational agent")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init,
    /// Start the HTTP chat gateway
    Serve {
        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
    /// Ask the agent a single question
    Ask {
        /// Message to send
        #[arg(short, long)]
        message: String,
    },
    /// List registered tools
    Tools,
    /// Run one tool directly
    Call {
        /// Tool name
        tool: String,
        /// Tool input as a JSON object
        #[arg(short, long, default_value = "{}")]
        input: String,
    },
    /// Show configuration status
    Status,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(matches!(cli.command, Commands::Serve { verbose: true }));

    let result = match cli.command {
        Commands::Init => init_command().await,
        Commands::Serve { verbose: _ } => serve_command().await,
        Commands::Ask { message } => ask_command(message).await,
        Commands::Tools => tools_command(),
        Commands::Call { tool, input } => call_command(tool, input).await,
        Commands::Status => status_command().await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
