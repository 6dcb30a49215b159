//! keyrelay CLI — the main entry point.
//!
//! Commands:
//! - `onboard`   — Write a default config
//! - `gateway`   — Start the HTTP admin API
//! - `status`    — Show configuration and channel counts
//! - `channels`  — List, search, export, import and prune channels

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "keyrelay",
    about = "keyrelay — channel administration for an AI API relay",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "KEYRELAY_JSON_LOGS")]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Onboard,

    /// Start the HTTP gateway server
    Gateway {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show configuration and store status
    Status,

    /// Manage channels directly against the configured store
    Channels {
        #[command(subcommand)]
        action: ChannelsAction,
    },
}

#[derive(Subcommand)]
enum ChannelsAction {
    /// Show one page of channels (keys hidden)
    List {
        #[arg(short, long, default_value_t = 0)]
        page: i64,
    },

    /// Find channels by id or name prefix
    Search { keyword: String },

    /// Write channels to a JSON file
    Export {
        #[arg(short, long)]
        output: String,

        /// all, disabled or limited
        #[arg(short, long, default_value = "all")]
        scope: String,

        /// Include credential keys in the output
        #[arg(long)]
        include_key: bool,
    },

    /// Merge or create channels from a JSON file
    Import { file: String },

    /// Delete every disabled channel
    DeleteDisabled,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Gateway { port } => commands::gateway::run(port).await?,
        Commands::Status => commands::status::run().await?,
        Commands::Channels { action } => match action {
            ChannelsAction::List { page } => commands::channels::list(page).await?,
            ChannelsAction::Search { keyword } => commands::channels::search(&keyword).await?,
            ChannelsAction::Export {
                output,
                scope,
                include_key,
            } => commands::channels::export(&output, &scope, include_key).await?,
            ChannelsAction::Import { file } => commands::channels::import(&file).await?,
            ChannelsAction::DeleteDisabled => commands::channels::delete_disabled().await?,
        },
    }

    Ok(())
}
