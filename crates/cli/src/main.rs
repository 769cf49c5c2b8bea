//! Concierge CLI — the main entry point.
//!
//! Commands:
//! - `onboard`  — Write a default config
//! - `chat`     — Interactive or single-message customer chat
//! - `gateway`  — Start the HTTP API server
//! - `task`     — Run one specialist task with JSON input
//! - `fulfill`  — Run the order-fulfillment saga with JSON input
//! - `status`   — Show the effective configuration

use clap::{Parser, Subcommand};

mod commands;

use commands::task::TaskKind;

#[derive(Parser)]
#[command(
    name = "concierge",
    about = "Concierge — customer-service routing and specialist agents",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use the seeded in-memory backend instead of the service gateway
    #[arg(long, global = true)]
    offline: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Onboard,

    /// Chat as a customer
    Chat {
        /// Customer identity (email)
        #[arg(short, long, default_value = "guest@example.com")]
        user: String,

        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Start the HTTP gateway server
    Gateway {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run a specialist task
    Task {
        kind: TaskKind,

        /// Task input as JSON, or @file
        #[arg(short, long)]
        input: String,
    },

    /// Reserve stock and take payment for an order, compensating on failure
    Fulfill {
        /// Order as JSON, or @file
        #[arg(short, long)]
        input: String,
    },

    /// Show the effective configuration
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat { user, message } => commands::chat::run(cli.offline, user, message).await?,
        Commands::Gateway { port } => commands::gateway::run(cli.offline, port).await?,
        Commands::Task { kind, input } => commands::task::run(cli.offline, kind, &input).await?,
        Commands::Fulfill { input } => commands::fulfill::run(cli.offline, &input).await?,
        Commands::Status => commands::status::run(cli.offline).await?,
    }

    Ok(())
}
