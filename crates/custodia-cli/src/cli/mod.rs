//! CLI entry and dispatch.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use custodia_client::client::ApiClient;
use custodia_client::config::Config;
use custodia_client::queries::Queries;
use custodia_client::session::SessionStore;

mod commands;

#[derive(Parser)]
#[command(name = "custodia")]
#[command(version = "0.1")]
#[command(about = "Console for the custodia admin backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in to the backend
    Login {
        /// Operator email
        #[arg(long)]
        email: String,

        /// Password (prompted on stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Log out and discard stored credentials
    Logout,

    /// Show the current session
    Status,

    /// Token-approval records
    Approvals {
        #[command(subcommand)]
        command: commands::approvals::ApprovalsCommand,
    },

    /// Pending claim requests
    Claims {
        #[command(subcommand)]
        command: commands::claims::ClaimsCommand,
    },

    /// Custodial contract records
    Contracts {
        #[command(subcommand)]
        command: commands::contracts::ContractsCommand,
    },

    /// Look up a wallet's token balance
    Balance {
        /// Wallet address to inspect
        #[arg(long)]
        wallet: String,

        /// Token symbol (USDT, USDC, DAI) or raw token address
        #[arg(long)]
        token: String,
    },
}

pub fn run() -> Result<()> {
    crate::logging::init();
    let cli = Cli::parse();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = Config::load().context("load config")?;

    let session = Arc::new(SessionStore::at_default_path());
    session.initialize();

    let client = Arc::new(ApiClient::new(config.api_base_url.clone(), session));
    let queries = Queries::new(client, &config);

    match cli.command {
        Commands::Login { email, password } => {
            commands::auth::login(&queries, &email, password.as_deref()).await
        }
        Commands::Logout => commands::auth::logout(&queries),
        Commands::Status => commands::auth::status(&queries),
        Commands::Approvals { command } => commands::approvals::dispatch(&queries, command).await,
        Commands::Claims { command } => commands::claims::dispatch(&queries, command).await,
        Commands::Contracts { command } => commands::contracts::dispatch(&queries, command).await,
        Commands::Balance { wallet, token } => {
            commands::balance::lookup(&queries, &wallet, &token).await
        }
    }
}
