//! Contract-record handlers.

use anyhow::{Context, Result};
use chrono::Utc;
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;
use custodia_client::queries::Queries;
use custodia_client::resources::contracts::NewContract;

use super::{prompt_line, short_date};

#[derive(clap::Subcommand)]
pub enum ContractsCommand {
    /// List contract records
    List,

    /// Register a contract with the custodian
    Create {
        /// Contract address
        #[arg(long)]
        address: String,

        /// Pool address
        #[arg(long)]
        pool: String,

        /// Private key (prompted on stdin when omitted)
        #[arg(long)]
        key: Option<String>,
    },

    /// Delete a contract record
    Delete { id: i64 },
}

pub async fn dispatch(queries: &Queries, command: ContractsCommand) -> Result<()> {
    match command {
        ContractsCommand::List => list(queries).await,
        ContractsCommand::Create { address, pool, key } => {
            create(queries, address, pool, key).await
        }
        ContractsCommand::Delete { id } => {
            queries
                .destroy_contract(id)
                .await
                .with_context(|| format!("delete contract {id}"))?;
            println!("Contract {id} deleted.");
            Ok(())
        }
    }
}

async fn list(queries: &Queries) -> Result<()> {
    let rows = queries.contracts().await.context("list contracts")?;

    if rows.is_empty() {
        println!("No contracts.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["ID", "Contract", "Pool", "User", "Created"]);
    for row in &rows {
        table.add_row(vec![
            row.id.to_string(),
            row.contract_address.clone(),
            row.pool_address.clone(),
            row.user_id.map(|id| id.to_string()).unwrap_or_default(),
            short_date(&row.created_at),
        ]);
    }
    println!("{table}");
    Ok(())
}

async fn create(
    queries: &Queries,
    address: String,
    pool: String,
    key: Option<String>,
) -> Result<()> {
    let private_key = match key {
        Some(k) => k,
        None => prompt_line("Private key: ")?,
    };
    if private_key.is_empty() {
        anyhow::bail!("Private key must not be empty");
    }

    let contract = NewContract {
        contract_address: address,
        pool_address: pool,
        private_key,
        created_at: Utc::now().to_rfc3339(),
        user_id: queries.client().session().user().map(|u| u.id),
    };

    let created = queries
        .create_contract(&contract)
        .await
        .map_err(|e| anyhow::anyhow!("Create failed: {e}"))?;

    println!("Contract {} registered.", created.id);
    Ok(())
}
