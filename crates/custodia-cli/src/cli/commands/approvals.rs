//! Approval listing, deletion, and transfer handlers.

use anyhow::{Context, Result};
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;
use custodia_client::queries::Queries;
use custodia_client::resources::approvals::Approval;
use custodia_client::tokens::format_token_value;
use futures_util::future::join_all;

use super::short_date;

#[derive(clap::Subcommand)]
pub enum ApprovalsCommand {
    /// List approval records
    List {
        /// Also fetch the owner's current balance for each row
        #[arg(long)]
        balances: bool,
    },

    /// Delete an approval record
    Delete { id: i64 },

    /// Transfer tokens out of an approved wallet
    Transfer {
        /// Approval record to transfer from
        id: i64,

        /// Recipient address
        #[arg(long)]
        to: String,

        /// Amount to transfer
        #[arg(long)]
        amount: String,
    },
}

pub async fn dispatch(queries: &Queries, command: ApprovalsCommand) -> Result<()> {
    match command {
        ApprovalsCommand::List { balances } => list(queries, balances).await,
        ApprovalsCommand::Delete { id } => {
            queries
                .delete_approval(id)
                .await
                .with_context(|| format!("delete approval {id}"))?;
            println!("Approval {id} deleted.");
            Ok(())
        }
        ApprovalsCommand::Transfer { id, to, amount } => transfer(queries, id, &to, &amount).await,
    }
}

async fn list(queries: &Queries, balances: bool) -> Result<()> {
    let mut rows = queries.approvals().await.context("list approvals")?;

    if balances {
        // Each lookup write-through merges into the cached list; a failed
        // row leaves its balance blank rather than sinking the table.
        let lookups = rows.iter().map(|approval| async move {
            if let Err(e) = queries.load_balance(approval).await {
                tracing::warn!(id = approval.id, "balance lookup failed: {e}");
            }
        });
        join_all(lookups).await;
        rows = queries.approvals().await.context("re-read approvals")?;
    }

    if rows.is_empty() {
        println!("No approvals.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "ID", "Owner", "Spender", "Token", "Amount", "Balance", "Block", "Created",
    ]);
    for row in &rows {
        table.add_row(vec![
            row.id.to_string(),
            row.owner_address.clone(),
            row.spender_address.clone(),
            row.token_symbol.clone(),
            format_token_value(&row.value, &row.token_symbol),
            row.balance
                .as_deref()
                .map(|b| format_token_value(b, &row.token_symbol))
                .unwrap_or_default(),
            row.block_number.to_string(),
            short_date(&row.created_at),
        ]);
    }
    println!("{table}");
    Ok(())
}

async fn transfer(queries: &Queries, id: i64, to: &str, amount: &str) -> Result<()> {
    let approval = find_approval(queries, id).await?;

    let response = queries
        .transfer(&approval, to, amount)
        .await
        .map_err(|e| anyhow::anyhow!("Transfer failed: {e}"))?;

    println!("Transfer initiated from {}:", approval.owner_address);
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn find_approval(queries: &Queries, id: i64) -> Result<Approval> {
    queries
        .approvals()
        .await
        .context("list approvals")?
        .into_iter()
        .find(|a| a.id == id)
        .with_context(|| format!("No approval with id {id}"))
}
