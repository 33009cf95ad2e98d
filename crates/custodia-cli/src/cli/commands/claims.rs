//! Claim-request listing and completion handlers.

use anyhow::{Context, Result};
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;
use custodia_client::queries::Queries;

use super::short_date;

#[derive(clap::Subcommand)]
pub enum ClaimsCommand {
    /// List pending claim requests
    List,

    /// Complete a claim: remove the request and its backing investment
    Complete { id: i64 },
}

pub async fn dispatch(queries: &Queries, command: ClaimsCommand) -> Result<()> {
    match command {
        ClaimsCommand::List => list(queries).await,
        ClaimsCommand::Complete { id } => complete(queries, id).await,
    }
}

fn duration_label(weeks: u32) -> String {
    match weeks {
        1 => "1 Week".to_string(),
        4 => "1 Month".to_string(),
        26 => "6 Months".to_string(),
        52 => "1 Year".to_string(),
        other => format!("{other} weeks"),
    }
}

async fn list(queries: &Queries) -> Result<()> {
    let rows = queries
        .withdrawal_requests()
        .await
        .context("list claim requests")?;

    if rows.is_empty() {
        println!("No pending claim requests.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "ID", "Owner", "Token", "Amount", "Profit", "Duration", "Unlocks", "Investment",
    ]);
    for row in &rows {
        table.add_row(vec![
            row.id.map(|id| id.to_string()).unwrap_or_default(),
            row.owner_address.clone(),
            row.token_name.clone(),
            row.amount.clone(),
            row.profit.clone(),
            duration_label(row.duration_weeks),
            short_date(&row.unlock_date),
            row.investment_id.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

async fn complete(queries: &Queries, id: i64) -> Result<()> {
    let claim = queries
        .withdrawal_requests()
        .await
        .context("list claim requests")?
        .into_iter()
        .find(|c| c.id == Some(id))
        .with_context(|| format!("No claim request with id {id}"))?;

    queries
        .complete_claim(id, claim.investment_id)
        .await
        .map_err(|e| anyhow::anyhow!("Complete failed: {e}"))?;

    println!(
        "Claim {id} completed, investment {} removed.",
        claim.investment_id
    );
    Ok(())
}
