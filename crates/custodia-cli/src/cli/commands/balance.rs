//! Ad-hoc balance lookup handler.

use anyhow::Result;
use custodia_client::queries::Queries;
use custodia_client::resources::balance;
use custodia_client::tokens::{format_token_value, token_address};

/// Looks up `wallet`'s balance for `token`, which may be a known symbol or
/// a raw token address.
pub async fn lookup(queries: &Queries, wallet: &str, token: &str) -> Result<()> {
    let (address, symbol) = match token_address(token) {
        Some(address) => (address.to_string(), Some(token)),
        None if token.starts_with("0x") => (token.to_string(), None),
        None => anyhow::bail!("Unknown token symbol: {token}"),
    };

    let response = balance::get(queries.client(), wallet, &address)
        .await
        .map_err(|e| anyhow::anyhow!("Balance lookup failed: {e}"))?;

    match symbol {
        Some(symbol) => println!(
            "{wallet}: {} {symbol}",
            format_token_value(&response.balance, symbol)
        ),
        None => println!("{wallet}: {}", response.balance),
    }
    Ok(())
}
