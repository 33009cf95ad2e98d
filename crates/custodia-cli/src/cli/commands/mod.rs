//! Command handlers, one module per resource family.

pub mod approvals;
pub mod auth;
pub mod balance;
pub mod claims;
pub mod contracts;

use chrono::DateTime;

/// Renders a backend timestamp for table display; unparseable values pass
/// through unchanged.
pub fn short_date(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// Reads one trimmed line from stdin after printing a prompt.
pub fn prompt_line(prompt: &str) -> anyhow::Result<String> {
    use std::io::{BufRead, Write};

    print!("{prompt}");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
