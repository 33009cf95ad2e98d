//! Known token registry and unit formatting.
//!
//! Approval rows carry raw on-chain integer amounts; display scales them by
//! the token's decimals. Unknown symbols and unparseable values pass through
//! unchanged so a listing never fails on a single odd row.

/// Returns the on-chain address for a supported token symbol (Arbitrum).
pub fn token_address(symbol: &str) -> Option<&'static str> {
    match symbol {
        "USDT" => Some("0xfd086bc7cd5c481dcc9c85ebe478a1c0b69fcbb9"),
        "USDC" => Some("0xaf88d065e77c8cC2239327C5EDb3A432268e5831"),
        "DAI" => Some("0xda10009cbd5d07dd0cecc66161fc93d7c9000da1"),
        _ => None,
    }
}

/// Returns the decimal places for a supported token symbol.
pub fn token_decimals(symbol: &str) -> Option<u32> {
    match symbol {
        "USDT" | "USDC" => Some(6),
        "DAI" => Some(18),
        _ => None,
    }
}

/// Scales a raw integer amount string down by `decimals` places.
///
/// `"1000000"` with 6 decimals yields `"1.0"`; trailing fractional zeros are
/// trimmed but at least one fractional digit is kept. Returns `None` when
/// the input is not a plain (optionally negative) integer string.
pub fn format_units(value: &str, decimals: u32) -> Option<String> {
    let value = value.trim();
    let (sign, digits) = match value.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", value),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digits = digits.trim_start_matches('0');
    let digits = if digits.is_empty() { "0" } else { digits };

    if decimals == 0 {
        return Some(format!("{sign}{digits}"));
    }

    let decimals = decimals as usize;
    let padded = if digits.len() <= decimals {
        format!("{digits:0>width$}", width = decimals + 1)
    } else {
        digits.to_string()
    };

    let split = padded.len() - decimals;
    let whole = &padded[..split];
    let fraction = padded[split..].trim_end_matches('0');
    let fraction = if fraction.is_empty() { "0" } else { fraction };

    Some(format!("{sign}{whole}.{fraction}"))
}

/// Formats an approval amount for display. Unrecognized symbols and values
/// that fail to parse come back unchanged.
pub fn format_token_value(value: &str, symbol: &str) -> String {
    match token_decimals(symbol) {
        Some(decimals) => format_units(value, decimals).unwrap_or_else(|| value.to_string()),
        None => value.to_string(),
    }
}
