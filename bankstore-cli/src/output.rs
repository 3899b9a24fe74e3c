//! Output formatting utilities

use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Render minor units (cents) as a decimal amount
pub fn format_balance(minor_units: i64) -> String {
    Decimal::new(minor_units, 2).to_string()
}

/// Parse a decimal amount into minor units
///
/// At most two fractional digits are accepted.
pub fn parse_balance(input: &str) -> Result<i64> {
    let amount = Decimal::from_str(input.trim())
        .map_err(|e| anyhow!("Invalid balance '{}': {}", input, e))?;

    if amount.scale() > 2 {
        bail!("Invalid balance '{}': at most two decimal places", input);
    }

    (amount * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or_else(|| anyhow!("Invalid balance '{}': out of range", input))
}
