//! Currency and fixed-point conversion.
//!
//! Ledger amounts are integers with 18 decimals. Naira prices are converted
//! to the base asset at the configured rate before scaling.

use crate::types::Currency;

pub const DECIMALS: usize = 18;
pub const UNIT: u128 = 1_000_000_000_000_000_000;

/// Parse a decimal string ("30", "0.001") into smallest units.
pub fn parse_units(amount: &str) -> Option<u128> {
    let (whole, fraction) = match amount.split_once('.') {
        Some((w, f)) => (w, f),
        None => (amount, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit())
        || !fraction.chars().all(|c| c.is_ascii_digit())
        || fraction.len() > DECIMALS
    {
        return None;
    }

    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let fraction: u128 = if fraction.is_empty() {
        0
    } else {
        format!("{:0<width$}", fraction, width = DECIMALS).parse().ok()?
    };

    whole.checked_mul(UNIT)?.checked_add(fraction)
}

/// Convert a vendor-entered amount to smallest units of the base asset.
///
/// `naira_per_unit` is how many naira buy one base unit.
pub fn to_base_units(amount: &str, currency: Currency, naira_per_unit: u128) -> Option<u128> {
    let scaled = parse_units(amount)?;
    match currency {
        Currency::Naira => scaled.checked_div(naira_per_unit),
        Currency::Cusd | Currency::Celo | Currency::Dollar => Some(scaled),
    }
}

/// Render smallest units as a trimmed decimal ("1.5", "30", "0.001").
pub fn format_units(value: u128) -> String {
    let whole = value / UNIT;
    let fraction = value % UNIT;
    if fraction == 0 {
        return whole.to_string();
    }
    let fraction = format!("{:0>width$}", fraction, width = DECIMALS);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}
