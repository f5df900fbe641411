use primitive_types::U256;
use snafu::ensure;

use crate::error::{AmountError, EmptyAmountSnafu, InvalidDigitSnafu, TooPreciseSnafu};

/// number of decimals between ether and wei
pub const ETHER_DECIMALS: u32 = 18;

/// Returns Result<U256, AmountError> from exactly converting a decimal string into its
/// integer amount of smallest units
///
/// # Arguments
///
/// * `value` - decimal string such as "0.0003"
/// * `decimals` - number of decimal places in one whole unit
pub fn parse_units(value: &str, decimals: u32) -> Result<U256, AmountError> {
    let trimmed = value.trim();
    let (whole, frac) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };
    ensure!(!whole.is_empty() || !frac.is_empty(), EmptyAmountSnafu);
    ensure!(
        whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()),
        InvalidDigitSnafu { value: trimmed }
    );
    // trailing zeros carry no precision
    let frac = frac.trim_end_matches('0');
    ensure!(
        frac.len() <= decimals as usize,
        TooPreciseSnafu {
            value: trimmed,
            decimals
        }
    );
    let mut digits = String::with_capacity(whole.len() + decimals as usize);
    digits.push_str(if whole.is_empty() { "0" } else { whole });
    digits.push_str(frac);
    for _ in frac.len()..decimals as usize {
        digits.push('0');
    }
    U256::from_dec_str(&digits).map_err(|_| AmountError::Overflow)
}

/// Returns Result<U256, AmountError> from parsing an ether amount into wei
///
/// # Arguments
///
/// * `value` - decimal ether string
pub fn parse_ether(value: &str) -> Result<U256, AmountError> {
    parse_units(value, ETHER_DECIMALS)
}

/// Returns String of an integer amount rendered with `decimals` decimal places, without
/// trailing zeros
///
/// # Arguments
///
/// * `amount` - amount in smallest units
/// * `decimals` - number of decimal places in one whole unit
pub fn format_units(amount: U256, decimals: u32) -> String {
    let raw = amount.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return raw;
    }
    let padded = if raw.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - raw.len()), raw)
    } else {
        raw
    };
    let (whole, frac) = padded.split_at(padded.len() - decimals);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, frac)
    }
}

/// Returns String of a wei amount rendered in ether
pub fn format_ether(amount: U256) -> String {
    format_units(amount, ETHER_DECIMALS)
}

/// Returns Result<U256, AmountError> of the payment for `quantity` units at `price` each
///
/// # Arguments
///
/// * `price` - price of one unit in smallest units
/// * `quantity` - number of units
pub fn total_value(price: U256, quantity: u32) -> Result<U256, AmountError> {
    price
        .checked_mul(U256::from(quantity))
        .ok_or(AmountError::Overflow)
}
