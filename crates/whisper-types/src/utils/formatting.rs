//! String formatting utilities.
//!
//! Hex prefix management and human-readable rendering of smallest-unit
//! amounts.

use super::conversion::ETHER_DECIMALS;
use alloy::primitives::utils::format_units;
use alloy::primitives::U256;

/// Adds "0x" prefix to a hex string if it doesn't already have one.
pub fn with_0x_prefix(hex_str: &str) -> String {
	if hex_str.to_lowercase().starts_with("0x") {
		hex_str.to_string()
	} else {
		format!("0x{}", hex_str)
	}
}

/// Removes "0x" or "0X" prefix from a hex string if present.
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}

/// Renders an integer amount of smallest units as a decimal string.
///
/// Trailing fractional zeros are dropped, so one ether reads `"1"` and
/// one and a half reads `"1.5"`.
pub fn format_units_trimmed(amount: U256, decimals: u8) -> String {
	if decimals == 0 {
		return amount.to_string();
	}

	let formatted = match format_units(amount, decimals) {
		Ok(s) => s,
		Err(_) => return amount.to_string(),
	};

	match formatted.split_once('.') {
		Some((whole, fraction)) => {
			let fraction = fraction.trim_end_matches('0');
			if fraction.is_empty() {
				whole.to_string()
			} else {
				format!("{}.{}", whole, fraction)
			}
		}
		None => formatted,
	}
}

/// Renders a wei amount as ether.
pub fn format_ether(wei: U256) -> String {
	format_units_trimmed(wei, ETHER_DECIMALS)
}
