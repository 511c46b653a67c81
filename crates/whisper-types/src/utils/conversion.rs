//! Decimal amount to smallest-unit conversion.
//!
//! Values are always carried as integers of the smallest unit (wei). Decimal
//! strings are converted exactly; an amount that cannot be represented without
//! rounding is rejected instead of being truncated.

use alloy::primitives::utils::{parse_units, ParseUnits};
use alloy::primitives::U256;
use thiserror::Error;

/// Number of decimals of the native currency.
pub const ETHER_DECIMALS: u8 = 18;

/// Errors produced while converting a decimal amount.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
	#[error("Amount is empty")]
	Empty,
	#[error("Amount '{0}' is negative")]
	Negative(String),
	#[error("Amount '{amount}' has more than {decimals} fractional digits")]
	TooPrecise { amount: String, decimals: u8 },
	#[error("Amount '{amount}' is not a decimal number: {reason}")]
	Malformed { amount: String, reason: String },
}

/// Converts a decimal string into an integer of `decimals` smallest units.
///
/// `"1.5"` with 18 decimals becomes `1_500_000_000_000_000_000`.
pub fn parse_units_exact(amount: &str, decimals: u8) -> Result<U256, AmountError> {
	let amount = amount.trim();
	if amount.is_empty() {
		return Err(AmountError::Empty);
	}
	if amount.starts_with('-') {
		return Err(AmountError::Negative(amount.to_string()));
	}

	let malformed = |reason: String| AmountError::Malformed {
		amount: amount.to_string(),
		reason,
	};

	let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));
	if whole.is_empty() && fraction.is_empty() {
		return Err(malformed("no digits".to_string()));
	}
	if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
		return Err(malformed("unexpected character".to_string()));
	}
	if fraction.trim_end_matches('0').len() > decimals as usize {
		return Err(AmountError::TooPrecise {
			amount: amount.to_string(),
			decimals,
		});
	}

	// Trailing zeros beyond the unit precision carry no value.
	let fraction = fraction.trim_end_matches('0');
	let normalized = match (whole.is_empty(), fraction.is_empty()) {
		(true, _) => format!("0.{}", fraction),
		(false, true) => whole.to_string(),
		(false, false) => format!("{}.{}", whole, fraction),
	};

	match parse_units(&normalized, decimals).map_err(|e| malformed(e.to_string()))? {
		ParseUnits::U256(value) => Ok(value),
		ParseUnits::I256(_) => Err(AmountError::Negative(amount.to_string())),
	}
}

/// Converts a decimal ether amount into wei.
pub fn parse_ether(amount: &str) -> Result<U256, AmountError> {
	parse_units_exact(amount, ETHER_DECIMALS)
}
