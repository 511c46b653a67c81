//! Utility functions for amount conversion and hex formatting.

pub mod conversion;
pub mod formatting;

pub use conversion::{parse_ether, parse_units_exact, AmountError, ETHER_DECIMALS};
pub use formatting::{format_ether, format_units_trimmed, with_0x_prefix, without_0x_prefix};
