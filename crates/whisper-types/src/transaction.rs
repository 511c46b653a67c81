//! Transaction types shared across the toolkit.
//!
//! This module defines the identifiers and confirmation records the node
//! returns once a signed transaction has been broadcast.

use crate::utils::with_0x_prefix;
use alloy::primitives::{Address, Log, B256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a transaction hash cannot be parsed from hex.
#[derive(Debug, Error)]
#[error("Invalid transaction hash '{input}': {reason}")]
pub struct TransactionHashError {
	pub input: String,
	pub reason: String,
}

/// Hash identifying a broadcast transaction.
///
/// Renders as `0x`-prefixed lowercase hex, which is the form nodes and block
/// explorers accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TransactionHash(pub B256);

impl TransactionHash {
	/// Returns the raw 32-byte hash.
	pub fn as_b256(&self) -> B256 {
		self.0
	}
}

impl From<B256> for TransactionHash {
	fn from(hash: B256) -> Self {
		Self(hash)
	}
}

impl fmt::Display for TransactionHash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", with_0x_prefix(&hex::encode(self.0)))
	}
}

impl FromStr for TransactionHash {
	type Err = TransactionHashError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		s.trim()
			.parse::<B256>()
			.map(Self)
			.map_err(|e| TransactionHashError {
				input: s.to_string(),
				reason: e.to_string(),
			})
	}
}

/// Receipt for a mined transaction.
///
/// A transaction accepted by the node can still fail on-chain; `success` is the
/// only place that outcome is reported.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TransactionReceipt {
	/// The hash of the transaction.
	pub hash: TransactionHash,
	/// The block number where the transaction was included.
	pub block_number: u64,
	/// Whether the transaction executed successfully.
	pub success: bool,
	/// Address of the created contract, for deployment transactions.
	pub contract_address: Option<Address>,
	/// Gas consumed by the transaction.
	pub gas_used: u64,
	/// Logs emitted during execution.
	#[serde(default)]
	pub logs: Vec<Log>,
}
