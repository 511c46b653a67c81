//! Common types for the WhisperChain EVM toolkit.
//!
//! This crate defines the data types shared by the account, client and minter
//! crates so that every layer agrees on how hashes, receipts, secrets and NFT
//! metadata are represented.

/// NFT metadata records in the marketplace JSON layout.
pub mod metadata;
/// Secret wrapper for signer keys.
pub mod secret_string;
/// Transaction hashes and receipts returned by the node.
pub mod transaction;
/// Utility functions for unit conversion and hex formatting.
pub mod utils;

pub use metadata::{Attribute, NftMetadata};
pub use secret_string::SecretString;
pub use transaction::{TransactionHash, TransactionHashError, TransactionReceipt};
pub use utils::{
	format_ether, format_units_trimmed, parse_ether, parse_units_exact, with_0x_prefix,
	without_0x_prefix, AmountError, ETHER_DECIMALS,
};
