//! Account management for the WhisperChain toolkit.
//!
//! This crate wraps local signer keys: deriving addresses, signing transaction
//! requests into broadcastable envelopes, signing and verifying messages, and
//! generating fresh key pairs. Keys never leave the calling process.

use alloy::consensus::TxEnvelope;
use alloy::primitives::{keccak256, Address, Signature, B256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use thiserror::Error;
use whisper_types::{with_0x_prefix, without_0x_prefix, SecretString};

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

pub use implementations::local::{create_account, GeneratedAccount, LocalAccount};

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// The key is malformed or not a valid secp256k1 scalar.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	/// Signing failed, including incomplete transaction requests.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	/// The signature bytes could not be decoded.
	#[error("Invalid signature: {0}")]
	InvalidSignature(String),
}

/// Interface for anything that can sign on behalf of an address.
#[async_trait]
pub trait AccountInterface: Send + Sync {
	/// Address the account signs for.
	fn address(&self) -> Address;

	/// Signs a fully populated transaction request.
	///
	/// Every field (nonce, gas, gas price, chain id) must already be resolved;
	/// the request is rejected rather than completed.
	async fn sign_transaction(&self, request: TransactionRequest)
		-> Result<TxEnvelope, AccountError>;

	/// Signs the keccak-256 hash of `message`.
	async fn sign_message(&self, message: &[u8]) -> Result<Signature, AccountError>;
}

/// Hash used for message signatures: plain keccak-256 of the message bytes,
/// signed as a prehashed digest without the EIP-191 prefix.
pub fn message_hash(message: &[u8]) -> B256 {
	keccak256(message)
}

/// Encodes a signature as `0x`-prefixed 65-byte `r || s || v` hex.
pub fn signature_to_hex(signature: &Signature) -> String {
	with_0x_prefix(&hex::encode(signature.as_bytes()))
}

/// Decodes a 65-byte `r || s || v` signature from hex.
pub fn signature_from_hex(signature: &str) -> Result<Signature, AccountError> {
	let bytes = hex::decode(without_0x_prefix(signature.trim()))
		.map_err(|e| AccountError::InvalidSignature(format!("not hex: {}", e)))?;

	if bytes.len() != 65 {
		return Err(AccountError::InvalidSignature(format!(
			"expected 65 bytes, got {}",
			bytes.len()
		)));
	}

	Signature::try_from(bytes.as_slice())
		.map_err(|e| AccountError::InvalidSignature(e.to_string()))
}

/// Checks that `signature` over `message` was produced by `expected_address`.
///
/// Addresses are compared case-insensitively. A well-formed signature from a
/// different key, or one that recovers to no key at all, yields `Ok(false)`;
/// only undecodable signature bytes are an error.
pub fn verify_message(
	message: &[u8],
	signature: &str,
	expected_address: &str,
) -> Result<bool, AccountError> {
	let signature = signature_from_hex(signature)?;
	let hash = message_hash(message);

	let recovered = match signature.recover_address_from_prehash(&hash) {
		Ok(address) => address,
		Err(e) => {
			tracing::debug!(error = %e, "Signature did not recover to a key");
			return Ok(false);
		}
	};

	let expected = with_0x_prefix(expected_address.trim()).to_lowercase();
	Ok(recovered.to_string().to_lowercase() == expected)
}

/// Service that signs on behalf of one account.
pub struct AccountService {
	implementation: Box<dyn AccountInterface>,
}

impl AccountService {
	pub fn new(implementation: Box<dyn AccountInterface>) -> Self {
		Self { implementation }
	}

	/// Builds a service around a local key.
	pub fn from_key(key: &SecretString) -> Result<Self, AccountError> {
		Ok(Self::new(Box::new(LocalAccount::from_key(key)?)))
	}

	pub fn address(&self) -> Address {
		self.implementation.address()
	}

	/// Signs a transaction using the managed account.
	pub async fn sign(&self, request: TransactionRequest) -> Result<TxEnvelope, AccountError> {
		self.implementation.sign_transaction(request).await
	}

	/// Signs a message and returns the hex encoded signature.
	pub async fn sign_message(&self, message: &[u8]) -> Result<String, AccountError> {
		let signature = self.implementation.sign_message(message).await?;
		Ok(signature_to_hex(&signature))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
	const ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

	#[tokio::test]
	async fn test_sign_and_verify_round_trip() {
		let service = AccountService::from_key(&SecretString::from(KEY)).unwrap();
		let signature = service.sign_message(b"hello whisper").await.unwrap();

		assert!(signature.starts_with("0x"));
		assert_eq!(signature.len(), 2 + 130);
		assert!(verify_message(b"hello whisper", &signature, ADDRESS).unwrap());
		assert!(verify_message(b"hello whisper", &signature, &ADDRESS.to_lowercase()).unwrap());
	}

	#[tokio::test]
	async fn test_round_trip_holds_for_generated_keys() {
		let messages: [&[u8]; 5] = [
			b"",
			b"a",
			"gr\u{fc}\u{df}e \u{1f680} \u{4e16}\u{754c}".as_bytes(),
			&[0x00, 0xff, 0x80, 0x7f],
			&[0x5a; 1024],
		];

		for _ in 0..4 {
			let account = create_account();
			let service = AccountService::from_key(&account.private_key).unwrap();
			assert_eq!(service.address(), account.address);

			for message in messages {
				let signature = service.sign_message(message).await.unwrap();
				let address = account.address.to_string();
				assert!(verify_message(message, &signature, &address).unwrap());
				assert!(verify_message(message, &signature, &address.to_lowercase()).unwrap());
			}
		}
	}

	#[tokio::test]
	async fn test_verify_rejects_other_message_and_signer() {
		let service = AccountService::from_key(&SecretString::from(KEY)).unwrap();
		let signature = service.sign_message(b"original").await.unwrap();

		assert!(!verify_message(b"tampered", &signature, ADDRESS).unwrap());

		let other = create_account();
		assert!(!verify_message(b"original", &signature, &other.address.to_string()).unwrap());
	}

	#[test]
	fn test_malformed_signature_is_an_error() {
		assert!(matches!(
			verify_message(b"m", "0xzz", ADDRESS),
			Err(AccountError::InvalidSignature(_))
		));
		assert!(matches!(
			verify_message(b"m", "0x1234", ADDRESS),
			Err(AccountError::InvalidSignature(_))
		));
	}

	#[test]
	fn test_message_hash_is_plain_keccak() {
		assert_eq!(
			message_hash(b"").to_string(),
			"0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
		);
	}
}
