//! Local private-key account.
//!
//! Keys are parsed from a [`SecretString`] for the lifetime of one
//! [`LocalAccount`]. Callers create an account per operation and drop it when
//! the signature is produced.

use crate::{message_hash, AccountError, AccountInterface};
use alloy::consensus::TxEnvelope;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Signature};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use async_trait::async_trait;
use whisper_types::{with_0x_prefix, SecretString};

/// Account backed by an in-memory secp256k1 key.
pub struct LocalAccount {
	signer: PrivateKeySigner,
}

impl LocalAccount {
	/// Parses a hex private key, with or without `0x`.
	pub fn from_key(key: &SecretString) -> Result<Self, AccountError> {
		let signer = key.with_exposed(|k| {
			k.trim()
				.parse::<PrivateKeySigner>()
				.map_err(|_| AccountError::InvalidKey("Invalid private key format".to_string()))
		})?;
		Ok(Self { signer })
	}
}

impl std::fmt::Debug for LocalAccount {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LocalAccount")
			.field("address", &self.signer.address())
			.finish()
	}
}

#[async_trait]
impl AccountInterface for LocalAccount {
	fn address(&self) -> Address {
		self.signer.address()
	}

	async fn sign_transaction(
		&self,
		request: TransactionRequest,
	) -> Result<TxEnvelope, AccountError> {
		if let Some(from) = request.from {
			if from != self.signer.address() {
				return Err(AccountError::SigningFailed(format!(
					"Request sender {} does not match key address {}",
					from,
					self.signer.address()
				)));
			}
		}

		let wallet = EthereumWallet::from(self.signer.clone());
		request
			.build(&wallet)
			.await
			.map_err(|e| AccountError::SigningFailed(e.to_string()))
	}

	async fn sign_message(&self, message: &[u8]) -> Result<Signature, AccountError> {
		self.signer
			.sign_hash_sync(&message_hash(message))
			.map_err(|e| AccountError::SigningFailed(e.to_string()))
	}
}

/// A freshly generated key pair.
#[derive(Debug, Clone)]
pub struct GeneratedAccount {
	pub address: Address,
	/// `0x`-prefixed hex private key.
	pub private_key: SecretString,
}

/// Generates a new key pair from the operating system's secure RNG.
pub fn create_account() -> GeneratedAccount {
	let signer = PrivateKeySigner::random();
	GeneratedAccount {
		address: signer.address(),
		private_key: SecretString::new(with_0x_prefix(&hex::encode(signer.to_bytes()))),
	}
}
