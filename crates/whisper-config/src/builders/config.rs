//! Configuration builder for tests and local development.

use crate::{AccountConfig, Config, MinterConfig, NodeConfig};
use std::path::PathBuf;
use whisper_types::SecretString;

/// Well-known development key (first account of a local dev node).
const DEV_PRIVATE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Builder for creating `Config` instances with a fluent API.
///
/// Defaults point at a local node on port 8545 with the dev key and no
/// minter section.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	rpc_url: String,
	poll_interval_ms: u64,
	confirmation_timeout_seconds: u64,
	private_key: String,
	minter: Option<MinterConfig>,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	pub fn new() -> Self {
		Self {
			rpc_url: "http://localhost:8545".to_string(),
			poll_interval_ms: 1000,
			confirmation_timeout_seconds: 120,
			private_key: DEV_PRIVATE_KEY.to_string(),
			minter: None,
		}
	}

	pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
		self.rpc_url = url.into();
		self
	}

	pub fn poll_interval_ms(mut self, interval: u64) -> Self {
		self.poll_interval_ms = interval;
		self
	}

	pub fn confirmation_timeout_seconds(mut self, timeout: u64) -> Self {
		self.confirmation_timeout_seconds = timeout;
		self
	}

	pub fn private_key(mut self, key: impl Into<String>) -> Self {
		self.private_key = key.into();
		self
	}

	/// Adds a minter section for `contract_address` with default price and
	/// metadata directory.
	pub fn minter(mut self, contract_address: impl Into<String>) -> Self {
		self.minter = Some(MinterConfig {
			contract_address: contract_address.into(),
			abi_path: None,
			mint_price: "0".to_string(),
			metadata_dir: PathBuf::from("metadata"),
		});
		self
	}

	/// Sets the batch mint price. Has no effect without a minter section.
	pub fn mint_price(mut self, price: impl Into<String>) -> Self {
		if let Some(minter) = self.minter.as_mut() {
			minter.mint_price = price.into();
		}
		self
	}

	/// Builds the `Config` without validating it.
	pub fn build(self) -> Config {
		Config {
			node: NodeConfig {
				rpc_url: self.rpc_url,
				poll_interval_ms: self.poll_interval_ms,
				confirmation_timeout_seconds: self.confirmation_timeout_seconds,
			},
			account: AccountConfig {
				private_key: SecretString::from(self.private_key),
			},
			minter: self.minter,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;

	#[test]
	fn test_defaults_target_local_node() {
		let config = ConfigBuilder::new().build();
		assert_eq!(config.node.rpc_url, "http://localhost:8545");
		assert_eq!(config.node.poll_interval(), Duration::from_secs(1));
		assert!(config.minter.is_none());
	}

	#[test]
	fn test_minter_section() {
		let config = ConfigBuilder::new()
			.poll_interval_ms(10)
			.minter("0x5FbDB2315678afecb367f032d93F642f64180aa3")
			.mint_price("0.2")
			.build();

		let minter = config.minter().unwrap();
		assert_eq!(minter.mint_price, "0.2");
		assert_eq!(config.node.poll_interval(), Duration::from_millis(10));
	}
}
