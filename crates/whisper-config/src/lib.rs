//! Configuration for the WhisperChain tools.
//!
//! Configuration is TOML with three sections: `[node]` (where and how to talk
//! to the chain), `[account]` (the signer key) and an optional `[minter]`
//! (which NFT contract to drive). `${VAR}` and `${VAR:-default}` references
//! are resolved from the environment before parsing, so keys can stay out of
//! the file.
//!
//! ## Modular Configuration Support
//!
//! - Use `include = ["file1.toml", "file2.toml"]` to pull in other files
//! - Each top-level section must be unique across all files

mod loader;

#[cfg(any(test, feature = "testing"))]
pub mod builders;

#[cfg(any(test, feature = "testing"))]
pub use builders::config::ConfigBuilder;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use whisper_types::{parse_ether, SecretString};

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message only; the full error embeds the input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Node connection and confirmation polling.
	pub node: NodeConfig,
	/// Signer used for every transaction.
	pub account: AccountConfig,
	/// NFT contract settings, needed only by minting tools.
	pub minter: Option<MinterConfig>,
}

/// Node connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeConfig {
	/// HTTP(S) JSON-RPC endpoint.
	pub rpc_url: String,
	/// Delay between receipt polls. Defaults to 1000 ms.
	#[serde(default = "default_poll_interval_ms")]
	pub poll_interval_ms: u64,
	/// How long to wait for a receipt. Defaults to 120 seconds.
	#[serde(default = "default_confirmation_timeout_seconds")]
	pub confirmation_timeout_seconds: u64,
}

impl NodeConfig {
	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}

	pub fn confirmation_timeout(&self) -> Duration {
		Duration::from_secs(self.confirmation_timeout_seconds)
	}
}

fn default_poll_interval_ms() -> u64 {
	1000
}

fn default_confirmation_timeout_seconds() -> u64 {
	120
}

/// Signer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	/// `0x`-prefixed, 64 hex digit private key.
	pub private_key: SecretString,
}

/// NFT minter settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MinterConfig {
	/// Address of the mintable contract.
	pub contract_address: String,
	/// JSON ABI (or compiler artifact) for the contract. The built-in
	/// mintable interface is used when absent.
	pub abi_path: Option<PathBuf>,
	/// Price in ether paid per mint in a batch.
	#[serde(default = "default_mint_price")]
	pub mint_price: String,
	/// Where metadata records are written.
	#[serde(default = "default_metadata_dir")]
	pub metadata_dir: PathBuf,
}

fn default_mint_price() -> String {
	"0".to_string()
}

fn default_metadata_dir() -> PathBuf {
	PathBuf::from("metadata")
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to bound regex work.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match (std::env::var(var_name.as_str()), cap.get(2)) {
			(Ok(value), _) => value,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				return Err(ConfigError::Validation(format!(
					"Environment variable '{}' not found",
					var_name.as_str()
				)));
			}
		};

		result.push_str(&input[last..full_match.start()]);
		result.push_str(&value);
		last = full_match.end();
	}

	result.push_str(&input[last..]);
	Ok(result)
}

fn is_http_url(url: &str) -> bool {
	url.starts_with("http://") || url.starts_with("https://")
}

fn is_hex_address(address: &str) -> bool {
	address.len() == 42
		&& address.starts_with("0x")
		&& address[2..].chars().all(|c| c.is_ascii_hexdigit())
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	///
	/// Each top-level section must be unique across all configuration files.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path.file_name().ok_or_else(|| {
			ConfigError::Validation(format!("Invalid path: {}", path.display()))
		})?;
		loader.load_config(file_name).await
	}

	/// Returns the minter section or a validation error naming it.
	pub fn minter(&self) -> Result<&MinterConfig, ConfigError> {
		self.minter
			.as_ref()
			.ok_or_else(|| ConfigError::Validation("Missing [minter] section".into()))
	}

	/// Validates the configuration:
	/// - the RPC URL is a non-empty http(s) URL
	/// - the poll interval is non-zero
	/// - the private key is 0x-prefixed 64-digit hex
	/// - the minter contract address and mint price parse
	fn validate(&self) -> Result<(), ConfigError> {
		if self.node.rpc_url.trim().is_empty() {
			return Err(ConfigError::Validation("node.rpc_url cannot be empty".into()));
		}
		if !is_http_url(&self.node.rpc_url) {
			return Err(ConfigError::Validation(format!(
				"node.rpc_url must be an http(s) URL, got '{}'",
				self.node.rpc_url
			)));
		}
		if self.node.poll_interval_ms == 0 {
			return Err(ConfigError::Validation(
				"node.poll_interval_ms must be greater than zero".into(),
			));
		}

		if self.account.private_key.is_empty() {
			return Err(ConfigError::Validation(
				"account.private_key is required".into(),
			));
		}
		let prefixed = self
			.account
			.private_key
			.with_exposed(|key| key.trim().starts_with("0x"));
		if !prefixed || !self.account.private_key.is_hex_private_key() {
			return Err(ConfigError::Validation(
				"account.private_key must be 0x followed by 64 hex digits".into(),
			));
		}

		if let Some(minter) = &self.minter {
			if !is_hex_address(&minter.contract_address) {
				return Err(ConfigError::Validation(format!(
					"minter.contract_address '{}' is not a valid address",
					minter.contract_address
				)));
			}
			parse_ether(&minter.mint_price).map_err(|e| {
				ConfigError::Validation(format!("minter.mint_price: {}", e))
			})?;
		}

		Ok(())
	}
}

/// Parses TOML, resolving environment variables first, then validates.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
