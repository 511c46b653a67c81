//! Shared setup for the demo binaries.
//!
//! Both demos take `--config` and `--log-level`, install a tracing subscriber
//! and connect a [`ChainClient`] from the `[node]` section.

use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use whisper_client::{ChainClient, ClientError, ClientSettings};
use whisper_config::Config;

/// Command-line arguments common to every demo.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	pub config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	pub log_level: String,
}

/// Installs a formatting subscriber. `RUST_LOG` takes precedence over
/// `log_level`.
pub fn init_tracing(log_level: &str) {
	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

	fmt().with_env_filter(env_filter).with_target(true).init();
}

/// Polling settings taken from the `[node]` section.
pub fn client_settings(config: &Config) -> ClientSettings {
	ClientSettings {
		poll_interval: config.node.poll_interval(),
		confirmation_timeout: config.node.confirmation_timeout(),
	}
}

/// Connects to the configured node.
pub async fn connect(config: &Config) -> Result<Arc<ChainClient>, ClientError> {
	let client = ChainClient::connect(&config.node.rpc_url, client_settings(config)).await?;
	Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;
	use whisper_config::ConfigBuilder;

	#[test]
	fn test_client_settings_follow_node_section() {
		let config = ConfigBuilder::new()
			.poll_interval_ms(250)
			.confirmation_timeout_seconds(15)
			.build();

		let settings = client_settings(&config);
		assert_eq!(settings.poll_interval, Duration::from_millis(250));
		assert_eq!(settings.confirmation_timeout, Duration::from_secs(15));
	}

	#[tokio::test]
	async fn test_connect_fails_for_unreachable_node() {
		let config = ConfigBuilder::new().rpc_url("http://127.0.0.1:1").build();
		let result = connect(&config).await;
		assert!(matches!(result, Err(ClientError::Connection(_))));
	}
}
