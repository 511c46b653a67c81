//! Walks through the chain client: account creation, balances, message
//! signing and an optional ETH transfer.

use clap::Parser;
use whisper_config::Config;
use whisper_demo::{connect, init_tracing, CommonArgs};

/// Command-line arguments for the utilities demo.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	#[command(flatten)]
	common: CommonArgs,

	/// Address to inspect instead of the configured signer
	#[arg(long)]
	address: Option<String>,

	/// Message to sign and verify
	#[arg(long, default_value = "Hello, WhisperChain!")]
	message: String,

	/// Recipient of an optional transfer
	#[arg(long, requires = "amount")]
	send_to: Option<String>,

	/// Amount in ether for the transfer
	#[arg(long)]
	amount: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();
	init_tracing(&args.common.log_level);

	let config = Config::from_file(&args.common.config).await?;
	let client = connect(&config).await?;
	let key = &config.account.private_key;

	let chain_id = client.chain_id().await?;
	let block = client.get_block_number().await?;
	tracing::info!(chain_id, block, "Node reachable");

	let fresh = client.create_account();
	tracing::info!(address = %fresh.address, "Created account");

	let signer = whisper_client::signer_address(key)?.to_checksum(None);
	let address = args.address.unwrap_or(signer.clone());
	let balance = client.get_balance(&address).await?;
	tracing::info!(address = %address, balance = %balance, "Balance (ETH)");

	let signature = client.sign_message(&args.message, key).await?;
	let valid = client.verify_signature(&args.message, &signature, &signer)?;
	tracing::info!(signature = %signature, valid, "Signed message");

	if let (Some(to), Some(amount)) = (args.send_to, args.amount) {
		let hash = client.send_value(key, &to, &amount, None).await?;
		let receipt = client
			.wait_for_confirmation(&hash, client.settings().confirmation_timeout)
			.await?;
		tracing::info!(
			tx_hash = %hash,
			block_number = receipt.block_number,
			success = receipt.success,
			"Transfer mined"
		);
	}

	Ok(())
}
