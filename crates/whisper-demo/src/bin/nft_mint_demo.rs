//! End-to-end minting walkthrough: write a metadata record, mint a token to a
//! recipient and report the contract's supply.

use clap::Parser;
use whisper_client::{ClientError, ContractDescriptor};
use whisper_config::Config;
use whisper_demo::{connect, init_tracing, CommonArgs};
use whisper_minter::NftMinter;
use whisper_types::Attribute;

/// Command-line arguments for the minting demo.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	#[command(flatten)]
	common: CommonArgs,

	/// Token recipient; defaults to the configured signer
	#[arg(long)]
	recipient: Option<String>,

	/// Metadata URI stored on-chain (e.g. after uploading the record)
	#[arg(long, default_value = "ipfs://QmMetadata")]
	metadata_uri: String,

	/// Mint price in ether; defaults to the configured price
	#[arg(long)]
	price: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();
	init_tracing(&args.common.log_level);

	let config = Config::from_file(&args.common.config).await?;
	let minter_config = config.minter()?;
	let client = connect(&config).await?;
	let key = config.account.private_key.clone();

	let minter = match &minter_config.abi_path {
		Some(abi_path) => {
			let address = whisper_client::parse_address(&minter_config.contract_address)?;
			let descriptor = ContractDescriptor::from_abi_file(address, abi_path)?;
			NftMinter::new(client.clone(), descriptor, key.clone())
		}
		None => NftMinter::with_default_abi(
			client.clone(),
			&minter_config.contract_address,
			key.clone(),
		)?,
	}
	.with_mint_price(&minter_config.mint_price)?;

	let metadata = NftMinter::create_metadata(
		"Whisper Avatar #1",
		"Unique avatar for WhisperChain",
		"ipfs://QmExample",
		Some(vec![
			Attribute::new("Background", "Blue"),
			Attribute::new("Expression", "Happy"),
			Attribute::new("Rarity", "Rare"),
		]),
	);
	let path =
		NftMinter::save_metadata(&metadata, minter_config.metadata_dir.join("1.json")).await?;
	tracing::info!(path = %path.display(), "Saved metadata");

	let recipient = match args.recipient {
		Some(recipient) => recipient,
		None => whisper_client::signer_address(&key)?.to_checksum(None),
	};
	let price = args.price.unwrap_or_else(|| minter_config.mint_price.clone());

	let hash = minter.mint_one(&recipient, &args.metadata_uri, &price).await?;
	let receipt = client
		.wait_for_confirmation(&hash, client.settings().confirmation_timeout)
		.await?;
	if !receipt.success {
		return Err(ClientError::Reverted(hash.to_string()).into());
	}
	tracing::info!(tx_hash = %hash, block_number = receipt.block_number, "NFT minted");

	let total_supply = minter.total_supply().await?;
	tracing::info!(total_supply = %total_supply, "Total NFTs minted");

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults_leave_overrides_to_config() {
		let args = Args::try_parse_from(["nft-mint-demo"]).unwrap();
		assert_eq!(args.metadata_uri, "ipfs://QmMetadata");
		assert!(args.recipient.is_none());
		assert!(args.price.is_none());
	}

	#[test]
	fn test_recipient_and_price_overrides() {
		let args = Args::try_parse_from([
			"nft-mint-demo",
			"--config",
			"minter.toml",
			"--recipient",
			"0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
			"--price",
			"0.01",
		])
		.unwrap();
		assert_eq!(args.common.config.to_str(), Some("minter.toml"));
		assert_eq!(args.price.as_deref(), Some("0.01"));
	}
}
