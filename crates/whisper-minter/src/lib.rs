//! NFT minting workflow on top of the chain client.
//!
//! [`NftMinter`] binds one mintable contract and one signer key. Single mints
//! return as soon as the node accepts the transaction; batches run strictly
//! one after another, each mint confirmed before the next is built, so a
//! failure leaves a well-defined prefix of the batch on-chain.

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, U256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;
use whisper_client::contract::{parse_abi, single_output};
use whisper_client::{
	parse_address, BoundContract, ChainClient, ClientError, ContractDescriptor, TxOptions,
};
use whisper_types::{parse_ether, Attribute, NftMetadata, SecretString, TransactionHash};

/// Interface of a mintable ERC-721 with URI storage.
pub const MINTABLE_NFT_ABI: &str = r#"[
	{"type":"function","name":"mint","inputs":[{"name":"to","type":"address"},{"name":"uri","type":"string"}],"outputs":[],"stateMutability":"payable"},
	{"type":"function","name":"tokenURI","inputs":[{"name":"tokenId","type":"uint256"}],"outputs":[{"name":"","type":"string"}],"stateMutability":"view"},
	{"type":"function","name":"totalSupply","inputs":[],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"},
	{"type":"function","name":"ownerOf","inputs":[{"name":"tokenId","type":"uint256"}],"outputs":[{"name":"","type":"address"}],"stateMutability":"view"},
	{"type":"event","name":"Transfer","inputs":[{"name":"from","type":"address","indexed":true},{"name":"to","type":"address","indexed":true},{"name":"tokenId","type":"uint256","indexed":true}],"anonymous":false}
]"#;

/// Errors that can occur while minting or handling metadata.
#[derive(Debug, Error)]
pub enum MinterError {
	/// Batch inputs have different lengths. Nothing was sent.
	#[error("Recipients and metadata URIs must have the same length ({recipients} vs {uris})")]
	ArityMismatch { recipients: usize, uris: usize },
	/// A batch stopped part way; the first `minted` entries are confirmed.
	#[error("Batch aborted after {minted} confirmed mint(s): {source}")]
	BatchAborted { minted: usize, source: ClientError },
	#[error(transparent)]
	Client(#[from] ClientError),
	#[error("Metadata error: {0}")]
	Metadata(String),
}

/// Mints tokens on a single contract with a single signer.
pub struct NftMinter {
	client: Arc<ChainClient>,
	contract: BoundContract,
	signer_key: SecretString,
	confirmation_timeout: Duration,
	mint_price: U256,
}

impl NftMinter {
	/// Binds `descriptor` for minting with `signer_key`.
	///
	/// The confirmation timeout starts from the client's settings and the
	/// per-mint price used by batches is zero.
	pub fn new(
		client: Arc<ChainClient>,
		descriptor: ContractDescriptor,
		signer_key: SecretString,
	) -> Self {
		let confirmation_timeout = client.settings().confirmation_timeout;
		Self {
			client,
			contract: BoundContract::new(descriptor),
			signer_key,
			confirmation_timeout,
			mint_price: U256::ZERO,
		}
	}

	/// Binds the contract at `address` using [`MINTABLE_NFT_ABI`].
	pub fn with_default_abi(
		client: Arc<ChainClient>,
		address: &str,
		signer_key: SecretString,
	) -> Result<Self, MinterError> {
		let descriptor = ContractDescriptor::new(parse_address(address)?, parse_abi(MINTABLE_NFT_ABI)?);
		Ok(Self::new(client, descriptor, signer_key))
	}

	pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
		self.confirmation_timeout = timeout;
		self
	}

	/// Sets the price paid for every mint in [`NftMinter::mint_batch`].
	pub fn with_mint_price(mut self, price: &str) -> Result<Self, MinterError> {
		self.mint_price = parse_ether(price).map_err(ClientError::from)?;
		Ok(self)
	}

	pub fn contract(&self) -> &BoundContract {
		&self.contract
	}

	pub fn mint_price(&self) -> U256 {
		self.mint_price
	}

	/// Mints one token to `recipient`, paying `price` ether.
	///
	/// Returns once the node accepts the transaction; confirmation is up to
	/// the caller.
	pub async fn mint_one(
		&self,
		recipient: &str,
		metadata_uri: &str,
		price: &str,
	) -> Result<TransactionHash, MinterError> {
		let value = parse_ether(price).map_err(ClientError::from)?;
		Ok(self.send_mint(recipient, metadata_uri, value).await?)
	}

	/// Mints `recipients[i]` with `metadata_uris[i]` for every `i`, in order.
	///
	/// Each mint is confirmed before the next one is built. A rejected send,
	/// a missing receipt or a reverted receipt stops the batch and reports how
	/// many mints before it were confirmed.
	#[instrument(skip_all, fields(contract = %self.contract.address(), count = recipients.len()))]
	pub async fn mint_batch<R, U>(
		&self,
		recipients: &[R],
		metadata_uris: &[U],
	) -> Result<Vec<TransactionHash>, MinterError>
	where
		R: AsRef<str>,
		U: AsRef<str>,
	{
		if recipients.len() != metadata_uris.len() {
			return Err(MinterError::ArityMismatch {
				recipients: recipients.len(),
				uris: metadata_uris.len(),
			});
		}

		let mut hashes = Vec::with_capacity(recipients.len());
		for (recipient, uri) in recipients.iter().zip(metadata_uris) {
			let minted = hashes.len();
			let abort = |source: ClientError| MinterError::BatchAborted { minted, source };

			let hash = self
				.send_mint(recipient.as_ref(), uri.as_ref(), self.mint_price)
				.await
				.map_err(abort)?;
			let receipt = self
				.client
				.wait_for_confirmation(&hash, self.confirmation_timeout)
				.await
				.map_err(abort)?;

			if !receipt.success {
				return Err(abort(ClientError::Reverted(hash.to_string())));
			}

			tracing::info!(
				recipient = recipient.as_ref(),
				tx_hash = %hash,
				block_number = receipt.block_number,
				"Minted"
			);
			hashes.push(hash);
		}

		Ok(hashes)
	}

	/// Metadata URI stored for `token_id`.
	pub async fn token_uri(&self, token_id: U256) -> Result<String, MinterError> {
		let value = self
			.read("tokenURI", &[DynSolValue::Uint(token_id, 256)])
			.await?;
		value
			.as_str()
			.map(str::to_string)
			.ok_or_else(|| ClientError::Decode("tokenURI did not return a string".into()).into())
	}

	pub async fn total_supply(&self) -> Result<U256, MinterError> {
		let value = self.read("totalSupply", &[]).await?;
		value
			.as_uint()
			.map(|(supply, _)| supply)
			.ok_or_else(|| ClientError::Decode("totalSupply did not return an integer".into()).into())
	}

	pub async fn owner_of(&self, token_id: U256) -> Result<Address, MinterError> {
		let value = self
			.read("ownerOf", &[DynSolValue::Uint(token_id, 256)])
			.await?;
		value
			.as_address()
			.ok_or_else(|| ClientError::Decode("ownerOf did not return an address".into()).into())
	}

	/// Builds a metadata record. An empty attribute list is treated as none.
	pub fn create_metadata(
		name: &str,
		description: &str,
		image: &str,
		attributes: Option<Vec<Attribute>>,
	) -> NftMetadata {
		NftMetadata::new(name, description, image, attributes)
	}

	/// Writes `metadata` as indented JSON to `path`, creating parent
	/// directories as needed. Returns the path written.
	pub async fn save_metadata(
		metadata: &NftMetadata,
		path: impl AsRef<Path>,
	) -> Result<PathBuf, MinterError> {
		let path = path.as_ref();
		let json = metadata
			.to_pretty_json()
			.map_err(|e| MinterError::Metadata(e.to_string()))?;

		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			tokio::fs::create_dir_all(parent)
				.await
				.map_err(|e| MinterError::Metadata(format!("{}: {}", parent.display(), e)))?;
		}

		// Write to a sibling then rename so readers never see a partial file
		let temp_path = path.with_extension("json.tmp");
		tokio::fs::write(&temp_path, json)
			.await
			.map_err(|e| MinterError::Metadata(format!("{}: {}", temp_path.display(), e)))?;
		tokio::fs::rename(&temp_path, path)
			.await
			.map_err(|e| MinterError::Metadata(format!("{}: {}", path.display(), e)))?;

		tracing::debug!(path = %path.display(), "Saved metadata");
		Ok(path.to_path_buf())
	}

	/// Reads a record written by [`NftMinter::save_metadata`].
	pub async fn load_metadata(path: impl AsRef<Path>) -> Result<NftMetadata, MinterError> {
		let path = path.as_ref();
		let content = tokio::fs::read_to_string(path)
			.await
			.map_err(|e| MinterError::Metadata(format!("{}: {}", path.display(), e)))?;
		serde_json::from_str(&content)
			.map_err(|e| MinterError::Metadata(format!("{}: {}", path.display(), e)))
	}

	async fn send_mint(
		&self,
		recipient: &str,
		metadata_uri: &str,
		value: U256,
	) -> Result<TransactionHash, ClientError> {
		let args = [
			DynSolValue::Address(parse_address(recipient)?),
			DynSolValue::String(metadata_uri.to_string()),
		];
		let hash = self
			.client
			.call_state_changing(
				&self.contract,
				"mint",
				&self.signer_key,
				&args,
				TxOptions::default().with_value(value),
			)
			.await?;

		tracing::info!(recipient, tx_hash = %hash, "Submitted mint");
		Ok(hash)
	}

	async fn read(&self, function: &str, args: &[DynSolValue]) -> Result<DynSolValue, ClientError> {
		let values = self
			.client
			.call_read_only(&self.contract, function, args)
			.await?;
		single_output(function, values)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::consensus::Transaction as _;
	use whisper_client::implementations::mock::MockNode;
	use whisper_client::ClientSettings;

	const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
	const NFT: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
	const ALICE: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";
	const BOB: &str = "0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc";
	const CAROL: &str = "0x90f79bf6eb2c4f870365e785982e1f101e93b906";

	async fn minter_with(node: Arc<MockNode>) -> NftMinter {
		let client = ChainClient::from_node(node, ClientSettings::default())
			.await
			.unwrap();
		NftMinter::with_default_abi(Arc::new(client), NFT, SecretString::from(KEY)).unwrap()
	}

	fn receipt_polls(node: &MockNode) -> usize {
		node.methods()
			.iter()
			.filter(|m| **m == "eth_getTransactionReceipt")
			.count()
	}

	#[tokio::test]
	async fn test_mint_one_pays_price_and_encodes_arguments() {
		let node = Arc::new(MockNode::new());
		let minter = minter_with(node.clone()).await;

		minter
			.mint_one(ALICE, "ipfs://QmMetadata", "0.01")
			.await
			.unwrap();

		let sent = node.sent_transactions();
		assert_eq!(sent.len(), 1);
		assert_eq!(sent[0].value(), U256::from(10_000_000_000_000_000u64));
		assert_eq!(sent[0].to(), Some(parse_address(NFT).unwrap()));

		let mint = minter.contract().function("mint", 2).unwrap();
		assert_eq!(&sent[0].input()[..4], mint.selector().as_slice());
		assert_eq!(receipt_polls(&node), 0);
	}

	#[tokio::test]
	async fn test_mint_one_rejects_bad_recipient() {
		let node = Arc::new(MockNode::new());
		let minter = minter_with(node.clone()).await;

		let result = minter.mint_one("alice", "ipfs://x", "0").await;
		assert!(matches!(
			result,
			Err(MinterError::Client(ClientError::InvalidAddress(_)))
		));
		assert!(node.sent_transactions().is_empty());
	}

	#[tokio::test]
	async fn test_mint_batch_arity_mismatch_makes_no_calls() {
		let node = Arc::new(MockNode::new());
		let minter = minter_with(node.clone()).await;
		let calls_before = node.methods().len();

		let result = minter
			.mint_batch(&[ALICE, BOB], &["ipfs://1"])
			.await;

		assert!(matches!(
			result,
			Err(MinterError::ArityMismatch {
				recipients: 2,
				uris: 1
			})
		));
		assert_eq!(node.methods().len(), calls_before);
	}

	#[tokio::test]
	async fn test_mint_batch_is_serial_and_confirmed() {
		let node = Arc::new(MockNode::new());
		let minter = minter_with(node.clone())
			.await
			.with_mint_price("0.5")
			.unwrap();

		let hashes = minter
			.mint_batch(&[ALICE, BOB, CAROL], &["ipfs://1", "ipfs://2", "ipfs://3"])
			.await
			.unwrap();

		assert_eq!(hashes.len(), 3);
		let sent = node.sent_transactions();
		let nonces: Vec<u64> = sent.iter().map(|tx| tx.nonce()).collect();
		assert_eq!(nonces, vec![0, 1, 2]);
		assert!(sent.iter().all(|tx| tx.value() == minter.mint_price()));

		// every send is followed by a receipt poll before the next send
		let order: Vec<&str> = node
			.methods()
			.into_iter()
			.filter(|m| *m == "eth_sendRawTransaction" || *m == "eth_getTransactionReceipt")
			.collect();
		assert_eq!(
			order,
			vec![
				"eth_sendRawTransaction",
				"eth_getTransactionReceipt",
				"eth_sendRawTransaction",
				"eth_getTransactionReceipt",
				"eth_sendRawTransaction",
				"eth_getTransactionReceipt",
			]
		);
	}

	#[tokio::test]
	async fn test_mint_batch_send_failure_reports_prior_mints() {
		let node = Arc::new(MockNode::new().fail_send_at(2, "replacement transaction underpriced"));
		let minter = minter_with(node.clone()).await;

		let result = minter
			.mint_batch(
				&[ALICE, BOB, CAROL, ALICE],
				&["ipfs://1", "ipfs://2", "ipfs://3", "ipfs://4"],
			)
			.await;

		match result {
			Err(MinterError::BatchAborted { minted, source }) => {
				assert_eq!(minted, 2);
				assert!(matches!(source, ClientError::Rpc(_)));
			}
			other => panic!("expected aborted batch, got {:?}", other),
		}
		assert_eq!(node.sent_transactions().len(), 2);
	}

	#[tokio::test]
	async fn test_mint_batch_reverted_mint_aborts() {
		let node = Arc::new(MockNode::new().revert_send_at(1));
		let minter = minter_with(node.clone()).await;

		let result = minter
			.mint_batch(&[ALICE, BOB, CAROL], &["ipfs://1", "ipfs://2", "ipfs://3"])
			.await;

		assert!(matches!(
			result,
			Err(MinterError::BatchAborted {
				minted: 1,
				source: ClientError::Reverted(_)
			})
		));
		assert_eq!(node.sent_transactions().len(), 2);
	}

	#[tokio::test(start_paused = true)]
	async fn test_mint_batch_timeout_aborts_first_mint() {
		let node = Arc::new(MockNode::new().withhold_receipts());
		let minter = minter_with(node.clone())
			.await
			.with_confirmation_timeout(Duration::from_secs(2));

		let result = minter.mint_batch(&[ALICE, BOB], &["ipfs://1", "ipfs://2"]).await;

		assert!(matches!(
			result,
			Err(MinterError::BatchAborted {
				minted: 0,
				source: ClientError::Timeout { .. }
			})
		));
		assert_eq!(node.sent_transactions().len(), 1);
	}

	#[tokio::test]
	async fn test_empty_batch_is_a_no_op() {
		let node = Arc::new(MockNode::new());
		let minter = minter_with(node.clone()).await;

		let hashes = minter
			.mint_batch::<&str, &str>(&[], &[])
			.await
			.unwrap();
		assert!(hashes.is_empty());
		assert!(node.sent_transactions().is_empty());
	}

	#[tokio::test]
	async fn test_read_only_delegations() {
		let node = Arc::new(MockNode::new());
		let minter = minter_with(node.clone()).await;
		let selector = |name: &str, arity: usize| {
			minter.contract().function(name, arity).unwrap().selector().0
		};

		node.set_call_response(
			selector("tokenURI", 1),
			DynSolValue::Tuple(vec![DynSolValue::String("ipfs://QmToken1".into())])
				.abi_encode_params(),
		);
		node.set_call_response(
			selector("totalSupply", 0),
			U256::from(3u64).to_be_bytes::<32>().to_vec(),
		);
		node.set_call_response(
			selector("ownerOf", 1),
			parse_address(BOB).unwrap().into_word().to_vec(),
		);

		assert_eq!(
			minter.token_uri(U256::from(1u64)).await.unwrap(),
			"ipfs://QmToken1"
		);
		assert_eq!(minter.total_supply().await.unwrap(), U256::from(3u64));
		assert_eq!(
			minter.owner_of(U256::from(1u64)).await.unwrap(),
			parse_address(BOB).unwrap()
		);
	}

	#[tokio::test]
	async fn test_save_and_load_metadata() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("metadata").join("nested").join("1.json");
		let metadata = NftMinter::create_metadata(
			"Whisper Avatar #1",
			"Unique avatar for WhisperChain",
			"ipfs://QmExample",
			Some(vec![
				Attribute::new("Background", "Blue"),
				Attribute::new("Rarity", "Rare"),
			]),
		);

		let written = NftMinter::save_metadata(&metadata, &path).await.unwrap();
		assert_eq!(written, path);

		let content = std::fs::read_to_string(&path).unwrap();
		assert!(content.starts_with("{\n  \"name\": \"Whisper Avatar #1\""));
		assert!(!path.with_extension("json.tmp").exists());

		let loaded = NftMinter::load_metadata(&path).await.unwrap();
		assert_eq!(loaded, metadata);
	}

	#[tokio::test]
	async fn test_save_metadata_without_attributes() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("plain.json");
		let metadata = NftMinter::create_metadata("A", "B", "ipfs://x", Some(vec![]));

		NftMinter::save_metadata(&metadata, &path).await.unwrap();

		let value: serde_json::Value =
			serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
		assert_eq!(
			value,
			serde_json::json!({"name": "A", "description": "B", "image": "ipfs://x"})
		);
	}

	#[tokio::test]
	async fn test_load_missing_metadata_fails() {
		let dir = tempfile::tempdir().unwrap();
		let result = NftMinter::load_metadata(dir.path().join("missing.json")).await;
		assert!(matches!(result, Err(MinterError::Metadata(_))));
	}
}
