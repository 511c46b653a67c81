//! Chain client adapter for the WhisperChain toolkit.
//!
//! This crate turns high-level intents (move ETH, deploy a contract, call a
//! contract function by name, sign a message) into node RPC calls. Every write
//! follows the same lifecycle:
//!
//! 1. **build**: assemble a transaction request with every field resolved
//! 2. **sign**: locally, with a key that never leaves the process
//! 3. **broadcast**: submit the raw signed bytes
//! 4. **confirm**: optional, caller-driven receipt polling
//!
//! Broadcast success is not confirmation. A transaction accepted by the node
//! can still fail on-chain, which only the receipt's status flag reports.

use alloy::dyn_abi::DynSolValue;
use alloy::eips::eip2718::Encodable2718;
use alloy::json_abi::JsonAbi;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use whisper_account::{verify_message, AccountError, AccountService, GeneratedAccount};
use whisper_types::{
	format_ether, parse_ether, AmountError, SecretString, TransactionHash, TransactionReceipt,
};

pub mod contract;

/// Typed helpers for well-known contract surfaces.
pub mod contracts {
	pub mod erc20;

	#[cfg(test)]
	mod tests;
}

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
	#[cfg(any(test, feature = "testing"))]
	pub mod mock;
}

pub use contract::{BoundContract, ContractDescriptor, DecodedLog, DeployedContract};
pub use contracts::erc20::{Erc20Token, TokenInfo};
pub use implementations::evm::alloy::AlloyNode;

/// Gas limit for a plain ETH transfer.
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;
/// Gas limit for contract deployments.
pub const DEPLOY_GAS_LIMIT: u64 = 3_000_000;
/// Gas limit for contract calls unless overridden in [`TxOptions`].
pub const DEFAULT_CALL_GAS_LIMIT: u64 = 300_000;

/// Errors that can occur while talking to the chain.
#[derive(Debug, Error)]
pub enum ClientError {
	/// The node could not be reached or failed its liveness check.
	#[error("Connection error: {0}")]
	Connection(String),
	/// The signer key is malformed or signing failed.
	#[error("Signing error: {0}")]
	Signing(String),
	/// The node rejected a call or transaction.
	#[error("RPC error: {0}")]
	Rpc(String),
	/// No receipt appeared before the deadline.
	#[error("Timed out after {timeout:?} waiting for receipt of {hash}")]
	Timeout { hash: String, timeout: Duration },
	/// The deployment receipt reports failure or lacks a contract address.
	#[error("Deployment failed: {0}")]
	Deployment(String),
	/// The function name is not part of the contract interface.
	#[error("Unknown function: {0}")]
	UnknownFunction(String),
	/// The event name is not part of the contract interface.
	#[error("Unknown event: {0}")]
	UnknownEvent(String),
	/// The signature bytes are malformed.
	#[error("Invalid signature: {0}")]
	InvalidSignature(String),
	#[error("Invalid address '{0}'")]
	InvalidAddress(String),
	#[error("Invalid amount: {0}")]
	InvalidAmount(#[from] AmountError),
	/// Arguments do not match the function or constructor inputs.
	#[error("Invalid arguments: {0}")]
	InvalidArguments(String),
	/// Return data or logs could not be decoded.
	#[error("Decode error: {0}")]
	Decode(String),
	/// The transaction was mined but execution failed.
	#[error("Transaction {0} reverted")]
	Reverted(String),
}

impl From<AccountError> for ClientError {
	fn from(err: AccountError) -> Self {
		match err {
			AccountError::InvalidSignature(msg) => ClientError::InvalidSignature(msg),
			AccountError::InvalidKey(msg) | AccountError::SigningFailed(msg) => {
				ClientError::Signing(msg)
			}
		}
	}
}

/// The node RPC boundary.
///
/// Implementations perform one round-trip per call and never cache. The
/// adapter treats transport timeouts as opaque.
#[async_trait]
pub trait NodeInterface: Send + Sync {
	/// Returns the chain id. Also used as the liveness check.
	async fn chain_id(&self) -> Result<u64, ClientError>;

	/// Gets the balance of `address` in wei.
	async fn get_balance(&self, address: Address) -> Result<U256, ClientError>;

	/// Gets the number of transactions sent from `address`, i.e. its next nonce.
	async fn get_transaction_count(&self, address: Address) -> Result<u64, ClientError>;

	/// Gets the node's current gas price quote in wei.
	async fn get_gas_price(&self) -> Result<u128, ClientError>;

	/// Gets the latest block number.
	async fn get_block_number(&self) -> Result<u64, ClientError>;

	/// Submits a signed, EIP-2718 encoded transaction.
	async fn send_raw_transaction(&self, encoded: &[u8]) -> Result<TransactionHash, ClientError>;

	/// Returns the receipt if the transaction has been mined.
	async fn get_transaction_receipt(
		&self,
		hash: B256,
	) -> Result<Option<TransactionReceipt>, ClientError>;

	/// Executes a call without creating a transaction.
	async fn call(&self, request: TransactionRequest) -> Result<Bytes, ClientError>;
}

/// Polling behavior for confirmations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSettings {
	/// Delay between receipt polls.
	pub poll_interval: Duration,
	/// Deadline used where the client waits on the caller's behalf
	/// (deployments, batch minting).
	pub confirmation_timeout: Duration,
}

impl Default for ClientSettings {
	fn default() -> Self {
		Self {
			poll_interval: Duration::from_secs(1),
			confirmation_timeout: Duration::from_secs(120),
		}
	}
}

/// Overrides for contract transactions.
///
/// Unset fields fall back to: gas [`DEFAULT_CALL_GAS_LIMIT`], gas price from a
/// live node quote, value zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxOptions {
	pub gas: Option<u64>,
	pub gas_price: Option<u128>,
	pub value: Option<U256>,
}

impl TxOptions {
	pub fn with_gas(mut self, gas: u64) -> Self {
		self.gas = Some(gas);
		self
	}

	pub fn with_gas_price(mut self, gas_price: u128) -> Self {
		self.gas_price = Some(gas_price);
		self
	}

	pub fn with_value(mut self, value: U256) -> Self {
		self.value = Some(value);
		self
	}

	fn gas_or_default(&self) -> u64 {
		self.gas.unwrap_or(DEFAULT_CALL_GAS_LIMIT)
	}

	fn value_or_default(&self) -> U256 {
		self.value.unwrap_or(U256::ZERO)
	}
}

/// Parses an address in any letter case.
pub fn parse_address(address: &str) -> Result<Address, ClientError> {
	address
		.trim()
		.parse::<Address>()
		.map_err(|_| ClientError::InvalidAddress(address.to_string()))
}

/// Derives the address controlled by `signer_key`.
pub fn signer_address(signer_key: &SecretString) -> Result<Address, ClientError> {
	Ok(AccountService::from_key(signer_key)?.address())
}

/// Adapter that drives a node through [`NodeInterface`].
///
/// Holds only the node handle and polling settings; keys are passed per call.
pub struct ChainClient {
	node: Arc<dyn NodeInterface>,
	settings: ClientSettings,
}

impl ChainClient {
	/// Connects to a node over HTTP and checks that it responds.
	pub async fn connect(node_url: &str, settings: ClientSettings) -> Result<Self, ClientError> {
		let node = AlloyNode::connect(node_url).await?;
		Self::from_node(Arc::new(node), settings).await
	}

	/// Wraps an existing node implementation after a liveness check.
	pub async fn from_node(
		node: Arc<dyn NodeInterface>,
		settings: ClientSettings,
	) -> Result<Self, ClientError> {
		let chain_id = node
			.chain_id()
			.await
			.map_err(|e| ClientError::Connection(format!("Node liveness check failed: {}", e)))?;

		tracing::info!(chain_id, "Connected to node");
		Ok(Self { node, settings })
	}

	pub fn settings(&self) -> &ClientSettings {
		&self.settings
	}

	pub async fn chain_id(&self) -> Result<u64, ClientError> {
		self.node.chain_id().await
	}

	/// Gets the balance of `address` as a decimal ether string.
	pub async fn get_balance(&self, address: &str) -> Result<String, ClientError> {
		let wei = self.get_balance_wei(address).await?;
		Ok(format_ether(wei))
	}

	/// Gets the balance of `address` in wei.
	pub async fn get_balance_wei(&self, address: &str) -> Result<U256, ClientError> {
		let address = parse_address(address)?;
		tracing::debug!(address = %address.to_checksum(None), "Querying balance");
		self.node.get_balance(address).await
	}

	pub async fn get_gas_price(&self) -> Result<u128, ClientError> {
		self.node.get_gas_price().await
	}

	pub async fn get_block_number(&self) -> Result<u64, ClientError> {
		self.node.get_block_number().await
	}

	/// Gets the next nonce for `address`.
	pub async fn get_nonce(&self, address: &str) -> Result<u64, ClientError> {
		let address = parse_address(address)?;
		self.node.get_transaction_count(address).await
	}

	/// Polls once for a receipt.
	pub async fn get_receipt(
		&self,
		hash: &TransactionHash,
	) -> Result<Option<TransactionReceipt>, ClientError> {
		self.node.get_transaction_receipt(hash.as_b256()).await
	}

	/// Sends `amount` ether from the key's address to `to`.
	///
	/// Gas is fixed at [`TRANSFER_GAS_LIMIT`]. Gas price defaults to a live
	/// quote; nonce and chain id always come from the node.
	pub async fn send_value(
		&self,
		signer_key: &SecretString,
		to: &str,
		amount: &str,
		gas_price: Option<u128>,
	) -> Result<TransactionHash, ClientError> {
		let account = AccountService::from_key(signer_key)?;
		let to = parse_address(to)?;
		let value = parse_ether(amount)?;

		let request = TransactionRequest::default()
			.with_from(account.address())
			.with_to(to)
			.with_value(value);

		let request = self
			.resolve_request(&account, request, TRANSFER_GAS_LIMIT, gas_price)
			.await?;
		self.sign_and_broadcast(&account, request).await
	}

	/// Polls for the receipt of `hash` until it appears or `timeout` elapses.
	///
	/// The node is always asked at least once, so a zero timeout still returns
	/// a receipt that is already available. The receipt is returned whatever
	/// its status; callers decide what a failed execution means.
	pub async fn wait_for_confirmation(
		&self,
		hash: &TransactionHash,
		timeout: Duration,
	) -> Result<TransactionReceipt, ClientError> {
		let start = tokio::time::Instant::now();

		loop {
			if let Some(receipt) = self.node.get_transaction_receipt(hash.as_b256()).await? {
				if receipt.success {
					tracing::info!(
						tx_hash = %hash,
						block_number = receipt.block_number,
						"Transaction confirmed"
					);
				} else {
					tracing::warn!(
						tx_hash = %hash,
						block_number = receipt.block_number,
						"Transaction mined but reverted"
					);
				}
				return Ok(receipt);
			}

			let elapsed = start.elapsed();
			if elapsed >= timeout {
				return Err(ClientError::Timeout {
					hash: hash.to_string(),
					timeout,
				});
			}

			tracing::debug!(tx_hash = %hash, "Receipt not available yet");
			tokio::time::sleep(self.settings.poll_interval.min(timeout - elapsed)).await;
		}
	}

	/// Deploys a contract and waits for its receipt.
	///
	/// The deployment carries `bytecode` followed by the ABI-encoded
	/// constructor arguments, zero value and [`DEPLOY_GAS_LIMIT`] gas.
	pub async fn deploy_contract(
		&self,
		abi: &JsonAbi,
		bytecode: &Bytes,
		signer_key: &SecretString,
		constructor_args: &[DynSolValue],
	) -> Result<DeployedContract, ClientError> {
		let account = AccountService::from_key(signer_key)?;
		let code = contract::deployment_code(abi, bytecode, constructor_args)?;

		let request = TransactionRequest::default()
			.with_from(account.address())
			.with_deploy_code(code)
			.with_value(U256::ZERO);

		let request = self
			.resolve_request(&account, request, DEPLOY_GAS_LIMIT, None)
			.await?;
		let hash = self.sign_and_broadcast(&account, request).await?;

		let receipt = self
			.wait_for_confirmation(&hash, self.settings.confirmation_timeout)
			.await?;

		if !receipt.success {
			return Err(ClientError::Deployment(format!(
				"transaction {} reverted in block {}",
				hash, receipt.block_number
			)));
		}

		let address = receipt.contract_address.ok_or_else(|| {
			ClientError::Deployment(format!("receipt for {} has no contract address", hash))
		})?;

		tracing::info!(address = %address, tx_hash = %hash, "Deployed contract");
		Ok(DeployedContract {
			address,
			contract: BoundContract::new(ContractDescriptor::new(address, abi.clone())),
			receipt,
		})
	}

	/// Calls a function without a transaction and decodes its outputs.
	///
	/// The function is resolved against the interface before anything is sent
	/// to the node.
	pub async fn call_read_only(
		&self,
		contract: &BoundContract,
		function_name: &str,
		args: &[DynSolValue],
	) -> Result<Vec<DynSolValue>, ClientError> {
		let (function, data) = contract.encode_call(function_name, args)?;

		let request = TransactionRequest::default()
			.with_to(contract.address())
			.with_input(data);

		let output = self.node.call(request).await?;
		BoundContract::decode_output(function, &output)
	}

	/// Like [`ChainClient::call_read_only`] for an address and ABI that are not
	/// bound yet.
	pub async fn call_read_only_at(
		&self,
		contract_address: &str,
		abi: &JsonAbi,
		function_name: &str,
		args: &[DynSolValue],
	) -> Result<Vec<DynSolValue>, ClientError> {
		let contract = BoundContract::new(ContractDescriptor::new(
			parse_address(contract_address)?,
			abi.clone(),
		));
		self.call_read_only(&contract, function_name, args).await
	}

	/// Sends a transaction invoking `function_name` and returns its hash.
	pub async fn call_state_changing(
		&self,
		contract: &BoundContract,
		function_name: &str,
		signer_key: &SecretString,
		args: &[DynSolValue],
		options: TxOptions,
	) -> Result<TransactionHash, ClientError> {
		let (_, data) = contract.encode_call(function_name, args)?;
		let account = AccountService::from_key(signer_key)?;

		let request = TransactionRequest::default()
			.with_from(account.address())
			.with_to(contract.address())
			.with_value(options.value_or_default())
			.with_input(data);

		let request = self
			.resolve_request(&account, request, options.gas_or_default(), options.gas_price)
			.await?;

		tracing::debug!(
			contract = %contract.address(),
			function = function_name,
			"Submitting contract transaction"
		);
		self.sign_and_broadcast(&account, request).await
	}

	/// Like [`ChainClient::call_state_changing`] for an address and ABI that
	/// are not bound yet.
	pub async fn call_state_changing_at(
		&self,
		contract_address: &str,
		abi: &JsonAbi,
		function_name: &str,
		signer_key: &SecretString,
		args: &[DynSolValue],
		options: TxOptions,
	) -> Result<TransactionHash, ClientError> {
		let contract = BoundContract::new(ContractDescriptor::new(
			parse_address(contract_address)?,
			abi.clone(),
		));
		self.call_state_changing(&contract, function_name, signer_key, args, options)
			.await
	}

	/// Decodes the named event from the logs `contract` emitted in `receipt`.
	pub fn decode_logs(
		&self,
		contract: &BoundContract,
		receipt: &TransactionReceipt,
		event_name: &str,
	) -> Result<Vec<DecodedLog>, ClientError> {
		contract.decode_logs(event_name, &receipt.logs)
	}

	/// Signs the keccak-256 hash of `message`; returns `0x` hex.
	pub async fn sign_message(
		&self,
		message: &str,
		signer_key: &SecretString,
	) -> Result<String, ClientError> {
		let account = AccountService::from_key(signer_key)?;
		Ok(account.sign_message(message.as_bytes()).await?)
	}

	/// Checks that `signature` over `message` recovers to `expected_address`.
	pub fn verify_signature(
		&self,
		message: &str,
		signature: &str,
		expected_address: &str,
	) -> Result<bool, ClientError> {
		Ok(verify_message(
			message.as_bytes(),
			signature,
			expected_address,
		)?)
	}

	/// Generates a fresh key pair.
	pub fn create_account(&self) -> GeneratedAccount {
		whisper_account::create_account()
	}

	/// Fills gas, gas price, nonce and chain id so nothing is left for the
	/// node to guess.
	async fn resolve_request(
		&self,
		account: &AccountService,
		request: TransactionRequest,
		gas_limit: u64,
		gas_price: Option<u128>,
	) -> Result<TransactionRequest, ClientError> {
		let gas_price = match gas_price {
			Some(price) => price,
			None => self.node.get_gas_price().await?,
		};
		let nonce = self.node.get_transaction_count(account.address()).await?;
		let chain_id = self.node.chain_id().await?;

		Ok(request
			.with_gas_limit(gas_limit)
			.with_gas_price(gas_price)
			.with_nonce(nonce)
			.with_chain_id(chain_id))
	}

	async fn sign_and_broadcast(
		&self,
		account: &AccountService,
		request: TransactionRequest,
	) -> Result<TransactionHash, ClientError> {
		let nonce = request.nonce;
		let envelope = account.sign(request).await?;
		let hash = self
			.node
			.send_raw_transaction(&envelope.encoded_2718())
			.await?;

		tracing::info!(
			tx_hash = %hash,
			from = %account.address(),
			nonce = ?nonce,
			"Broadcast transaction"
		);
		Ok(hash)
	}
}
