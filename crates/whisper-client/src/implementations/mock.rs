//! In-memory node for tests.
//!
//! Decodes every raw transaction it receives, keeps a single account-wide
//! nonce counter, and mines each accepted transaction into its own block.
//! Failure modes are injected per send index so callers can exercise
//! rejection, reverts and missing receipts deterministically.

use crate::{ClientError, NodeInterface};
use alloy::consensus::{Transaction as _, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{Address, Bytes, Log, TxKind, B256, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use whisper_types::{TransactionHash, TransactionReceipt};

#[derive(Default)]
struct MockState {
	chain_id: u64,
	gas_price: u128,
	block_number: u64,
	nonce: u64,
	reachable: bool,
	withhold_receipts: bool,
	balances: HashMap<Address, U256>,
	call_responses: HashMap<[u8; 4], Bytes>,
	failing_sends: HashMap<usize, String>,
	reverting_sends: HashSet<usize>,
	deploy_address: Option<Address>,
	receipt_logs: Vec<Log>,
	send_count: usize,
	sent: Vec<TxEnvelope>,
	receipts: HashMap<B256, TransactionReceipt>,
	calls: Vec<TransactionRequest>,
	methods: Vec<&'static str>,
}

/// Scriptable [`NodeInterface`] implementation.
pub struct MockNode {
	state: Mutex<MockState>,
}

impl Default for MockNode {
	fn default() -> Self {
		Self::new()
	}
}

impl MockNode {
	/// A reachable node on chain 31337 quoting 1 gwei.
	pub fn new() -> Self {
		Self {
			state: Mutex::new(MockState {
				chain_id: 31337,
				gas_price: 1_000_000_000,
				reachable: true,
				deploy_address: Some(Address::repeat_byte(0xcc)),
				..Default::default()
			}),
		}
	}

	fn state(&self) -> MutexGuard<'_, MockState> {
		self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}

	pub fn with_chain_id(self, chain_id: u64) -> Self {
		self.state().chain_id = chain_id;
		self
	}

	pub fn with_gas_price(self, gas_price: u128) -> Self {
		self.state().gas_price = gas_price;
		self
	}

	pub fn with_balance(self, address: Address, wei: U256) -> Self {
		self.state().balances.insert(address, wei);
		self
	}

	/// Every RPC call fails, including the liveness check.
	pub fn unreachable(self) -> Self {
		self.state().reachable = false;
		self
	}

	/// Transactions are accepted but never mined.
	pub fn withhold_receipts(self) -> Self {
		self.state().withhold_receipts = true;
		self
	}

	/// Rejects the send with zero-based index `index`.
	pub fn fail_send_at(self, index: usize, message: &str) -> Self {
		self.state().failing_sends.insert(index, message.to_string());
		self
	}

	/// Mines the send with zero-based index `index` with a failed status.
	pub fn revert_send_at(self, index: usize) -> Self {
		self.state().reverting_sends.insert(index);
		self
	}

	/// Contract address reported for deployments; `None` omits it.
	pub fn with_deploy_address(self, address: Option<Address>) -> Self {
		self.state().deploy_address = address;
		self
	}

	/// Logs attached to every receipt.
	pub fn with_receipt_logs(self, logs: Vec<Log>) -> Self {
		self.state().receipt_logs = logs;
		self
	}

	/// Return data for `eth_call` requests whose input starts with `selector`.
	pub fn set_call_response(&self, selector: [u8; 4], output: impl Into<Bytes>) {
		self.state().call_responses.insert(selector, output.into());
	}

	/// Transactions accepted so far, in order.
	pub fn sent_transactions(&self) -> Vec<TxEnvelope> {
		self.state().sent.clone()
	}

	/// `eth_call` requests received so far.
	pub fn calls(&self) -> Vec<TransactionRequest> {
		self.state().calls.clone()
	}

	/// RPC method names in the order they were invoked.
	pub fn methods(&self) -> Vec<&'static str> {
		self.state().methods.clone()
	}

	fn enter(&self, method: &'static str) -> Result<MutexGuard<'_, MockState>, ClientError> {
		let mut state = self.state();
		state.methods.push(method);
		if !state.reachable {
			return Err(ClientError::Rpc(format!("{}: connection refused", method)));
		}
		Ok(state)
	}
}

#[async_trait]
impl NodeInterface for MockNode {
	async fn chain_id(&self) -> Result<u64, ClientError> {
		Ok(self.enter("eth_chainId")?.chain_id)
	}

	async fn get_balance(&self, address: Address) -> Result<U256, ClientError> {
		let state = self.enter("eth_getBalance")?;
		Ok(state.balances.get(&address).copied().unwrap_or_default())
	}

	async fn get_transaction_count(&self, _address: Address) -> Result<u64, ClientError> {
		Ok(self.enter("eth_getTransactionCount")?.nonce)
	}

	async fn get_gas_price(&self) -> Result<u128, ClientError> {
		Ok(self.enter("eth_gasPrice")?.gas_price)
	}

	async fn get_block_number(&self) -> Result<u64, ClientError> {
		Ok(self.enter("eth_blockNumber")?.block_number)
	}

	async fn send_raw_transaction(&self, encoded: &[u8]) -> Result<TransactionHash, ClientError> {
		let mut state = self.enter("eth_sendRawTransaction")?;
		let index = state.send_count;
		state.send_count += 1;

		if let Some(message) = state.failing_sends.get(&index) {
			return Err(ClientError::Rpc(message.clone()));
		}

		let envelope = TxEnvelope::decode_2718(&mut &encoded[..])
			.map_err(|e| ClientError::Rpc(format!("invalid raw transaction: {}", e)))?;

		if envelope.nonce() != state.nonce {
			return Err(ClientError::Rpc(format!(
				"nonce mismatch: expected {}, got {}",
				state.nonce,
				envelope.nonce()
			)));
		}
		if envelope.chain_id() != Some(state.chain_id) {
			return Err(ClientError::Rpc("invalid chain id for signer".to_string()));
		}

		let hash = *envelope.tx_hash();
		state.nonce += 1;

		if !state.withhold_receipts {
			state.block_number += 1;
			let contract_address = match envelope.kind() {
				TxKind::Create => state.deploy_address,
				TxKind::Call(_) => None,
			};
			let receipt = TransactionReceipt {
				hash: TransactionHash(hash),
				block_number: state.block_number,
				success: !state.reverting_sends.contains(&index),
				contract_address,
				gas_used: envelope.gas_limit(),
				logs: state.receipt_logs.clone(),
			};
			state.receipts.insert(hash, receipt);
		}

		state.sent.push(envelope);
		Ok(TransactionHash(hash))
	}

	async fn get_transaction_receipt(
		&self,
		hash: B256,
	) -> Result<Option<TransactionReceipt>, ClientError> {
		let state = self.enter("eth_getTransactionReceipt")?;
		Ok(state.receipts.get(&hash).cloned())
	}

	async fn call(&self, request: TransactionRequest) -> Result<Bytes, ClientError> {
		let mut state = self.enter("eth_call")?;
		let selector: Option<[u8; 4]> = request
			.input
			.input()
			.and_then(|input| input.get(..4))
			.and_then(|prefix| prefix.try_into().ok());
		state.calls.push(request);

		selector
			.and_then(|selector| state.call_responses.get(&selector).cloned())
			.ok_or_else(|| ClientError::Rpc("execution reverted".to_string()))
	}
}
