//! Alloy-based node implementation.
//!
//! Talks JSON-RPC to an EVM node through an alloy HTTP provider. The provider
//! is built without fillers: requests reach it fully populated and already
//! signed, so it only relays.

use crate::{ClientError, NodeInterface};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt as RpcReceipt, TransactionRequest};
use async_trait::async_trait;
use whisper_types::{TransactionHash, TransactionReceipt};

/// Node reached over HTTP JSON-RPC.
pub struct AlloyNode {
	provider: DynProvider,
	url: String,
}

impl AlloyNode {
	/// Builds a provider for `url`. No request is made here; the liveness check
	/// happens in [`crate::ChainClient::from_node`].
	pub async fn connect(url: &str) -> Result<Self, ClientError> {
		let provider = ProviderBuilder::new()
			.disable_recommended_fillers()
			.connect(url)
			.await
			.map_err(|e| ClientError::Connection(format!("Failed to connect to {}: {}", url, e)))?;

		Ok(Self {
			provider: provider.erased(),
			url: url.to_string(),
		})
	}

	pub fn url(&self) -> &str {
		&self.url
	}
}

fn rpc_error(action: &str) -> impl Fn(alloy::transports::TransportError) -> ClientError + '_ {
	move |e| ClientError::Rpc(format!("Failed to {}: {}", action, e))
}

fn convert_receipt(receipt: RpcReceipt) -> TransactionReceipt {
	TransactionReceipt {
		hash: TransactionHash(receipt.transaction_hash),
		block_number: receipt.block_number.unwrap_or(0),
		success: receipt.status(),
		contract_address: receipt.contract_address,
		gas_used: receipt.gas_used,
		logs: receipt
			.inner
			.logs()
			.iter()
			.map(|log| log.inner.clone())
			.collect(),
	}
}

#[async_trait]
impl NodeInterface for AlloyNode {
	async fn chain_id(&self) -> Result<u64, ClientError> {
		self.provider
			.get_chain_id()
			.await
			.map_err(rpc_error("get chain id"))
	}

	async fn get_balance(&self, address: Address) -> Result<U256, ClientError> {
		self.provider
			.get_balance(address)
			.await
			.map_err(rpc_error("get balance"))
	}

	async fn get_transaction_count(&self, address: Address) -> Result<u64, ClientError> {
		self.provider
			.get_transaction_count(address)
			.await
			.map_err(rpc_error("get nonce"))
	}

	async fn get_gas_price(&self) -> Result<u128, ClientError> {
		self.provider
			.get_gas_price()
			.await
			.map_err(rpc_error("get gas price"))
	}

	async fn get_block_number(&self) -> Result<u64, ClientError> {
		self.provider
			.get_block_number()
			.await
			.map_err(rpc_error("get block number"))
	}

	async fn send_raw_transaction(&self, encoded: &[u8]) -> Result<TransactionHash, ClientError> {
		let pending = self
			.provider
			.send_raw_transaction(encoded)
			.await
			.map_err(rpc_error("send transaction"))?;

		Ok(TransactionHash(*pending.tx_hash()))
	}

	async fn get_transaction_receipt(
		&self,
		hash: B256,
	) -> Result<Option<TransactionReceipt>, ClientError> {
		let receipt = self
			.provider
			.get_transaction_receipt(hash)
			.await
			.map_err(rpc_error("get receipt"))?;

		Ok(receipt.map(convert_receipt))
	}

	async fn call(&self, request: TransactionRequest) -> Result<Bytes, ClientError> {
		self.provider
			.call(request)
			.await
			.map_err(rpc_error("call contract"))
	}
}
