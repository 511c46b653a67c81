//! ERC-20 token helper.
//!
//! Thin typed wrapper over the by-name dispatch in [`ChainClient`]; it adds no
//! encoding of its own.

use crate::contract::{parse_abi, single_output, BoundContract, ContractDescriptor};
use crate::{parse_address, ChainClient, ClientError, TxOptions};
use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, U256};
use std::sync::Arc;
use whisper_types::{SecretString, TransactionHash};

/// Standard ERC-20 interface.
pub const ERC20_ABI: &str = r#"[
	{"type":"function","name":"name","inputs":[],"outputs":[{"name":"","type":"string"}],"stateMutability":"view"},
	{"type":"function","name":"symbol","inputs":[],"outputs":[{"name":"","type":"string"}],"stateMutability":"view"},
	{"type":"function","name":"decimals","inputs":[],"outputs":[{"name":"","type":"uint8"}],"stateMutability":"view"},
	{"type":"function","name":"totalSupply","inputs":[],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"},
	{"type":"function","name":"balanceOf","inputs":[{"name":"owner","type":"address"}],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"},
	{"type":"function","name":"allowance","inputs":[{"name":"owner","type":"address"},{"name":"spender","type":"address"}],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"},
	{"type":"function","name":"transfer","inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],"outputs":[{"name":"","type":"bool"}],"stateMutability":"nonpayable"},
	{"type":"function","name":"approve","inputs":[{"name":"spender","type":"address"},{"name":"amount","type":"uint256"}],"outputs":[{"name":"","type":"bool"}],"stateMutability":"nonpayable"},
	{"type":"function","name":"transferFrom","inputs":[{"name":"from","type":"address"},{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],"outputs":[{"name":"","type":"bool"}],"stateMutability":"nonpayable"},
	{"type":"event","name":"Transfer","inputs":[{"name":"sender","type":"address","indexed":true},{"name":"receiver","type":"address","indexed":true},{"name":"value","type":"uint256","indexed":false}],"anonymous":false},
	{"type":"event","name":"Approval","inputs":[{"name":"owner","type":"address","indexed":true},{"name":"spender","type":"address","indexed":true},{"name":"value","type":"uint256","indexed":false}],"anonymous":false}
]"#;

/// Summary of a token's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
	pub name: String,
	pub symbol: String,
	pub decimals: u8,
	pub total_supply: U256,
}

/// An ERC-20 token reached through a [`ChainClient`].
pub struct Erc20Token {
	client: Arc<ChainClient>,
	contract: BoundContract,
}

impl Erc20Token {
	pub fn new(client: Arc<ChainClient>, address: Address) -> Result<Self, ClientError> {
		let abi = parse_abi(ERC20_ABI)?;
		Ok(Self {
			client,
			contract: BoundContract::new(ContractDescriptor::new(address, abi)),
		})
	}

	pub fn contract(&self) -> &BoundContract {
		&self.contract
	}

	pub async fn name(&self) -> Result<String, ClientError> {
		let value = self.read("name", &[]).await?;
		as_string("name", value)
	}

	pub async fn symbol(&self) -> Result<String, ClientError> {
		let value = self.read("symbol", &[]).await?;
		as_string("symbol", value)
	}

	pub async fn decimals(&self) -> Result<u8, ClientError> {
		let value = as_u256("decimals", self.read("decimals", &[]).await?)?;
		u8::try_from(value)
			.map_err(|_| ClientError::Decode(format!("decimals out of range: {}", value)))
	}

	pub async fn total_supply(&self) -> Result<U256, ClientError> {
		as_u256("totalSupply", self.read("totalSupply", &[]).await?)
	}

	pub async fn balance_of(&self, owner: &str) -> Result<U256, ClientError> {
		let owner = DynSolValue::Address(parse_address(owner)?);
		as_u256("balanceOf", self.read("balanceOf", &[owner]).await?)
	}

	pub async fn allowance(&self, owner: &str, spender: &str) -> Result<U256, ClientError> {
		let args = [
			DynSolValue::Address(parse_address(owner)?),
			DynSolValue::Address(parse_address(spender)?),
		];
		as_u256("allowance", self.read("allowance", &args).await?)
	}

	/// Reads name, symbol, decimals and total supply.
	pub async fn token_info(&self) -> Result<TokenInfo, ClientError> {
		Ok(TokenInfo {
			name: self.name().await?,
			symbol: self.symbol().await?,
			decimals: self.decimals().await?,
			total_supply: self.total_supply().await?,
		})
	}

	pub async fn transfer(
		&self,
		signer_key: &SecretString,
		to: &str,
		amount: U256,
	) -> Result<TransactionHash, ClientError> {
		let args = [
			DynSolValue::Address(parse_address(to)?),
			DynSolValue::Uint(amount, 256),
		];
		self.write("transfer", signer_key, &args).await
	}

	pub async fn approve(
		&self,
		signer_key: &SecretString,
		spender: &str,
		amount: U256,
	) -> Result<TransactionHash, ClientError> {
		let args = [
			DynSolValue::Address(parse_address(spender)?),
			DynSolValue::Uint(amount, 256),
		];
		self.write("approve", signer_key, &args).await
	}

	pub async fn transfer_from(
		&self,
		signer_key: &SecretString,
		from: &str,
		to: &str,
		amount: U256,
	) -> Result<TransactionHash, ClientError> {
		let args = [
			DynSolValue::Address(parse_address(from)?),
			DynSolValue::Address(parse_address(to)?),
			DynSolValue::Uint(amount, 256),
		];
		self.write("transferFrom", signer_key, &args).await
	}

	async fn read(&self, function: &str, args: &[DynSolValue]) -> Result<DynSolValue, ClientError> {
		let values = self
			.client
			.call_read_only(&self.contract, function, args)
			.await?;
		single_output(function, values)
	}

	async fn write(
		&self,
		function: &str,
		signer_key: &SecretString,
		args: &[DynSolValue],
	) -> Result<TransactionHash, ClientError> {
		self.client
			.call_state_changing(&self.contract, function, signer_key, args, TxOptions::default())
			.await
	}
}

pub(crate) fn as_u256(function: &str, value: DynSolValue) -> Result<U256, ClientError> {
	value
		.as_uint()
		.map(|(value, _)| value)
		.ok_or_else(|| ClientError::Decode(format!("{} did not return an integer", function)))
}

pub(crate) fn as_string(function: &str, value: DynSolValue) -> Result<String, ClientError> {
	value
		.as_str()
		.map(str::to_string)
		.ok_or_else(|| ClientError::Decode(format!("{} did not return a string", function)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::implementations::mock::MockNode;
	use crate::ClientSettings;
	use alloy::consensus::Transaction as _;

	const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
	const TOKEN: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
	const HOLDER: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

	async fn token_with(node: Arc<MockNode>) -> Erc20Token {
		let client = ChainClient::from_node(node, ClientSettings::default())
			.await
			.unwrap();
		Erc20Token::new(Arc::new(client), parse_address(TOKEN).unwrap()).unwrap()
	}

	fn selector(token: &Erc20Token, name: &str, arity: usize) -> [u8; 4] {
		token.contract().function(name, arity).unwrap().selector().0
	}

	#[tokio::test]
	async fn test_token_info_decodes_each_field() {
		let encode = |value: DynSolValue| DynSolValue::Tuple(vec![value]).abi_encode_params();

		let node = Arc::new(MockNode::new());
		let token = token_with(node.clone()).await;
		node.set_call_response(
			selector(&token, "name", 0),
			encode(DynSolValue::String("VyperToken".into())),
		);
		node.set_call_response(
			selector(&token, "symbol", 0),
			encode(DynSolValue::String("VYP".into())),
		);
		node.set_call_response(
			selector(&token, "decimals", 0),
			encode(DynSolValue::Uint(U256::from(18u8), 8)),
		);
		node.set_call_response(
			selector(&token, "totalSupply", 0),
			U256::from(1_000_000u64).to_be_bytes::<32>().to_vec(),
		);

		let info = token.token_info().await.unwrap();
		assert_eq!(
			info,
			TokenInfo {
				name: "VyperToken".to_string(),
				symbol: "VYP".to_string(),
				decimals: 18,
				total_supply: U256::from(1_000_000u64),
			}
		);
	}

	#[tokio::test]
	async fn test_balance_of_sends_owner_argument() {
		let node = Arc::new(MockNode::new());
		let token = token_with(node.clone()).await;
		node.set_call_response(
			selector(&token, "balanceOf", 1),
			U256::from(42u64).to_be_bytes::<32>().to_vec(),
		);

		assert_eq!(token.balance_of(HOLDER).await.unwrap(), U256::from(42u64));

		let calls = node.calls();
		let input = calls[0].input.input().unwrap();
		assert_eq!(&input[16..36], parse_address(HOLDER).unwrap().as_slice());
	}

	#[tokio::test]
	async fn test_transfer_from_targets_token_with_default_gas() {
		let node = Arc::new(MockNode::new());
		let token = token_with(node.clone()).await;

		token
			.transfer_from(&SecretString::from(KEY), HOLDER, TOKEN, U256::from(5u64))
			.await
			.unwrap();

		let sent = node.sent_transactions();
		assert_eq!(sent[0].to(), Some(parse_address(TOKEN).unwrap()));
		assert_eq!(sent[0].gas_limit(), crate::DEFAULT_CALL_GAS_LIMIT);
		assert_eq!(&sent[0].input()[..4], &selector(&token, "transferFrom", 3));
	}
}
