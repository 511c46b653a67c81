//! Contract binding and ABI dispatch.
//!
//! A [`BoundContract`] pairs an address with its JSON interface and indexes
//! every function and event by name once, at bind time. Calls are resolved by
//! explicit lookup, so an unknown name fails before anything is encoded or
//! sent.

use crate::ClientError;
use alloy::dyn_abi::{DynSolValue, EventExt, FunctionExt, JsonAbiExt};
use alloy::json_abi::{Event, Function, JsonAbi};
use alloy::primitives::{Address, Bytes, Log};
use std::collections::HashMap;
use std::path::Path;
use whisper_types::TransactionReceipt;

/// Address and interface of a deployed contract.
#[derive(Debug, Clone)]
pub struct ContractDescriptor {
	pub address: Address,
	pub abi: JsonAbi,
}

impl ContractDescriptor {
	pub fn new(address: Address, abi: JsonAbi) -> Self {
		Self { address, abi }
	}

	/// Parses a JSON ABI document.
	pub fn from_abi_json(address: Address, abi_json: &str) -> Result<Self, ClientError> {
		let abi = parse_abi(abi_json)?;
		Ok(Self::new(address, abi))
	}

	/// Reads a JSON ABI document from disk.
	pub fn from_abi_file(address: Address, path: impl AsRef<Path>) -> Result<Self, ClientError> {
		Ok(Self::new(address, load_abi(path)?))
	}
}

/// Parses a JSON ABI, accepting either a bare array or an artifact object
/// with an `abi` field.
pub fn parse_abi(abi_json: &str) -> Result<JsonAbi, ClientError> {
	let value: serde_json::Value = serde_json::from_str(abi_json)
		.map_err(|e| ClientError::Decode(format!("ABI is not valid JSON: {}", e)))?;

	let abi = match value {
		serde_json::Value::Object(mut artifact) if artifact.contains_key("abi") => {
			artifact.remove("abi").unwrap_or_default()
		}
		other => other,
	};

	serde_json::from_value(abi).map_err(|e| ClientError::Decode(format!("Invalid ABI: {}", e)))
}

/// Loads a JSON ABI from a file.
pub fn load_abi(path: impl AsRef<Path>) -> Result<JsonAbi, ClientError> {
	let path = path.as_ref();
	let content = std::fs::read_to_string(path).map_err(|e| {
		ClientError::Decode(format!("Cannot read ABI file {}: {}", path.display(), e))
	})?;
	parse_abi(&content)
}

/// A contract address with its interface indexed by name.
#[derive(Debug, Clone)]
pub struct BoundContract {
	address: Address,
	abi: JsonAbi,
	functions: HashMap<String, Vec<Function>>,
	events: HashMap<String, Vec<Event>>,
}

impl BoundContract {
	pub fn new(descriptor: ContractDescriptor) -> Self {
		let ContractDescriptor { address, abi } = descriptor;
		let functions = abi
			.functions
			.iter()
			.map(|(name, overloads)| (name.clone(), overloads.clone()))
			.collect();
		let events = abi
			.events
			.iter()
			.map(|(name, overloads)| (name.clone(), overloads.clone()))
			.collect();

		Self {
			address,
			abi,
			functions,
			events,
		}
	}

	pub fn address(&self) -> Address {
		self.address
	}

	pub fn abi(&self) -> &JsonAbi {
		&self.abi
	}

	pub fn has_function(&self, name: &str) -> bool {
		self.functions.contains_key(name)
	}

	/// Resolves `name` to the overload taking `arg_count` arguments.
	pub fn function(&self, name: &str, arg_count: usize) -> Result<&Function, ClientError> {
		let overloads = self
			.functions
			.get(name)
			.ok_or_else(|| ClientError::UnknownFunction(name.to_string()))?;

		overloads
			.iter()
			.find(|f| f.inputs.len() == arg_count)
			.ok_or_else(|| {
				let arities: Vec<String> =
					overloads.iter().map(|f| f.inputs.len().to_string()).collect();
				ClientError::InvalidArguments(format!(
					"{} takes {} argument(s), got {}",
					name,
					arities.join(" or "),
					arg_count
				))
			})
	}

	/// Encodes selector and arguments for `name`.
	pub fn encode_call(
		&self,
		name: &str,
		args: &[DynSolValue],
	) -> Result<(&Function, Bytes), ClientError> {
		let function = self.function(name, args.len())?;
		let data = function
			.abi_encode_input(args)
			.map_err(|e| ClientError::InvalidArguments(format!("{}: {}", name, e)))?;
		Ok((function, data.into()))
	}

	/// Decodes return data for `function`.
	pub fn decode_output(
		function: &Function,
		data: &[u8],
	) -> Result<Vec<DynSolValue>, ClientError> {
		function
			.abi_decode_output(data)
			.map_err(|e| ClientError::Decode(format!("{} output: {}", function.name, e)))
	}

	pub fn event(&self, name: &str) -> Result<&Event, ClientError> {
		self.events
			.get(name)
			.and_then(|overloads| overloads.first())
			.ok_or_else(|| ClientError::UnknownEvent(name.to_string()))
	}

	/// Decodes every log this contract emitted for the named event.
	///
	/// Logs from other addresses, or with a different topic0, are skipped. For
	/// anonymous events, logs that do not decode are skipped as well.
	pub fn decode_logs(&self, name: &str, logs: &[Log]) -> Result<Vec<DecodedLog>, ClientError> {
		let overloads = self
			.events
			.get(name)
			.ok_or_else(|| ClientError::UnknownEvent(name.to_string()))?;

		let mut decoded = Vec::new();
		for log in logs.iter().filter(|log| log.address == self.address) {
			let topic0 = log.data.topics().first();
			let Some(event) = overloads
				.iter()
				.find(|event| event.anonymous || topic0 == Some(&event.selector()))
			else {
				continue;
			};

			// Anonymous events match any topic0, so a log that fails to decode
			// belongs to some other event.
			let values = match event.decode_log(&log.data) {
				Ok(values) => values,
				Err(_) if event.anonymous => continue,
				Err(e) => return Err(ClientError::Decode(format!("{} log: {}", name, e))),
			};

			let mut indexed = values.indexed.into_iter();
			let mut body = values.body.into_iter();
			let mut args = Vec::with_capacity(event.inputs.len());
			for input in &event.inputs {
				let value = if input.indexed {
					indexed.next()
				} else {
					body.next()
				};
				if let Some(value) = value {
					args.push((input.name.clone(), value));
				}
			}

			decoded.push(DecodedLog {
				event: event.name.clone(),
				address: log.address,
				args,
			});
		}

		Ok(decoded)
	}

	/// Decodes the named event from a receipt's logs.
	pub fn decode_receipt(
		&self,
		name: &str,
		receipt: &TransactionReceipt,
	) -> Result<Vec<DecodedLog>, ClientError> {
		self.decode_logs(name, &receipt.logs)
	}
}

/// An event decoded by name.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedLog {
	pub event: String,
	pub address: Address,
	/// Arguments in declaration order.
	pub args: Vec<(String, DynSolValue)>,
}

impl DecodedLog {
	pub fn arg(&self, name: &str) -> Option<&DynSolValue> {
		self.args
			.iter()
			.find(|(arg_name, _)| arg_name == name)
			.map(|(_, value)| value)
	}
}

/// A contract created by [`crate::ChainClient::deploy_contract`].
#[derive(Debug, Clone)]
pub struct DeployedContract {
	pub address: Address,
	pub contract: BoundContract,
	pub receipt: TransactionReceipt,
}

/// Builds deployment input: creation bytecode followed by the encoded
/// constructor arguments.
pub(crate) fn deployment_code(
	abi: &JsonAbi,
	bytecode: &Bytes,
	constructor_args: &[DynSolValue],
) -> Result<Bytes, ClientError> {
	let mut code = bytecode.to_vec();

	match abi.constructor() {
		Some(constructor) => {
			let encoded = constructor
				.abi_encode_input(constructor_args)
				.map_err(|e| ClientError::InvalidArguments(format!("constructor: {}", e)))?;
			code.extend_from_slice(&encoded);
		}
		None if !constructor_args.is_empty() => {
			return Err(ClientError::InvalidArguments(format!(
				"ABI has no constructor but {} argument(s) were given",
				constructor_args.len()
			)));
		}
		None => {}
	}

	Ok(code.into())
}

/// Takes the single return value of a call.
pub fn single_output(
	function_name: &str,
	mut values: Vec<DynSolValue>,
) -> Result<DynSolValue, ClientError> {
	if values.len() != 1 {
		return Err(ClientError::Decode(format!(
			"{} returned {} values, expected 1",
			function_name,
			values.len()
		)));
	}
	Ok(values.remove(0))
}
