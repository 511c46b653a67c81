//! NFT metadata records.
//!
//! The on-disk layout is the one marketplaces read: `name`, `description`,
//! `image` and an optional `attributes` list of `{trait_type, value}` pairs.
//! `attributes` is omitted entirely when there are none.

use serde::{Deserialize, Serialize};

/// A single trait attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
	pub trait_type: String,
	pub value: String,
}

impl Attribute {
	pub fn new(trait_type: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			trait_type: trait_type.into(),
			value: value.into(),
		}
	}
}

/// Metadata for a single token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftMetadata {
	pub name: String,
	pub description: String,
	/// Image reference, usually an `ipfs://` or `https://` URI.
	pub image: String,
	/// Ordered trait list. Only present when non-empty.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub attributes: Option<Vec<Attribute>>,
}

impl NftMetadata {
	/// Builds a record, keeping `attributes` only if it has entries.
	pub fn new(
		name: impl Into<String>,
		description: impl Into<String>,
		image: impl Into<String>,
		attributes: Option<Vec<Attribute>>,
	) -> Self {
		Self {
			name: name.into(),
			description: description.into(),
			image: image.into(),
			attributes: attributes.filter(|list| !list.is_empty()),
		}
	}

	/// Serializes with two-space indentation.
	pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
		serde_json::to_string_pretty(self)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_record_without_attributes_has_exactly_three_keys() {
		let metadata = NftMetadata::new("A", "B", "ipfs://x", None);
		let value = serde_json::to_value(&metadata).unwrap();
		assert_eq!(
			value,
			json!({"name": "A", "description": "B", "image": "ipfs://x"})
		);
	}

	#[test]
	fn test_empty_attribute_list_is_dropped() {
		let metadata = NftMetadata::new("A", "B", "ipfs://x", Some(vec![]));
		assert!(metadata.attributes.is_none());
		let value = serde_json::to_value(&metadata).unwrap();
		assert!(value.get("attributes").is_none());
	}

	#[test]
	fn test_attributes_keep_order() {
		let metadata = NftMetadata::new(
			"A",
			"B",
			"ipfs://x",
			Some(vec![
				Attribute::new("Color", "Blue"),
				Attribute::new("Rarity", "Rare"),
			]),
		);
		let value = serde_json::to_value(&metadata).unwrap();
		assert_eq!(
			value["attributes"],
			json!([
				{"trait_type": "Color", "value": "Blue"},
				{"trait_type": "Rarity", "value": "Rare"}
			])
		);
	}

	#[test]
	fn test_pretty_json_uses_two_space_indent() {
		let metadata = NftMetadata::new("A", "B", "ipfs://x", None);
		let text = metadata.to_pretty_json().unwrap();
		assert_eq!(
			text,
			"{\n  \"name\": \"A\",\n  \"description\": \"B\",\n  \"image\": \"ipfs://x\"\n}"
		);
	}
}
