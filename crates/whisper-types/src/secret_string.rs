//! Secret wrapper for signer keys.
//!
//! Signer keys are owned by the caller and handed to the toolkit only for the
//! duration of a signing operation. `SecretString` zeroes its buffer on drop
//! and redacts itself wherever it could end up in a log line.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroizing;

const REDACTED: &str = "***REDACTED***";

/// A string that is zeroed on drop and never printed.
#[derive(Clone)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
	/// Wraps an owned string.
	pub fn new(s: String) -> Self {
		Self(Zeroizing::new(s))
	}

	/// Exposes the secret to a closure.
	///
	/// Prefer this over [`SecretString::expose_secret`] so the plain value never
	/// outlives the call that needs it.
	pub fn with_exposed<F, R>(&self, f: F) -> R
	where
		F: FnOnce(&str) -> R,
	{
		f(&self.0)
	}

	/// Exposes the secret as a string slice.
	pub fn expose_secret(&self) -> &str {
		&self.0
	}

	/// Returns true if the secret looks like a 32-byte hex private key,
	/// with or without the `0x` prefix.
	pub fn is_hex_private_key(&self) -> bool {
		self.with_exposed(|key| {
			let body = crate::without_0x_prefix(key.trim());
			body.len() == 64 && body.chars().all(|c| c.is_ascii_hexdigit())
		})
	}

	/// Returns true if the secret is empty or only whitespace.
	pub fn is_empty(&self) -> bool {
		self.0.trim().is_empty()
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SecretString({})", REDACTED)
	}
}

impl fmt::Display for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl From<String> for SecretString {
	fn from(s: String) -> Self {
		Self::new(s)
	}
}

impl From<&str> for SecretString {
	fn from(s: &str) -> Self {
		Self::new(s.to_string())
	}
}

impl PartialEq for SecretString {
	fn eq(&self, other: &Self) -> bool {
		self.0.as_str() == other.0.as_str()
	}
}

impl Eq for SecretString {}

// Serialized forms always carry the placeholder, never the key.
impl Serialize for SecretString {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(REDACTED)
	}
}

impl<'de> Deserialize<'de> for SecretString {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		String::deserialize(deserializer).map(SecretString::new)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	#[test]
	fn test_key_is_redacted_in_debug_and_display() {
		let key = SecretString::from(KEY);
		assert_eq!(format!("{:?}", key), "SecretString(***REDACTED***)");
		assert_eq!(key.to_string(), "***REDACTED***");
	}

	#[test]
	fn test_key_is_redacted_when_serialized() {
		let key = SecretString::from(KEY);
		let json = serde_json::to_string(&key).unwrap();
		assert_eq!(json, "\"***REDACTED***\"");
	}

	#[test]
	fn test_deserialize_keeps_value() {
		let key: SecretString = serde_json::from_str(&format!("\"{}\"", KEY)).unwrap();
		assert_eq!(key.expose_secret(), KEY);
	}

	#[test]
	fn test_hex_private_key_detection() {
		assert!(SecretString::from(KEY).is_hex_private_key());
		assert!(SecretString::from(&KEY[2..]).is_hex_private_key());
		assert!(!SecretString::from("0x1234").is_hex_private_key());
		assert!(!SecretString::from("not-a-key").is_hex_private_key());
	}

	#[test]
	fn test_whitespace_secret_is_empty() {
		assert!(SecretString::from("").is_empty());
		assert!(SecretString::from(" \t").is_empty());
		assert!(!SecretString::from("0x01").is_empty());
	}

	#[test]
	fn test_with_exposed_scopes_value() {
		let key = SecretString::from(KEY);
		let len = key.with_exposed(|k| k.len());
		assert_eq!(len, 66);
	}
}
