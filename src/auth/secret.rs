//! Redacting wrapper for sensitive strings (client secrets, access tokens).

// self
use crate::_prelude::*;

/// Redacted secret wrapper keeping sensitive material out of logs.
///
/// Wraps both static client secrets and issued access tokens; the raw value is
/// reachable only through [`expose`](SecretString::expose), which the transport
/// and token cache call at the last possible moment.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);
impl SecretString {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` if the wrapped value is empty.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl AsRef<str> for SecretString {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for SecretString {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SecretString").field(&"<redacted>").finish()
	}
}
impl Display for SecretString {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
