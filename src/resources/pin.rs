//! Offline PIN format validation for the checkers family.

// self
use crate::_prelude::*;

/// Expected character count of a PIN.
pub const PIN_LENGTH: usize = 11;

/// Validation failures for the PIN wire format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
pub enum PinFormatError {
	/// The value was empty or whitespace.
	#[error("PIN must not be empty.")]
	Empty,
	/// The value has the wrong character count.
	#[error("PIN must be exactly {expected} characters.")]
	Length {
		/// Required character count.
		expected: usize,
	},
	/// The value contains non-alphanumeric characters.
	#[error("PIN must contain only ASCII letters and digits.")]
	Charset,
	/// The value does not start and end with a letter.
	#[error("PIN must start and end with a letter.")]
	Edges,
	/// The characters between the letters are not all digits.
	#[error("PIN must carry nine digits between the letters.")]
	Digits,
}

/// Checks the `A000000000B` shape offline: a letter, nine digits, a letter.
///
/// No network access is performed; use
/// [`CheckersClient::validate_pin`](crate::resources::CheckersClient::validate_pin)
/// for an authoritative registry check.
pub fn validate_pin_format(pin: &str) -> Result<(), PinFormatError> {
	let pin = pin.trim();

	if pin.is_empty() {
		return Err(PinFormatError::Empty);
	}
	if pin.chars().count() != PIN_LENGTH {
		return Err(PinFormatError::Length { expected: PIN_LENGTH });
	}
	if !pin.chars().all(|c| c.is_ascii_alphanumeric()) {
		return Err(PinFormatError::Charset);
	}

	let mut chars = pin.chars();
	let first = chars.next();
	let last = chars.next_back();

	if !matches!((first, last), (Some(a), Some(b)) if a.is_ascii_alphabetic() && b.is_ascii_alphabetic())
	{
		return Err(PinFormatError::Edges);
	}
	if !chars.as_str().chars().all(|c| c.is_ascii_digit()) {
		return Err(PinFormatError::Digits);
	}

	Ok(())
}
