//! Secure handling of PIN input
//!
//! PINs pass through the process only long enough to be hashed or checked.
//! `SecurePin` wipes its buffer on drop and never prints its contents.

use std::fmt;
use std::ops::Deref;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::ValidationError;

/// Shortest accepted PIN
pub const MIN_PIN_LEN: usize = 4;

/// Longest accepted PIN
pub const MAX_PIN_LEN: usize = 6;

/// A PIN that zeros its memory on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecurePin {
    inner: String,
}

impl SecurePin {
    pub fn new(pin: impl Into<String>) -> Self {
        Self { inner: pin.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }

    /// Check the PIN shape: 4 to 6 ASCII digits
    ///
    /// Length is checked first, so "12ab5" reports `PinNotNumeric` and "12"
    /// reports `PinTooShort`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let len = self.inner.chars().count();
        if !(MIN_PIN_LEN..=MAX_PIN_LEN).contains(&len) {
            return Err(ValidationError::PinTooShort);
        }
        if !self.inner.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::PinNotNumeric);
        }
        Ok(())
    }
}

impl Deref for SecurePin {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl From<String> for SecurePin {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecurePin {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Debug for SecurePin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurePin")
            .field("len", &self.inner.len())
            .finish()
    }
}

impl fmt::Display for SecurePin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED {} chars]", self.inner.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_pins() {
        for pin in ["1234", "12345", "000000"] {
            assert!(SecurePin::from(pin).validate().is_ok(), "{}", pin);
        }
    }

    #[test]
    fn test_length_checked() {
        assert_eq!(SecurePin::from("123").validate(), Err(ValidationError::PinTooShort));
        assert_eq!(SecurePin::from("1234567").validate(), Err(ValidationError::PinTooShort));
        assert_eq!(SecurePin::from("").validate(), Err(ValidationError::PinTooShort));
    }

    #[test]
    fn test_digits_only() {
        assert_eq!(SecurePin::from("12a4").validate(), Err(ValidationError::PinNotNumeric));
        assert_eq!(SecurePin::from("12 34").validate(), Err(ValidationError::PinNotNumeric));
        // Non-ASCII digits do not count
        assert_eq!(SecurePin::from("١٢٣٤").validate(), Err(ValidationError::PinNotNumeric));
    }

    #[test]
    fn test_debug_and_display_redacted() {
        let pin = SecurePin::new("9876");
        assert!(!format!("{:?}", pin).contains("9876"));
        assert!(format!("{}", pin).contains("REDACTED"));
    }
}
