//! Format checks for user-supplied identifiers.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Mobile numbers in national format: `09` followed by nine digits.
static PHONE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^09\d{9}$").expect("phone number pattern is valid"));

/// Validate a phone number used as a login identifier.
pub fn validate_phone_number(phone_number: &str) -> Result<(), CoreError> {
    if PHONE_NUMBER_RE.is_match(phone_number) {
        Ok(())
    } else {
        Err(CoreError::Validation(
            "Phone number must be 11 digits starting with 09".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_national_mobile_numbers() {
        assert!(validate_phone_number("09123456789").is_ok());
        assert!(validate_phone_number("09000000000").is_ok());
    }

    #[test]
    fn rejects_malformed_numbers() {
        for bad in ["", "9123456789", "0912345678", "091234567890", "+989123456789", "0912345678a"] {
            assert!(
                validate_phone_number(bad).is_err(),
                "{bad:?} should be rejected"
            );
        }
    }
}
