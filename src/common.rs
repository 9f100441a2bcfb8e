//! Validation helpers shared across services and commands.

use rust_decimal::Decimal;
use validator::ValidationError;

/// `validator` custom check: strictly greater than zero.
pub fn validate_positive_decimal(value: &Decimal) -> Result<(), ValidationError> {
    if *value > Decimal::ZERO {
        Ok(())
    } else {
        let mut err = ValidationError::new("must_be_positive");
        err.message = Some("must be greater than zero".into());
        Err(err)
    }
}

/// `validator` custom check: zero or greater.
pub fn validate_non_negative_decimal(value: &Decimal) -> Result<(), ValidationError> {
    if *value >= Decimal::ZERO {
        Ok(())
    } else {
        let mut err = ValidationError::new("must_not_be_negative");
        err.message = Some("cannot be negative".into());
        Err(err)
    }
}

/// Trims a free-text field and maps blank input to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn decimal_checks() {
        assert!(validate_positive_decimal(&dec!(0.001)).is_ok());
        assert!(validate_positive_decimal(&dec!(0)).is_err());
        assert!(validate_non_negative_decimal(&dec!(0)).is_ok());
        assert!(validate_non_negative_decimal(&dec!(-0.01)).is_err());
    }

    #[test]
    fn blank_text_becomes_none() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(" Bay 3 ".into())), Some("Bay 3".into()));
        assert_eq!(non_blank(None), None);
    }
}
