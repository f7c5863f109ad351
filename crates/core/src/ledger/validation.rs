//! Business rule validation for transactions.

use rust_decimal::Decimal;

use crate::error::DomainError;

/// Validates that a transaction amount is strictly positive.
///
/// # Errors
///
/// Returns `DomainError::NonPositiveAmount` for zero or negative amounts.
pub fn validate_amount(amount: Decimal) -> Result<(), DomainError> {
    if amount <= Decimal::ZERO {
        return Err(DomainError::NonPositiveAmount(amount));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_positive_amount_passes() {
        assert!(validate_amount(dec!(0.01)).is_ok());
        assert!(validate_amount(dec!(12500)).is_ok());
    }

    #[test]
    fn test_zero_and_negative_rejected() {
        assert!(validate_amount(Decimal::ZERO).is_err());
        assert!(validate_amount(dec!(-1)).is_err());
    }
}
