//! Property-based tests for transaction amount rules.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::types::TransactionType;
use super::validation::validate_amount;
use crate::error::DomainError;

/// Strategy to generate a valid positive amount (> 0).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    // 0.01 to 1,000,000.00
    (1i64..100_000_000i64).prop_map(|paise| Decimal::new(paise, 2))
}

/// Strategy to generate a zero or negative amount.
fn non_positive_amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|paise| Decimal::new(-paise, 2))
}

fn kind() -> impl Strategy<Value = TransactionType> {
    prop_oneof![Just(TransactionType::Given), Just(TransactionType::Received)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_positive_amounts_accepted(amount in positive_amount()) {
        prop_assert!(validate_amount(amount).is_ok());
    }

    #[test]
    fn prop_non_positive_amounts_rejected(amount in non_positive_amount()) {
        prop_assert_eq!(
            validate_amount(amount),
            Err(DomainError::NonPositiveAmount(amount))
        );
    }

    #[test]
    fn prop_given_and_received_cancel(amount in positive_amount()) {
        let net = TransactionType::Given.sign(amount) + TransactionType::Received.sign(amount);
        prop_assert_eq!(net, Decimal::ZERO);
    }

    #[test]
    fn prop_sign_preserves_magnitude(amount in positive_amount(), kind in kind()) {
        prop_assert_eq!(kind.sign(amount).abs(), amount);
    }
}
