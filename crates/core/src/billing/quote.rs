//! Bill totals: bags times price, plus market cess.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Pricing inputs for one billed product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillQuote {
    /// Price of one bag.
    pub price_per_bag: Decimal,
    /// Number of bags.
    pub quantity: u32,
    /// Cess as a percentage of the subtotal.
    #[serde(default = "default_cess_rate")]
    pub cess_rate: Decimal,
}

fn default_cess_rate() -> Decimal {
    Decimal::new(5, 0)
}

impl BillQuote {
    /// Rejects negative prices and cess rates.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidField` for a negative price or cess rate.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.price_per_bag < Decimal::ZERO {
            return Err(DomainError::invalid("price_per_bag", "must not be negative"));
        }
        if self.cess_rate < Decimal::ZERO {
            return Err(DomainError::invalid("cess_rate", "must not be negative"));
        }
        Ok(())
    }

    /// `price_per_bag * quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.price_per_bag * Decimal::from(self.quantity)
    }

    /// Cess on the subtotal, rounded to paise.
    #[must_use]
    pub fn cess(&self) -> Decimal {
        (self.subtotal() * self.cess_rate / Decimal::ONE_HUNDRED).round_dp(2)
    }

    /// Subtotal plus cess.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.subtotal() + self.cess()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_total_with_default_cess() {
        let quote: BillQuote =
            serde_json::from_str(r#"{"price_per_bag": "500", "quantity": 30}"#).unwrap();
        assert_eq!(quote.subtotal(), dec!(15000));
        assert_eq!(quote.cess(), dec!(750));
        assert_eq!(quote.total(), dec!(15750));
    }

    #[test]
    fn test_cess_rounds_to_paise() {
        let quote = BillQuote {
            price_per_bag: dec!(333.33),
            quantity: 1,
            cess_rate: dec!(2.5),
        };
        assert_eq!(quote.cess(), dec!(8.33));
        assert_eq!(quote.total(), dec!(341.66));
    }

    #[test]
    fn test_zero_quantity_is_zero_total() {
        let quote = BillQuote {
            price_per_bag: dec!(1200),
            quantity: 0,
            cess_rate: dec!(5),
        };
        assert_eq!(quote.total(), Decimal::ZERO);
    }

    #[test]
    fn test_negative_price_rejected() {
        let quote = BillQuote {
            price_per_bag: dec!(-1),
            quantity: 1,
            cess_rate: dec!(5),
        };
        assert!(quote.validate().is_err());
    }
}
