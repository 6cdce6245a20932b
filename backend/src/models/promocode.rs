//! Promotional discount codes.
//!
//! Validity is decided by plain comparisons at the moment a code is used; there
//! is no reservation step between validating and redeeming.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record_id;

record_id!(i64, PromocodeId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// `discount_value` is a percentage in 1..=100.
    Percentage,
    /// `discount_value` is an amount in minor currency units.
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promocode {
    pub id: PromocodeId,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub max_uses: Option<u32>,
    pub used_count: u32,
    pub min_purchase_amount: Option<i64>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Why a promocode cannot be applied right now.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromocodeRejection {
    #[error("Promocode is not active")]
    Inactive,
    #[error("Promocode is not valid yet")]
    NotYetValid,
    #[error("Promocode has expired")]
    Expired,
    #[error("Promocode usage limit reached")]
    Exhausted,
    #[error("Minimum purchase amount of {minimum} not reached")]
    BelowMinimum { minimum: i64 },
}

impl Promocode {
    /// Check every use-time condition for a purchase of `amount` at `now`.
    pub fn check(&self, amount: i64, now: DateTime<Utc>) -> Result<(), PromocodeRejection> {
        if !self.is_active {
            return Err(PromocodeRejection::Inactive);
        }
        if now < self.valid_from {
            return Err(PromocodeRejection::NotYetValid);
        }
        if let Some(until) = self.valid_until {
            if now > until {
                return Err(PromocodeRejection::Expired);
            }
        }
        if let Some(max) = self.max_uses {
            if self.used_count >= max {
                return Err(PromocodeRejection::Exhausted);
            }
        }
        if let Some(minimum) = self.min_purchase_amount {
            if amount < minimum {
                return Err(PromocodeRejection::BelowMinimum { minimum });
            }
        }
        Ok(())
    }

    /// Discount for `amount`, never more than the amount itself. Rounds down.
    pub fn discount_for(&self, amount: i64) -> i64 {
        let amount = amount.max(0);
        // Widened so large amounts cannot overflow the product.
        let discount = match self.discount_type {
            DiscountType::Percentage => i128::from(amount) * i128::from(self.discount_value) / 100,
            DiscountType::Fixed => i128::from(self.discount_value),
        };
        // Within 0..=amount, so it fits back into i64.
        discount.clamp(0, i128::from(amount)) as i64
    }

    pub fn quote(&self, amount: i64) -> PromocodeQuote {
        let discount = self.discount_for(amount);
        PromocodeQuote {
            code: self.code.clone(),
            amount,
            discount,
            final_amount: amount - discount,
        }
    }
}

/// Create payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPromocode {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    #[serde(default)]
    pub max_uses: Option<u32>,
    #[serde(default)]
    pub min_purchase_amount: Option<i64>,
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Request body for validate and redeem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromocodeApplication {
    pub code: String,
    pub amount: i64,
}

/// Outcome of applying a code to an amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromocodeQuote {
    pub code: String,
    pub amount: i64,
    pub discount: i64,
    pub final_amount: i64,
}

/// Codes are compared and stored upper-cased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn code(discount_type: DiscountType, value: i64) -> Promocode {
        let now = Utc::now();
        Promocode {
            id: PromocodeId::new(1),
            code: "LAUNCH20".to_string(),
            discount_type,
            discount_value: value,
            max_uses: None,
            used_count: 0,
            min_purchase_amount: None,
            valid_from: now - Duration::days(1),
            valid_until: None,
            is_active: true,
            created_at: now,
        }
    }

    #[test]
    fn test_percentage_discount_rounds_down() {
        let promo = code(DiscountType::Percentage, 15);
        assert_eq!(promo.discount_for(999), 149);
    }

    #[test]
    fn test_percentage_discount_on_huge_amount() {
        let promo = code(DiscountType::Percentage, 15);
        let amount = 9_000_000_000_000_000_000;
        let quote = promo.quote(amount);
        assert_eq!(quote.discount, 1_350_000_000_000_000_000);
        assert_eq!(quote.final_amount, 7_650_000_000_000_000_000);

        let full = code(DiscountType::Percentage, 100).quote(i64::MAX);
        assert_eq!(full.discount, i64::MAX);
        assert_eq!(full.final_amount, 0);
    }

    #[test]
    fn test_fixed_discount_never_exceeds_amount() {
        let promo = code(DiscountType::Fixed, 5000);
        assert_eq!(promo.discount_for(1200), 1200);
        assert_eq!(promo.quote(1200).final_amount, 0);
    }

    #[test]
    fn test_expired_code_rejected() {
        let mut promo = code(DiscountType::Fixed, 100);
        promo.valid_until = Some(Utc::now() - Duration::hours(1));
        assert_eq!(promo.check(1000, Utc::now()), Err(PromocodeRejection::Expired));
    }

    #[test]
    fn test_future_code_rejected() {
        let mut promo = code(DiscountType::Fixed, 100);
        promo.valid_from = Utc::now() + Duration::days(2);
        assert_eq!(
            promo.check(1000, Utc::now()),
            Err(PromocodeRejection::NotYetValid)
        );
    }

    #[test]
    fn test_exhausted_code_rejected() {
        let mut promo = code(DiscountType::Fixed, 100);
        promo.max_uses = Some(3);
        promo.used_count = 3;
        assert_eq!(promo.check(1000, Utc::now()), Err(PromocodeRejection::Exhausted));
    }

    #[test]
    fn test_minimum_purchase_enforced() {
        let mut promo = code(DiscountType::Percentage, 10);
        promo.min_purchase_amount = Some(2000);
        assert_eq!(
            promo.check(1999, Utc::now()),
            Err(PromocodeRejection::BelowMinimum { minimum: 2000 })
        );
        assert!(promo.check(2000, Utc::now()).is_ok());
    }

    #[test]
    fn test_inactive_checked_first() {
        let mut promo = code(DiscountType::Fixed, 100);
        promo.is_active = false;
        promo.valid_until = Some(Utc::now() - Duration::hours(1));
        assert_eq!(promo.check(1000, Utc::now()), Err(PromocodeRejection::Inactive));
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  launch20 "), "LAUNCH20");
    }
}
