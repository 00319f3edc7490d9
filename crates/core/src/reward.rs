//! Margin-based reward calculation.
//!
//! A variant's reward is a share of its gross margin:
//!
//! ```text
//! margin         = (sale_price - cost_price) / sale_price * 100
//! elite_reward   = margin * elite_gross_margin   / 100
//! regular_reward = margin * regular_gross_margin / 100
//! ```
//!
//! Both rewards are rounded to two decimal places, midpoint away from zero.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of decimal places rewards are rounded to.
pub const REWARD_DECIMAL_PLACES: u32 = 2;

/// Errors that can occur while calculating rewards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RewardError {
    /// The sale price is zero, so the margin is undefined.
    #[error("sale price is zero, margin is undefined")]
    ZeroSalePrice,

    /// An intermediate value does not fit in a `Decimal`.
    #[error("reward calculation overflowed")]
    Overflow,
}

/// Gross-margin percentages configured on a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GrossMargins {
    /// Percentage of the variant margin paid to elite customers.
    pub elite: Decimal,
    /// Percentage of the variant margin paid to regular customers.
    pub regular: Decimal,
}

impl GrossMargins {
    /// Margins used for products whose collection has no category.
    pub const ZERO: Self = Self {
        elite: Decimal::ZERO,
        regular: Decimal::ZERO,
    };

    /// Create margins from elite and regular percentages.
    #[must_use]
    pub const fn new(elite: Decimal, regular: Decimal) -> Self {
        Self { elite, regular }
    }
}

/// Computed reward amounts for a single variant (or summed over an order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RewardAmounts {
    /// Reward for elite customers.
    pub elite: Decimal,
    /// Reward for regular customers.
    pub regular: Decimal,
}

impl RewardAmounts {
    /// No reward. Written to metafields when a category is removed.
    pub const ZERO: Self = Self {
        elite: Decimal::ZERO,
        regular: Decimal::ZERO,
    };

    /// Create reward amounts.
    #[must_use]
    pub const fn new(elite: Decimal, regular: Decimal) -> Self {
        Self { elite, regular }
    }

    /// The elite reward as a metafield value (e.g. `20`, `8.5`).
    #[must_use]
    pub fn elite_metafield_value(&self) -> String {
        metafield_value(self.elite)
    }

    /// The regular reward as a metafield value (e.g. `20`, `8.5`).
    #[must_use]
    pub fn regular_metafield_value(&self) -> String {
        metafield_value(self.regular)
    }
}

impl std::ops::Add for RewardAmounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            elite: self.elite + rhs.elite,
            regular: self.regular + rhs.regular,
        }
    }
}

impl std::ops::AddAssign for RewardAmounts {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Format a decimal without trailing zeros, as stored in `number_decimal`
/// metafields.
#[must_use]
pub fn metafield_value(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Percentage margin between sale and cost price.
///
/// # Errors
///
/// Returns `RewardError::ZeroSalePrice` when `sale_price` is zero and
/// `RewardError::Overflow` if the division overflows.
pub fn margin_percent(sale_price: Decimal, cost_price: Decimal) -> Result<Decimal, RewardError> {
    if sale_price.is_zero() {
        return Err(RewardError::ZeroSalePrice);
    }

    sale_price
        .checked_sub(cost_price)
        .and_then(|diff| diff.checked_div(sale_price))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or(RewardError::Overflow)
}

/// Calculate elite and regular rewards for a variant.
///
/// # Errors
///
/// Returns `RewardError::ZeroSalePrice` when `sale_price` is zero and
/// `RewardError::Overflow` if an intermediate value overflows.
pub fn calculate_rewards(
    sale_price: Decimal,
    cost_price: Decimal,
    margins: GrossMargins,
) -> Result<RewardAmounts, RewardError> {
    let margin = margin_percent(sale_price, cost_price)?;

    Ok(RewardAmounts {
        elite: share_of_margin(margin, margins.elite)?,
        regular: share_of_margin(margin, margins.regular)?,
    })
}

fn share_of_margin(margin: Decimal, percent: Decimal) -> Result<Decimal, RewardError> {
    margin
        .checked_mul(percent)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .map(|v| {
            v.round_dp_with_strategy(REWARD_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        })
        .ok_or(RewardError::Overflow)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_reference_example() {
        let margin = margin_percent(dec!(100), dec!(60)).unwrap();
        assert_eq!(margin, dec!(40));

        let rewards = calculate_rewards(dec!(100), dec!(60), GrossMargins::new(dec!(50), dec!(20)))
            .unwrap();
        assert_eq!(rewards.elite, dec!(20.00));
        assert_eq!(rewards.regular, dec!(8.00));
    }

    #[test]
    fn test_rounds_to_two_places() {
        // margin = 2/3 * 100 = 66.666..., elite = 66.666... * 10 / 100 = 6.666...
        let rewards =
            calculate_rewards(dec!(30), dec!(10), GrossMargins::new(dec!(10), dec!(5))).unwrap();
        assert_eq!(rewards.elite, dec!(6.67));
        assert_eq!(rewards.regular, dec!(3.33));
    }

    #[test]
    fn test_midpoint_rounds_away_from_zero() {
        // margin = 50, elite = 50 * 12.25 / 100 = 6.125
        let rewards =
            calculate_rewards(dec!(10), dec!(5), GrossMargins::new(dec!(12.25), dec!(0))).unwrap();
        assert_eq!(rewards.elite, dec!(6.13));
        assert_eq!(rewards.regular, dec!(0));
    }

    #[test]
    fn test_missing_cost_is_full_margin() {
        let rewards =
            calculate_rewards(dec!(19.99), Decimal::ZERO, GrossMargins::new(dec!(10), dec!(5)))
                .unwrap();
        assert_eq!(rewards.elite, dec!(10.00));
        assert_eq!(rewards.regular, dec!(5.00));
    }

    #[test]
    fn test_cost_above_price_gives_negative_reward() {
        let rewards =
            calculate_rewards(dec!(50), dec!(75), GrossMargins::new(dec!(10), dec!(10))).unwrap();
        assert_eq!(rewards.elite, dec!(-5.00));
    }

    #[test]
    fn test_zero_sale_price_is_an_error() {
        assert_eq!(
            calculate_rewards(Decimal::ZERO, dec!(5), GrossMargins::new(dec!(10), dec!(10))),
            Err(RewardError::ZeroSalePrice)
        );
    }

    #[test]
    fn test_zero_margins_give_zero_rewards() {
        let rewards = calculate_rewards(dec!(100), dec!(60), GrossMargins::ZERO).unwrap();
        assert_eq!(rewards, RewardAmounts::ZERO);
    }

    #[test]
    fn test_metafield_value_drops_trailing_zeros() {
        let rewards = RewardAmounts::new(dec!(20.00), dec!(8.50));
        assert_eq!(rewards.elite_metafield_value(), "20");
        assert_eq!(rewards.regular_metafield_value(), "8.5");
        assert_eq!(RewardAmounts::ZERO.elite_metafield_value(), "0");
    }

    #[test]
    fn test_amounts_add() {
        let mut total = RewardAmounts::ZERO;
        total += RewardAmounts::new(dec!(5.00), dec!(1.00));
        total += RewardAmounts::new(dec!(3.00), dec!(0.50));
        assert_eq!(total, RewardAmounts::new(dec!(8.00), dec!(1.50)));
    }
}
