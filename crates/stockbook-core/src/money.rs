//! # Money Module
//!
//! Currency rounding and percentage math over exact decimals.
//!
//! ## Why Exact Decimals?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    10.005 is stored as 10.00499999999999989...                          │
//! │    round-half-up(10.005) → 10.00  ❌ WRONG!                             │
//! │                                                                         │
//! │  With rust_decimal:                                                     │
//! │    10.005 is exactly 10005 × 10^-3                                      │
//! │    round_currency(10.005) → 10.01  ✅                                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Precisions
//! - Line extended amounts are kept at [`INTERMEDIATE_DP`] (6) places while
//!   the subtotal is accumulated.
//! - Every persisted amount goes through [`round_currency`] (2 places,
//!   half-up) exactly once, at the end.
//!
//! ## Usage
//! ```rust
//! use rust_decimal::Decimal;
//! use stockbook_core::money::{percent_of, round_currency};
//!
//! let subtotal = Decimal::new(2500, 2);          // 25.00
//! let discount = round_currency(percent_of(subtotal, Decimal::from(10)));
//! assert_eq!(discount, Decimal::new(250, 2));    // 2.50
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Fractional digits of every persisted monetary amount.
pub const MONEY_DP: u32 = 2;

/// Fractional digits kept for line extended amounts before summation.
pub const INTERMEDIATE_DP: u32 = 6;

// =============================================================================
// Rounding
// =============================================================================

/// Rounds to exactly two fractional digits, half-up.
///
/// Half-up here means midpoints move away from zero: `0.005 → 0.01`,
/// never banker's rounding. The result always carries scale 2, so
/// `10` comes back as `10.00` and prints that way.
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use stockbook_core::money::round_currency;
///
/// assert_eq!(round_currency(Decimal::new(10005, 3)).to_string(), "10.01");
/// assert_eq!(round_currency(Decimal::new(10004, 3)).to_string(), "10.00");
/// assert_eq!(round_currency(Decimal::from(7)).to_string(), "7.00");
/// ```
pub fn round_currency(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_DP);
    rounded
}

/// Like [`round_currency`], treating a missing amount as zero.
pub fn round_currency_opt(amount: Option<Decimal>) -> Decimal {
    round_currency(amount.unwrap_or(Decimal::ZERO))
}

/// Rounds to the intermediate precision used while summing line amounts.
pub fn round_intermediate(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(INTERMEDIATE_DP, RoundingStrategy::MidpointAwayFromZero)
}

// =============================================================================
// Percentages
// =============================================================================

/// `amount × percentage / 100`, unrounded.
///
/// `percentage` is a whole-number style percentage (`10` means 10%).
pub fn percent_of(amount: Decimal, percentage: Decimal) -> Decimal {
    amount * percentage / Decimal::ONE_HUNDRED
}

/// Multiplier that removes `percentage` percent: `1 − percentage / 100`.
pub fn discount_factor(percentage: Decimal) -> Decimal {
    Decimal::ONE - percentage / Decimal::ONE_HUNDRED
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses a decimal amount as stored in the database or typed by a user.
///
/// Returns `None` for anything that is not a plain decimal number.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim()).ok()
}

/// Sums amounts exactly, with no rounding.
pub fn sum<I>(amounts: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    amounts.into_iter().fold(Decimal::ZERO, |acc, amount| acc + amount)
}

// =============================================================================
// Unit Tests
// =============================================================================
