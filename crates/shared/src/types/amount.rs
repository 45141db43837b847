//! Coin amount helpers with decimal precision.
//!
//! CRITICAL: Never use floating-point for ValCoin calculations.
//! All amounts are `rust_decimal::Decimal`, rounded to 2 decimal places.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places carried by every stored amount.
pub const COIN_SCALE: u32 = 2;

/// Rounds an amount to 2 decimal places, midpoints away from zero.
#[must_use]
pub fn round_coin(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(COIN_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Parses a numeric input leniently, defaulting to zero.
///
/// Rule amounts and limits arrive from form input; anything that does not
/// parse as a decimal is coerced to `0`.
#[must_use]
pub fn parse_amount(input: &str) -> Decimal {
    input.trim().parse::<Decimal>().unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(10.005), dec!(10.01))]
    #[case(dec!(10.004), dec!(10.00))]
    #[case(dec!(-10.005), dec!(-10.01))]
    #[case(dec!(23.0), dec!(23.00))]
    fn test_round_coin(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(round_coin(input), expected);
    }

    #[rstest]
    #[case("10.50", dec!(10.50))]
    #[case(" 7 ", dec!(7))]
    #[case("", dec!(0))]
    #[case("abc", dec!(0))]
    #[case("1,5", dec!(0))]
    fn test_parse_amount(#[case] input: &str, #[case] expected: Decimal) {
        assert_eq!(parse_amount(input), expected);
    }
}
