//! Property tests for the VAT split.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::vat::split_gross;

/// Gross amounts between 0.01 and 100,000.00 at 2 dp.
fn gross_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Rates between 0% and 100% in whole percents.
fn rate_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=100i64).prop_map(Decimal::from)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// The split never creates or destroys value: net + vat == gross.
    /// This is the zero-sum invariant of the whole VAT side-accounting:
    /// the destination loses exactly what the sink gains.
    #[test]
    fn prop_split_is_zero_sum(gross in gross_strategy(), rate in rate_strategy()) {
        let breakdown = split_gross(gross, rate);
        prop_assert_eq!(breakdown.net + breakdown.vat, gross);
    }

    /// Both portions stay within [0, gross].
    #[test]
    fn prop_portions_are_bounded(gross in gross_strategy(), rate in rate_strategy()) {
        let breakdown = split_gross(gross, rate);
        prop_assert!(breakdown.vat >= Decimal::ZERO);
        prop_assert!(breakdown.net >= Decimal::ZERO);
        prop_assert!(breakdown.net <= gross);
        prop_assert!(breakdown.vat <= gross);
    }

    /// A zero rate yields no VAT, so exempt rows can never recurse.
    #[test]
    fn prop_zero_rate_yields_no_vat(gross in gross_strategy()) {
        let breakdown = split_gross(gross, Decimal::ZERO);
        prop_assert_eq!(breakdown.vat, Decimal::ZERO);
        prop_assert_eq!(breakdown.net, gross);
    }

    /// The net part carries at most 2 decimal places.
    #[test]
    fn prop_net_is_coin_scaled(gross in gross_strategy(), rate in rate_strategy()) {
        let breakdown = split_gross(gross, rate);
        prop_assert!(breakdown.net.scale() <= 2);
    }
}
