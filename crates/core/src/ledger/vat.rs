//! VAT split computation.
//!
//! Transfer amounts are VAT-inclusive. When a transfer's rate reference
//! resolves to a nonzero percentage, the gross amount is split into a net
//! part (stays with the destination) and a VAT part (routed to the
//! settlement account by a generated counter-transaction).

use rust_decimal::Decimal;
use std::collections::HashMap;
use valcoin_shared::types::amount::round_coin;

/// Rate reference carried by generated VAT rows so they are never taxed again.
pub const VAT_EXEMPT_REF: &str = "isento";

/// A gross amount split into net and VAT portions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VatBreakdown {
    /// The original VAT-inclusive amount.
    pub gross: Decimal,
    /// The amount net of VAT, rounded to 2 dp.
    pub net: Decimal,
    /// The VAT portion; `gross - net`, so the split is always exact.
    pub vat: Decimal,
    /// The applied percentage.
    pub rate: Decimal,
}

/// Splits a VAT-inclusive gross amount at the given percentage.
///
/// `net = gross / (1 + rate/100)` rounded to 2 dp; `vat = gross - net`.
/// Deriving the VAT side by subtraction keeps `net + vat == gross` exact,
/// which is what keeps the ledger zero-sum.
#[must_use]
pub fn split_gross(gross: Decimal, rate_percent: Decimal) -> VatBreakdown {
    if rate_percent.is_zero() {
        return VatBreakdown {
            gross,
            net: gross,
            vat: Decimal::ZERO,
            rate: rate_percent,
        };
    }

    let divisor = Decimal::ONE + rate_percent / Decimal::ONE_HUNDRED;
    let net = round_coin(gross / divisor);
    VatBreakdown {
        gross,
        net,
        vat: gross - net,
        rate: rate_percent,
    }
}

/// Resolves a VAT rate reference against the configured rate map.
///
/// Unknown references resolve to zero, matching the behavior of the
/// settings store when a rate was removed after rows referencing it exist.
#[must_use]
pub fn rate_for(vat_rates: &HashMap<String, Decimal>, vat_ref: &str) -> Decimal {
    vat_rates.get(vat_ref).copied().unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_standard_rate_split() {
        // 23% on a gross of 123: net 100.00, vat 23.00.
        let breakdown = split_gross(dec!(123), dec!(23));
        assert_eq!(breakdown.net, dec!(100.00));
        assert_eq!(breakdown.vat, dec!(23.00));
        assert_eq!(breakdown.gross, dec!(123));
    }

    #[test]
    fn test_zero_rate_is_identity() {
        let breakdown = split_gross(dec!(50), Decimal::ZERO);
        assert_eq!(breakdown.net, dec!(50));
        assert_eq!(breakdown.vat, Decimal::ZERO);
    }

    #[rstest]
    #[case(dec!(10), dec!(6))]
    #[case(dec!(99.99), dec!(23))]
    #[case(dec!(0.01), dec!(23))]
    #[case(dec!(1234.56), dec!(13))]
    fn test_split_is_exact(#[case] gross: Decimal, #[case] rate: Decimal) {
        let breakdown = split_gross(gross, rate);
        assert_eq!(breakdown.net + breakdown.vat, gross);
        assert!(breakdown.vat >= Decimal::ZERO);
    }

    #[test]
    fn test_rate_for() {
        let mut rates = HashMap::new();
        rates.insert("normal".to_string(), dec!(23));
        rates.insert("reduzida".to_string(), dec!(6));
        rates.insert("isento".to_string(), Decimal::ZERO);

        assert_eq!(rate_for(&rates, "normal"), dec!(23));
        assert_eq!(rate_for(&rates, "reduzida"), dec!(6));
        assert_eq!(rate_for(&rates, VAT_EXEMPT_REF), Decimal::ZERO);
        assert_eq!(rate_for(&rates, "desconhecida"), Decimal::ZERO);
    }
}
