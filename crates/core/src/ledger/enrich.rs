//! Read-side display enrichment.
//!
//! Listing endpoints resolve user display names and the numeric VAT
//! percentage for each row. Enrichment is a pure function over the raw rows
//! and two lookup maps: running it twice over the same inputs yields
//! identical output.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use valcoin_shared::types::{
    DisciplineId, RuleId, TransactionGroupId, TransactionId, UserId,
};

use super::status::{OriginKind, TransactionStatus};
use super::vat::rate_for;
use crate::rules::types::TransactionDirection;

/// Fallback shown when a party's user row no longer exists.
const UNKNOWN_USER: &str = "Utilizador não encontrado";

/// A raw ledger row as read from storage.
#[derive(Debug, Clone)]
pub struct LedgerRow {
    /// Row identifier.
    pub id: TransactionId,
    /// Group correlating this row with its companions.
    pub group_id: TransactionGroupId,
    /// Origin user.
    pub origin_id: UserId,
    /// Destination user.
    pub destination_id: UserId,
    /// Transfer amount.
    pub amount: Decimal,
    /// Transfer direction.
    pub direction: TransactionDirection,
    /// Lifecycle status.
    pub status: TransactionStatus,
    /// Row provenance.
    pub origin_kind: OriginKind,
    /// Free-text description.
    pub description: String,
    /// VAT rate reference.
    pub vat_ref: String,
    /// Originating rule, when rule-driven.
    pub rule_id: Option<RuleId>,
    /// Discipline scope, when any.
    pub discipline_id: Option<DisciplineId>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

/// A ledger row decorated for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedTransaction {
    /// Row identifier.
    pub id: TransactionId,
    /// Group correlating this row with its companions.
    pub group_id: TransactionGroupId,
    /// Origin user.
    pub origin_id: UserId,
    /// Origin display name.
    pub origin_name: String,
    /// Destination user.
    pub destination_id: UserId,
    /// Destination display name.
    pub destination_name: String,
    /// Transfer amount.
    pub amount: Decimal,
    /// Transfer direction.
    pub direction: TransactionDirection,
    /// Lifecycle status.
    pub status: TransactionStatus,
    /// Row provenance.
    pub origin_kind: OriginKind,
    /// Free-text description.
    pub description: String,
    /// VAT rate reference.
    pub vat_ref: String,
    /// Resolved VAT percentage for display.
    pub vat_rate: Decimal,
    /// Originating rule, when rule-driven.
    pub rule_id: Option<RuleId>,
    /// Discipline scope, when any.
    pub discipline_id: Option<DisciplineId>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

/// Decorates raw rows with display names and resolved VAT percentages.
#[must_use]
pub fn enrich(
    rows: &[LedgerRow],
    names: &HashMap<UserId, String>,
    vat_rates: &HashMap<String, Decimal>,
) -> Vec<EnrichedTransaction> {
    rows.iter()
        .map(|row| {
            let resolve = |id: &UserId| {
                names
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_USER.to_string())
            };

            EnrichedTransaction {
                id: row.id,
                group_id: row.group_id,
                origin_id: row.origin_id,
                origin_name: resolve(&row.origin_id),
                destination_id: row.destination_id,
                destination_name: resolve(&row.destination_id),
                amount: row.amount,
                direction: row.direction,
                status: row.status,
                origin_kind: row.origin_kind,
                description: row.description.clone(),
                vat_ref: row.vat_ref.clone(),
                vat_rate: rate_for(vat_rates, &row.vat_ref),
                rule_id: row.rule_id,
                discipline_id: row.discipline_id,
                created_at: row.created_at,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn sample_row(origin: UserId, destination: UserId, vat_ref: &str) -> LedgerRow {
        LedgerRow {
            id: TransactionId::new(),
            group_id: TransactionGroupId::new(),
            origin_id: origin,
            destination_id: destination,
            amount: dec!(25),
            direction: TransactionDirection::Credito,
            status: TransactionStatus::Aprovada,
            origin_kind: OriginKind::User,
            description: "Prémio de mérito".to_string(),
            vat_ref: vat_ref.to_string(),
            rule_id: None,
            discipline_id: None,
            created_at: Utc.with_ymd_and_hms(2026, 8, 7, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_names_and_rates_resolved() {
        let origin = UserId::new();
        let destination = UserId::new();
        let mut names = HashMap::new();
        names.insert(origin, "Professor Silva".to_string());
        names.insert(destination, "Ana".to_string());
        let mut rates = HashMap::new();
        rates.insert("normal".to_string(), dec!(23));

        let rows = vec![sample_row(origin, destination, "normal")];
        let enriched = enrich(&rows, &names, &rates);

        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].origin_name, "Professor Silva");
        assert_eq!(enriched[0].destination_name, "Ana");
        assert_eq!(enriched[0].vat_rate, dec!(23));
    }

    #[test]
    fn test_missing_user_gets_fallback_name() {
        let rows = vec![sample_row(UserId::new(), UserId::new(), "isento")];
        let enriched = enrich(&rows, &HashMap::new(), &HashMap::new());
        assert_eq!(enriched[0].origin_name, UNKNOWN_USER);
        assert_eq!(enriched[0].destination_name, UNKNOWN_USER);
        assert_eq!(enriched[0].vat_rate, Decimal::ZERO);
    }

    #[test]
    fn test_enrichment_is_idempotent() {
        let origin = UserId::new();
        let destination = UserId::new();
        let mut names = HashMap::new();
        names.insert(origin, "Professor Silva".to_string());
        let mut rates = HashMap::new();
        rates.insert("reduzida".to_string(), dec!(6));

        let rows = vec![
            sample_row(origin, destination, "reduzida"),
            sample_row(destination, origin, "isento"),
        ];

        let first = enrich(&rows, &names, &rates);
        let second = enrich(&rows, &names, &rates);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert!(enrich(&[], &HashMap::new(), &HashMap::new()).is_empty());
    }
}
