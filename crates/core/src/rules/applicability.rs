//! The applicability checker.
//!
//! Answers "can rule R be applied from A to B (optionally scoped to
//! discipline D) right now?" over a fully gathered [`RuleContext`].
//!
//! The checker is a pure function: callers load users, disciplines,
//! enrollment flags, and the window usage total, then hand everything here.
//! The dry-run endpoint and the ledger writer's in-transaction gate both go
//! through [`evaluate`], so the two paths cannot drift apart.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use valcoin_shared::types::DisciplineId;

use super::error::{RuleViolation, RuleWarning};
use super::types::{DisciplineSnapshot, LimitPeriod, TransactionDirection, TransactionRule, UserSnapshot};

/// A debit that would leave the origin below this balance raises a warning.
const LOW_BALANCE_THRESHOLD: Decimal = Decimal::TEN;

/// Everything the checker needs, gathered by the caller.
///
/// `origin`/`destination` are `None` when the referenced user row does not
/// exist; the checker turns that into the corresponding violation so the
/// dry run can report it alongside everything else.
#[derive(Debug, Clone)]
pub struct RuleContext {
    /// The rule under evaluation.
    pub rule: TransactionRule,
    /// Origin user snapshot, if the row exists.
    pub origin: Option<UserSnapshot>,
    /// Requested origin id, used for diagnostics when the row is missing.
    pub origin_id: valcoin_shared::types::UserId,
    /// Destination user snapshot, if one was requested and the row exists.
    pub destination: Option<UserSnapshot>,
    /// Requested destination id, if any.
    pub destination_id: Option<valcoin_shared::types::UserId>,
    /// Requested discipline scope, if any.
    pub discipline_id: Option<DisciplineId>,
    /// Discipline snapshot, if a scope was requested and the row exists.
    pub discipline: Option<DisciplineSnapshot>,
    /// Whether the destination is actively enrolled in the discipline.
    /// `None` when unknown (no destination or no discipline).
    pub destination_enrolled: Option<bool>,
    /// Sum of non-rejected usage for this rule in the current window.
    pub used_in_window: Decimal,
    /// Evaluation instant; anchors the limit window.
    pub now: DateTime<Utc>,
}

/// Remaining headroom under a rule's usage limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitStatus {
    /// `limit - used` for the current window; equals `total` when no limit
    /// is configured.
    pub remaining: Decimal,
    /// The configured ceiling (`0` when unlimited).
    pub total: Decimal,
    /// The window unit.
    pub period: LimitPeriod,
}

/// Outcome of an applicability evaluation.
#[derive(Debug, Clone)]
pub struct ApplicabilityReport {
    /// True iff no hard violation was raised.
    pub can_apply: bool,
    /// Every violation found, in check order.
    pub errors: Vec<RuleViolation>,
    /// Soft signals; never block application.
    pub warnings: Vec<RuleWarning>,
    /// Limit headroom computed during the check.
    pub limits: LimitStatus,
}

impl ApplicabilityReport {
    /// Collapses the report into the committing gate's verdict.
    ///
    /// # Errors
    ///
    /// Returns the first violation when the rule is not applicable.
    pub fn into_result(self) -> Result<LimitStatus, RuleViolation> {
        match self.errors.into_iter().next() {
            Some(violation) => Err(violation),
            None => Ok(self.limits),
        }
    }
}

/// Runs every applicability check over the gathered context.
///
/// Checks run in a fixed order and all of them always run, so the dry run
/// reports complete diagnostics. The commit path short-circuits afterwards
/// via [`ApplicabilityReport::into_result`].
#[must_use]
pub fn evaluate(ctx: &RuleContext) -> ApplicabilityReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let rule = &ctx.rule;

    // 1. Rule must be active.
    if !rule.is_active {
        errors.push(RuleViolation::RuleInactive);
    }

    // 2. Origin must exist, be active, and hold the allowed role.
    match &ctx.origin {
        None => errors.push(RuleViolation::OriginNotFound(ctx.origin_id)),
        Some(origin) => {
            if !origin.is_active {
                errors.push(RuleViolation::OriginInactive);
            }
            if origin.role != rule.origin_role {
                errors.push(RuleViolation::OriginRoleMismatch {
                    required: rule.origin_role,
                    actual: origin.role,
                });
            }
        }
    }

    // 3. Destination, when supplied, must exist, be active, hold the
    //    allowed role, and differ from the origin.
    if let Some(destination_id) = ctx.destination_id {
        match &ctx.destination {
            None => errors.push(RuleViolation::DestinationNotFound(destination_id)),
            Some(destination) => {
                if !destination.is_active {
                    errors.push(RuleViolation::DestinationInactive);
                }
                if destination.role != rule.destination_role {
                    errors.push(RuleViolation::DestinationRoleMismatch {
                        required: rule.destination_role,
                        actual: destination.role,
                    });
                }
                if destination_id == ctx.origin_id {
                    errors.push(RuleViolation::SelfTransfer);
                }
            }
        }
    }

    // 4. Per-discipline rules need an active discipline and, when the
    //    destination is known, an active enrollment.
    if rule.per_discipline {
        match ctx.discipline_id {
            None => errors.push(RuleViolation::DisciplineRequired),
            Some(discipline_id) => match &ctx.discipline {
                None => errors.push(RuleViolation::DisciplineNotFound(discipline_id)),
                Some(discipline) => {
                    if !discipline.is_active {
                        errors.push(RuleViolation::DisciplineInactive(discipline_id));
                    }
                    if ctx.destination.is_some() && ctx.destination_enrolled == Some(false) {
                        errors.push(RuleViolation::NotEnrolled);
                    }
                }
            },
        }
    }

    // 5. Debits require a covering origin balance.
    if rule.direction == TransactionDirection::Debito
        && let Some(origin) = &ctx.origin
    {
        if origin.balance < rule.amount {
            errors.push(RuleViolation::InsufficientBalance {
                balance: origin.balance,
                required: rule.amount,
            });
        } else if origin.balance - rule.amount < LOW_BALANCE_THRESHOLD {
            warnings.push(RuleWarning::LowBalanceAfterDebit);
        }
    }

    // 6. Period limit: remaining headroom must cover the rule amount.
    let limits = if rule.has_limit() {
        let remaining = rule.limit_amount - ctx.used_in_window;
        if remaining < rule.amount {
            errors.push(RuleViolation::LimitExceeded {
                limit: rule.limit_amount,
                used: ctx.used_in_window,
                period: rule.limit_period,
            });
        }
        LimitStatus {
            remaining,
            total: rule.limit_amount,
            period: rule.limit_period,
        }
    } else {
        LimitStatus {
            remaining: rule.limit_amount,
            total: rule.limit_amount,
            period: rule.limit_period,
        }
    };

    ApplicabilityReport {
        can_apply: errors.is_empty(),
        errors,
        warnings,
        limits,
    }
}
