//! Limit window computation.
//!
//! A rule's usage limit applies to a calendar window anchored at "now":
//! the current day, ISO week, month, or year, all in UTC.

use chrono::{DateTime, Datelike, NaiveTime, TimeZone, Utc};

use super::types::LimitPeriod;

/// Returns the inclusive start of the limit window containing `now`.
///
/// Returns `None` for [`LimitPeriod::Nenhum`], which carries no window.
#[must_use]
pub fn window_start(period: LimitPeriod, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let midnight = NaiveTime::MIN;
    let today = now.date_naive();

    let start_date = match period {
        LimitPeriod::Nenhum => return None,
        LimitPeriod::Diario => today,
        LimitPeriod::Semanal => {
            let days_from_monday = i64::from(today.weekday().num_days_from_monday());
            today - chrono::Duration::days(days_from_monday)
        }
        LimitPeriod::Mensal => today.with_day(1)?,
        LimitPeriod::Anual => today.with_day(1)?.with_month(1)?,
    };

    Some(Utc.from_utc_datetime(&start_date.and_time(midnight)))
}
