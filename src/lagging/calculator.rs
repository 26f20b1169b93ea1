use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};
use tracing::warn;

use crate::{
    config::IndicatorPolicy,
    models::{
        labor_hours::AnnualLaborHoursRecord,
        summary::{Breakdown, PropertyDamage},
        victim::{VictimRecord, VictimSeverity},
    },
};

use super::classifier::IndicatorFamily;

const DAY_MILLIS: i64 = 86_400_000;

/// Frequency per `constant` hours. Zero or non-finite hours yield 0.
pub fn rate(count: u64, hours: f64, constant: f64) -> f64 {
    normalized(count as f64, hours, constant)
}

/// Lost days per `constant` hours. Zero or non-finite hours yield 0.
pub fn severity(lost_days: u64, hours: f64, constant: f64) -> f64 {
    normalized(lost_days as f64, hours, constant)
}

fn normalized(value: f64, hours: f64, constant: f64) -> f64 {
    if !hours.is_finite() || hours <= 0.0 {
        return 0.0;
    }
    let result = (value / hours) * constant;
    if result.is_finite() {
        result
    } else {
        0.0
    }
}

fn ceil_days(from_millis: i64, to_millis: i64) -> u64 {
    let span = to_millis.saturating_sub(from_millis);
    if span <= 0 {
        0
    } else {
        span.div_euclid(DAY_MILLIS) as u64 + u64::from(span.rem_euclid(DAY_MILLIS) != 0)
    }
}

/// Lost days charged to one victim.
///
/// Death is a fixed day-equivalent. Otherwise the recorded absence is used
/// when both dates are present. Lost-time severities without both dates get
/// a running estimate from the accident date to `today`, capped by policy.
pub fn victim_lost_days(
    victim: &VictimRecord,
    occurred_at: bson::DateTime,
    today: DateTime<Utc>,
    policy: &IndicatorPolicy,
) -> u64 {
    if victim.severity == VictimSeverity::Death {
        return policy.death_lost_days;
    }

    if let (Some(start), Some(back)) = (victim.absence_start, victim.expected_return) {
        return ceil_days(start.timestamp_millis(), back.timestamp_millis());
    }

    if !IndicatorFamily::LostTime.includes(victim.severity) {
        return 0;
    }

    let estimate = ceil_days(occurred_at.timestamp_millis(), today.timestamp_millis());
    match policy.lost_day_cap {
        Some(cap) => estimate.min(cap),
        None => estimate,
    }
}

/// Stored amounts that are negative or not finite count as 0.
pub fn stored_amount(value: f64, field: &'static str, record: ObjectId) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        warn!(%record, field, value, "Invalid stored amount, counting as 0");
        0.0
    }
}

/// Sums labor hours for the year, and reports whether every row is closed.
///
/// When a year has both organization-level rows and per-site rows, the
/// site rows win and the organization-level rows are ignored.
pub fn labor_hours(
    records: &[AnnualLaborHoursRecord],
    policy: &IndicatorPolicy,
) -> (Breakdown<f64>, bool) {
    let site_rows = records.iter().filter(|record| record.site_code.is_some()).count();
    let rows: Vec<&AnnualLaborHoursRecord> = if site_rows > 0 && site_rows < records.len() {
        warn!(
            ignored = records.len() - site_rows,
            "Organization-level labor hours overlap site rows, using site rows only"
        );
        records.iter().filter(|record| record.site_code.is_some()).collect()
    } else {
        records.iter().collect()
    };

    let mut hours: Breakdown<f64> = Breakdown::default();
    for record in &rows {
        let employee = stored_amount(record.employee_hours, "employee_hours", record._id);
        let contractor = stored_amount(
            record.contractor_hours(policy.include_offsite_contractor_hours),
            "contractor_hours",
            record._id,
        );
        hours.employee += employee;
        hours.contractor += contractor;
        hours.total += employee + contractor;
    }
    let closed = !rows.is_empty() && rows.iter().all(|record| record.closed);
    (hours, closed)
}

pub fn property_damage(direct: Breakdown<f64>, policy: &IndicatorPolicy) -> PropertyDamage {
    let indirect = direct.map(|amount| amount * policy.indirect_damage_multiplier);
    PropertyDamage {
        direct,
        indirect,
        total: direct.zip(&indirect, |direct, indirect| direct + indirect),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorRates {
    pub lost_time_injury_rate: Breakdown<f64>,
    pub total_recordable_injury_rate: Breakdown<f64>,
    pub severity_rate: Breakdown<f64>,
}

pub fn derive_rates(
    lost_time_accidents: &Breakdown<u64>,
    recordable_accidents: &Breakdown<u64>,
    lost_days: &Breakdown<u64>,
    hours: &Breakdown<f64>,
    policy: &IndicatorPolicy,
) -> IndicatorRates {
    IndicatorRates {
        lost_time_injury_rate: lost_time_accidents
            .zip(hours, |count, hours| rate(count, hours, policy.rate_constant)),
        total_recordable_injury_rate: recordable_accidents
            .zip(hours, |count, hours| rate(count, hours, policy.rate_constant)),
        severity_rate: lost_days
            .zip(hours, |days, hours| severity(days, hours, policy.severity_constant)),
    }
}
