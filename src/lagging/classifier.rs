use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use tracing::warn;

use crate::{
    config::IndicatorPolicy,
    models::{
        accident::AccidentRecord,
        property_damage::PropertyDamageRecord,
        summary::{Breakdown, CategoryCounts, VictimCounts, UNCLASSIFIED_SITE},
        victim::{VictimRecord, VictimSeverity},
    },
};

use super::{
    calculator::{stored_amount, victim_lost_days},
    code::ParsedCode,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorFamily {
    LostTime,
    Recordable,
}

impl IndicatorFamily {
    /// `first-aid` belongs to neither family.
    pub fn includes(self, severity: VictimSeverity) -> bool {
        match severity {
            VictimSeverity::Death
            | VictimSeverity::Serious
            | VictimSeverity::Minor
            | VictimSeverity::Other => true,
            VictimSeverity::HospitalTreatment => self == IndicatorFamily::Recordable,
            VictimSeverity::FirstAid => false,
        }
    }
}

/// Counts for one year before any rate is derived.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tally {
    pub accidents: Breakdown<u64>,
    pub by_category: CategoryCounts,
    pub by_site: BTreeMap<String, u64>,
    pub lost_time_accidents: Breakdown<u64>,
    pub recordable_accidents: Breakdown<u64>,
    pub victims: VictimCounts,
    pub lost_days: Breakdown<u64>,
    pub direct_damage: Breakdown<f64>,
}

pub fn classify(
    accidents: &[AccidentRecord],
    victims: &[VictimRecord],
    damages: &[PropertyDamageRecord],
    today: DateTime<Utc>,
    policy: &IndicatorPolicy,
) -> Tally {
    // Stable iteration keeps floating-point sums reproducible.
    let mut accidents: Vec<&AccidentRecord> = accidents.iter().collect();
    accidents.sort_by_key(|accident| (accident.occurred_at, accident._id));

    let mut victims_of: HashMap<ObjectId, Vec<&VictimRecord>> = HashMap::new();
    for victim in victims {
        victims_of.entry(victim.accident_id).or_default().push(victim);
    }
    let mut damages_of: HashMap<ObjectId, Vec<&PropertyDamageRecord>> = HashMap::new();
    for damage in damages {
        damages_of.entry(damage.accident_id).or_default().push(damage);
    }

    let mut tally = Tally::default();

    for accident in accidents {
        let relation = accident.employment;
        tally.accidents.add(relation, 1);
        tally.by_category.bump(accident.category);

        let parsed = ParsedCode::parse(&accident.code);
        match &parsed {
            ParsedCode::Parsed(code) if accident.occurred_year() != Some(code.year) => {
                warn!(
                    accident_id = %accident._id,
                    code = %accident.code,
                    code_year = code.year,
                    "Accident code year disagrees with its date"
                );
            }
            ParsedCode::Unparseable { raw, reason } => {
                warn!(
                    accident_id = %accident._id,
                    code = %raw,
                    ?reason,
                    "Unparseable accident code, counting as unclassified"
                );
            }
            ParsedCode::Parsed(_) => {}
        }
        let site = parsed.site().unwrap_or(UNCLASSIFIED_SITE).to_string();
        *tally.by_site.entry(site).or_default() += 1;

        let mut own_victims = victims_of.remove(&accident._id).unwrap_or_default();
        own_victims.sort_by_key(|victim| victim._id);

        let mut lost_time = false;
        let mut recordable = false;
        for victim in own_victims {
            let victim_relation = victim.employment.unwrap_or(relation);
            tally.victims.bump(victim.severity, victim_relation);
            tally.lost_days.add(
                victim_relation,
                victim_lost_days(victim, accident.occurred_at, today, policy),
            );
            lost_time |= IndicatorFamily::LostTime.includes(victim.severity);
            recordable |= IndicatorFamily::Recordable.includes(victim.severity);
        }
        if lost_time {
            tally.lost_time_accidents.add(relation, 1);
        }
        if recordable {
            tally.recordable_accidents.add(relation, 1);
        }

        if accident.category.bears_damage() {
            let mut own_damages = damages_of.remove(&accident._id).unwrap_or_default();
            own_damages.sort_by_key(|damage| damage._id);
            for damage in own_damages {
                tally.direct_damage.add(
                    relation,
                    stored_amount(damage.direct_cost, "direct_cost", damage._id),
                );
            }
        }
    }

    tally
}
