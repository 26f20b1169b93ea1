use std::{collections::BTreeMap, ops::AddAssign};

use serde::{Deserialize, Serialize};

use super::{
    accident::{AccidentCategory, EmploymentRelation},
    victim::VictimSeverity,
};

/// Bucket name for accidents whose code could not be parsed.
pub const UNCLASSIFIED_SITE: &str = "unclassified";

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Breakdown<T> {
    pub total: T,
    pub employee: T,
    pub contractor: T,
}

impl<T: AddAssign + Copy> Breakdown<T> {
    /// Adds to the total and to the relation's own column.
    pub fn add(&mut self, relation: EmploymentRelation, value: T) {
        self.total += value;
        match relation {
            EmploymentRelation::Employee => self.employee += value,
            EmploymentRelation::Contractor => self.contractor += value,
        }
    }
}

impl<T: Copy> Breakdown<T> {
    pub fn map<U, F: Fn(T) -> U>(&self, f: F) -> Breakdown<U> {
        Breakdown {
            total: f(self.total),
            employee: f(self.employee),
            contractor: f(self.contractor),
        }
    }
    pub fn zip<U: Copy, V, F: Fn(T, U) -> V>(&self, other: &Breakdown<U>, f: F) -> Breakdown<V> {
        Breakdown {
            total: f(self.total, other.total),
            employee: f(self.employee, other.employee),
            contractor: f(self.contractor, other.contractor),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct CategoryCounts {
    pub human: u64,
    pub property: u64,
    pub combined: u64,
}

impl CategoryCounts {
    pub fn bump(&mut self, category: AccidentCategory) {
        match category {
            AccidentCategory::Human => self.human += 1,
            AccidentCategory::Property => self.property += 1,
            AccidentCategory::Combined => self.combined += 1,
        }
    }
}

/// Victims per severity. Attributed by the victim's own employment relation
/// when recorded, otherwise by the accident's.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct VictimCounts {
    pub death: Breakdown<u64>,
    pub serious: Breakdown<u64>,
    pub minor: Breakdown<u64>,
    pub other: Breakdown<u64>,
    pub hospital_treatment: Breakdown<u64>,
    pub first_aid: Breakdown<u64>,
}

impl VictimCounts {
    pub fn bump(&mut self, severity: VictimSeverity, relation: EmploymentRelation) {
        let bucket = match severity {
            VictimSeverity::Death => &mut self.death,
            VictimSeverity::Serious => &mut self.serious,
            VictimSeverity::Minor => &mut self.minor,
            VictimSeverity::Other => &mut self.other,
            VictimSeverity::HospitalTreatment => &mut self.hospital_treatment,
            VictimSeverity::FirstAid => &mut self.first_aid,
        };
        bucket.add(relation, 1);
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct PropertyDamage {
    pub direct: Breakdown<f64>,
    pub indirect: Breakdown<f64>,
    pub total: Breakdown<f64>,
}

/// Lagging indicators for one calendar year.
///
/// Every value is a pure function of the accident, victim, property-damage
/// and labor-hour records of that year. Employee/contractor splits of
/// accident-level counts use the accident's single employment flag, so a
/// mixed-crew accident is attributed entirely to that flag.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct LaggingSummary {
    pub year: i32,
    pub accidents: Breakdown<u64>,
    pub accidents_by_category: CategoryCounts,
    /// Keyed by the site segment of the accident code.
    pub accidents_by_site: BTreeMap<String, u64>,
    pub lost_time_accidents: Breakdown<u64>,
    pub recordable_accidents: Breakdown<u64>,
    pub victims: VictimCounts,
    pub property_damage: PropertyDamage,
    pub labor_hours: Breakdown<f64>,
    /// True when labor hours were reported for the year and every row is closed.
    pub labor_hours_closed: bool,
    pub lost_days: Breakdown<u64>,
    pub lost_time_injury_rate: Breakdown<f64>,
    pub total_recordable_injury_rate: Breakdown<f64>,
    pub severity_rate: Breakdown<f64>,
}
