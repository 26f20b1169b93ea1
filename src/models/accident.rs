use crate::error::LaggingError;

use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, DateTime},
    options::FindOptions,
    Collection, Database,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AccidentCategory {
    Human,
    Property,
    Combined,
}
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentRelation {
    Employee,
    Contractor,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct AccidentRecord {
    pub _id: ObjectId,
    /// Structured `ORG-SITE-YEAR-SEQ` identifier issued by the reporting workflow.
    pub code: String,
    pub occurred_at: DateTime,
    pub category: AccidentCategory,
    pub employment: EmploymentRelation,
}

impl AccidentCategory {
    /// Only these categories contribute to property-damage totals.
    pub fn bears_damage(&self) -> bool {
        matches!(self, AccidentCategory::Property | AccidentCategory::Combined)
    }
}

impl AccidentRecord {
    pub fn occurred_year(&self) -> Option<i32> {
        Utc.timestamp_millis_opt(self.occurred_at.timestamp_millis())
            .single()
            .map(|time| time.year())
    }
    pub async fn find_by_year(db: &Database, year: i32) -> Result<Vec<AccidentRecord>, LaggingError> {
        let collection: Collection<AccidentRecord> =
            db.collection::<AccidentRecord>("accidents");

        let (start, end) = year_bounds(year)?;
        let options = FindOptions::builder()
            .sort(doc! { "occurred_at": 1, "_id": 1 })
            .build();

        collection
            .find(
                doc! { "occurred_at": { "$gte": start, "$lt": end } },
                options,
            )
            .await
            .map_err(|error| LaggingError::unavailable("accidents", error))?
            .try_collect()
            .await
            .map_err(|error| LaggingError::unavailable("accidents", error))
    }
}

/// Half-open `[Jan 1 of year, Jan 1 of year + 1)` range in UTC.
pub fn year_bounds(year: i32) -> Result<(DateTime, DateTime), LaggingError> {
    let start_of = |year: i32| {
        NaiveDate::from_ymd_opt(year, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|time| DateTime::from_millis(time.and_utc().timestamp_millis()))
            .ok_or_else(|| LaggingError::invalid("INVALID_YEAR", format!("year {year} is out of range")))
    };
    Ok((start_of(year)?, start_of(year + 1)?))
}
