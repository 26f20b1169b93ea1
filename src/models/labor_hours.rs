use crate::error::LaggingError;

use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId},
    Collection, Database,
};
use serde::{Deserialize, Serialize};

/// One row per organization or site and year. Closing a row is a finance
/// concern; only the totals are read here.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct AnnualLaborHoursRecord {
    pub _id: ObjectId,
    pub year: i32,
    pub site_code: Option<String>,
    pub employee_hours: f64,
    pub contractor_onsite_hours: f64,
    pub contractor_offsite_hours: f64,
    pub closed: bool,
}

impl AnnualLaborHoursRecord {
    pub fn contractor_hours(&self, include_offsite: bool) -> f64 {
        if include_offsite {
            self.contractor_onsite_hours + self.contractor_offsite_hours
        } else {
            self.contractor_onsite_hours
        }
    }
    pub async fn find_by_year(
        db: &Database,
        year: i32,
    ) -> Result<Vec<AnnualLaborHoursRecord>, LaggingError> {
        let collection: Collection<AnnualLaborHoursRecord> =
            db.collection::<AnnualLaborHoursRecord>("annual-labor-hours");

        collection
            .find(doc! { "year": year }, None)
            .await
            .map_err(|error| LaggingError::unavailable("annual-labor-hours", error))?
            .try_collect()
            .await
            .map_err(|error| LaggingError::unavailable("annual-labor-hours", error))
    }
}
