use crate::error::LaggingError;

use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, DateTime},
    Collection, Database,
};
use serde::{Deserialize, Serialize};

use super::accident::EmploymentRelation;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum VictimSeverity {
    Death,
    Serious,
    Minor,
    Other,
    HospitalTreatment,
    FirstAid,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct VictimRecord {
    pub _id: ObjectId,
    pub accident_id: ObjectId,
    pub severity: VictimSeverity,
    /// Overrides the accident's employment relation for this victim when set.
    pub employment: Option<EmploymentRelation>,
    pub absence_start: Option<DateTime>,
    pub expected_return: Option<DateTime>,
}

impl VictimRecord {
    pub async fn find_by_accident_ids(
        db: &Database,
        accident_ids: &[ObjectId],
    ) -> Result<Vec<VictimRecord>, LaggingError> {
        if accident_ids.is_empty() {
            return Ok(Vec::new());
        }

        let collection: Collection<VictimRecord> =
            db.collection::<VictimRecord>("accident-victims");

        collection
            .find(doc! { "accident_id": { "$in": accident_ids.to_vec() } }, None)
            .await
            .map_err(|error| LaggingError::unavailable("accident-victims", error))?
            .try_collect()
            .await
            .map_err(|error| LaggingError::unavailable("accident-victims", error))
    }
}
