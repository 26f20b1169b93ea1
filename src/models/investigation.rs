use crate::error::LaggingError;

use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId},
    Collection, Database,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvestigationStatus {
    Draft,
    InProgress,
    Completed,
}

/// Follow-up investigation filed against an accident.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct InvestigationRecord {
    pub _id: ObjectId,
    pub accident_id: ObjectId,
    pub status: InvestigationStatus,
}

impl InvestigationRecord {
    pub async fn find_by_accident_ids(
        db: &Database,
        accident_ids: &[ObjectId],
    ) -> Result<Vec<InvestigationRecord>, LaggingError> {
        if accident_ids.is_empty() {
            return Ok(Vec::new());
        }

        let collection: Collection<InvestigationRecord> =
            db.collection::<InvestigationRecord>("accident-investigations");

        collection
            .find(doc! { "accident_id": { "$in": accident_ids.to_vec() } }, None)
            .await
            .map_err(|error| LaggingError::unavailable("accident-investigations", error))?
            .try_collect()
            .await
            .map_err(|error| LaggingError::unavailable("accident-investigations", error))
    }
}
