use crate::error::LaggingError;

use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId},
    Collection, Database,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PropertyDamageKind {
    Equipment,
    Facility,
    Vehicle,
    Material,
    Other,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PropertyDamageRecord {
    pub _id: ObjectId,
    pub accident_id: ObjectId,
    pub kind: PropertyDamageKind,
    /// Estimated direct cost, in the organization's reporting currency.
    pub direct_cost: f64,
}

impl PropertyDamageRecord {
    pub async fn find_by_accident_ids(
        db: &Database,
        accident_ids: &[ObjectId],
    ) -> Result<Vec<PropertyDamageRecord>, LaggingError> {
        if accident_ids.is_empty() {
            return Ok(Vec::new());
        }

        let collection: Collection<PropertyDamageRecord> =
            db.collection::<PropertyDamageRecord>("accident-property-damages");

        collection
            .find(doc! { "accident_id": { "$in": accident_ids.to_vec() } }, None)
            .await
            .map_err(|error| LaggingError::unavailable("accident-property-damages", error))?
            .try_collect()
            .await
            .map_err(|error| LaggingError::unavailable("accident-property-damages", error))
    }
}
