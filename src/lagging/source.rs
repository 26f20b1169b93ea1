use async_trait::async_trait;
use mongodb::{bson::oid::ObjectId, Database};

use crate::{
    error::LaggingError,
    models::{
        accident::AccidentRecord, investigation::InvestigationRecord,
        labor_hours::AnnualLaborHoursRecord, property_damage::PropertyDamageRecord,
        victim::VictimRecord,
    },
};

/// Read-only access to the records owned by the reporting workflow.
#[async_trait]
pub trait LaggingSource: Send + Sync {
    /// Accidents whose `occurred_at` falls inside the calendar year.
    async fn fetch_accidents(&self, year: i32) -> Result<Vec<AccidentRecord>, LaggingError>;
    async fn fetch_victims(
        &self,
        accident_ids: &[ObjectId],
    ) -> Result<Vec<VictimRecord>, LaggingError>;
    async fn fetch_property_damage(
        &self,
        accident_ids: &[ObjectId],
    ) -> Result<Vec<PropertyDamageRecord>, LaggingError>;
    async fn fetch_labor_hours(
        &self,
        year: i32,
    ) -> Result<Vec<AnnualLaborHoursRecord>, LaggingError>;
    async fn fetch_investigations(
        &self,
        accident_ids: &[ObjectId],
    ) -> Result<Vec<InvestigationRecord>, LaggingError>;
}

pub struct MongoSource {
    db: Database,
}

impl MongoSource {
    pub fn new(db: Database) -> Self {
        MongoSource { db }
    }
}

#[async_trait]
impl LaggingSource for MongoSource {
    async fn fetch_accidents(&self, year: i32) -> Result<Vec<AccidentRecord>, LaggingError> {
        AccidentRecord::find_by_year(&self.db, year).await
    }
    async fn fetch_victims(
        &self,
        accident_ids: &[ObjectId],
    ) -> Result<Vec<VictimRecord>, LaggingError> {
        VictimRecord::find_by_accident_ids(&self.db, accident_ids).await
    }
    async fn fetch_property_damage(
        &self,
        accident_ids: &[ObjectId],
    ) -> Result<Vec<PropertyDamageRecord>, LaggingError> {
        PropertyDamageRecord::find_by_accident_ids(&self.db, accident_ids).await
    }
    async fn fetch_labor_hours(
        &self,
        year: i32,
    ) -> Result<Vec<AnnualLaborHoursRecord>, LaggingError> {
        AnnualLaborHoursRecord::find_by_year(&self.db, year).await
    }
    async fn fetch_investigations(
        &self,
        accident_ids: &[ObjectId],
    ) -> Result<Vec<InvestigationRecord>, LaggingError> {
        InvestigationRecord::find_by_accident_ids(&self.db, accident_ids).await
    }
}

#[cfg(test)]
pub mod memory {
    use std::{
        sync::atomic::{AtomicBool, AtomicUsize, Ordering},
        time::Duration,
    };

    use super::*;

    /// Snapshot-backed source for tests.
    #[derive(Default)]
    pub struct MemorySource {
        pub accidents: Vec<AccidentRecord>,
        pub victims: Vec<VictimRecord>,
        pub damages: Vec<PropertyDamageRecord>,
        pub labor_hours: Vec<AnnualLaborHoursRecord>,
        pub investigations: Vec<InvestigationRecord>,
        pub offline: AtomicBool,
        pub delay: Option<Duration>,
        pub accident_fetches: AtomicUsize,
    }

    impl MemorySource {
        async fn guard(&self, collection: &'static str) -> Result<(), LaggingError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.offline.load(Ordering::SeqCst) {
                return Err(LaggingError::unavailable(collection, "connection refused"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl LaggingSource for MemorySource {
        async fn fetch_accidents(&self, year: i32) -> Result<Vec<AccidentRecord>, LaggingError> {
            self.accident_fetches.fetch_add(1, Ordering::SeqCst);
            self.guard("accidents").await?;
            Ok(self
                .accidents
                .iter()
                .filter(|accident| accident.occurred_year() == Some(year))
                .cloned()
                .collect())
        }
        async fn fetch_victims(
            &self,
            accident_ids: &[ObjectId],
        ) -> Result<Vec<VictimRecord>, LaggingError> {
            self.guard("accident-victims").await?;
            Ok(self
                .victims
                .iter()
                .filter(|victim| accident_ids.contains(&victim.accident_id))
                .cloned()
                .collect())
        }
        async fn fetch_property_damage(
            &self,
            accident_ids: &[ObjectId],
        ) -> Result<Vec<PropertyDamageRecord>, LaggingError> {
            self.guard("accident-property-damages").await?;
            Ok(self
                .damages
                .iter()
                .filter(|damage| accident_ids.contains(&damage.accident_id))
                .cloned()
                .collect())
        }
        async fn fetch_labor_hours(
            &self,
            year: i32,
        ) -> Result<Vec<AnnualLaborHoursRecord>, LaggingError> {
            self.guard("annual-labor-hours").await?;
            Ok(self
                .labor_hours
                .iter()
                .filter(|record| record.year == year)
                .cloned()
                .collect())
        }
        async fn fetch_investigations(
            &self,
            accident_ids: &[ObjectId],
        ) -> Result<Vec<InvestigationRecord>, LaggingError> {
            self.guard("accident-investigations").await?;
            Ok(self
                .investigations
                .iter()
                .filter(|record| accident_ids.contains(&record.accident_id))
                .cloned()
                .collect())
        }
    }
}
