use std::{
    collections::{BTreeMap, HashSet},
    future::Future,
    sync::Arc,
};

use chrono::{DateTime, Utc};
use futures::{future::try_join_all, try_join};
use mongodb::bson::oid::ObjectId;
use tracing::{debug, error, info, instrument};

use crate::{
    config::EngineConfig,
    error::LaggingError,
    models::{
        accident::AccidentRecord,
        investigation::InvestigationStatus,
        labor_hours::AnnualLaborHoursRecord,
        property_damage::PropertyDamageRecord,
        summary::LaggingSummary,
        victim::VictimRecord,
    },
};

use super::{
    cache::{CacheKey, ResultCache},
    calculator,
    classifier::classify,
    source::LaggingSource,
};

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

const MAX_YEAR: i64 = 9999;

/// Parses a year given by a client; only `1..=9999` is accepted.
pub fn parse_year(raw: &str) -> Result<i32, LaggingError> {
    match raw.trim().parse::<i64>() {
        Ok(year) if (1..=MAX_YEAR).contains(&year) => Ok(year as i32),
        _ => Err(LaggingError::invalid(
            "INVALID_YEAR",
            format!("`{raw}` is not a positive year"),
        )),
    }
}

pub struct LaggingEngine {
    source: Arc<dyn LaggingSource>,
    cache: ResultCache<LaggingSummary>,
    config: EngineConfig,
    clock: Clock,
}

impl LaggingEngine {
    pub fn new(source: Arc<dyn LaggingSource>, config: EngineConfig) -> Self {
        LaggingEngine {
            source,
            cache: ResultCache::new(config.cache_ttl),
            config,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[instrument(skip(self))]
    pub async fn summary(&self, year: i32) -> Result<LaggingSummary, LaggingError> {
        if !(1..=MAX_YEAR).contains(&i64::from(year)) {
            return Err(LaggingError::invalid(
                "INVALID_YEAR",
                format!("{year} is not a positive year"),
            ));
        }

        let key = CacheKey::new("summary", &year);
        if let Some(summary) = self.cache.get(&key) {
            debug!(year, "Summary cache hit");
            return Ok(summary);
        }
        debug!(year, "Summary cache miss");

        let generation = self.cache.generation();
        let summary = self.compute(year).await?;
        if self
            .cache
            .set_if_current(key, summary.clone(), self.cache.ttl(), generation)
        {
            debug!(year, entries = self.cache.len(), "Summary cached");
        } else {
            debug!(year, "Cache cleared during computation, summary not cached");
        }
        Ok(summary)
    }

    /// One summary per year of the inclusive range, each taken from [`Self::summary`].
    #[instrument(skip(self))]
    pub async fn chart_data(
        &self,
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<LaggingSummary>, LaggingError> {
        if start_year > end_year {
            return Err(LaggingError::invalid(
                "INVALID_RANGE",
                format!("startYear {start_year} is after endYear {end_year}"),
            ));
        }
        let span = i64::from(end_year) - i64::from(start_year) + 1;
        if span > i64::from(self.config.max_chart_years) {
            return Err(LaggingError::invalid(
                "INVALID_RANGE",
                format!(
                    "range spans {span} years, at most {} allowed",
                    self.config.max_chart_years
                ),
            ));
        }

        try_join_all((start_year..=end_year).map(|year| self.summary(year))).await
    }

    /// Maps each requested id to whether a completed investigation exists.
    /// Ids that are not valid identifiers map to `false`.
    pub async fn investigation_status(
        &self,
        accident_ids: &[String],
    ) -> Result<BTreeMap<String, bool>, LaggingError> {
        let parsed: Vec<(String, Option<ObjectId>)> = accident_ids
            .iter()
            .map(|id| (id.clone(), id.trim().parse::<ObjectId>().ok()))
            .collect();

        let mut lookup: Vec<ObjectId> = parsed.iter().filter_map(|(_, id)| *id).collect();
        lookup.sort();
        lookup.dedup();

        let records = self
            .bounded(
                "fetch_investigations",
                self.source.fetch_investigations(&lookup),
            )
            .await?;
        let completed: HashSet<ObjectId> = records
            .iter()
            .filter(|record| record.status == InvestigationStatus::Completed)
            .map(|record| record.accident_id)
            .collect();

        Ok(parsed
            .into_iter()
            .map(|(raw, id)| {
                let done = id.map(|id| completed.contains(&id)).unwrap_or(false);
                (raw, done)
            })
            .collect())
    }

    pub fn clear_cache(&self) -> usize {
        let cleared = self.cache.clear();
        info!(cleared, "Lagging indicator cache cleared");
        cleared
    }

    async fn compute(&self, year: i32) -> Result<LaggingSummary, LaggingError> {
        let (accidents, labor_hours) = try_join!(
            self.bounded("fetch_accidents", self.source.fetch_accidents(year)),
            self.bounded("fetch_labor_hours", self.source.fetch_labor_hours(year)),
        )?;

        let accident_ids: Vec<ObjectId> = accidents.iter().map(|accident| accident._id).collect();
        let (victims, damages) = try_join!(
            self.bounded("fetch_victims", self.source.fetch_victims(&accident_ids)),
            self.bounded(
                "fetch_property_damage",
                self.source.fetch_property_damage(&accident_ids)
            ),
        )?;

        debug!(
            year,
            accidents = accidents.len(),
            victims = victims.len(),
            damages = damages.len(),
            labor_rows = labor_hours.len(),
            "Fetched lagging indicator sources"
        );

        Ok(self.assemble(year, &accidents, &victims, &damages, &labor_hours))
    }

    fn assemble(
        &self,
        year: i32,
        accidents: &[AccidentRecord],
        victims: &[VictimRecord],
        damages: &[PropertyDamageRecord],
        labor_hours: &[AnnualLaborHoursRecord],
    ) -> LaggingSummary {
        let policy = &self.config.policy;
        let tally = classify(accidents, victims, damages, (self.clock)(), policy);
        let (hours, labor_hours_closed) = calculator::labor_hours(labor_hours, policy);
        let rates = calculator::derive_rates(
            &tally.lost_time_accidents,
            &tally.recordable_accidents,
            &tally.lost_days,
            &hours,
            policy,
        );

        LaggingSummary {
            year,
            accidents: tally.accidents,
            accidents_by_category: tally.by_category,
            accidents_by_site: tally.by_site,
            lost_time_accidents: tally.lost_time_accidents,
            recordable_accidents: tally.recordable_accidents,
            victims: tally.victims,
            property_damage: calculator::property_damage(tally.direct_damage, policy),
            labor_hours: hours,
            labor_hours_closed,
            lost_days: tally.lost_days,
            lost_time_injury_rate: rates.lost_time_injury_rate,
            total_recordable_injury_rate: rates.total_recordable_injury_rate,
            severity_rate: rates.severity_rate,
        }
    }

    async fn bounded<T, F>(&self, operation: &'static str, future: F) -> Result<T, LaggingError>
    where
        F: Future<Output = Result<T, LaggingError>>,
    {
        match tokio::time::timeout(self.config.fetch_timeout, future).await {
            Ok(Ok(records)) => Ok(records),
            Ok(Err(failure)) => {
                error!(operation, error = %failure, "Lagging source fetch failed");
                Err(failure)
            }
            Err(_) => {
                error!(operation, "Lagging source fetch timed out");
                Err(LaggingError::SourceTimeout {
                    operation,
                    seconds: self.config.fetch_timeout.as_secs(),
                })
            }
        }
    }
}
