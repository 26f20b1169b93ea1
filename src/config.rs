use std::{str::FromStr, time::Duration};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has an invalid value `{value}`")]
    InvalidValue { name: &'static str, value: String },
}

/// Constants and policies used when turning records into indicators.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPolicy {
    /// Hours normalization for the frequency rates (per 200,000 hours by default).
    pub rate_constant: f64,
    pub severity_constant: f64,
    /// Day-equivalent assigned to a fatality.
    pub death_lost_days: u64,
    pub indirect_damage_multiplier: f64,
    /// Cap on the running estimate used when absence dates are missing.
    pub lost_day_cap: Option<u64>,
    pub include_offsite_contractor_hours: bool,
}

impl Default for IndicatorPolicy {
    fn default() -> Self {
        IndicatorPolicy {
            rate_constant: 200_000.0,
            severity_constant: 1_000.0,
            death_lost_days: 7_500,
            indirect_damage_multiplier: 4.0,
            lost_day_cap: Some(180),
            include_offsite_contractor_hours: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub policy: IndicatorPolicy,
    pub cache_ttl: Duration,
    pub fetch_timeout: Duration,
    pub max_chart_years: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            policy: IndicatorPolicy::default(),
            cache_ttl: Duration::from_secs(300),
            fetch_timeout: Duration::from_secs(10),
            max_chart_years: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub host: String,
    pub port: u16,
    pub engine: EngineConfig,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = EngineConfig::default();

        let lost_day_cap = match lookup("LAGGING_LOST_DAY_CAP") {
            Some(value) if value.trim().eq_ignore_ascii_case("none") => None,
            Some(value) => Some(parse_value("LAGGING_LOST_DAY_CAP", &value)?),
            None => defaults.policy.lost_day_cap,
        };

        let policy = IndicatorPolicy {
            rate_constant: parse_or(
                &lookup,
                "LAGGING_RATE_CONSTANT",
                defaults.policy.rate_constant,
            )?,
            severity_constant: parse_or(
                &lookup,
                "LAGGING_SEVERITY_CONSTANT",
                defaults.policy.severity_constant,
            )?,
            death_lost_days: parse_or(
                &lookup,
                "LAGGING_DEATH_LOST_DAYS",
                defaults.policy.death_lost_days,
            )?,
            indirect_damage_multiplier: parse_or(
                &lookup,
                "LAGGING_INDIRECT_DAMAGE_MULTIPLIER",
                defaults.policy.indirect_damage_multiplier,
            )?,
            lost_day_cap,
            include_offsite_contractor_hours: parse_or(
                &lookup,
                "LAGGING_INCLUDE_OFFSITE_CONTRACTOR_HOURS",
                defaults.policy.include_offsite_contractor_hours,
            )?,
        };

        for (name, value) in [
            ("LAGGING_RATE_CONSTANT", policy.rate_constant),
            ("LAGGING_SEVERITY_CONSTANT", policy.severity_constant),
            (
                "LAGGING_INDIRECT_DAMAGE_MULTIPLIER",
                policy.indirect_damage_multiplier,
            ),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    name,
                    value: value.to_string(),
                });
            }
        }

        let engine = EngineConfig {
            policy,
            cache_ttl: Duration::from_secs(parse_or(
                &lookup,
                "LAGGING_CACHE_TTL_SECS",
                defaults.cache_ttl.as_secs(),
            )?),
            fetch_timeout: Duration::from_secs(parse_or(
                &lookup,
                "LAGGING_FETCH_TIMEOUT_SECS",
                defaults.fetch_timeout.as_secs(),
            )?),
            max_chart_years: parse_or(
                &lookup,
                "LAGGING_MAX_CHART_YEARS",
                defaults.max_chart_years,
            )?,
        };

        Ok(Config {
            mongodb_uri: lookup("MONGODB_URI")
                .unwrap_or_else(|| String::from("mongodb://localhost:27017")),
            mongodb_database: lookup("MONGODB_DATABASE").unwrap_or_else(|| String::from("safety")),
            host: lookup("SERVER_HOST").unwrap_or_else(|| String::from("127.0.0.1")),
            port: parse_or(&lookup, "SERVER_PORT", 8000)?,
            engine,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => parse_value(name, &value),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            name,
            value: value.to_string(),
        })
}
