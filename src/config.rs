// Runtime Configuration
// Tick rate, time scaling and conjunction screening read from the environment / .env

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{Result, TrackerError};
use crate::propagator::ConjunctionPolicy;

pub const ENV_TICK_MS: &str = "ORBITWATCH_TICK_MS";
pub const ENV_TIME_STEP: &str = "ORBITWATCH_TIME_STEP";
pub const ENV_TIME_SCALE: &str = "ORBITWATCH_TIME_SCALE";
pub const ENV_CONJUNCTION_HORIZON: &str = "ORBITWATCH_CONJUNCTION_HORIZON";
pub const ENV_CONJUNCTION_STEP: &str = "ORBITWATCH_CONJUNCTION_STEP";
pub const ENV_RUN_SECONDS: &str = "ORBITWATCH_RUN_SECONDS";

pub const MIN_TIME_SCALE: f64 = 1.0;
pub const MAX_TIME_SCALE: f64 = 1_000_000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Wall-clock interval between ticks (ms)
    pub tick_interval_ms: u64,
    /// Simulated seconds per tick before scaling
    pub time_step: f64,
    /// Speed multiplier (1.0 = real-time)
    pub time_scale: f64,
    pub conjunction: ConjunctionPolicy,
    /// How long the binary runs before stopping (s)
    pub run_seconds: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            time_step: 1.0,
            time_scale: 1.0,
            conjunction: ConjunctionPolicy::default(),
            run_seconds: 10,
        }
    }
}

impl SimulationConfig {
    /// Load `.env` if present, then read overrides from the process environment.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is fine
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup; absent keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let time_scale = parse_positive_or(&lookup, ENV_TIME_SCALE, defaults.time_scale)?;

        Ok(Self {
            tick_interval_ms: parse_or(&lookup, ENV_TICK_MS, defaults.tick_interval_ms)?,
            time_step: parse_positive_or(&lookup, ENV_TIME_STEP, defaults.time_step)?,
            time_scale: time_scale.clamp(MIN_TIME_SCALE, MAX_TIME_SCALE),
            conjunction: ConjunctionPolicy {
                horizon_s: parse_positive_or(
                    &lookup,
                    ENV_CONJUNCTION_HORIZON,
                    defaults.conjunction.horizon_s,
                )?,
                step_s: parse_positive_or(
                    &lookup,
                    ENV_CONJUNCTION_STEP,
                    defaults.conjunction.step_s,
                )?,
            },
            run_seconds: parse_or(&lookup, ENV_RUN_SECONDS, defaults.run_seconds)?,
        })
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| TrackerError::InvalidConfig {
                key: key.to_string(),
                value: raw,
            }),
        None => Ok(default),
    }
}

/// Like `parse_or`, but the value must also be finite and strictly positive.
fn parse_positive_or<F>(lookup: &F, key: &str, default: f64) -> Result<f64>
where
    F: Fn(&str) -> Option<String>,
{
    let value: f64 = parse_or(lookup, key, default)?;
    if !value.is_finite() || value <= 0.0 {
        return Err(TrackerError::InvalidConfig {
            key: key.to_string(),
            value: lookup(key).unwrap_or_else(|| value.to_string()),
        });
    }
    Ok(value)
}
