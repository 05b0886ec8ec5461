// State Manager - Satellite registry and simulation loop
// Owns one propagator per tracked satellite and ticks them from a background thread

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

use crate::config::{SimulationConfig, MAX_TIME_SCALE, MIN_TIME_SCALE};
use crate::errors::{Result, TrackerError};
use crate::mock_data::MockSatellite;
use crate::propagator::{
    ConjunctionPolicy, OrbitalParameters, OrbitalPropagator, SatelliteDescriptor, SatelliteUpdate,
};
use crate::threat_alerts::{evaluate_threats, Severity, ThreatAlert};

pub const MIN_TIME_STEP: f64 = 0.001;
pub const MAX_TIME_STEP: f64 = 86400.0;

// =============================================================================
// SATELLITE REGISTRY
// =============================================================================

pub type SatelliteId = String;

#[derive(Debug, Clone, PartialEq)]
pub struct TrackedSatellite {
    pub id: SatelliteId,
    pub name: String,
    pub propagator: OrbitalPropagator,
}

/// Satellite id -> propagator. Entries are only created by `insert` and only dropped by
/// `remove`; iteration is in id order.
#[derive(Debug, Clone, Default)]
pub struct SatelliteRegistry {
    satellites: BTreeMap<SatelliteId, TrackedSatellite>,
}

impl SatelliteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fleet(fleet: &[MockSatellite]) -> Result<Self> {
        let mut registry = Self::new();
        for sat in fleet {
            registry.insert(sat.id.as_str(), sat.name.as_str(), sat.descriptor.clone())?;
        }
        Ok(registry)
    }

    pub fn insert(
        &mut self,
        id: impl Into<SatelliteId>,
        name: impl Into<String>,
        descriptor: SatelliteDescriptor,
    ) -> Result<()> {
        let id = id.into();
        if self.satellites.contains_key(&id) {
            return Err(TrackerError::DuplicateSatellite(id));
        }

        let name = name.into();
        debug!(%id, %name, orbit = descriptor.orbit.label(), "tracking satellite");
        self.satellites.insert(
            id.clone(),
            TrackedSatellite {
                id,
                name,
                propagator: OrbitalPropagator::new(descriptor),
            },
        );
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<TrackedSatellite> {
        let removed = self
            .satellites
            .remove(id)
            .ok_or_else(|| TrackerError::UnknownSatellite(id.to_string()))?;
        debug!(%id, "stopped tracking satellite");
        Ok(removed)
    }

    pub fn get(&self, id: &str) -> Option<&TrackedSatellite> {
        self.satellites.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut TrackedSatellite> {
        self.satellites.get_mut(id)
    }

    pub fn update_parameters(&mut self, id: &str, update: &SatelliteUpdate) -> Result<()> {
        let sat = self
            .satellites
            .get_mut(id)
            .ok_or_else(|| TrackerError::UnknownSatellite(id.to_string()))?;
        sat.propagator.update_parameters(update);
        debug!(%id, ?update, "satellite parameters updated");
        Ok(())
    }

    /// Advance every propagator by `dt` seconds, one after the other.
    pub fn step_all(&mut self, dt: f64) {
        for sat in self.satellites.values_mut() {
            sat.propagator.step(dt);
        }
    }

    pub fn reset_all(&mut self) {
        for sat in self.satellites.values_mut() {
            sat.propagator.reset();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedSatellite> {
        self.satellites.values()
    }

    pub fn ids(&self) -> Vec<SatelliteId> {
        self.satellites.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.satellites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.satellites.is_empty()
    }

    pub fn snapshots(&self) -> Vec<FrontendSatellite> {
        self.iter().map(FrontendSatellite::from).collect()
    }
}

// =============================================================================
// SIMULATION STATE
// =============================================================================

#[derive(Debug, Clone)]
pub struct SimulationState {
    pub registry: SatelliteRegistry,
    pub time: f64,       // Simulated seconds since start / last reset
    pub dt: f64,         // Simulated seconds per tick before scaling
    pub time_scale: f64, // Speed multiplier (1.0 = real-time)
    pub is_paused: bool,
    pub conjunction: ConjunctionPolicy,
    pub started_at: DateTime<Utc>,
    pub tick_count: u64,
    pub alerts: Vec<ThreatAlert>,
}

impl SimulationState {
    pub fn new(registry: SatelliteRegistry, config: &SimulationConfig) -> Self {
        Self {
            registry,
            time: 0.0,
            dt: config.time_step.clamp(MIN_TIME_STEP, MAX_TIME_STEP),
            time_scale: config.time_scale.clamp(MIN_TIME_SCALE, MAX_TIME_SCALE),
            is_paused: false,
            conjunction: config.conjunction,
            started_at: Utc::now(),
            tick_count: 0,
            alerts: Vec::new(),
        }
    }

    /// Advance every satellite by `dt * time_scale` and rebuild the alert list.
    /// Returns false (and does nothing) while paused.
    pub fn tick(&mut self) -> bool {
        if self.is_paused {
            return false;
        }

        let dt = self.dt * self.time_scale;
        self.registry.step_all(dt);
        self.time += dt;
        self.tick_count += 1;

        self.alerts = evaluate_threats(&self.registry, &self.conjunction, Utc::now());
        for alert in self
            .alerts
            .iter()
            .filter(|a| a.severity == Severity::Critical)
        {
            warn!(alert = %alert.id, "{}", alert.message);
        }
        trace!(
            tick = self.tick_count,
            time = self.time,
            satellites = self.registry.len(),
            alerts = self.alerts.len(),
            "simulation tick"
        );
        true
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.is_paused = paused;
    }

    /// NaN is ignored; anything else is clamped into range.
    pub fn set_time_scale(&mut self, scale: f64) {
        if scale.is_nan() {
            return;
        }
        self.time_scale = scale.clamp(MIN_TIME_SCALE, MAX_TIME_SCALE);
    }

    pub fn set_time_step(&mut self, dt: f64) {
        if dt.is_nan() {
            return;
        }
        self.dt = dt.clamp(MIN_TIME_STEP, MAX_TIME_STEP);
    }

    /// Back to time zero; tracked satellites and their parameters are kept.
    pub fn reset(&mut self) {
        self.registry.reset_all();
        self.time = 0.0;
        self.tick_count = 0;
        self.alerts.clear();
        self.started_at = Utc::now();
    }
}

// =============================================================================
// SERIALIZABLE STATE FOR FRONTEND
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontendSatellite {
    pub id: String,
    pub name: String,
    pub orbit_type: String,
    pub parameters: OrbitalParameters,
    pub is_stable: bool,
}

impl From<&TrackedSatellite> for FrontendSatellite {
    fn from(sat: &TrackedSatellite) -> Self {
        Self {
            id: sat.id.clone(),
            name: sat.name.clone(),
            orbit_type: sat.propagator.descriptor().orbit.label().to_string(),
            parameters: sat.propagator.get_orbital_parameters(),
            is_stable: sat.propagator.is_stable(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontendState {
    pub satellites: Vec<FrontendSatellite>,
    pub time: f64,
    pub is_paused: bool,
    pub time_scale: f64,
    pub tick_count: u64,
    pub started_at: DateTime<Utc>,
    pub alerts: Vec<ThreatAlert>,
}

impl SimulationState {
    pub fn to_frontend(&self) -> FrontendState {
        FrontendState {
            satellites: self.registry.snapshots(),
            time: self.time,
            is_paused: self.is_paused,
            time_scale: self.time_scale,
            tick_count: self.tick_count,
            started_at: self.started_at,
            alerts: self.alerts.clone(),
        }
    }
}

// =============================================================================
// APP STATE
// =============================================================================

pub struct AppState {
    pub simulation: Arc<RwLock<SimulationState>>,
    pub config: SimulationConfig,
}

impl AppState {
    pub fn new(registry: SatelliteRegistry, config: SimulationConfig) -> Self {
        Self {
            simulation: Arc::new(RwLock::new(SimulationState::new(registry, &config))),
            config,
        }
    }

    pub fn add_satellite(
        &self,
        id: &str,
        name: &str,
        descriptor: SatelliteDescriptor,
    ) -> Result<()> {
        self.simulation.write().registry.insert(id, name, descriptor)?;
        info!(%id, %name, "satellite added");
        Ok(())
    }

    pub fn remove_satellite(&self, id: &str) -> Result<()> {
        self.simulation.write().registry.remove(id)?;
        info!(%id, "satellite removed");
        Ok(())
    }

    pub fn update_satellite(&self, id: &str, update: &SatelliteUpdate) -> Result<()> {
        self.simulation.write().registry.update_parameters(id, update)
    }

    pub fn get_simulation_state(&self) -> FrontendState {
        self.simulation.read().to_frontend()
    }

    pub fn get_satellite(&self, id: &str) -> Option<FrontendSatellite> {
        self.simulation
            .read()
            .registry
            .get(id)
            .map(FrontendSatellite::from)
    }

    pub fn set_paused(&self, paused: bool) {
        self.simulation.write().set_paused(paused);
    }

    pub fn set_time_scale(&self, scale: f64) {
        self.simulation.write().set_time_scale(scale);
    }

    pub fn set_time_step(&self, dt: f64) {
        self.simulation.write().set_time_step(dt);
    }

    pub fn reset_simulation(&self) {
        self.simulation.write().reset();
        info!("simulation reset");
    }

    pub fn start(&self) -> Result<SimulationHandle> {
        start_simulation(self.simulation.clone(), self.config.tick_interval())
    }
}

// =============================================================================
// SIMULATION LOOP (runs in background thread)
// =============================================================================

/// Owned handle to a running simulation loop. Stopping (or dropping) it ends the loop and
/// joins the thread.
pub struct SimulationHandle {
    is_running: Arc<RwLock<bool>>,
    thread: Option<JoinHandle<()>>,
}

impl SimulationHandle {
    pub fn is_running(&self) -> bool {
        *self.is_running.read()
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        *self.is_running.write() = false;
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("simulation thread panicked");
            } else {
                info!("simulation stopped");
            }
        }
    }
}

impl Drop for SimulationHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub fn start_simulation(
    state: Arc<RwLock<SimulationState>>,
    tick_interval: Duration,
) -> Result<SimulationHandle> {
    let is_running = Arc::new(RwLock::new(true));
    let running = is_running.clone();

    let thread = thread::Builder::new()
        .name("orbitwatch-simulation".to_string())
        .spawn(move || {
            loop {
                let start = Instant::now();

                // Check if we should stop
                if !*running.read() {
                    break;
                }

                state.write().tick();

                // Sleep to maintain tick rate
                let elapsed = start.elapsed();
                if elapsed < tick_interval {
                    thread::sleep(tick_interval - elapsed);
                }
            }
        })?;

    info!(interval_ms = tick_interval.as_millis() as u64, "simulation started");
    Ok(SimulationHandle {
        is_running,
        thread: Some(thread),
    })
}

pub fn stop_simulation(handle: SimulationHandle) {
    handle.stop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagator::{OrbitFamily, Vector3};

    fn descriptor(altitude: f64) -> SatelliteDescriptor {
        SatelliteDescriptor {
            altitude,
            inclination: 51.6,
            velocity: 7.66,
            orbit: OrbitFamily::Leo {
                eccentricity: Some(0.0003),
                argument_of_periapsis: Some(0.0),
            },
        }
    }

    fn state_with(altitudes: &[(&str, f64)]) -> SimulationState {
        let mut registry = SatelliteRegistry::new();
        for (id, altitude) in altitudes {
            registry.insert(*id, *id, descriptor(*altitude)).unwrap();
        }
        SimulationState::new(registry, &SimulationConfig::default())
    }

    #[test]
    fn test_registry_insert_and_remove() {
        let mut registry = SatelliteRegistry::new();
        registry.insert("iss", "ISS", descriptor(408.0)).unwrap();
        assert_eq!(registry.len(), 1);

        let err = registry.insert("iss", "ISS again", descriptor(500.0)).unwrap_err();
        assert_eq!(err, TrackerError::DuplicateSatellite("iss".to_string()));
        assert_eq!(registry.get("iss").unwrap().name, "ISS");

        let removed = registry.remove("iss").unwrap();
        assert_eq!(removed.id, "iss");
        assert!(registry.is_empty());

        let err = registry.remove("iss").unwrap_err();
        assert_eq!(err, TrackerError::UnknownSatellite("iss".to_string()));
    }

    #[test]
    fn test_registry_update_unknown_satellite() {
        let mut registry = SatelliteRegistry::new();
        let err = registry
            .update_parameters("ghost", &SatelliteUpdate::default())
            .unwrap_err();
        assert_eq!(err, TrackerError::UnknownSatellite("ghost".to_string()));
    }

    #[test]
    fn test_step_all_is_independent_per_satellite() {
        let mut registry = SatelliteRegistry::new();
        registry.insert("b", "B", descriptor(800.0)).unwrap();
        registry.insert("a", "A", descriptor(408.0)).unwrap();
        registry.step_all(10.0);

        assert_eq!(registry.ids(), vec!["a".to_string(), "b".to_string()]);

        let mut alone = OrbitalPropagator::new(descriptor(408.0));
        alone.step(10.0);
        assert_eq!(registry.get("a").unwrap().propagator, alone);
    }

    #[test]
    fn test_tick_scales_time_and_respects_pause() {
        let mut state = state_with(&[("a", 408.0)]);
        state.set_time_step(2.0);
        state.set_time_scale(30.0);

        assert!(state.tick());
        assert_eq!(state.time, 60.0);
        assert_eq!(state.tick_count, 1);
        let sat = state.registry.get("a").unwrap();
        assert_eq!(sat.propagator.simulation_time(), 60.0);

        state.set_paused(true);
        assert!(!state.tick());
        assert_eq!(state.time, 60.0);
    }

    #[test]
    fn test_setters_clamp() {
        let mut state = state_with(&[]);
        state.set_time_scale(0.0);
        assert_eq!(state.time_scale, MIN_TIME_SCALE);
        state.set_time_scale(1e12);
        assert_eq!(state.time_scale, MAX_TIME_SCALE);
        state.set_time_step(1e9);
        assert_eq!(state.dt, MAX_TIME_STEP);

        state.set_time_scale(f64::NAN);
        assert_eq!(state.time_scale, MAX_TIME_SCALE);
        state.set_time_step(f64::NAN);
        assert_eq!(state.dt, MAX_TIME_STEP);
    }

    #[test]
    fn test_reset_zeroes_every_propagator() {
        let mut state = state_with(&[("a", 408.0), ("b", 900.0)]);
        state.tick();
        state.reset();

        assert_eq!(state.time, 0.0);
        assert_eq!(state.tick_count, 0);
        for snapshot in state.to_frontend().satellites {
            assert_eq!(snapshot.parameters.simulation_time, 0.0);
            assert_eq!(snapshot.parameters.position, Vector3::zero());
        }
    }

    #[test]
    fn test_tick_rebuilds_alerts() {
        let mut state = state_with(&[("a", 550.0), ("b", 550.0)]);
        state.tick();
        assert_eq!(state.alerts.len(), 1);

        state.registry.remove("b").unwrap();
        state.tick();
        assert!(state.alerts.is_empty());
    }

    #[test]
    fn test_frontend_state_serializes() {
        let mut state = state_with(&[("a", 408.0)]);
        state.tick();
        let value = serde_json::to_value(state.to_frontend()).unwrap();

        assert_eq!(value["satellites"][0]["orbitType"], "LEO");
        assert_eq!(value["satellites"][0]["isStable"], true);
        assert_eq!(value["tickCount"], 1);
    }

    #[test]
    fn test_simulation_handle_start_and_stop() {
        let config = SimulationConfig {
            tick_interval_ms: 5,
            ..SimulationConfig::default()
        };
        let mut registry = SatelliteRegistry::new();
        registry.insert("a", "A", descriptor(408.0)).unwrap();
        let app = AppState::new(registry, config);

        let handle = app.start().unwrap();
        assert!(handle.is_running());
        thread::sleep(Duration::from_millis(60));
        stop_simulation(handle);

        let ticks = app.get_simulation_state().tick_count;
        assert!(ticks > 0);

        // No further ticks once stopped
        thread::sleep(Duration::from_millis(30));
        assert_eq!(app.get_simulation_state().tick_count, ticks);
    }
}
