// OrbitWatch - Satellite Tracking & Conjunction Alert Simulator
// Library root: wires the propagator, registry, alerts and configuration together

pub mod config;
pub mod errors;
pub mod mock_data;
pub mod propagator;
pub mod state_manager;
pub mod threat_alerts;

use std::thread;
use std::time::{Duration, Instant};

use tracing::info;

use config::SimulationConfig;
use errors::Result;
use state_manager::{stop_simulation, AppState, SatelliteRegistry};

/// Headless dashboard: track the built-in fleet, log snapshots at every tick interval
/// for `run_seconds`, then stop the simulation loop.
pub fn run() -> Result<()> {
    let config = SimulationConfig::from_env()?;
    let fleet = mock_data::default_fleet()?;
    let registry = SatelliteRegistry::from_fleet(&fleet)?;
    info!(satellites = registry.len(), ?config, "starting orbitwatch");

    let app_state = AppState::new(registry, config.clone());
    let handle = app_state.start()?;

    let deadline = Instant::now() + Duration::from_secs(config.run_seconds);
    while Instant::now() < deadline {
        thread::sleep(config.tick_interval());

        let snapshot = app_state.get_simulation_state();
        for sat in &snapshot.satellites {
            let p = sat.parameters.position;
            info!(
                id = %sat.id,
                name = %sat.name,
                t = sat.parameters.simulation_time,
                x = p.x,
                y = p.y,
                z = p.z,
                speed = sat.parameters.velocity.magnitude(),
                stable = sat.is_stable,
                "position"
            );
        }
        for alert in &snapshot.alerts {
            info!(severity = ?alert.severity, "{}", alert.message);
        }
    }

    stop_simulation(handle);
    Ok(())
}
