use std::thread;
use std::time::Duration;

use orbitwatch::config::SimulationConfig;
use orbitwatch::errors::TrackerError;
use orbitwatch::mock_data::{default_fleet, generate_constellation};
use orbitwatch::propagator::{
    OrbitFamily, OrbitalPropagator, SatelliteDescriptor, SatelliteUpdate, Vector3,
};
use orbitwatch::state_manager::{AppState, SatelliteRegistry};
use orbitwatch::threat_alerts::Severity;

fn iss() -> SatelliteDescriptor {
    SatelliteDescriptor {
        altitude: 408.0,
        inclination: 51.6,
        velocity: 7.66,
        orbit: OrbitFamily::Leo {
            eccentricity: Some(0.0003),
            argument_of_periapsis: Some(0.0),
        },
    }
}

#[test]
fn default_fleet_propagates_near_its_shells() {
    let fleet = default_fleet().unwrap();
    let mut registry = SatelliteRegistry::from_fleet(&fleet).unwrap();
    registry.step_all(600.0);

    for sat in registry.iter() {
        let a = sat.propagator.elements().semi_major_axis;
        let e = sat.propagator.elements().eccentricity;
        let r = sat.propagator.position().magnitude();
        assert!((r - a).abs() <= a * e + 1e-6, "{}: r={r} a={a}", sat.id);
    }
}

#[test]
fn app_state_add_update_remove() {
    let app = AppState::new(SatelliteRegistry::new(), SimulationConfig::default());
    app.add_satellite("iss", "ISS", iss()).unwrap();
    assert_eq!(
        app.add_satellite("iss", "ISS", iss()).unwrap_err(),
        TrackerError::DuplicateSatellite("iss".to_string())
    );

    app.simulation.write().tick();
    let before = app.get_satellite("iss").unwrap();
    assert_eq!(before.parameters.simulation_time, 1.0);

    app.update_satellite(
        "iss",
        &SatelliteUpdate {
            altitude: Some(100.0),
            ..Default::default()
        },
    )
    .unwrap();

    let after = app.get_satellite("iss").unwrap();
    assert_eq!(after.parameters.simulation_time, 1.0);
    assert_eq!(after.parameters.position, before.parameters.position);
    assert!(!after.is_stable);

    app.simulation.write().tick();
    let alerts = app.get_simulation_state().alerts;
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, Severity::Warning);

    app.remove_satellite("iss").unwrap();
    assert!(app.get_satellite("iss").is_none());
    assert_eq!(
        app.remove_satellite("iss").unwrap_err(),
        TrackerError::UnknownSatellite("iss".to_string())
    );
}

#[test]
fn running_loop_can_be_paused_reset_and_stopped() {
    let config = SimulationConfig {
        tick_interval_ms: 5,
        time_scale: 10.0,
        ..SimulationConfig::default()
    };
    let registry = SatelliteRegistry::from_fleet(&generate_constellation(4, 42)).unwrap();
    let app = AppState::new(registry, config);

    let handle = app.start().unwrap();
    thread::sleep(Duration::from_millis(50));

    app.set_paused(true);
    // Let any in-flight tick finish
    thread::sleep(Duration::from_millis(20));
    let paused = app.get_simulation_state();
    assert!(paused.tick_count > 0);
    assert!((paused.time - paused.tick_count as f64 * 10.0).abs() < 1e-9);

    thread::sleep(Duration::from_millis(30));
    assert_eq!(app.get_simulation_state().tick_count, paused.tick_count);

    app.reset_simulation();
    handle.stop();

    let state = app.get_simulation_state();
    assert_eq!(state.time, 0.0);
    for sat in state.satellites {
        assert_eq!(sat.parameters.position, Vector3::zero());
    }
}

#[test]
fn quarter_period_end_to_end() {
    let mut propagator = OrbitalPropagator::new(iss());
    let position = propagator.step(5400.0);
    let params = propagator.get_orbital_parameters();

    assert!((position.magnitude() - 6779.0).abs() < 5.0);
    assert_eq!(params.simulation_time, 5400.0);
    assert!((params.period * 60.0 - 92.7).abs() < 0.927);
    assert!((params.inclination - 51.6).abs() < 1e-9);
}
