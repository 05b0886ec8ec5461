// Mock Satellite Data
// Built-in fleet used when no live catalogue is wired in, plus a seeded synthetic constellation

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::propagator::{circular_speed, OrbitFamily, SatelliteDescriptor};

const DEFAULT_FLEET_JSON: &str = r#"[
    {
        "id": "25544",
        "name": "ISS (ZARYA)",
        "altitude": 408,
        "inclination": 51.6,
        "velocity": 7.66,
        "orbitType": "LEO",
        "eccentricity": 0.0003,
        "argumentOfPeriapsis": 0
    },
    {
        "id": "20580",
        "name": "HST",
        "altitude": 540,
        "inclination": 28.5,
        "velocity": 7.59,
        "orbitType": "LEO",
        "eccentricity": 0.0002,
        "argumentOfPeriapsis": 90
    },
    {
        "id": "43013",
        "name": "NOAA 20",
        "altitude": 825,
        "inclination": 98.7,
        "velocity": 7.43,
        "orbitType": "Polar",
        "raan": 120,
        "meanAnomaly": 45
    },
    {
        "id": "39084",
        "name": "LANDSAT 8",
        "altitude": 705,
        "inclination": 98.2,
        "velocity": 7.5,
        "orbitType": "Polar",
        "raan": 300
    },
    {
        "id": "28474",
        "name": "GPS BIIR-13",
        "altitude": 20180,
        "inclination": 55.0,
        "velocity": 3.87,
        "orbitType": "Generic"
    }
]"#;

// =============================================================================
// MOCK RECORDS
// =============================================================================

/// A catalogue entry: identity plus the descriptor fed to the propagator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockSatellite {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub descriptor: SatelliteDescriptor,
}

pub fn default_fleet() -> Result<Vec<MockSatellite>> {
    parse_fleet(DEFAULT_FLEET_JSON)
}

/// Decode a JSON array of catalogue entries
pub fn parse_fleet(json: &str) -> Result<Vec<MockSatellite>> {
    Ok(serde_json::from_str(json)?)
}

/// Deterministic synthetic LEO/Polar fleet for load and conjunction testing
pub fn generate_constellation(count: usize, seed: u64) -> Vec<MockSatellite> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..count)
        .map(|i| {
            let altitude: f64 = rng.gen_range(300.0..1200.0);
            let orbit = if rng.gen_bool(0.5) {
                OrbitFamily::Leo {
                    eccentricity: Some(rng.gen_range(0.0..0.02)),
                    argument_of_periapsis: Some(rng.gen_range(0.0..360.0)),
                }
            } else {
                OrbitFamily::Polar {
                    raan: Some(rng.gen_range(0.0..360.0)),
                    mean_anomaly: Some(rng.gen_range(0.0..360.0)),
                }
            };
            let inclination = match orbit {
                OrbitFamily::Polar { .. } => rng.gen_range(85.0..100.0),
                _ => rng.gen_range(0.0..65.0),
            };

            MockSatellite {
                id: format!("SYN-{:04}", i + 1),
                name: format!("Synthetic {}", i + 1),
                descriptor: SatelliteDescriptor {
                    altitude,
                    inclination,
                    velocity: circular_speed(altitude),
                    orbit,
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TrackerError;

    #[test]
    fn test_default_fleet_decodes() {
        let fleet = default_fleet().unwrap();
        assert_eq!(fleet.len(), 5);

        let iss = &fleet[0];
        assert_eq!(iss.id, "25544");
        assert_eq!(iss.descriptor.altitude, 408.0);
        assert_eq!(iss.descriptor.orbit.label(), "LEO");

        let landsat = fleet.iter().find(|s| s.id == "39084").unwrap();
        assert_eq!(
            landsat.descriptor.orbit,
            OrbitFamily::Polar {
                raan: Some(300.0),
                mean_anomaly: None,
            }
        );
    }

    #[test]
    fn test_bad_fleet_is_an_error() {
        let err = parse_fleet(r#"[{"id": "1"}]"#).unwrap_err();
        assert!(matches!(err, TrackerError::MockData(_)));
    }

    #[test]
    fn test_constellation_is_deterministic() {
        let a = generate_constellation(12, 7);
        let b = generate_constellation(12, 7);
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
        assert_eq!(a[0].id, "SYN-0001");

        for sat in &a {
            assert!((300.0..1200.0).contains(&sat.descriptor.altitude));
            assert!(sat.descriptor.velocity > 7.0);
        }
    }
}
