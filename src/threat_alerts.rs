// Threat Alerts
// Rebuilt from scratch on every tick: sampled conjunctions and unstable orbits

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::propagator::{assess_collision_risk, ConjunctionPolicy, RiskTier};
use crate::state_manager::SatelliteRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl From<RiskTier> for Severity {
    fn from(tier: RiskTier) -> Self {
        match tier {
            RiskTier::Critical | RiskTier::High => Severity::Critical,
            RiskTier::Moderate => Severity::Warning,
            RiskTier::Low | RiskTier::Negligible => Severity::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ThreatKind {
    #[serde(rename_all = "camelCase")]
    Conjunction {
        tier: RiskTier,
        min_distance_km: f64,
        time_of_closest_approach_s: f64,
    },
    #[serde(rename_all = "camelCase")]
    UnstableOrbit { altitude: f64, eccentricity: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatAlert {
    pub id: String,
    pub severity: Severity,
    pub satellites: Vec<String>,
    pub kind: ThreatKind,
    pub message: String,
    pub issued_at: DateTime<Utc>,
}

/// Screen every pair of tracked satellites and every individual orbit.
/// Result is ordered by descending severity, then by alert id.
pub fn evaluate_threats(
    registry: &SatelliteRegistry,
    policy: &ConjunctionPolicy,
    now: DateTime<Utc>,
) -> Vec<ThreatAlert> {
    let tracked: Vec<_> = registry.iter().collect();
    let mut alerts = Vec::new();

    for (i, first) in tracked.iter().enumerate() {
        for second in &tracked[i + 1..] {
            let assessment = assess_collision_risk(&first.propagator, &second.propagator, policy);
            if assessment.tier == RiskTier::Negligible {
                continue;
            }

            alerts.push(ThreatAlert {
                id: format!("conjunction:{}:{}", first.id, second.id),
                severity: assessment.tier.into(),
                satellites: vec![first.id.clone(), second.id.clone()],
                kind: ThreatKind::Conjunction {
                    tier: assessment.tier,
                    min_distance_km: assessment.min_distance_km,
                    time_of_closest_approach_s: assessment.time_of_closest_approach_s,
                },
                message: format!(
                    "{} and {} pass within {:.2} km in {:.0} s",
                    first.name,
                    second.name,
                    assessment.min_distance_km,
                    assessment.time_of_closest_approach_s
                ),
                issued_at: now,
            });
        }
    }

    for sat in &tracked {
        if sat.propagator.is_stable() {
            continue;
        }
        let params = sat.propagator.get_orbital_parameters();
        alerts.push(ThreatAlert {
            id: format!("unstable:{}", sat.id),
            severity: Severity::Warning,
            satellites: vec![sat.id.clone()],
            kind: ThreatKind::UnstableOrbit {
                altitude: params.altitude,
                eccentricity: params.eccentricity,
            },
            message: format!(
                "{} orbit outside stable band (altitude {:.0} km, e = {:.4})",
                sat.name, params.altitude, params.eccentricity
            ),
            issued_at: now,
        });
    }

    alerts.sort_by(|a, b| b.severity.cmp(&a.severity).then_with(|| a.id.cmp(&b.id)));
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagator::{OrbitFamily, SatelliteDescriptor};

    fn descriptor(altitude: f64, inclination: f64) -> SatelliteDescriptor {
        SatelliteDescriptor {
            altitude,
            inclination,
            velocity: 7.6,
            orbit: OrbitFamily::Leo {
                eccentricity: Some(0.0),
                argument_of_periapsis: Some(0.0),
            },
        }
    }

    #[test]
    fn test_quiet_sky_has_no_alerts() {
        let mut registry = SatelliteRegistry::new();
        registry.insert("a", "Alpha", descriptor(400.0, 51.6)).unwrap();
        registry.insert("b", "Bravo", descriptor(1200.0, 51.6)).unwrap();

        let alerts = evaluate_threats(&registry, &ConjunctionPolicy::default(), Utc::now());
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_co_orbital_pair_raises_critical_conjunction() {
        let mut registry = SatelliteRegistry::new();
        registry.insert("a", "Alpha", descriptor(550.0, 53.0)).unwrap();
        registry.insert("b", "Bravo", descriptor(550.0, 53.0)).unwrap();
        registry.insert("c", "Charlie", descriptor(1500.0, 10.0)).unwrap();

        let now = Utc::now();
        let alerts = evaluate_threats(&registry, &ConjunctionPolicy::default(), now);

        assert_eq!(alerts.len(), 1);
        let alert = &alerts[0];
        assert_eq!(alert.id, "conjunction:a:b");
        assert_eq!(alert.severity, Severity::Critical);
        assert_eq!(alert.satellites, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(alert.issued_at, now);
        assert!(matches!(
            alert.kind,
            ThreatKind::Conjunction {
                tier: RiskTier::Critical,
                ..
            }
        ));
    }

    #[test]
    fn test_unstable_orbits_are_flagged_after_conjunctions() {
        let mut registry = SatelliteRegistry::new();
        registry.insert("a", "Alpha", descriptor(550.0, 53.0)).unwrap();
        registry.insert("b", "Bravo", descriptor(550.0, 53.0)).unwrap();
        registry.insert("low", "Sinker", descriptor(120.0, 20.0)).unwrap();

        let alerts = evaluate_threats(&registry, &ConjunctionPolicy::default(), Utc::now());

        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(alerts[1].id, "unstable:low");
        assert_eq!(alerts[1].severity, Severity::Warning);
    }

    #[test]
    fn test_severity_mapping() {
        assert_eq!(Severity::from(RiskTier::High), Severity::Critical);
        assert_eq!(Severity::from(RiskTier::Moderate), Severity::Warning);
        assert_eq!(Severity::from(RiskTier::Low), Severity::Info);
    }
}
