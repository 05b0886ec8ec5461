// Orbital Propagator - Two-body Keplerian satellite propagation
// Orbital elements, Kepler solver, perifocal-to-ECI transform, stability and conjunction checks

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

// =============================================================================
// PHYSICAL CONSTANTS (km, s)
// =============================================================================

/// Mean Earth radius (km)
pub const EARTH_RADIUS: f64 = 6371.0;

/// Earth's gravitational parameter μ = G * M_earth (km³/s²)
pub const MU_EARTH: f64 = 3.986004418e5;

/// Eccentricity used when a descriptor does not carry one
pub const DEFAULT_ECCENTRICITY: f64 = 0.01;

/// Simulated seconds advanced by `step_once`
pub const DEFAULT_STEP_SECONDS: f64 = 1.0;

/// Newton-Raphson bound for Kepler's equation
pub const KEPLER_MAX_ITERATIONS: usize = 10;

/// Residual |E - e*sin(E) - M| below which the solver stops early
pub const KEPLER_TOLERANCE: f64 = 1e-6;

/// Upper bound on conjunction samples per satellite pair
pub const MAX_CONJUNCTION_SAMPLES: usize = 10_000;

/// Altitude band (km) considered a stable orbit for display purposes
pub const STABLE_ALTITUDE_MIN: f64 = 160.0;
pub const STABLE_ALTITUDE_MAX: f64 = 2000.0;

// =============================================================================
// 3D VECTOR MATHEMATICS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag > 1e-15 {
            Self {
                x: self.x / mag,
                y: self.y / mag,
                z: self.z / mag,
            }
        } else {
            Self::zero()
        }
    }

    pub fn scale(&self, s: f64) -> Self {
        Self {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }

    pub fn sub(&self, other: &Vector3) -> Vector3 {
        Vector3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }

    pub fn distance(&self, other: &Vector3) -> f64 {
        self.sub(other).magnitude()
    }
}

// =============================================================================
// SATELLITE DESCRIPTOR (user-supplied parameters)
// =============================================================================

/// Family-specific orbit parameters. Angles are in degrees, as entered by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "orbitType")]
pub enum OrbitFamily {
    #[serde(rename = "LEO", rename_all = "camelCase")]
    Leo {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        eccentricity: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        argument_of_periapsis: Option<f64>,
    },
    #[serde(rename = "Polar", rename_all = "camelCase")]
    Polar {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        raan: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mean_anomaly: Option<f64>,
    },
    Generic,
}

impl OrbitFamily {
    /// Fold `update` into this payload. Within the same family only the fields the update
    /// carries are overwritten; a different family replaces the payload wholesale.
    pub fn merge(&mut self, update: &OrbitFamily) {
        match (self, update) {
            (
                OrbitFamily::Leo {
                    eccentricity,
                    argument_of_periapsis,
                },
                OrbitFamily::Leo {
                    eccentricity: new_eccentricity,
                    argument_of_periapsis: new_argument,
                },
            ) => {
                if new_eccentricity.is_some() {
                    *eccentricity = *new_eccentricity;
                }
                if new_argument.is_some() {
                    *argument_of_periapsis = *new_argument;
                }
            }
            (
                OrbitFamily::Polar { raan, mean_anomaly },
                OrbitFamily::Polar {
                    raan: new_raan,
                    mean_anomaly: new_mean_anomaly,
                },
            ) => {
                if new_raan.is_some() {
                    *raan = *new_raan;
                }
                if new_mean_anomaly.is_some() {
                    *mean_anomaly = *new_mean_anomaly;
                }
            }
            (current, other) => *current = other.clone(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrbitFamily::Leo { .. } => "LEO",
            OrbitFamily::Polar { .. } => "Polar",
            OrbitFamily::Generic => "Generic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SatelliteDescriptor {
    /// Altitude above mean Earth radius (km)
    pub altitude: f64,
    /// Inclination (degrees)
    pub inclination: f64,
    /// Reported speed (km/s), informational only
    #[serde(default)]
    pub velocity: f64,
    #[serde(flatten)]
    pub orbit: OrbitFamily,
}

impl SatelliteDescriptor {
    pub fn eccentricity(&self) -> f64 {
        match self.orbit {
            OrbitFamily::Leo {
                eccentricity: Some(e),
                ..
            } => e,
            _ => DEFAULT_ECCENTRICITY,
        }
    }

    /// Shallow override: every field present in `update` replaces the stored one. Family
    /// fields are merged when the family is unchanged (see `OrbitFamily::merge`).
    pub fn apply(&mut self, update: &SatelliteUpdate) {
        if let Some(altitude) = update.altitude {
            self.altitude = altitude;
        }
        if let Some(inclination) = update.inclination {
            self.inclination = inclination;
        }
        if let Some(velocity) = update.velocity {
            self.velocity = velocity;
        }
        if let Some(orbit) = &update.orbit {
            self.orbit.merge(orbit);
        }
    }
}

/// Partial descriptor used by `update_parameters`. Family fields go under `orbit`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SatelliteUpdate {
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default)]
    pub inclination: Option<f64>,
    #[serde(default)]
    pub velocity: Option<f64>,
    #[serde(default)]
    pub orbit: Option<OrbitFamily>,
}

// =============================================================================
// KEPLERIAN ORBITAL ELEMENTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrbitalElements {
    /// Semi-major axis (km)
    pub semi_major_axis: f64,
    /// Inclination (radians)
    pub inclination: f64,
    /// Eccentricity (0-1 for elliptical)
    pub eccentricity: f64,
    /// Argument of periapsis (radians)
    pub argument_of_periapsis: f64,
    /// Right ascension of the ascending node (radians)
    pub right_ascension_of_ascending_node: f64,
    /// Mean anomaly at simulation time zero (radians)
    pub mean_anomaly: f64,
    /// Mean motion (rad/s)
    pub mean_motion: f64,
    /// Orbital period (s)
    pub orbital_period: f64,
}

impl OrbitalElements {
    pub fn from_descriptor(descriptor: &SatelliteDescriptor) -> Self {
        let semi_major_axis = descriptor.altitude + EARTH_RADIUS;

        let (argument_of_periapsis, raan, mean_anomaly) = match descriptor.orbit {
            OrbitFamily::Leo {
                argument_of_periapsis,
                ..
            } => (argument_of_periapsis.unwrap_or(0.0), 0.0, 0.0),
            OrbitFamily::Polar { raan, mean_anomaly } => {
                (0.0, raan.unwrap_or(0.0), mean_anomaly.unwrap_or(0.0))
            }
            OrbitFamily::Generic => (0.0, 0.0, 0.0),
        };

        let mean_motion = (MU_EARTH / semi_major_axis.powi(3)).sqrt();

        Self {
            semi_major_axis,
            inclination: descriptor.inclination.to_radians(),
            eccentricity: descriptor.eccentricity(),
            argument_of_periapsis: argument_of_periapsis.to_radians(),
            right_ascension_of_ascending_node: raan.to_radians(),
            mean_anomaly: mean_anomaly.to_radians(),
            mean_motion,
            orbital_period: 2.0 * PI / mean_motion,
        }
    }

    /// Mean, eccentric and true anomaly after `elapsed` seconds
    pub fn anomalies_at(&self, elapsed: f64) -> Anomalies {
        let e = self.eccentricity;
        let mean = self.mean_anomaly + self.mean_motion * elapsed;
        let eccentric = solve_kepler_equation(mean, e).eccentric_anomaly;

        let true_anomaly = 2.0
            * ((1.0 + e).sqrt() * (eccentric / 2.0).sin())
                .atan2((1.0 - e).sqrt() * (eccentric / 2.0).cos());

        Anomalies {
            mean,
            eccentric,
            true_anomaly,
        }
    }

    /// ECI position (km) after `elapsed` seconds
    pub fn position_at(&self, elapsed: f64) -> Vector3 {
        let a = self.semi_major_axis;
        let e = self.eccentricity;
        let anomalies = self.anomalies_at(elapsed);

        // Distance from focus
        let r = a * (1.0 - e * anomalies.eccentric.cos());

        // Position in orbital plane (perifocal frame)
        let x_orb = r * anomalies.true_anomaly.cos();
        let y_orb = r * anomalies.true_anomaly.sin();

        // 3-1-3 rotation (Ω, i, ω) from perifocal to ECI
        let cos_omega = self.right_ascension_of_ascending_node.cos();
        let sin_omega = self.right_ascension_of_ascending_node.sin();
        let cos_w = self.argument_of_periapsis.cos();
        let sin_w = self.argument_of_periapsis.sin();
        let cos_i = self.inclination.cos();
        let sin_i = self.inclination.sin();

        let r11 = cos_omega * cos_w - sin_omega * sin_w * cos_i;
        let r12 = -cos_omega * sin_w - sin_omega * cos_w * cos_i;
        let r21 = sin_omega * cos_w + cos_omega * sin_w * cos_i;
        let r22 = -sin_omega * sin_w + cos_omega * cos_w * cos_i;
        let r31 = sin_w * sin_i;
        let r32 = cos_w * sin_i;

        Vector3::new(
            r11 * x_orb + r12 * y_orb,
            r21 * x_orb + r22 * y_orb,
            r31 * x_orb + r32 * y_orb,
        )
    }
}

/// Angular position along the orbit at one instant (radians)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anomalies {
    pub mean: f64,
    pub eccentric: f64,
    pub true_anomaly: f64,
}

// =============================================================================
// KEPLER'S EQUATION
// =============================================================================

/// Result of the bounded Newton-Raphson solve, converged or not
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeplerSolution {
    pub eccentric_anomaly: f64,
    /// Newton updates performed (KEPLER_MAX_ITERATIONS when the bound was hit)
    pub iterations: usize,
    /// E - e*sin(E) - M at the returned estimate
    pub residual: f64,
}

/// Solve Kepler's equation M = E - e*sin(E) using Newton-Raphson.
///
/// Starts at E = M and stops once the residual is below `KEPLER_TOLERANCE` or after
/// `KEPLER_MAX_ITERATIONS` updates. Non-convergence is not an error: the last estimate is
/// returned as is, which for eccentricities close to 1 can be inaccurate.
pub fn solve_kepler_equation(mean_anomaly: f64, eccentricity: f64) -> KeplerSolution {
    let residual_of = |e_anom: f64| e_anom - eccentricity * e_anom.sin() - mean_anomaly;

    let mut e_anom = mean_anomaly; // Initial guess

    for iterations in 0..KEPLER_MAX_ITERATIONS {
        let f = residual_of(e_anom);
        if f.abs() < KEPLER_TOLERANCE {
            return KeplerSolution {
                eccentric_anomaly: e_anom,
                iterations,
                residual: f,
            };
        }
        let f_prime = 1.0 - eccentricity * e_anom.cos();
        e_anom -= f / f_prime;
    }

    KeplerSolution {
        eccentric_anomaly: e_anom,
        iterations: KEPLER_MAX_ITERATIONS,
        residual: residual_of(e_anom),
    }
}

// =============================================================================
// PROPAGATOR
// =============================================================================

/// Parameters snapshot handed to display collaborators
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrbitalParameters {
    /// Orbital period (hours)
    pub period: f64,
    /// Altitude (km)
    pub altitude: f64,
    pub eccentricity: f64,
    /// Inclination (degrees)
    pub inclination: f64,
    pub position: Vector3,
    pub velocity: Vector3,
    /// Elapsed simulation time (s)
    pub simulation_time: f64,
}

/// One propagator per tracked satellite. Owns the satellite's descriptor, the elements
/// derived from it and the mutable simulation state.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitalPropagator {
    descriptor: SatelliteDescriptor,
    elements: OrbitalElements,
    time: f64,
    position: Vector3,
    velocity: Vector3,
}

impl OrbitalPropagator {
    pub fn new(descriptor: SatelliteDescriptor) -> Self {
        let elements = OrbitalElements::from_descriptor(&descriptor);
        Self {
            descriptor,
            elements,
            time: 0.0,
            position: Vector3::zero(),
            velocity: Vector3::zero(),
        }
    }

    pub fn descriptor(&self) -> &SatelliteDescriptor {
        &self.descriptor
    }

    pub fn elements(&self) -> &OrbitalElements {
        &self.elements
    }

    pub fn simulation_time(&self) -> f64 {
        self.time
    }

    /// Zero vector until the first step
    pub fn position(&self) -> Vector3 {
        self.position
    }

    /// Zero vector until the first step
    pub fn velocity(&self) -> Vector3 {
        self.velocity
    }

    /// Advance the clock by `delta_seconds` and recompute position and velocity.
    pub fn step(&mut self, delta_seconds: f64) -> Vector3 {
        self.time += delta_seconds;
        self.position = self.elements.position_at(self.time);
        self.compute_velocity();
        self.position
    }

    pub fn step_once(&mut self) -> Vector3 {
        self.step(DEFAULT_STEP_SECONDS)
    }

    /// Predicted position `offset` seconds past the current simulation time.
    /// Does not touch the propagator's state.
    pub fn predict_position(&self, offset: f64) -> Vector3 {
        self.elements.position_at(self.time + offset)
    }

    /// Vis-viva speed at the current radius, pointed along the tangent of the position's
    /// x-y projection. The z component is always 0: this is a display approximation, not
    /// the true 3D orbital velocity.
    pub fn compute_velocity(&mut self) -> Vector3 {
        let r = self.position.magnitude();
        if r < 1e-9 {
            self.velocity = Vector3::zero();
            return self.velocity;
        }

        let a = self.elements.semi_major_axis;
        let speed = (MU_EARTH * (2.0 / r - 1.0 / a)).max(0.0).sqrt();
        let tangent = Vector3::new(-self.position.y, self.position.x, 0.0).normalize();

        self.velocity = tangent.scale(speed);
        self.velocity
    }

    pub fn get_orbital_parameters(&self) -> OrbitalParameters {
        OrbitalParameters {
            period: self.elements.orbital_period / 3600.0,
            altitude: self.elements.semi_major_axis - EARTH_RADIUS,
            eccentricity: self.elements.eccentricity,
            inclination: self.elements.inclination.to_degrees(),
            position: self.position,
            velocity: self.velocity,
            simulation_time: self.time,
        }
    }

    pub fn reset(&mut self) {
        self.time = 0.0;
        self.position = Vector3::zero();
        self.velocity = Vector3::zero();
        self.elements = OrbitalElements::from_descriptor(&self.descriptor);
    }

    /// Merge `update` into the descriptor and rederive the elements.
    /// Clock, position and velocity are kept.
    pub fn update_parameters(&mut self, update: &SatelliteUpdate) {
        self.descriptor.apply(update);
        self.elements = OrbitalElements::from_descriptor(&self.descriptor);
    }

    pub fn is_stable(&self) -> bool {
        is_stable_orbit(
            self.elements.semi_major_axis - EARTH_RADIUS,
            self.elements.eccentricity,
        )
    }
}

// =============================================================================
// ORBIT HELPERS
// =============================================================================

/// Display annotation only; has no effect on propagation.
pub fn is_stable_orbit(altitude: f64, eccentricity: f64) -> bool {
    (STABLE_ALTITUDE_MIN..=STABLE_ALTITUDE_MAX).contains(&altitude)
        && (0.0..1.0).contains(&eccentricity)
}

/// Kepler's third law period (s) for a circular orbit at `altitude` km
pub fn orbital_period_seconds(altitude: f64) -> f64 {
    let a = altitude + EARTH_RADIUS;
    2.0 * PI * (a.powi(3) / MU_EARTH).sqrt()
}

/// Circular orbit speed (km/s) at `altitude` km
pub fn circular_speed(altitude: f64) -> f64 {
    (MU_EARTH / (altitude + EARTH_RADIUS)).sqrt()
}

// =============================================================================
// COLLISION RISK (sampled closest approach)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    Negligible,
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskTier {
    pub fn from_distance(distance_km: f64) -> Self {
        match distance_km {
            d if d < 1.0 => RiskTier::Critical,
            d if d < 5.0 => RiskTier::High,
            d if d < 25.0 => RiskTier::Moderate,
            d if d < 100.0 => RiskTier::Low,
            _ => RiskTier::Negligible,
        }
    }
}

/// Sampling policy for `assess_collision_risk`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConjunctionPolicy {
    /// How far ahead to look (s)
    pub horizon_s: f64,
    /// Spacing between samples (s)
    pub step_s: f64,
}

impl Default for ConjunctionPolicy {
    fn default() -> Self {
        Self {
            horizon_s: 3600.0,
            step_s: 60.0,
        }
    }
}

impl ConjunctionPolicy {
    /// Sample offsets: step, 2*step, ... up to and including the horizon.
    /// A non-positive or non-finite horizon yields a single sample at 0, a non-positive
    /// step a single sample at the horizon. At most `MAX_CONJUNCTION_SAMPLES` offsets are
    /// produced; the step is widened to fit.
    pub fn sample_offsets(&self) -> Vec<f64> {
        if !self.horizon_s.is_finite() || self.horizon_s <= 0.0 {
            return vec![0.0];
        }
        if !self.step_s.is_finite() || self.step_s <= 0.0 {
            return vec![self.horizon_s];
        }

        let mut step = self.step_s;
        let mut count = (self.horizon_s / step).floor();
        if count > MAX_CONJUNCTION_SAMPLES as f64 {
            count = MAX_CONJUNCTION_SAMPLES as f64;
            step = self.horizon_s / count;
        }
        (1..=(count as usize).max(1))
            .map(|k| (k as f64 * step).min(self.horizon_s))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionAssessment {
    /// Smallest separation among the evaluated samples (km)
    pub min_distance_km: f64,
    /// Offset from now of that sample (s)
    pub time_of_closest_approach_s: f64,
    pub tier: RiskTier,
}

/// Best-effort conjunction screen: the minimum is only over the sampled instants, not a
/// true closest-approach solution.
pub fn assess_collision_risk(
    a: &OrbitalPropagator,
    b: &OrbitalPropagator,
    policy: &ConjunctionPolicy,
) -> CollisionAssessment {
    let mut min_distance = f64::INFINITY;
    let mut time_of_closest = 0.0;

    for offset in policy.sample_offsets() {
        let distance = a
            .predict_position(offset)
            .distance(&b.predict_position(offset));
        if distance < min_distance {
            min_distance = distance;
            time_of_closest = offset;
        }
    }

    CollisionAssessment {
        min_distance_km: min_distance,
        time_of_closest_approach_s: time_of_closest,
        tier: RiskTier::from_distance(min_distance),
    }
}

// =============================================================================
// TESTS
// =============================================================================
