//! Swarm configuration: the containment region and the named tunables.
//!
//! Configuration is plain serde data so hosts can load it from whatever
//! format they already use. Values are validated once, when the world is
//! built, and converted to fixed-point for the simulation loop.

use crate::fixed::Fixed64;
use crate::math::Vec2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors detected while validating configuration or assembling a world.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("no simulation region configured")]
    MissingRegion,
    #[error("no effect sink supplied")]
    MissingEffectSink,
    #[error("invalid region: min {min:?} must not exceed max {max:?}")]
    InvalidRegion { min: Vec2, max: Vec2 },
    #[error("`{field}` must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error("`{field}` must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("`{field}` must be at least 1")]
    ZeroParticles { field: &'static str },
    #[error("`{field}` = {value} is out of range for the fixed-point timestep")]
    OutOfRange { field: &'static str, value: f64 },
}

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

/// Axis-aligned rectangle that bounds agent positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub min: Vec2,
    pub max: Vec2,
}

impl Region {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Region centred on `center` with the given full size, the way a box
    /// collider is usually described.
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Whether `p` lies inside the region or on its edge.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let size = self.size();
        let finite = [self.min.x, self.min.y, self.max.x, self.max.y, size.x, size.y]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.min.x > self.max.x || self.min.y > self.max.y {
            return Err(ConfigError::InvalidRegion {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SwarmConfig
// ---------------------------------------------------------------------------

/// All tunables of a swarm. Durations and rates are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    /// Containment region. Required.
    pub region: Option<Region>,
    /// Scale of the inverse-square repulsion between neighbors.
    pub repulsion_constant: f64,
    /// Spring constant pushing escaped agents back into the region.
    pub boundary_force_constant: f64,
    /// Duration of one agent's lighting reveal.
    pub light_duration: f64,
    /// Lightning particles emitted in the burst when an agent becomes lit.
    pub lightning_particles: u32,
    /// Expected lightning emissions per second while an agent is being lit.
    pub lightning_emission_rate: f64,
    /// Duration of one feedback playback window.
    pub feedback_duration: f64,
    /// Sub-steps per tick during feedback playback.
    pub feedback_particles: u32,
    /// Particles per feedback emission.
    pub feedback_burst: u32,
    /// Fixed simulation timestep.
    pub fixed_dt: f64,
    /// Seed for initial velocities and emission rolls.
    pub seed: u64,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            region: None,
            repulsion_constant: 100.0,
            boundary_force_constant: 250.0,
            light_duration: 0.2,
            lightning_particles: 25,
            lightning_emission_rate: 100.0,
            feedback_duration: 1.5,
            feedback_particles: 10,
            feedback_burst: 2,
            fixed_dt: 0.02,
            seed: 0,
        }
    }
}

impl SwarmConfig {
    /// Default tunables with the given region.
    pub fn with_region(region: Region) -> Self {
        Self {
            region: Some(region),
            ..Self::default()
        }
    }

    /// Check every field and return the validated form used by the world.
    pub fn validate(&self) -> Result<Tunables, ConfigError> {
        let region = self.region.ok_or(ConfigError::MissingRegion)?;
        region.validate()?;

        non_negative("repulsion_constant", self.repulsion_constant)?;
        non_negative("boundary_force_constant", self.boundary_force_constant)?;
        non_negative("lightning_emission_rate", self.lightning_emission_rate)?;
        positive("light_duration", self.light_duration)?;
        positive("feedback_duration", self.feedback_duration)?;
        positive("fixed_dt", self.fixed_dt)?;
        if self.lightning_particles == 0 {
            return Err(ConfigError::ZeroParticles {
                field: "lightning_particles",
            });
        }
        if self.feedback_particles == 0 {
            return Err(ConfigError::ZeroParticles {
                field: "feedback_particles",
            });
        }
        let fixed_dt = positive_time("fixed_dt", self.fixed_dt)?;
        feedback_sub_step(fixed_dt, self.feedback_particles)?;

        Ok(Tunables {
            region,
            repulsion_constant: self.repulsion_constant,
            boundary_force_constant: self.boundary_force_constant,
            light_duration: positive_time("light_duration", self.light_duration)?,
            lightning_particles: self.lightning_particles,
            lightning_emission_rate: to_fixed(
                "lightning_emission_rate",
                self.lightning_emission_rate,
            )?,
            feedback_duration: positive_time("feedback_duration", self.feedback_duration)?,
            feedback_particles: self.feedback_particles,
            feedback_burst: self.feedback_burst,
            fixed_dt,
            seed: self.seed,
        })
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn to_fixed(field: &'static str, value: f64) -> Result<Fixed64, ConfigError> {
    Fixed64::checked_from_num(value).ok_or(ConfigError::OutOfRange { field, value })
}

/// A duration that must stay above zero once rounded to fixed-point.
fn positive_time(field: &'static str, value: f64) -> Result<Fixed64, ConfigError> {
    let fixed = to_fixed(field, value)?;
    if fixed > Fixed64::ZERO {
        Ok(fixed)
    } else {
        Err(ConfigError::OutOfRange { field, value })
    }
}

/// Feedback splits each tick into `particles` sub-steps; each one must
/// still advance the playback timer.
fn feedback_sub_step(dt: Fixed64, particles: u32) -> Result<Fixed64, ConfigError> {
    let out_of_range = ConfigError::OutOfRange {
        field: "feedback_particles",
        value: particles as f64,
    };
    let Some(count) = Fixed64::checked_from_num(particles) else {
        return Err(out_of_range);
    };
    match dt.checked_div(count) {
        Some(sub_dt) if sub_dt > Fixed64::ZERO => Ok(sub_dt),
        _ => Err(out_of_range),
    }
}

// ---------------------------------------------------------------------------
// Tunables
// ---------------------------------------------------------------------------

/// Validated configuration with time quantities in fixed-point.
#[derive(Debug, Clone, PartialEq)]
pub struct Tunables {
    pub region: Region,
    pub repulsion_constant: f64,
    pub boundary_force_constant: f64,
    pub light_duration: Fixed64,
    pub lightning_particles: u32,
    pub lightning_emission_rate: Fixed64,
    pub feedback_duration: Fixed64,
    pub feedback_particles: u32,
    pub feedback_burst: u32,
    pub fixed_dt: Fixed64,
    pub seed: u64,
}
