//! Shared parameter types for the Flock boid simulation
//!
//! This crate contains the parameter structures used by the simulation core and the
//! headless runner so both agree on one definition, plus the GPU-compatible layout
//! of the per-frame uniform.

use bytemuck::{Pod, Zeroable};
use thiserror::Error;

/// Errors raised while validating parameters or configuration.
///
/// All of these are fatal: a simulation is never created from a configuration that
/// fails validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("particle count must be greater than 0")]
    ZeroParticles,

    #[error("particle count mismatch: parameters say {expected}, initial buffer holds {actual}")]
    ParticleCountMismatch { expected: u32, actual: usize },

    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f32 },

    #[error("{name} must be non-negative, got {value}")]
    Negative { name: &'static str, value: f32 },

    #[error("min_speed must be positive, got {0}")]
    NonPositiveMinSpeed(f32),

    #[error("min_speed ({min}) must not exceed max_speed ({max})")]
    SpeedRange { min: f32, max: f32 },

    #[error("time step must be finite and non-negative, got {0}")]
    InvalidTimeStep(f32),

    #[error("world size must be finite and non-negative, got {0:?}")]
    InvalidWorldSize([f32; 2]),

    #[error("grid cell size must be finite and positive, got {0}")]
    InvalidCellSize(f32),

    #[error("initial state of {0} is not finite")]
    NonFiniteInitialState(String),
}

/// Flocking parameters for one run.
///
/// The field order and `#[repr(C)]` layout match the `Params` uniform read by the
/// compute kernel, so a value can be uploaded with `bytemuck::bytes_of`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimulationParameters {
    pub cohesion_strength: f32,   // Pull toward the neighbor centroid
    pub separation_strength: f32, // Push away from close neighbors
    pub alignment_strength: f32,  // Match neighbor velocity
    pub predator_strength: f32,   // Flee from the predator
    pub min_speed: f32,
    pub max_speed: f32,
    pub predator_speed: f32,
    pub neighbor_radius: f32,
    pub separation_radius: f32,
    pub predator_radius: f32,
    pub predator_seek: f32, // Predator pull toward the flock centroid
    pub particle_count: u32,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            cohesion_strength: 0.02,
            separation_strength: 50.0,
            alignment_strength: 0.05,
            predator_strength: 40.0,
            min_speed: 60.0,
            max_speed: 180.0,
            predator_speed: 150.0,
            neighbor_radius: 50.0,
            separation_radius: 15.0,
            predator_radius: 100.0,
            predator_seek: 0.05,
            particle_count: 1000,
        }
    }
}

impl SimulationParameters {
    fn named_floats(&self) -> [(&'static str, f32); 11] {
        [
            ("cohesion_strength", self.cohesion_strength),
            ("separation_strength", self.separation_strength),
            ("alignment_strength", self.alignment_strength),
            ("predator_strength", self.predator_strength),
            ("min_speed", self.min_speed),
            ("max_speed", self.max_speed),
            ("predator_speed", self.predator_speed),
            ("neighbor_radius", self.neighbor_radius),
            ("separation_radius", self.separation_radius),
            ("predator_radius", self.predator_radius),
            ("predator_seek", self.predator_seek),
        ]
    }

    /// Check every invariant a simulation relies on.
    ///
    /// Strengths are not bounded, only required to be finite. A separation radius
    /// larger than the neighbor radius is legal but unusual and only logged.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.particle_count == 0 {
            return Err(ConfigError::ZeroParticles);
        }

        for (name, value) in self.named_floats() {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { name, value });
            }
        }

        if self.min_speed <= 0.0 {
            return Err(ConfigError::NonPositiveMinSpeed(self.min_speed));
        }
        if self.min_speed > self.max_speed {
            return Err(ConfigError::SpeedRange {
                min: self.min_speed,
                max: self.max_speed,
            });
        }

        for (name, value) in [
            ("neighbor_radius", self.neighbor_radius),
            ("separation_radius", self.separation_radius),
            ("predator_radius", self.predator_radius),
            ("predator_speed", self.predator_speed),
        ] {
            if value < 0.0 {
                return Err(ConfigError::Negative { name, value });
            }
        }

        if self.separation_radius > self.neighbor_radius {
            log::warn!(
                "separation_radius ({}) exceeds neighbor_radius ({})",
                self.separation_radius,
                self.neighbor_radius
            );
        }

        Ok(())
    }

    /// Largest interaction radius a neighbor index has to serve.
    pub fn query_radius(&self) -> f32 {
        self.neighbor_radius.max(self.separation_radius)
    }
}

/// What happens to an entity that leaves the world rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Boundary {
    /// Unbounded plane
    #[default]
    Open,
    /// Reflect off the edges
    Bounce,
    /// Toroidal world
    Wrap,
}

/// World configuration parameters
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WorldConfig {
    pub size: [f32; 2],
    pub steps: u32,
    pub dt: f32,
    pub seed: u64,
    pub boundary: Boundary,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            size: [800.0, 600.0],
            steps: 2000,
            dt: 1.0 / 60.0,
            seed: 1337,
            boundary: Boundary::Bounce,
        }
    }
}

/// Neighbor search strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NeighborStrategy {
    BruteForce,
    #[default]
    Grid,
}

/// Neighbor search configuration
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NeighborConfig {
    pub strategy: NeighborStrategy,
    /// Grid cell edge; derived from the neighbor radius when absent
    pub cell_size: Option<f32>,
}

/// Headless output configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OutputConfig {
    pub metrics_every: u32,
    pub snapshot_steps: Vec<u32>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            metrics_every: 50,
            snapshot_steps: vec![0, 200, 1000, 2000],
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimulationConfig {
    pub world: WorldConfig,
    pub flock: SimulationParameters,
    pub neighbors: NeighborConfig,
    pub output: OutputConfig,
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.flock.validate()?;

        let [w, h] = self.world.size;
        if !(w.is_finite() && h.is_finite()) || w < 0.0 || h < 0.0 {
            return Err(ConfigError::InvalidWorldSize(self.world.size));
        }
        if !self.world.dt.is_finite() || self.world.dt < 0.0 {
            return Err(ConfigError::InvalidTimeStep(self.world.dt));
        }
        if let Some(cell) = self.neighbors.cell_size {
            if !cell.is_finite() || cell <= 0.0 {
                return Err(ConfigError::InvalidCellSize(cell));
            }
        }

        Ok(())
    }
}

/// GPU layout documentation and validation
///
/// The compute kernel and any renderer reading the particle buffer share these
/// layouts. They must stay byte-identical to the Rust records.
pub mod layout {
    use super::*;

    /// Particle record, one per boid
    ///
    /// ```metal
    /// struct Particle {
    ///     float2 position;
    ///     float2 velocity;
    /// };
    /// ```
    pub const PARTICLE_LAYOUT: &str = "Particle: position(float2) velocity(float2), 16 bytes";

    /// Per-frame parameter uniform
    ///
    /// ```metal
    /// struct Params {
    ///     float cohesionStrength;
    ///     float separationStrength;
    ///     float alignmentStrength;
    ///     float predatorStrength;
    ///     float minSpeed;
    ///     float maxSpeed;
    ///     float predatorSpeed;
    ///     float neighborRadius;
    ///     float separationRadius;
    ///     float predatorRadius;
    ///     float predatorSeek;
    ///     uint32_t particleCount;
    /// };
    /// ```
    pub const PARAMS_LAYOUT: &str = "Params: 11 x float, particleCount(uint32), 48 bytes";

    pub const PARTICLE_SIZE: usize = 16;
    pub const PARAMS_SIZE: usize = 48;

    /// Check the uniform record against the documented size
    pub fn validate_params_layout() -> Result<(), String> {
        let size = std::mem::size_of::<SimulationParameters>();
        if size != PARAMS_SIZE {
            Err(format!("Params size mismatch: expected {}, got {}", PARAMS_SIZE, size))
        } else {
            Ok(())
        }
    }

    /// Log layout information for debugging
    pub fn log_layouts() {
        log::info!("{}", PARTICLE_LAYOUT);
        log::info!("{}", PARAMS_LAYOUT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(SimulationParameters::default().validate(), Ok(()));
        assert_eq!(SimulationConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_zero_particles() {
        let params = SimulationParameters {
            particle_count: 0,
            ..Default::default()
        };
        assert_eq!(params.validate(), Err(ConfigError::ZeroParticles));
    }

    #[test]
    fn rejects_inverted_speed_range() {
        let params = SimulationParameters {
            min_speed: 5.0,
            max_speed: 2.0,
            ..Default::default()
        };
        assert_eq!(
            params.validate(),
            Err(ConfigError::SpeedRange { min: 5.0, max: 2.0 })
        );
    }

    #[test]
    fn equal_speed_bounds_are_allowed() {
        let params = SimulationParameters {
            min_speed: 3.0,
            max_speed: 3.0,
            ..Default::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn rejects_negative_radius() {
        let params = SimulationParameters {
            predator_radius: -1.0,
            ..Default::default()
        };
        assert_eq!(
            params.validate(),
            Err(ConfigError::Negative {
                name: "predator_radius",
                value: -1.0
            })
        );
    }

    #[test]
    fn rejects_nan_strength() {
        let params = SimulationParameters {
            alignment_strength: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::NonFinite { name: "alignment_strength", .. })
        ));
    }

    #[test]
    fn rejects_bad_world() {
        let mut config = SimulationConfig::default();
        config.world.dt = -0.1;
        assert_eq!(config.validate(), Err(ConfigError::InvalidTimeStep(-0.1)));

        let mut config = SimulationConfig::default();
        config.neighbors.cell_size = Some(0.0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidCellSize(0.0)));
    }

    #[test]
    fn params_match_gpu_layout() {
        assert!(layout::validate_params_layout().is_ok());
        let params = SimulationParameters::default();
        assert_eq!(bytemuck::bytes_of(&params).len(), layout::PARAMS_SIZE);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "world:\n  steps: 10\n  boundary: wrap\nflock:\n  cohesion_strength: 0.1\n  separation_strength: 1.0\n  alignment_strength: 0.2\n  predator_strength: 3.0\n  min_speed: 1.0\n  max_speed: 4.0\n  predator_speed: 5.0\n  neighbor_radius: 10.0\n  separation_radius: 2.0\n  predator_radius: 20.0\n  predator_seek: 0.5\n  particle_count: 64\n";
        let config: SimulationConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.world.steps, 10);
        assert_eq!(config.world.boundary, Boundary::Wrap);
        assert_eq!(config.world.seed, WorldConfig::default().seed);
        assert_eq!(config.flock.particle_count, 64);
        assert_eq!(config.neighbors.strategy, NeighborStrategy::Grid);
        assert!(config.validate().is_ok());
    }
}
