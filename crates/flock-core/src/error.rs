//! Error types for the simulation core.

use std::collections::TryReserveError;

use flock_params::ConfigError;
use thiserror::Error;

/// Failures of a neighbor index.
#[derive(Error, Debug)]
pub enum QueryError {
    /// A boid position is NaN or infinite and cannot be bucketed
    #[error("boid {index} has a non-finite position")]
    NonFinitePosition { index: usize },

    /// A boid lies too far from the origin for the grid's cell coordinates
    #[error("boid {index} at {position:?} is outside the indexable range")]
    OutOfRange { index: usize, position: [f32; 2] },

    /// Index storage could not be allocated
    #[error("neighbor index allocation failed: {0}")]
    Exhausted(#[from] TryReserveError),

    /// The index was built for a different snapshot
    #[error("neighbor index is stale: built for {built} boids, queried with {actual}")]
    Stale { built: usize, actual: usize },
}

/// Errors surfaced by [`FlockSimulation`](crate::sim::FlockSimulation).
#[derive(Error, Debug)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The neighbor query failed; the frame was aborted and the previous state kept
    #[error("frame {frame} aborted: {source}")]
    Query {
        frame: u64,
        #[source]
        source: QueryError,
    },
}

pub type Result<T> = std::result::Result<T, SimError>;
