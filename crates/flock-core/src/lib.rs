//! Flock Core Engine
//!
//! Double-buffered boid flocking: neighbor search, the per-boid flocking kernel and
//! the parallel frame stepper.

pub mod error;
pub mod sim;

// Re-export main types
pub use error::*;
pub use sim::*;

// Re-export params from flock-params
pub use flock_params::*;
