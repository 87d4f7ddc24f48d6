pub mod boid;
pub mod emitter;
pub mod kernel;
pub mod neighbors;
pub mod stats;
pub mod stepper;

pub use boid::*;
pub use emitter::*;
pub use neighbors::*;
pub use stats::*;
pub use stepper::*;
