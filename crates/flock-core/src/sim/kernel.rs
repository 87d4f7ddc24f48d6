//! Per-boid flocking kernel.
//!
//! Everything here is a pure function of its inputs: the stepper may call it for
//! every boid concurrently, in any order, any number of times.

use flock_params::SimulationParameters;
use glam::Vec2;

use crate::sim::Boid;

/// Heading used when a velocity has no usable direction
pub const DEFAULT_HEADING: Vec2 = Vec2::X;

/// Below this speed a velocity is treated as zero
pub const SPEED_EPSILON: f32 = 1e-6;

/// Softening added to the separation distance, bounds the push at `1 / SEPARATION_SOFTENING`
pub const SEPARATION_SOFTENING: f32 = 1e-3;

/// Mean position, `None` for an empty slice
pub fn centroid(boids: &[Boid]) -> Option<Vec2> {
    if boids.is_empty() {
        return None;
    }
    let sum: Vec2 = boids.iter().map(Boid::position).sum();
    Some(sum / boids.len() as f32)
}

fn mean_velocity(boids: &[Boid]) -> Option<Vec2> {
    if boids.is_empty() {
        return None;
    }
    let sum: Vec2 = boids.iter().map(Boid::velocity).sum();
    Some(sum / boids.len() as f32)
}

/// Steer toward the centroid of the neighborhood
pub fn cohesion(boid: &Boid, neighbors: &[Boid], params: &SimulationParameters) -> Vec2 {
    match centroid(neighbors) {
        Some(center) => (center - boid.position()) * params.cohesion_strength,
        None => Vec2::ZERO,
    }
}

/// Unweighted repulsion from a single neighbor: unit direction away, magnitude
/// `1 / (d + SEPARATION_SOFTENING)`
pub fn repulsion(from: Vec2, other: Vec2) -> Vec2 {
    let offset = from - other;
    let distance = offset.length();
    if distance == 0.0 {
        // Coincident boids have no direction to separate along
        return Vec2::ZERO;
    }
    (offset / distance) / (distance + SEPARATION_SOFTENING)
}

/// Push away from crowding neighbors, closer ones harder
pub fn separation(boid: &Boid, close: &[Boid], params: &SimulationParameters) -> Vec2 {
    let p = boid.position();
    let sum: Vec2 = close.iter().map(|other| repulsion(p, other.position())).sum();
    sum * params.separation_strength
}

/// Steer velocity toward the neighborhood's mean velocity
pub fn alignment(boid: &Boid, neighbors: &[Boid], params: &SimulationParameters) -> Vec2 {
    match mean_velocity(neighbors) {
        Some(mean) => (mean - boid.velocity()) * params.alignment_strength,
        None => Vec2::ZERO,
    }
}

/// Flee the predator when it is inside `predator_radius`, with linear falloff
pub fn predator_avoidance(boid: &Boid, predator: &Boid, params: &SimulationParameters) -> Vec2 {
    let offset = boid.position() - predator.position();
    let distance = offset.length();
    if distance.is_nan() || distance >= params.predator_radius {
        return Vec2::ZERO;
    }

    let away = if distance > 0.0 {
        offset / distance
    } else {
        predator.velocity().try_normalize().unwrap_or(DEFAULT_HEADING)
    };
    let falloff = 1.0 - distance / params.predator_radius;
    away * params.predator_strength * falloff
}

/// Rescale `velocity` into `[min_speed, max_speed]`.
///
/// A zero velocity takes [`DEFAULT_HEADING`]. Non-finite input is returned
/// non-finite so the caller can detect it.
pub fn clamp_speed(velocity: Vec2, min_speed: f32, max_speed: f32) -> Vec2 {
    if !velocity.is_finite() {
        return Vec2::NAN;
    }
    let speed = velocity.length();
    if !speed.is_finite() {
        // The squared length overflowed; the speed is far above any max_speed.
        let scaled = velocity / velocity.abs().max_element();
        return scaled.normalize() * max_speed;
    }
    if speed < SPEED_EPSILON {
        DEFAULT_HEADING * min_speed
    } else if speed < min_speed {
        velocity * (min_speed / speed)
    } else if speed > max_speed {
        velocity * (max_speed / speed)
    } else {
        velocity
    }
}

/// Net steering for one boid, before clamping
pub fn steering(
    boid: &Boid,
    neighbors_full: &[Boid],
    neighbors_close: &[Boid],
    predator: &Boid,
    params: &SimulationParameters,
) -> Vec2 {
    cohesion(boid, neighbors_full, params)
        + separation(boid, neighbors_close, params)
        + alignment(boid, neighbors_full, params)
        + predator_avoidance(boid, predator, params)
}

/// Next state of one boid.
///
/// `neighbors_full` are the boids within `neighbor_radius`, `neighbors_close` those
/// within `separation_radius`. The result may be non-finite for degenerate input;
/// the stepper checks it.
pub fn step(
    boid: &Boid,
    neighbors_full: &[Boid],
    neighbors_close: &[Boid],
    predator: &Boid,
    params: &SimulationParameters,
    dt: f32,
) -> Boid {
    let force = steering(boid, neighbors_full, neighbors_close, predator, params);
    let velocity = clamp_speed(boid.velocity() + force, params.min_speed, params.max_speed);
    let position = boid.position() + velocity * dt;
    Boid::new(position, velocity)
}

/// Next state of the predator: seek the flock centroid, cap at `predator_speed`
pub fn step_predator(
    predator: &Boid,
    flock_centroid: Option<Vec2>,
    params: &SimulationParameters,
    dt: f32,
) -> Boid {
    let seek = match flock_centroid {
        Some(center) => (center - predator.position()) * params.predator_seek,
        None => Vec2::ZERO,
    };
    let velocity = (predator.velocity() + seek).clamp_length_max(params.predator_speed);
    let position = predator.position() + velocity * dt;
    Boid::new(position, velocity)
}
