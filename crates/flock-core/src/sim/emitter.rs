use flock_params::SimulationParameters;
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::sim::Boid;

/// Seeds the initial flock and predator
pub struct Emitter {
    rng: ChaCha8Rng,
}

impl Emitter {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn coordinate(&mut self, extent: f32) -> f32 {
        if extent > 0.0 {
            self.rng.gen_range(0.0..extent)
        } else {
            0.0
        }
    }

    fn position(&mut self, world_size: [f32; 2]) -> Vec2 {
        Vec2::new(self.coordinate(world_size[0]), self.coordinate(world_size[1]))
    }

    /// Predator at a random spot, heading diagonally at `predator_speed` per axis
    pub fn emit_predator(&mut self, params: &SimulationParameters, world_size: [f32; 2]) -> Boid {
        let position = self.position(world_size);
        Boid::new(position, Vec2::splat(params.predator_speed))
    }

    /// `particle_count` boids scattered over the world with velocity components in
    /// `[-max_speed, max_speed]`
    pub fn emit_boids(&mut self, params: &SimulationParameters, world_size: [f32; 2]) -> Vec<Boid> {
        let count = params.particle_count as usize;
        let max = params.max_speed.abs();
        let mut boids = Vec::with_capacity(count);

        for _ in 0..count {
            let position = self.position(world_size);
            let velocity = Vec2::new(
                self.rng.gen_range(-max..=max),
                self.rng.gen_range(-max..=max),
            );
            boids.push(Boid::new(position, velocity));
        }

        boids
    }

    /// Predator first, then the flock
    pub fn emit(&mut self, params: &SimulationParameters, world_size: [f32; 2]) -> (Vec<Boid>, Boid) {
        let predator = self.emit_predator(params, world_size);
        let boids = self.emit_boids(params, world_size);
        (boids, predator)
    }
}
