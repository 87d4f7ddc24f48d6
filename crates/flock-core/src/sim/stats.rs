use glam::Vec2;

use crate::sim::FrameView;

/// Flock statistics for metrics collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlockStats {
    pub frame: u64,
    pub boid_count: usize,
    pub centroid_x: f32,
    pub centroid_y: f32,
    pub mean_speed: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    /// Length of the mean unit heading: 1 when every boid flies the same way
    pub polarization: f32,
    /// Mean distance of boids from the centroid
    pub spread: f32,
    pub predator_distance: f32,
}

impl FlockStats {
    pub fn from_state(view: &FrameView<'_>) -> Self {
        let boids = view.boids;
        if boids.is_empty() {
            return Self {
                frame: view.frame,
                ..Self::default()
            };
        }

        let n = boids.len() as f32;
        let centroid = boids.iter().map(|b| b.position()).sum::<Vec2>() / n;

        let mut total_speed = 0.0;
        let mut min_speed = f32::INFINITY;
        let mut max_speed = 0.0f32;
        let mut heading = Vec2::ZERO;
        let mut spread = 0.0;

        for boid in boids {
            let speed = boid.speed();
            total_speed += speed;
            min_speed = min_speed.min(speed);
            max_speed = max_speed.max(speed);
            heading += boid.velocity().normalize_or_zero();
            spread += boid.position().distance(centroid);
        }

        Self {
            frame: view.frame,
            boid_count: boids.len(),
            centroid_x: centroid.x,
            centroid_y: centroid.y,
            mean_speed: total_speed / n,
            min_speed,
            max_speed,
            polarization: (heading / n).length(),
            spread: spread / n,
            predator_distance: view.predator.position().distance(centroid),
        }
    }
}
