use bytemuck::{Pod, Zeroable};
use flock_params::Boundary;
use glam::Vec2;

/// Boid state shared with the GPU particle buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Boid {
    pub pos: [f32; 2], // Position (x, y)
    pub vel: [f32; 2], // Velocity (vx, vy)
}

impl Boid {
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        Self {
            pos: [position.x, position.y],
            vel: [velocity.x, velocity.y],
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.pos[0], self.pos[1])
    }

    pub fn velocity(&self) -> Vec2 {
        Vec2::new(self.vel[0], self.vel[1])
    }

    pub fn speed(&self) -> f32 {
        self.velocity().length()
    }

    pub fn is_finite(&self) -> bool {
        self.position().is_finite() && self.velocity().is_finite()
    }

    /// Keep the boid inside a `[0, w] x [0, h]` world according to `boundary`
    pub fn apply_boundary(&mut self, boundary: Boundary, world_size: Vec2) {
        match boundary {
            Boundary::Open => {}
            Boundary::Bounce => {
                for axis in 0..2 {
                    let limit = world_size[axis];
                    if self.pos[axis] < 0.0 {
                        self.pos[axis] = 0.0;
                        self.vel[axis] = self.vel[axis].abs();
                    } else if self.pos[axis] > limit {
                        self.pos[axis] = limit;
                        self.vel[axis] = -self.vel[axis].abs();
                    }
                }
            }
            Boundary::Wrap => {
                for axis in 0..2 {
                    let limit = world_size[axis];
                    if limit > 0.0 {
                        let wrapped = self.pos[axis].rem_euclid(limit);
                        // rem_euclid can round up to the limit itself
                        self.pos[axis] = if wrapped >= limit { 0.0 } else { wrapped };
                    } else {
                        self.pos[axis] = 0.0;
                    }
                }
            }
        }
    }
}

/// Read-only view of a completed frame, handed to renderers
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub frame: u64,
    pub boids: &'a [Boid],
    pub predator: &'a Boid,
}

impl<'a> FrameView<'a> {
    /// Raw particle buffer in GPU layout
    pub fn boid_bytes(&self) -> &'a [u8] {
        bytemuck::cast_slice(self.boids)
    }

    pub fn len(&self) -> usize {
        self.boids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_particle_record() {
        assert_eq!(
            std::mem::size_of::<Boid>(),
            flock_params::layout::PARTICLE_SIZE
        );
        let boids = [Boid::new(Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0))];
        let floats: &[f32] = bytemuck::cast_slice(&boids);
        assert_eq!(floats, &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn bounce_reflects_velocity_inward() {
        let mut boid = Boid::new(Vec2::new(-2.0, 105.0), Vec2::new(-1.0, 3.0));
        boid.apply_boundary(Boundary::Bounce, Vec2::new(100.0, 100.0));
        assert_eq!(boid.position(), Vec2::new(0.0, 100.0));
        assert_eq!(boid.velocity(), Vec2::new(1.0, -3.0));
    }

    #[test]
    fn wrap_is_toroidal() {
        let mut boid = Boid::new(Vec2::new(-10.0, 250.0), Vec2::new(1.0, 1.0));
        boid.apply_boundary(Boundary::Wrap, Vec2::new(100.0, 100.0));
        assert_eq!(boid.position(), Vec2::new(90.0, 50.0));
        assert_eq!(boid.velocity(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn open_leaves_boid_alone() {
        let mut boid = Boid::new(Vec2::new(-10.0, 250.0), Vec2::new(1.0, 1.0));
        let before = boid;
        boid.apply_boundary(Boundary::Open, Vec2::new(100.0, 100.0));
        assert_eq!(boid, before);
    }
}
