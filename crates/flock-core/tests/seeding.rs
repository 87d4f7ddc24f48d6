use flock_core::{Emitter, SimulationParameters};

fn params(count: u32) -> SimulationParameters {
    SimulationParameters {
        particle_count: count,
        ..Default::default()
    }
}

#[test]
fn seeding_runs_for_common_sizes() {
    let sizes = [[64.0f32, 64.0], [800.0, 600.0], [4096.0, 2048.0]];
    for size in sizes {
        let params = params(500);
        let (boids, predator) = Emitter::new(42).emit(&params, size);
        assert_eq!(boids.len(), 500);

        for boid in &boids {
            assert!(boid.is_finite());
            assert!(boid.pos[0] >= 0.0 && boid.pos[0] < size[0], "x out of {:?}", size);
            assert!(boid.pos[1] >= 0.0 && boid.pos[1] < size[1], "y out of {:?}", size);
            assert!(boid.vel[0].abs() <= params.max_speed);
            assert!(boid.vel[1].abs() <= params.max_speed);
        }

        assert!(predator.pos[0] >= 0.0 && predator.pos[0] < size[0]);
        assert!(predator.pos[1] >= 0.0 && predator.pos[1] < size[1]);
        assert_eq!(predator.vel, [params.predator_speed, params.predator_speed]);
    }
}

#[test]
fn seeding_is_reproducible() {
    let params = params(64);
    let a = Emitter::new(7).emit(&params, [800.0, 600.0]);
    let b = Emitter::new(7).emit(&params, [800.0, 600.0]);
    let c = Emitter::new(8).emit(&params, [800.0, 600.0]);
    assert_eq!(a, b);
    assert_ne!(a.0, c.0);
}

#[test]
fn zero_sized_axis_collapses_to_origin() {
    let (boids, predator) = Emitter::new(3).emit(&params(10), [100.0, 0.0]);
    assert!(boids.iter().all(|b| b.pos[1] == 0.0));
    assert_eq!(predator.pos[1], 0.0);
}
