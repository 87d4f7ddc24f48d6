use std::time::{Duration, Instant};

use flock_params::{Boundary, ConfigError, SimulationParameters};
use glam::Vec2;
use rayon::prelude::*;

use crate::error::{QueryError, Result, SimError};
use crate::sim::neighbors::{within, BruteForce, NeighborQuery};
use crate::sim::{kernel, Boid, FrameView};

/// Outcome of one completed frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    /// Boids reset this frame because their new state was non-finite
    pub numeric_faults: usize,
    pub predator_fault: bool,
    pub elapsed: Duration,
}

impl FrameReport {
    pub fn total_faults(&self) -> usize {
        self.numeric_faults + usize::from(self.predator_fault)
    }
}

/// One side of the double buffer
#[derive(Debug, Clone)]
struct FrameBuffer {
    boids: Vec<Boid>,
    predator: Boid,
}

/// Double-buffered flock simulation.
///
/// Each [`advance`](Self::advance) reads only the current buffer, writes every boid's
/// next state into its own slot of the other buffer, then swaps. Because `advance`
/// takes `&mut self`, no reader can observe a half-written frame.
pub struct FlockSimulation<Q = BruteForce> {
    params: SimulationParameters,
    pending: Option<SimulationParameters>,
    current: FrameBuffer,
    next: FrameBuffer,
    query: Q,
    boundary: Boundary,
    world_size: Vec2,
    frame: u64,
}

impl FlockSimulation<BruteForce> {
    /// Create a simulation using brute-force neighbor search
    pub fn create(
        params: SimulationParameters,
        initial_boids: Vec<Boid>,
        initial_predator: Boid,
    ) -> Result<Self> {
        Self::with_query(params, initial_boids, initial_predator, BruteForce)
    }
}

impl<Q: NeighborQuery> FlockSimulation<Q> {
    pub fn with_query(
        params: SimulationParameters,
        initial_boids: Vec<Boid>,
        initial_predator: Boid,
        query: Q,
    ) -> Result<Self> {
        params.validate()?;
        check_count(&params, initial_boids.len())?;

        if let Some(index) = initial_boids.iter().position(|b| !b.is_finite()) {
            return Err(ConfigError::NonFiniteInitialState(format!("boid {}", index)).into());
        }
        if !initial_predator.is_finite() {
            return Err(ConfigError::NonFiniteInitialState("predator".to_string()).into());
        }

        let current = FrameBuffer {
            boids: initial_boids,
            predator: initial_predator,
        };
        log::debug!(
            "created flock of {} boids using {} neighbor search",
            current.boids.len(),
            query.name()
        );

        Ok(Self {
            params,
            pending: None,
            next: current.clone(),
            current,
            query,
            boundary: Boundary::Open,
            world_size: Vec2::ZERO,
            frame: 0,
        })
    }

    /// Confine boids and predator to a `[0, w] x [0, h]` world
    pub fn with_boundary(mut self, boundary: Boundary, world_size: [f32; 2]) -> Self {
        self.boundary = boundary;
        self.world_size = Vec2::from(world_size);
        self
    }

    /// Replace the parameters starting with the next [`advance`](Self::advance)
    pub fn set_parameters(
        &mut self,
        params: SimulationParameters,
    ) -> std::result::Result<(), ConfigError> {
        params.validate()?;
        check_count(&params, self.current.boids.len())?;
        self.pending = Some(params);
        Ok(())
    }

    /// Parameters the last frame ran with
    pub fn parameters(&self) -> &SimulationParameters {
        &self.params
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    pub fn query(&self) -> &Q {
        &self.query
    }

    pub fn current_state(&self) -> FrameView<'_> {
        FrameView {
            frame: self.frame,
            boids: &self.current.boids,
            predator: &self.current.predator,
        }
    }

    /// Run one frame of `dt`.
    ///
    /// On a neighbor query failure the frame is abandoned and the current state is
    /// left exactly as it was; parameters set since the last frame stay pending.
    pub fn advance(&mut self, dt: f32) -> Result<FrameReport> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(ConfigError::InvalidTimeStep(dt).into());
        }

        let start = Instant::now();
        let frame = self.frame + 1;
        // Pending parameters drive this frame but are committed only if it completes.
        let params = self.pending.unwrap_or(self.params);
        let boundary = self.boundary;
        let world_size = self.world_size;

        self.query
            .rebuild(&self.current.boids, params.query_radius())
            .map_err(|source| SimError::Query { frame, source })?;

        let current = &self.current.boids;
        let predator = self.current.predator;
        let query = &self.query;
        // The close set is a subset of the full set whenever the radii nest.
        let filter_close = params.separation_radius <= params.neighbor_radius;
        let separation_sq = params.separation_radius * params.separation_radius;

        let numeric_faults = self
            .next
            .boids
            .par_iter_mut()
            .enumerate()
            .map_init(
                || (Vec::<Boid>::new(), Vec::<Boid>::new()),
                |(full, close), (index, slot)| -> std::result::Result<usize, QueryError> {
                    let boid = &current[index];
                    query.neighbors_into(current, boid, params.neighbor_radius, index, full)?;
                    if filter_close {
                        close.clear();
                        let p = boid.position();
                        close.extend(full.iter().filter(|n| within(p, n, separation_sq)).copied());
                    } else {
                        query.neighbors_into(current, boid, params.separation_radius, index, close)?;
                    }

                    let mut next = kernel::step(boid, full, close, &predator, &params, dt);
                    next.apply_boundary(boundary, world_size);
                    if next.is_finite() {
                        *slot = next;
                        Ok(0)
                    } else {
                        *slot = Boid::new(boid.position(), Vec2::ZERO);
                        Ok(1)
                    }
                },
            )
            .try_reduce(|| 0, |a, b| Ok(a + b))
            .map_err(|source| SimError::Query { frame, source })?;

        let mut next_predator =
            kernel::step_predator(&predator, kernel::centroid(current), &params, dt);
        next_predator.apply_boundary(boundary, world_size);
        let predator_fault = !next_predator.is_finite();
        self.next.predator = if predator_fault {
            Boid::new(predator.position(), Vec2::ZERO)
        } else {
            next_predator
        };

        if let Some(pending) = self.pending.take() {
            log::debug!("applied new parameters at frame {}", frame);
            self.params = pending;
        }
        std::mem::swap(&mut self.current, &mut self.next);
        self.frame = frame;

        let report = FrameReport {
            frame,
            numeric_faults,
            predator_fault,
            elapsed: start.elapsed(),
        };
        if report.total_faults() > 0 {
            log::warn!(
                "frame {}: reset {} boid(s) with non-finite state{}",
                frame,
                numeric_faults,
                if predator_fault { " and the predator" } else { "" }
            );
        }
        log::trace!("frame {} done in {:?}", frame, report.elapsed);
        Ok(report)
    }
}

fn check_count(params: &SimulationParameters, actual: usize) -> std::result::Result<(), ConfigError> {
    if actual != params.particle_count as usize {
        Err(ConfigError::ParticleCountMismatch {
            expected: params.particle_count,
            actual,
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(count: u32) -> SimulationParameters {
        SimulationParameters {
            particle_count: count,
            ..Default::default()
        }
    }

    #[test]
    fn create_rejects_count_mismatch() {
        let err = FlockSimulation::create(params(3), vec![Boid::default(); 2], Boid::default())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            SimError::Config(ConfigError::ParticleCountMismatch { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn create_rejects_non_finite_state() {
        let mut boids = vec![Boid::default(); 2];
        boids[1].pos[0] = f32::NAN;
        let err = FlockSimulation::create(params(2), boids, Boid::default())
            .err()
            .unwrap();
        assert!(matches!(err, SimError::Config(ConfigError::NonFiniteInitialState(_))));
    }

    #[test]
    fn invalid_dt_leaves_state_alone() {
        let boids = vec![Boid::new(Vec2::ZERO, Vec2::X * 100.0)];
        let mut sim = FlockSimulation::create(params(1), boids.clone(), Boid::default()).unwrap();
        assert!(sim.advance(f32::NAN).is_err());
        assert!(sim.advance(-1.0).is_err());
        assert_eq!(sim.frame(), 0);
        assert_eq!(sim.current_state().boids, boids.as_slice());
    }

    #[test]
    fn zero_dt_still_clamps_speed() {
        let boids = vec![Boid::new(Vec2::new(5.0, 5.0), Vec2::ZERO)];
        let predator = Boid::new(Vec2::splat(1e4), Vec2::ZERO);
        let mut sim = FlockSimulation::create(params(1), boids, predator).unwrap();
        sim.advance(0.0).unwrap();
        let state = sim.current_state();
        assert_eq!(state.boids[0].position(), Vec2::new(5.0, 5.0));
        assert_eq!(state.boids[0].speed(), sim.parameters().min_speed);
    }
}
