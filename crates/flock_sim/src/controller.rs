//! Flock controller.
//!
//! [`Flock`] owns the agent registry and runs the per-tick pipeline:
//!
//! 1. Materialise the registry and take the pivot temperature from the first
//!    element of that sequence.
//! 2. Partition pass: shade every non-highlighted agent cool or warm.
//! 3. Walk the registry links once. For every agent that is not highlighted:
//!    query neighbors, ask the steering strategy for a desired velocity,
//!    scale it by the drive factor, clamp it to the maximum speed and
//!    integrate it.
//! 4. Record one timing sample.
//!
//! A tick either completes for every agent or not at all: moves are journaled
//! and undone if a collaborator fails part-way through.

use std::time::{Duration, Instant};

use flock_agent::{Agent, AgentHandle, AgentId, AgentIdAllocator, AgentRegistry, Shade};
use flock_math::{Pose2D, Vec2, clamp_speed, sample_unit_disk, with_length};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::config::{FlockConfig, FlockParams, LoopConfig};
use crate::error::{ConfigError, FlockError, SteeringError};
use crate::highlight::apply_highlight;
use crate::partition::{PartitionSummary, classify_by_temperature, pivot_temperature};
use crate::spatial::{LinearScan, Neighbor, NeighborRequest, SpatialQuery};
use crate::steering::{Composite, SteeringStrategy};
use crate::telemetry::{FrameSample, NullTelemetry, TelemetrySink};

/// Whether ticks advance the flock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlockState {
    #[default]
    Stopped,
    Running,
}

/// Initial state of one agent to create.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSpawn {
    pub pose: Pose2D,
    pub temperature: f32,
}

/// What one call to [`Flock::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickReport {
    /// Tick counter after this call.
    pub tick_id: u64,
    /// `false` when the flock was stopped and nothing happened.
    pub ran: bool,
    /// Agents integrated this tick.
    pub moved: usize,
    /// Agents skipped because they are highlighted.
    pub skipped: usize,
    /// Neighbor entries handed to the steering strategy, summed over agents.
    pub neighbors_visited: usize,
    pub partition: PartitionSummary,
    pub fps: f32,
    /// Wall-clock time spent inside the tick.
    pub elapsed: Duration,
}

/// A flock of agents and the collaborators that move it.
pub struct Flock<S = Composite, Q = LinearScan, T = NullTelemetry> {
    config: FlockConfig,
    params: FlockParams,
    registry: AgentRegistry,
    ids: AgentIdAllocator,
    state: FlockState,
    highlighted: Option<AgentId>,
    rng: ChaCha8Rng,
    tick_id: u64,
    steering: S,
    spatial: Q,
    telemetry: T,
    /// Scratch buffer reused by every neighbor query.
    neighbors: Vec<Neighbor>,
    /// Pre-move state of every agent integrated in the current tick.
    journal: Vec<(AgentHandle, Pose2D, Vec2)>,
    /// Shades as they were before the current tick's partition pass.
    shades: Vec<(AgentHandle, Shade)>,
    /// `None` when the configured budget does not fit in a `Duration`.
    frame_budget: Option<Duration>,
}

impl Flock {
    /// A flock with the classic boids blend, a linear-scan neighbor query and
    /// no telemetry.
    ///
    /// # Errors
    ///
    /// Returns [`FlockError::Config`] if `config` does not validate.
    pub fn from_config(config: FlockConfig) -> Result<Self, FlockError> {
        Self::new(config, Composite::boids(), LinearScan::new(), NullTelemetry)
    }
}

impl<S, Q, T> Flock<S, Q, T>
where
    S: SteeringStrategy,
    Q: SpatialQuery,
    T: TelemetrySink,
{
    /// Build a stopped, empty flock.
    ///
    /// # Errors
    ///
    /// Returns [`FlockError::Config`] if `config` does not validate.
    pub fn new(config: FlockConfig, steering: S, spatial: Q, telemetry: T) -> Result<Self, FlockError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let frame_budget = Duration::try_from_secs_f32(config.frame_budget_ms / 1000.0).ok();
        Ok(Self {
            params: config.params(),
            registry: AgentRegistry::with_capacity(config.starting_count),
            config,
            ids: AgentIdAllocator::new(),
            state: FlockState::Stopped,
            highlighted: None,
            rng,
            tick_id: 0,
            steering,
            spatial,
            telemetry,
            neighbors: Vec::new(),
            journal: Vec::new(),
            shades: Vec::new(),
            frame_budget,
        })
    }

    #[must_use]
    pub fn config(&self) -> &FlockConfig {
        &self.config
    }

    #[must_use]
    pub fn params(&self) -> &FlockParams {
        &self.params
    }

    #[must_use]
    pub fn state(&self) -> FlockState {
        self.state
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == FlockState::Running
    }

    /// Number of ticks that have run.
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    /// Identity currently highlighted, if any.
    #[must_use]
    pub fn highlighted(&self) -> Option<AgentId> {
        self.highlighted
    }

    #[must_use]
    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    #[must_use]
    pub fn steering(&self) -> &S {
        &self.steering
    }

    #[must_use]
    pub fn spatial(&self) -> &Q {
        &self.spatial
    }

    #[must_use]
    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }

    /// Pure lookup; shades are left untouched.
    #[must_use]
    pub fn find(&self, id: AgentId) -> Option<&Agent> {
        self.registry.find(id)
    }

    /// All agents in registration order.
    #[must_use]
    pub fn agents(&self) -> Vec<&Agent> {
        self.registry.to_sequence()
    }

    /// Populate the flock with `count` agents and start it.
    ///
    /// Agents are placed uniformly in a disk whose radius grows with the
    /// population (`count * agent_density`), face a random direction, and
    /// draw a temperature from the configured range.
    ///
    /// # Errors
    ///
    /// See [`Flock::start_with`].
    pub fn start(&mut self, count: usize) -> Result<Vec<AgentId>, FlockError> {
        if self.is_running() {
            return Err(FlockError::AlreadyRunning);
        }
        let spread = count as f32 * self.config.agent_density;
        let [low, high] = self.config.temperature_range;

        let spawns: Vec<AgentSpawn> = (0..count)
            .map(|_| {
                let position = sample_unit_disk(&mut self.rng) * spread;
                let angle = self.rng.gen_range(0.0..360.0);
                AgentSpawn {
                    pose: Pose2D::from_position_angle(position, angle),
                    temperature: self.rng.gen_range(low..=high),
                }
            })
            .collect();
        self.start_with(spawns)
    }

    /// Populate the flock with explicit spawns and start it.
    ///
    /// A flock that was stopped with agents still registered is cleared
    /// first, so identities of the new population start again at the
    /// allocator's current value (0 after [`Flock::stop`]).
    ///
    /// # Errors
    ///
    /// Returns [`FlockError::AlreadyRunning`] if the flock is running and
    /// [`FlockError::EmptyPopulation`] if `spawns` is empty.
    pub fn start_with(
        &mut self,
        spawns: impl IntoIterator<Item = AgentSpawn>,
    ) -> Result<Vec<AgentId>, FlockError> {
        if self.is_running() {
            return Err(FlockError::AlreadyRunning);
        }
        let spawns: Vec<AgentSpawn> = spawns.into_iter().collect();
        if spawns.is_empty() {
            return Err(FlockError::EmptyPopulation);
        }

        if !self.registry.is_empty() {
            debug!(
                discarded = self.registry.len(),
                "clearing previous population"
            );
            self.registry.clear();
            self.highlighted = None;
        }

        let mut created = Vec::with_capacity(spawns.len());
        for spawn in spawns {
            let id = self.ids.allocate();
            self.registry
                .append(Agent::new(id, spawn.pose, spawn.temperature));
            created.push(id);
        }
        self.spatial.sync(&self.registry);
        self.state = FlockState::Running;

        info!(
            count = created.len(),
            next_id = self.ids.peek().id(),
            "flock started"
        );
        Ok(created)
    }

    /// Suspend ticking and restart identity numbering at zero.
    ///
    /// Registered agents stay addressable until the next start.
    pub fn stop(&mut self) {
        self.state = FlockState::Stopped;
        self.ids.reset();
        info!(agents = self.registry.len(), "flock stopped");
    }

    /// Advance the flock by `dt` seconds.
    ///
    /// Does nothing while stopped.
    ///
    /// # Errors
    ///
    /// Returns [`FlockError::Spatial`] or [`FlockError::Steering`] if a
    /// collaborator fails; every agent is then back where it was before the
    /// call and no telemetry is recorded.
    pub fn tick(&mut self, dt: f32) -> Result<TickReport, FlockError> {
        if !self.is_running() {
            return Ok(TickReport {
                tick_id: self.tick_id,
                ..TickReport::default()
            });
        }
        let started = Instant::now();

        self.snapshot_shades();
        let partition = match pivot_temperature(&self.registry.to_sequence()) {
            Some(pivot) => classify_by_temperature(&mut self.registry, pivot, self.highlighted),
            None => PartitionSummary::default(),
        };

        self.spatial.sync(&self.registry);
        self.journal.clear();
        let (moved, skipped, neighbors_visited) = match self.steer_all(dt) {
            Ok(counts) => counts,
            Err(err) => {
                self.rollback();
                warn!(tick_id = self.tick_id + 1, error = %err, "tick abandoned");
                return Err(err);
            }
        };
        self.tick_id += 1;

        let sample = FrameSample::from_delta(dt);
        if let Err(err) = self.telemetry.record(sample) {
            warn!(tick_id = self.tick_id, error = %err, "failed to record frame timing");
        }

        let elapsed = started.elapsed();
        if let Some(budget) = self.frame_budget.filter(|budget| elapsed > *budget) {
            warn!(
                tick_id = self.tick_id,
                elapsed_ms = elapsed.as_millis() as u64,
                budget_ms = budget.as_millis() as u64,
                "tick exceeded time budget"
            );
        }
        debug!(
            tick_id = self.tick_id,
            dt,
            moved,
            skipped,
            neighbors_visited,
            low = partition.low,
            high = partition.high,
            "tick complete"
        );

        Ok(TickReport {
            tick_id: self.tick_id,
            ran: true,
            moved,
            skipped,
            neighbors_visited,
            partition,
            fps: sample.fps,
            elapsed,
        })
    }

    /// Walk the registry links, steering and integrating each agent.
    fn steer_all(&mut self, dt: f32) -> Result<(usize, usize, usize), FlockError> {
        let (mut moved, mut skipped, mut visited) = (0, 0, 0);

        let mut cursor = self.registry.head_handle();
        while let Some(handle) = cursor {
            cursor = self.registry.next_handle(handle);
            let Some(agent) = self.registry.get(handle) else {
                continue;
            };
            let id = agent.id();
            if self.highlighted == Some(id) {
                skipped += 1;
                continue;
            }

            let request = NeighborRequest {
                origin: id,
                position: agent.position(),
                radius: self.params.neighbor_radius,
            };
            self.neighbors.clear();
            self.spatial
                .query(&self.registry, &request, &mut self.neighbors)
                .map_err(|source| FlockError::Spatial { agent: id, source })?;
            visited += self.neighbors.len();

            let desired = self
                .steering
                .calculate_move(agent, &self.neighbors, &self.params)
                .map_err(|source| FlockError::Steering { agent: id, source })?;
            if !desired.is_finite() {
                return Err(FlockError::Steering {
                    agent: id,
                    source: SteeringError::NonFinite {
                        x: desired.x,
                        y: desired.y,
                    },
                });
            }

            let scaled = desired * self.params.drive_factor;
            let velocity = if scaled.is_finite() {
                clamp_speed(scaled, self.params.max_speed, self.params.max_speed_sq)
            } else {
                // Scaling overflowed; a positive drive factor keeps the direction.
                with_length(desired, self.params.max_speed)
            };
            self.journal.push((handle, agent.pose(), agent.velocity()));

            if let Some(agent) = self.registry.get_mut(handle) {
                agent.integrate(velocity, dt);
                self.spatial.moved(id, agent.position());
                moved += 1;
            }
        }

        Ok((moved, skipped, visited))
    }

    fn snapshot_shades(&mut self) {
        self.shades.clear();
        let mut cursor = self.registry.head_handle();
        while let Some(handle) = cursor {
            if let Some(agent) = self.registry.get(handle) {
                self.shades.push((handle, agent.shade));
            }
            cursor = self.registry.next_handle(handle);
        }
    }

    /// Undo every move journaled in the current tick and the partition pass
    /// that preceded it.
    fn rollback(&mut self) {
        for (handle, pose, velocity) in self.journal.drain(..).rev() {
            if let Some(agent) = self.registry.get_mut(handle) {
                agent.restore(pose, velocity);
                self.spatial.moved(agent.id(), pose.position);
            }
        }
        for (handle, shade) in self.shades.drain(..) {
            if let Some(agent) = self.registry.get_mut(handle) {
                agent.shade = shade;
            }
        }
    }

    /// Highlight the agent with `id`, clearing any previous highlight.
    ///
    /// Returns the agent if it exists; otherwise the highlight is cleared and
    /// `None` is returned.
    pub fn search(&mut self, id: AgentId) -> Option<&Agent> {
        self.highlighted = apply_highlight(&mut self.registry, Some(id));
        match self.highlighted {
            Some(found) => {
                info!(agent_id = found.id(), "agent found and highlighted");
                self.registry.find(found)
            }
            None => {
                info!(agent_id = id.id(), "agent not found");
                None
            }
        }
    }

    /// Remove any highlight.
    pub fn clear_highlight(&mut self) {
        self.highlighted = apply_highlight(&mut self.registry, None);
    }

    /// Remove the agent with `id`. Returns `false` if there was none.
    pub fn delete(&mut self, id: AgentId) -> bool {
        if !self.registry.delete(id) {
            info!(agent_id = id.id(), "delete ignored, agent not found");
            return false;
        }
        self.spatial.removed(id);
        if self.highlighted == Some(id) {
            self.highlighted = None;
        }
        info!(agent_id = id.id(), remaining = self.registry.len(), "agent deleted");
        true
    }

    /// Set an agent's temperature. Returns `false` if there is no such agent.
    pub fn set_temperature(&mut self, id: AgentId, temperature: f32) -> bool {
        match self.registry.find_mut(id) {
            Some(agent) => {
                agent.temperature = temperature;
                true
            }
            None => false,
        }
    }

    /// Tick at a fixed rate until `max_ticks` have run or the flock stops.
    ///
    /// Each tick receives the wall-clock time since the previous tick began.
    /// A failed tick is logged and the loop carries on with the next one.
    /// Returns the number of ticks attempted.
    ///
    /// # Errors
    ///
    /// Returns [`FlockError::Config`] if `tick_rate` is not positive.
    pub fn run(&mut self, loop_config: &LoopConfig) -> Result<u64, FlockError> {
        let tick_duration = (loop_config.tick_rate.is_finite() && loop_config.tick_rate > 0.0)
            .then(|| Duration::try_from_secs_f64(1.0 / loop_config.tick_rate).ok())
            .flatten()
            .ok_or_else(|| ConfigError::Invalid {
                name: "tick_rate",
                reason: format!("must be finite and positive, got {}", loop_config.tick_rate),
            })?;
        let mut attempted = 0u64;
        let mut dt = tick_duration.as_secs_f32();

        info!(
            tick_rate = loop_config.tick_rate,
            max_ticks = loop_config.max_ticks,
            "starting frame loop"
        );

        while self.is_running() {
            let start = Instant::now();

            if let Err(err) = self.tick(dt) {
                warn!(error = %err, "tick failed, continuing");
            }
            attempted += 1;
            if loop_config.max_ticks > 0 && attempted >= loop_config.max_ticks {
                break;
            }

            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            }
            dt = start.elapsed().as_secs_f32();
        }

        info!(ticks = attempted, "frame loop complete");
        Ok(attempted)
    }
}

impl<S, Q, T> std::fmt::Debug for Flock<S, Q, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flock")
            .field("state", &self.state)
            .field("agents", &self.registry.len())
            .field("tick_id", &self.tick_id)
            .field("highlighted", &self.highlighted)
            .field("next_id", &self.ids.peek())
            .finish_non_exhaustive()
    }
}
