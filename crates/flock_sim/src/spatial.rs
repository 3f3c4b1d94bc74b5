//! Neighbor queries.
//!
//! The controller asks a [`SpatialQuery`] backend, once per agent per tick,
//! for everything within the neighbor radius of that agent. Backends answer
//! against the registry as it is at the moment of the call, so agents moved
//! earlier in the same tick are seen at their new positions.
//!
//! Results are owned snapshots ([`Neighbor`]); nothing handed to a steering
//! strategy borrows from the registry.

use std::collections::HashMap;

use flock_agent::{AgentId, AgentRegistry};
use flock_math::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::SpatialError;

/// A circular static obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub position: Vec2,
    pub radius: f32,
}

/// Read-only view of a neighboring agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborAgent {
    pub id: AgentId,
    pub position: Vec2,
    pub heading: Vec2,
    pub velocity: Vec2,
}

/// Something found near the querying agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Neighbor {
    Agent(NeighborAgent),
    Obstacle(Obstacle),
}

impl Neighbor {
    /// Position of the neighbor's centre.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        match self {
            Self::Agent(a) => a.position,
            Self::Obstacle(o) => o.position,
        }
    }

    /// Returns the agent view, if this neighbor is an agent.
    #[must_use]
    pub fn as_agent(&self) -> Option<&NeighborAgent> {
        match self {
            Self::Agent(a) => Some(a),
            Self::Obstacle(_) => None,
        }
    }
}

/// One neighbor lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborRequest {
    /// The querying agent, excluded from the results.
    pub origin: AgentId,
    pub position: Vec2,
    pub radius: f32,
}

/// A spatial index the controller consults for neighbor sets.
pub trait SpatialQuery {
    /// Called once at the start of every tick, before any query.
    fn sync(&mut self, _registry: &AgentRegistry) {}

    /// Called after the controller moves an agent.
    fn moved(&mut self, _id: AgentId, _position: Vec2) {}

    /// Called after an agent leaves the registry.
    fn removed(&mut self, _id: AgentId) {}

    /// Append every entity within `request.radius` of `request.position`,
    /// other than the origin agent, to `out`.
    ///
    /// # Errors
    ///
    /// Backends return [`SpatialError`] when they cannot answer; the
    /// controller then abandons the whole tick.
    fn query(
        &self,
        registry: &AgentRegistry,
        request: &NeighborRequest,
        out: &mut Vec<Neighbor>,
    ) -> Result<(), SpatialError>;
}

/// Checks every agent and obstacle on each query.
#[derive(Debug, Clone, Default)]
pub struct LinearScan {
    obstacles: Vec<Obstacle>,
}

impl LinearScan {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_obstacles(obstacles: Vec<Obstacle>) -> Self {
        Self { obstacles }
    }
}

impl SpatialQuery for LinearScan {
    fn query(
        &self,
        registry: &AgentRegistry,
        request: &NeighborRequest,
        out: &mut Vec<Neighbor>,
    ) -> Result<(), SpatialError> {
        if !check_radius(request.radius)? {
            return Ok(());
        }
        let radius_sq = request.radius * request.radius;

        for agent in registry {
            if agent.id() == request.origin {
                continue;
            }
            if agent.position().distance_squared(request.position) <= radius_sq {
                out.push(Neighbor::Agent(snapshot(agent)));
            }
        }
        push_obstacles(&self.obstacles, request, out);
        Ok(())
    }
}

type Cell = (i32, i32);

/// Uniform bucket grid over agent positions.
///
/// Buckets are rebuilt in [`sync`](SpatialQuery::sync) and kept current
/// through [`moved`](SpatialQuery::moved) and
/// [`removed`](SpatialQuery::removed), so queries later in a tick see agents
/// in the cells they have moved into.
#[derive(Debug, Clone)]
pub struct UniformGrid {
    cell_size: f32,
    cells: HashMap<Cell, Vec<AgentId>>,
    cell_of: HashMap<AgentId, Cell>,
    obstacles: Vec<Obstacle>,
}

const MIN_CELL_SIZE: f32 = 1.0e-3;

impl UniformGrid {
    /// Create a grid with the given cell edge length.
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() {
            cell_size.max(MIN_CELL_SIZE)
        } else {
            MIN_CELL_SIZE
        };
        Self {
            cell_size,
            cells: HashMap::new(),
            cell_of: HashMap::new(),
            obstacles: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_obstacles(mut self, obstacles: Vec<Obstacle>) -> Self {
        self.obstacles = obstacles;
        self
    }

    #[must_use]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of agents currently bucketed.
    #[must_use]
    pub fn indexed(&self) -> usize {
        self.cell_of.len()
    }

    fn cell(&self, position: Vec2) -> Cell {
        (
            (position.x / self.cell_size).floor() as i32,
            (position.y / self.cell_size).floor() as i32,
        )
    }

    fn insert(&mut self, id: AgentId, cell: Cell) {
        self.cells.entry(cell).or_default().push(id);
        self.cell_of.insert(id, cell);
    }

    fn evict(&mut self, id: AgentId, cell: Cell) {
        if let Some(bucket) = self.cells.get_mut(&cell) {
            bucket.retain(|&other| other != id);
            if bucket.is_empty() {
                self.cells.remove(&cell);
            }
        }
    }
}

impl SpatialQuery for UniformGrid {
    fn sync(&mut self, registry: &AgentRegistry) {
        self.cells.clear();
        self.cell_of.clear();
        for agent in registry {
            let cell = self.cell(agent.position());
            self.insert(agent.id(), cell);
        }
    }

    fn moved(&mut self, id: AgentId, position: Vec2) {
        let cell = self.cell(position);
        match self.cell_of.get(&id).copied() {
            Some(old) if old == cell => {}
            Some(old) => {
                self.evict(id, old);
                self.insert(id, cell);
            }
            None => self.insert(id, cell),
        }
    }

    fn removed(&mut self, id: AgentId) {
        if let Some(cell) = self.cell_of.remove(&id) {
            self.evict(id, cell);
        }
    }

    fn query(
        &self,
        registry: &AgentRegistry,
        request: &NeighborRequest,
        out: &mut Vec<Neighbor>,
    ) -> Result<(), SpatialError> {
        if !check_radius(request.radius)? {
            return Ok(());
        }
        if registry.contains(request.origin) && !self.cell_of.contains_key(&request.origin) {
            return Err(SpatialError::NotIndexed(request.origin));
        }
        let radius_sq = request.radius * request.radius;
        // Float-to-int casts saturate, so `reach` and the cell are in range.
        let reach = (request.radius / self.cell_size).ceil() as i32;
        let (cx, cy) = self.cell(request.position);

        let side = 2 * u64::from(reach.unsigned_abs()) + 1;
        if side.saturating_mul(side) > (self.cells.len() as u64).max(FULL_SCAN_CELLS) {
            for bucket in self.cells.values() {
                collect_bucket(bucket, registry, request, radius_sq, out)?;
            }
        } else {
            for y in cy.saturating_sub(reach)..=cy.saturating_add(reach) {
                for x in cx.saturating_sub(reach)..=cx.saturating_add(reach) {
                    if let Some(bucket) = self.cells.get(&(x, y)) {
                        collect_bucket(bucket, registry, request, radius_sq, out)?;
                    }
                }
            }
        }
        push_obstacles(&self.obstacles, request, out);
        Ok(())
    }
}

/// Window size, in cells, above which a query visits occupied buckets
/// directly instead of walking its cell window.
const FULL_SCAN_CELLS: u64 = 1024;

fn collect_bucket(
    bucket: &[AgentId],
    registry: &AgentRegistry,
    request: &NeighborRequest,
    radius_sq: f32,
    out: &mut Vec<Neighbor>,
) -> Result<(), SpatialError> {
    for &id in bucket {
        if id == request.origin {
            continue;
        }
        let agent = registry
            .find(id)
            .ok_or_else(|| SpatialError::Backend(format!("{id} is bucketed but not registered")))?;
        if agent.position().distance_squared(request.position) <= radius_sq {
            out.push(Neighbor::Agent(snapshot(agent)));
        }
    }
    Ok(())
}

/// `Ok(false)` for a zero radius, which never matches anything.
fn check_radius(radius: f32) -> Result<bool, SpatialError> {
    if !radius.is_finite() || radius < 0.0 {
        return Err(SpatialError::InvalidRadius(radius));
    }
    Ok(radius > 0.0)
}

fn snapshot(agent: &flock_agent::Agent) -> NeighborAgent {
    NeighborAgent {
        id: agent.id(),
        position: agent.position(),
        heading: agent.heading(),
        velocity: agent.velocity(),
    }
}

fn push_obstacles(obstacles: &[Obstacle], request: &NeighborRequest, out: &mut Vec<Neighbor>) {
    for obstacle in obstacles {
        let reach = request.radius + obstacle.radius;
        if obstacle.position.distance_squared(request.position) <= reach * reach {
            out.push(Neighbor::Obstacle(*obstacle));
        }
    }
}
