//! Steering strategies.
//!
//! A [`SteeringStrategy`] turns one agent and its neighbor set into a desired
//! velocity. The controller scales that by the drive factor and clamps it to
//! the maximum speed; strategies only decide direction and relative strength.
//!
//! The classic boids rules ship here as separate strategies and are blended
//! with [`Composite`]. Any `Fn(&Agent, &[Neighbor], &FlockParams)` closure is
//! also a strategy.

use flock_agent::Agent;
use flock_math::{Vec2, with_length};

use crate::config::FlockParams;
use crate::error::SteeringError;
use crate::spatial::Neighbor;

/// Computes the desired velocity of one agent.
///
/// Implementations must not keep references to the agent or neighbors past
/// the call, and must be safe to call once per agent per tick.
pub trait SteeringStrategy {
    /// # Errors
    ///
    /// Returns [`SteeringError`] if no move can be produced; the controller
    /// then abandons the whole tick.
    fn calculate_move(
        &self,
        agent: &Agent,
        neighbors: &[Neighbor],
        params: &FlockParams,
    ) -> Result<Vec2, SteeringError>;
}

impl<F> SteeringStrategy for F
where
    F: Fn(&Agent, &[Neighbor], &FlockParams) -> Result<Vec2, SteeringError>,
{
    fn calculate_move(
        &self,
        agent: &Agent,
        neighbors: &[Neighbor],
        params: &FlockParams,
    ) -> Result<Vec2, SteeringError> {
        self(agent, neighbors, params)
    }
}

/// Which neighbors a rule looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NeighborFilter {
    #[default]
    All,
    Agents,
    Obstacles,
}

impl NeighborFilter {
    fn admits(self, neighbor: &Neighbor) -> bool {
        match (self, neighbor) {
            (Self::All, _) => true,
            (Self::Agents, Neighbor::Agent(_)) => true,
            (Self::Obstacles, Neighbor::Obstacle(_)) => true,
            _ => false,
        }
    }
}

/// Steer toward the average position of neighboring agents.
#[derive(Debug, Clone, Copy)]
pub struct Cohesion {
    pub filter: NeighborFilter,
}

impl Default for Cohesion {
    fn default() -> Self {
        Self {
            filter: NeighborFilter::Agents,
        }
    }
}

impl SteeringStrategy for Cohesion {
    fn calculate_move(
        &self,
        agent: &Agent,
        neighbors: &[Neighbor],
        _params: &FlockParams,
    ) -> Result<Vec2, SteeringError> {
        let (sum, count) = neighbors
            .iter()
            .filter(|n| self.filter.admits(n))
            .fold((Vec2::ZERO, 0u32), |(sum, count), n| (sum + n.position(), count + 1));
        if count == 0 {
            return Ok(Vec2::ZERO);
        }
        Ok(sum / count as f32 - agent.position())
    }
}

/// Match the average heading of neighboring agents.
///
/// With nobody to align to, the agent keeps its own heading.
#[derive(Debug, Clone, Copy, Default)]
pub struct Alignment;

impl SteeringStrategy for Alignment {
    fn calculate_move(
        &self,
        agent: &Agent,
        neighbors: &[Neighbor],
        _params: &FlockParams,
    ) -> Result<Vec2, SteeringError> {
        let (sum, count) = neighbors
            .iter()
            .filter_map(Neighbor::as_agent)
            .fold((Vec2::ZERO, 0u32), |(sum, count), n| (sum + n.heading, count + 1));
        if count == 0 {
            return Ok(agent.heading());
        }
        Ok(sum / count as f32)
    }
}

/// Move away from anything inside the avoidance radius.
#[derive(Debug, Clone, Copy, Default)]
pub struct Avoidance {
    pub filter: NeighborFilter,
}

impl SteeringStrategy for Avoidance {
    fn calculate_move(
        &self,
        agent: &Agent,
        neighbors: &[Neighbor],
        params: &FlockParams,
    ) -> Result<Vec2, SteeringError> {
        let position = agent.position();
        let (sum, count) = neighbors
            .iter()
            .filter(|n| self.filter.admits(n))
            .filter(|n| n.position().distance_squared(position) < params.avoidance_radius_sq)
            .fold((Vec2::ZERO, 0u32), |(sum, count), n| {
                (sum + (position - n.position()), count + 1)
            });
        if count == 0 {
            return Ok(Vec2::ZERO);
        }
        Ok(sum / count as f32)
    }
}

/// Pull agents back once they drift toward the edge of a circular area.
#[derive(Debug, Clone, Copy)]
pub struct StayInRadius {
    pub center: Vec2,
    pub radius: f32,
}

/// Fraction of the radius inside which no pull is applied.
const STAY_IN_RADIUS_SLACK: f32 = 0.9;

impl SteeringStrategy for StayInRadius {
    fn calculate_move(
        &self,
        agent: &Agent,
        _neighbors: &[Neighbor],
        _params: &FlockParams,
    ) -> Result<Vec2, SteeringError> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(SteeringError::Failed(format!(
                "stay-in-radius needs a positive radius, got {}",
                self.radius
            )));
        }
        let offset = self.center - agent.position();
        let t = offset.length() / self.radius;
        if t < STAY_IN_RADIUS_SLACK {
            return Ok(Vec2::ZERO);
        }
        Ok(offset * t * t)
    }
}

/// Weighted blend of several strategies.
///
/// Each partial move is scaled by its weight and then limited to a magnitude
/// of that weight, so no single rule can swamp the others.
#[derive(Default)]
pub struct Composite {
    rules: Vec<(Box<dyn SteeringStrategy>, f32)>,
}

impl Composite {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Avoidance, alignment and cohesion with avoidance weighted highest.
    #[must_use]
    pub fn boids() -> Self {
        Self::new()
            .with(Avoidance::default(), 2.0)
            .with(Alignment, 1.0)
            .with(Cohesion::default(), 1.0)
    }

    /// Add a rule with the given weight.
    #[must_use]
    pub fn with(mut self, rule: impl SteeringStrategy + 'static, weight: f32) -> Self {
        self.rules.push((Box::new(rule), weight));
        self
    }

    /// Number of blended rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl std::fmt::Debug for Composite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composite")
            .field("weights", &self.rules.iter().map(|(_, w)| *w).collect::<Vec<_>>())
            .finish()
    }
}

impl SteeringStrategy for Composite {
    fn calculate_move(
        &self,
        agent: &Agent,
        neighbors: &[Neighbor],
        params: &FlockParams,
    ) -> Result<Vec2, SteeringError> {
        let mut total = Vec2::ZERO;
        for (rule, weight) in &self.rules {
            let raw = rule.calculate_move(agent, neighbors, params)?;
            let partial = raw * *weight;
            if partial.length_squared() > weight * weight {
                // Rescale the raw move: `partial` itself may have overflowed.
                total += with_length(raw, *weight);
            } else {
                total += partial;
            }
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use flock_agent::AgentId;
    use flock_math::Pose2D;

    use super::*;
    use crate::config::FlockConfig;
    use crate::spatial::{NeighborAgent, Obstacle};

    fn params() -> FlockParams {
        FlockConfig::default().params()
    }

    fn agent_at(x: f32, y: f32) -> Agent {
        Agent::new(AgentId(0), Pose2D::from_position(Vec2::new(x, y)), 0.0)
    }

    fn neighbor(id: u64, x: f32, y: f32, heading: Vec2) -> Neighbor {
        Neighbor::Agent(NeighborAgent {
            id: AgentId(id),
            position: Vec2::new(x, y),
            heading,
            velocity: Vec2::ZERO,
        })
    }

    #[test]
    fn test_cohesion_points_at_centroid() {
        let agent = agent_at(0.0, 0.0);
        let neighbors = [neighbor(1, 2.0, 0.0, Vec2::Y), neighbor(2, 0.0, 2.0, Vec2::Y)];
        let v = Cohesion::default()
            .calculate_move(&agent, &neighbors, &params())
            .unwrap();
        assert_eq!(v, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_cohesion_ignores_obstacles_by_default() {
        let agent = agent_at(0.0, 0.0);
        let neighbors = [Neighbor::Obstacle(Obstacle {
            position: Vec2::new(1.0, 0.0),
            radius: 0.5,
        })];
        let v = Cohesion::default()
            .calculate_move(&agent, &neighbors, &params())
            .unwrap();
        assert_eq!(v, Vec2::ZERO);
    }

    #[test]
    fn test_alignment_without_neighbors_keeps_heading() {
        let agent = Agent::new(AgentId(0), Pose2D::from_position_angle(Vec2::ZERO, 90.0), 0.0);
        let v = Alignment.calculate_move(&agent, &[], &params()).unwrap();
        assert_eq!(v, agent.heading());
    }

    #[test]
    fn test_alignment_averages_headings() {
        let agent = agent_at(0.0, 0.0);
        let neighbors = [neighbor(1, 1.0, 0.0, Vec2::X), neighbor(2, 0.0, 1.0, Vec2::Y)];
        let v = Alignment.calculate_move(&agent, &neighbors, &params()).unwrap();
        assert_eq!(v, Vec2::new(0.5, 0.5));
    }

    #[test]
    fn test_avoidance_only_counts_close_neighbors() {
        // avoidance radius² = 2.25 * 0.25 = 0.5625
        let agent = agent_at(0.0, 0.0);
        let neighbors = [neighbor(1, 0.5, 0.0, Vec2::Y), neighbor(2, 0.0, 1.0, Vec2::Y)];
        let v = Avoidance::default()
            .calculate_move(&agent, &neighbors, &params())
            .unwrap();
        assert_eq!(v, Vec2::new(-0.5, 0.0));
    }

    #[test]
    fn test_stay_in_radius_inside_slack_is_zero() {
        let rule = StayInRadius {
            center: Vec2::ZERO,
            radius: 10.0,
        };
        let v = rule.calculate_move(&agent_at(5.0, 0.0), &[], &params()).unwrap();
        assert_eq!(v, Vec2::ZERO);
        let v = rule.calculate_move(&agent_at(10.0, 0.0), &[], &params()).unwrap();
        assert_eq!(v, Vec2::new(-10.0, 0.0));
    }

    #[test]
    fn test_stay_in_radius_rejects_bad_radius() {
        let rule = StayInRadius {
            center: Vec2::ZERO,
            radius: 0.0,
        };
        assert!(rule.calculate_move(&agent_at(1.0, 0.0), &[], &params()).is_err());
    }

    #[test]
    fn test_composite_limits_each_partial_to_weight() {
        let far = |_: &Agent, _: &[Neighbor], _: &FlockParams| -> Result<Vec2, SteeringError> {
            Ok(Vec2::new(100.0, 0.0))
        };
        let small = |_: &Agent, _: &[Neighbor], _: &FlockParams| -> Result<Vec2, SteeringError> {
            Ok(Vec2::new(0.0, 0.1))
        };
        let composite = Composite::new().with(far, 2.0).with(small, 1.0);
        let v = composite
            .calculate_move(&agent_at(0.0, 0.0), &[], &params())
            .unwrap();
        assert!((v - Vec2::new(2.0, 0.1)).length() < 1e-5);
        assert_eq!(composite.len(), 2);
    }

    #[test]
    fn test_composite_caps_huge_partial_at_weight() {
        let huge = |_: &Agent, _: &[Neighbor], _: &FlockParams| -> Result<Vec2, SteeringError> {
            Ok(Vec2::new(0.0, -1e20))
        };
        let composite = Composite::new().with(huge, 1.5).with(Alignment, 1.0);
        let agent = Agent::new(AgentId(0), Pose2D::from_position_angle(Vec2::ZERO, -90.0), 0.0);
        let v = composite.calculate_move(&agent, &[], &params()).unwrap();
        // Capped partial (0, -1.5) plus the agent's own heading (1, 0).
        assert!((v - Vec2::new(1.0, -1.5)).length() < 1e-5);
    }

    #[test]
    fn test_composite_propagates_rule_failure() {
        let broken = |_: &Agent, _: &[Neighbor], _: &FlockParams| -> Result<Vec2, SteeringError> {
            Err(SteeringError::Failed("broken rule".to_string()))
        };
        let composite = Composite::new().with(Alignment, 1.0).with(broken, 1.0);
        assert!(composite
            .calculate_move(&agent_at(0.0, 0.0), &[], &params())
            .is_err());
    }
}
