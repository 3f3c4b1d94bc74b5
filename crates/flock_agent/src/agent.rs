//! A single simulated drone.

use flock_math::{Pose2D, Vec2};
use serde::{Deserialize, Serialize};

use crate::id::AgentId;

/// Cosmetic display state of an agent.
///
/// Renderers map these to colours; the simulation itself never reads them
/// back for steering decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shade {
    /// Unclassified (white).
    #[default]
    Default,
    /// The operator-selected agent (yellow).
    Highlighted,
    /// Temperature at or below the frame's pivot (blue).
    Cool,
    /// Temperature above the frame's pivot (red).
    Warm,
}

/// One autonomous agent of the flock.
///
/// Pose and velocity change only through [`Agent::integrate`], which the flock
/// controller calls once per tick. Temperature is owned by whatever
/// environment model drives it and may be written at any time between ticks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    id: AgentId,
    pose: Pose2D,
    velocity: Vec2,
    /// Scalar read by the partition pass.
    pub temperature: f32,
    /// Current display state.
    pub shade: Shade,
}

impl Agent {
    /// Create an agent at rest.
    #[must_use]
    pub fn new(id: AgentId, pose: Pose2D, temperature: f32) -> Self {
        Self {
            id,
            pose,
            velocity: Vec2::ZERO,
            temperature,
            shade: Shade::Default,
        }
    }

    #[must_use]
    pub fn id(&self) -> AgentId {
        self.id
    }

    #[must_use]
    pub fn pose(&self) -> Pose2D {
        self.pose
    }

    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.pose.position
    }

    #[must_use]
    pub fn heading(&self) -> Vec2 {
        self.pose.heading
    }

    /// Velocity applied by the most recent [`integrate`](Self::integrate).
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Move the agent with `velocity` for `dt` seconds.
    pub fn integrate(&mut self, velocity: Vec2, dt: f32) {
        self.velocity = velocity;
        self.pose = self.pose.advanced(velocity, dt);
    }

    /// Put pose and velocity back to an earlier state.
    pub fn restore(&mut self, pose: Pose2D, velocity: Vec2) {
        self.pose = pose;
        self.velocity = velocity;
    }
}
