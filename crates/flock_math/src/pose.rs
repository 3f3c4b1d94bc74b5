//! 2-D pose of a single agent.
//!
//! [`Pose2D`] is the position plus a unit heading. The heading follows the
//! direction of travel: whenever an agent is moved with a non-zero velocity
//! its heading is re-pointed along that velocity.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Position and facing direction in the plane.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Pose2D {
    /// World-space position.
    pub position: Vec2,
    /// Unit vector the agent faces.
    pub heading: Vec2,
}

impl Pose2D {
    /// Origin, facing +Y.
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        heading: Vec2::Y,
    };

    /// Create a pose at `position` facing +Y.
    #[must_use]
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Create a pose at `position` rotated `degrees` counter-clockwise from +Y.
    #[must_use]
    pub fn from_position_angle(position: Vec2, degrees: f32) -> Self {
        let radians = degrees.to_radians();
        Self {
            position,
            heading: Vec2::new(-radians.sin(), radians.cos()),
        }
    }

    /// Advance the pose by `velocity` over `dt` seconds.
    ///
    /// A zero velocity leaves the heading untouched.
    #[must_use]
    pub fn advanced(mut self, velocity: Vec2, dt: f32) -> Self {
        if let Some(direction) = velocity.try_normalize() {
            self.heading = direction;
        }
        self.position += velocity * dt;
        self
    }
}

impl Default for Pose2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}
