//! # flock_math
//!
//! 2-D math for the flock simulation. Re-exports [`glam`] for linear algebra
//! and defines the agent pose plus the speed and spawn helpers shared by the
//! controller.

pub mod pose;
pub mod speed;

// Re-export glam types for convenience.
pub use glam::Vec2;

pub use pose::Pose2D;
pub use speed::{clamp_speed, sample_unit_disk, with_length};
