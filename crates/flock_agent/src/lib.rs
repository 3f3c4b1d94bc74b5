//! # flock_agent
//!
//! The agents ("drones") of the flock and the registry that owns them.
//!
//! This crate provides:
//!
//! - [`AgentId`]: monotonically assigned agent identity.
//! - [`AgentIdAllocator`]: the identity counter, resettable between sessions.
//! - [`Agent`]: pose, last applied velocity, temperature, and display shade.
//! - [`AgentRegistry`]: generational slot storage with insertion-ordered
//!   links and an identity index.

pub mod agent;
pub mod id;
pub mod registry;

pub use agent::{Agent, Shade};
pub use id::{AgentId, AgentIdAllocator};
pub use registry::{AgentHandle, AgentRegistry};
