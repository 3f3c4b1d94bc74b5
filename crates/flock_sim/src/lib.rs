//! Flock simulation core.
//!
//! [`Flock`] owns an [`AgentRegistry`](flock_agent::AgentRegistry) and moves
//! it one tick at a time. Neighbor lookup ([`SpatialQuery`]), steering
//! ([`SteeringStrategy`]) and frame timing ([`TelemetrySink`]) are pluggable.

pub mod config;
pub mod controller;
pub mod error;
pub mod highlight;
pub mod partition;
pub mod spatial;
pub mod steering;
pub mod telemetry;

pub use config::{FlockConfig, FlockParams, LoopConfig};
pub use controller::{AgentSpawn, Flock, FlockState, TickReport};
pub use error::{ConfigError, FlockError, SpatialError, SteeringError, TelemetryError};
pub use partition::PartitionSummary;
pub use spatial::{
    LinearScan, Neighbor, NeighborAgent, NeighborRequest, Obstacle, SpatialQuery, UniformGrid,
};
pub use steering::{
    Alignment, Avoidance, Cohesion, Composite, NeighborFilter, StayInRadius, SteeringStrategy,
};
pub use telemetry::{CsvTelemetry, FrameSample, MemoryTelemetry, NullTelemetry, TelemetrySink};
