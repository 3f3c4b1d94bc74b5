//! Error types for the flock controller and its collaborators.

use std::path::PathBuf;

use flock_agent::AgentId;

/// Rejected or unreadable configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A parameter is outside its valid range.
    #[error("invalid flock parameter `{name}`: {reason}")]
    Invalid {
        /// Parameter name as it appears in the config file.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config text is not valid JSON for [`FlockConfig`](crate::FlockConfig).
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failure reported by a [`SpatialQuery`](crate::SpatialQuery) backend.
#[derive(Debug, thiserror::Error)]
pub enum SpatialError {
    /// The query radius was negative or not finite.
    #[error("invalid query radius {0}")]
    InvalidRadius(f32),

    /// The backend has no record of the querying agent.
    #[error("{0} is not indexed")]
    NotIndexed(AgentId),

    /// Backend-specific failure.
    #[error("spatial backend failure: {0}")]
    Backend(String),
}

/// Failure reported by a [`SteeringStrategy`](crate::SteeringStrategy).
#[derive(Debug, thiserror::Error)]
pub enum SteeringError {
    /// The strategy produced NaN or infinite components.
    #[error("steering produced a non-finite move ({x}, {y})")]
    NonFinite { x: f32, y: f32 },

    /// Strategy-specific failure.
    #[error("steering failure: {0}")]
    Failed(String),
}

/// Failure writing a telemetry record.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The underlying writer failed.
    #[error("telemetry write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by [`Flock`](crate::Flock) operations.
#[derive(Debug, thiserror::Error)]
pub enum FlockError {
    /// Configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A start was requested with no agents to create.
    #[error("population must contain at least one agent")]
    EmptyPopulation,

    /// A start was requested while the flock is already running.
    #[error("flock is already running")]
    AlreadyRunning,

    /// The neighbor query for an agent failed; the tick was rolled back.
    #[error("neighbor query for {agent} failed: {source}")]
    Spatial {
        agent: AgentId,
        #[source]
        source: SpatialError,
    },

    /// Steering for an agent failed; the tick was rolled back.
    #[error("steering for {agent} failed: {source}")]
    Steering {
        agent: AgentId,
        #[source]
        source: SteeringError,
    },
}
