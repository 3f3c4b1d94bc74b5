//! Flock configuration.
//!
//! [`FlockConfig`] carries the plain numeric knobs of a flock. It is read-only
//! to the controller once a [`Flock`](crate::Flock) is built; the squared
//! thresholds used in the hot loop are derived once into [`FlockParams`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunable parameters of a flock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockConfig {
    /// Agents created by [`Flock::start`](crate::Flock::start) when no count
    /// is given explicitly.
    pub starting_count: usize,
    /// Multiplier applied to every steering output before clamping.
    pub drive_factor: f32,
    /// Upper bound on the applied speed.
    pub max_speed: f32,
    /// Distance within which other entities influence steering.
    pub neighbor_radius: f32,
    /// Fraction of `neighbor_radius` inside which neighbors are avoided.
    pub avoidance_radius_multiplier: f32,
    /// Spawn disk radius per agent: the disk grows with the population.
    pub agent_density: f32,
    /// Inclusive range initial temperatures are drawn from.
    pub temperature_range: [f32; 2],
    /// RNG seed for spawning; `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Wall-clock budget per tick in milliseconds. Overruns are logged.
    pub frame_budget_ms: f32,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            starting_count: 250,
            drive_factor: 10.0,
            max_speed: 5.0,
            neighbor_radius: 1.5,
            avoidance_radius_multiplier: 0.5,
            agent_density: 0.08,
            temperature_range: [15.0, 35.0],
            seed: None,
            frame_budget_ms: 1000.0 / 60.0,
        }
    }
}

impl FlockConfig {
    /// Parse a JSON config and validate it. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`FlockConfig::from_json_str`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Check every parameter.
    ///
    /// # Errors
    ///
    /// Returns the first offending parameter as [`ConfigError::Invalid`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.starting_count == 0 {
            return Err(invalid("starting_count", "must be at least 1"));
        }
        positive("drive_factor", self.drive_factor)?;
        positive("max_speed", self.max_speed)?;
        positive("agent_density", self.agent_density)?;
        if !self.neighbor_radius.is_finite() || self.neighbor_radius < 0.0 {
            return Err(invalid(
                "neighbor_radius",
                format!("must be finite and non-negative, got {}", self.neighbor_radius),
            ));
        }
        if !(0.0..=1.0).contains(&self.avoidance_radius_multiplier) {
            return Err(invalid(
                "avoidance_radius_multiplier",
                format!("must lie in [0, 1], got {}", self.avoidance_radius_multiplier),
            ));
        }
        let [low, high] = self.temperature_range;
        if !low.is_finite() || !high.is_finite() || low > high {
            return Err(invalid(
                "temperature_range",
                format!("must be a finite [low, high] pair, got [{low}, {high}]"),
            ));
        }
        positive("frame_budget_ms", self.frame_budget_ms)?;
        Ok(())
    }

    /// Derive the per-tick constants.
    #[must_use]
    pub fn params(&self) -> FlockParams {
        let neighbor_radius_sq = self.neighbor_radius * self.neighbor_radius;
        FlockParams {
            drive_factor: self.drive_factor,
            max_speed: self.max_speed,
            max_speed_sq: self.max_speed * self.max_speed,
            neighbor_radius: self.neighbor_radius,
            neighbor_radius_sq,
            avoidance_radius_sq: neighbor_radius_sq
                * self.avoidance_radius_multiplier
                * self.avoidance_radius_multiplier,
        }
    }
}

/// Shared, precomputed parameters handed to steering strategies each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlockParams {
    pub drive_factor: f32,
    pub max_speed: f32,
    pub max_speed_sq: f32,
    pub neighbor_radius: f32,
    pub neighbor_radius_sq: f32,
    pub avoidance_radius_sq: f32,
}

/// Configuration for the fixed-rate frame loop.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 0,
        }
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        name,
        reason: reason.into(),
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(name, format!("must be finite and positive, got {value}")))
    }
}
