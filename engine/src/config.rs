//! Configuration types for the engine

use crate::core::entity::PoseTolerance;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Settings of the physics synchronization bridge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSyncConfig {
    /// Squared distance under which an inbound pose is considered unchanged
    pub position_epsilon_sq: f32,
    /// Inbound rotations match while `|dot| >= 1 - rotation_dot_epsilon`
    pub rotation_dot_epsilon: f32,
    /// Length of one simulation step in seconds
    pub fixed_timestep: f32,
    /// Cap on simulation steps per frame
    pub max_steps_per_frame: u32,
    pub gravity: Vec3,
}

impl Default for PhysicsSyncConfig {
    fn default() -> Self {
        let tolerance = PoseTolerance::default();
        Self {
            position_epsilon_sq: tolerance.position_epsilon_sq,
            rotation_dot_epsilon: tolerance.rotation_dot_epsilon,
            fixed_timestep: 1.0 / 60.0,
            max_steps_per_frame: 8,
            gravity: Vec3::new(0.0, -9.81, 0.0),
        }
    }
}

impl PhysicsSyncConfig {
    pub fn tolerance(&self) -> PoseTolerance {
        PoseTolerance {
            position_epsilon_sq: self.position_epsilon_sq,
            rotation_dot_epsilon: self.rotation_dot_epsilon,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub physics: PhysicsSyncConfig,
    /// Tracing filter directive; `None` uses `RUST_LOG` or the default
    pub log_filter: Option<String>,
}

impl EngineConfig {
    /// Load and validate a JSON configuration file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path.as_ref())?;
        let config: EngineConfig = serde_json::from_str(&json)?;
        config.validate()?;
        debug!(path = ?path.as_ref(), config = ?config, "Loaded engine config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let physics = &self.physics;
        if physics.fixed_timestep.is_nan() || physics.fixed_timestep <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "fixed_timestep must be positive, got {}",
                physics.fixed_timestep
            )));
        }
        if physics.max_steps_per_frame == 0 {
            return Err(ConfigError::Invalid(
                "max_steps_per_frame must be at least 1".to_string(),
            ));
        }
        if physics.position_epsilon_sq < 0.0 || physics.rotation_dot_epsilon < 0.0 {
            return Err(ConfigError::Invalid(
                "pose epsilons must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
