//! Streaming parameters shared by the world controller and its host.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected streaming configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A per-tick budget of zero would stall the pipeline forever.
    #[error("{field} must be at least 1")]
    ZeroBudget {
        /// Name of the offending field.
        field: &'static str,
    },
    /// Radii are measured in chunks and cannot be negative.
    #[error("{field} must not be negative (got {value})")]
    NegativeRadius {
        /// Name of the offending field.
        field: &'static str,
        /// Value that was supplied.
        value: i32,
    },
}

/// Per-tick budgets and radii for chunk streaming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Chebyshev radius, in chunks, of the needed set around the viewer.
    pub view_radius: i32,
    /// Chunks generated per tick.
    pub max_generations_per_tick: usize,
    /// Meshes rebuilt per tick.
    pub max_mesh_rebuilds_per_tick: usize,
    /// Extra radius beyond `view_radius` within which unclaimed deferred writes are kept.
    pub pending_retention_margin: i32,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            view_radius: 4,
            max_generations_per_tick: 1,
            max_mesh_rebuilds_per_tick: 2,
            pending_retention_margin: 2,
        }
    }
}

impl StreamingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.view_radius < 0 {
            return Err(ConfigError::NegativeRadius {
                field: "view_radius",
                value: self.view_radius,
            });
        }
        if self.pending_retention_margin < 0 {
            return Err(ConfigError::NegativeRadius {
                field: "pending_retention_margin",
                value: self.pending_retention_margin,
            });
        }
        if self.max_generations_per_tick == 0 {
            return Err(ConfigError::ZeroBudget {
                field: "max_generations_per_tick",
            });
        }
        if self.max_mesh_rebuilds_per_tick == 0 {
            return Err(ConfigError::ZeroBudget {
                field: "max_mesh_rebuilds_per_tick",
            });
        }
        Ok(())
    }

    /// Radius within which pending deferred writes survive eviction.
    pub fn retention_radius(&self) -> i32 {
        self.view_radius + self.pending_retention_margin
    }
}
