//! # Error Types
//!
//! Error values surfaced by the terrain, ray-march and configuration layers.
//!
//! Accessing a block where no chunk has been committed is a caller bug (every access
//! is expected to be guarded by an existence check), but it is reported as a value
//! rather than a panic so hot paths such as player collision can decide locally how
//! to react.

use std::fmt;

/// Errors raised by voxel queries and edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoxelError {
    /// No committed chunk covers the given world column.
    ChunkNotLoaded {
        /// World X coordinate that was accessed.
        x: i32,
        /// World Z coordinate that was accessed.
        z: i32,
    },
    /// The Y coordinate lies outside `[0, WORLD_HEIGHT)`.
    OutOfWorldBounds {
        /// World Y coordinate that was accessed.
        y: i32,
    },
    /// A ray march found no axis to step along (zero-length or NaN direction).
    DegenerateRay,
}

impl fmt::Display for VoxelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChunkNotLoaded { x, z } => {
                write!(f, "no committed chunk contains world column ({x}, {z})")
            }
            Self::OutOfWorldBounds { y } => {
                write!(f, "world y coordinate {y} is outside the world height")
            }
            Self::DegenerateRay => write!(f, "ray march direction has no steppable axis"),
        }
    }
}

impl std::error::Error for VoxelError {}

/// Errors raised while loading an [`EngineConfig`](crate::engine_state::config::EngineConfig).
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io(std::io::Error),
    /// The configuration text is not valid JSON for the expected schema.
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read configuration: {err}"),
            Self::Parse(err) => write!(f, "failed to parse configuration: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err)
    }
}
