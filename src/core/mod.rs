//! # Core Module
//!
//! Fundamental concurrency primitives and error types used throughout the crate.
//!
//! ## Key Components
//! - `MtResource`: Thread-safe reference-counted resource with read-write locking
//! - `VoxelError`: Failures of block queries, edits and ray marches
//! - `ConfigError`: Failures while loading the engine configuration

pub mod error;
pub mod mt_resource;

pub use error::{ConfigError, VoxelError};
pub use mt_resource::MtResource;
