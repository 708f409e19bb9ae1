//! # Voxel Task System
//!
//! This module contains tasks related to voxel world generation. They run on the
//! terrain worker pool to keep the main thread responsive while new chunks stream in.

pub mod chunk_fill_task;

pub use chunk_fill_task::ChunkFillTask;
