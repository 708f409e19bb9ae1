//! # Navigation
//!
//! Grid path search for NPCs and the discrete actions it produces.

pub mod npc_action;
pub mod path_finder;

pub use npc_action::{ActionKind, NpcAction, Path};
pub use path_finder::{CostModel, PathFinder};
