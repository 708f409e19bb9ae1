//! # Block Module
//!
//! Block type definitions and block face geometry.

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to represent block types in compact form.
pub type BlockTypeSize = u8;

pub use block_side::BlockSide;
pub use block_type::BlockType;
