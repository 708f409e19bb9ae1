//! # Chunk Fill Task
//!
//! This module defines the `ChunkFillTask` which populates the blocks of a freshly
//! created chunk from the height field. The chunk itself is created and inserted into
//! the terrain map on the main thread before the task is dispatched, so the map is
//! never mutated from a worker.
//!
//! Blocks are generated into a private buffer; the chunk's write lock is only taken
//! for the swap.

use std::sync::Arc;

use crossbeam_channel::Sender;
use log::trace;

use crate::{
    core::MtResource,
    engine_state::{
        task_management::task::Task,
        voxels::{
            chunk::{Chunk, ChunkKey},
            height_field::HeightField,
        },
    },
};

/// A task that fills a chunk's blocks asynchronously.
///
/// This task is responsible for:
/// 1. Generating every column of the chunk from the height field
/// 2. Swapping the generated blocks into the chunk
/// 3. Reporting the chunk key on the blocks-ready channel
///
/// Columns are independent of each other and of other chunks, so any number of
/// fill tasks can run side by side.
pub struct ChunkFillTask {
    /// The chunk to fill; no other writer exists until the fill is reported
    chunk: MtResource<Chunk>,
    key: ChunkKey,
    height_field: Arc<dyn HeightField>,
    blocks_ready: Sender<ChunkKey>,
}

impl ChunkFillTask {
    /// Creates a new chunk fill task.
    ///
    /// # Arguments
    /// * `chunk` - The empty chunk to fill
    /// * `height_field` - Source of surface heights
    /// * `blocks_ready` - Sender half of the blocks-ready stage channel
    pub fn new(
        chunk: MtResource<Chunk>,
        height_field: Arc<dyn HeightField>,
        blocks_ready: Sender<ChunkKey>,
    ) -> Self {
        let key = chunk.get().key;
        ChunkFillTask {
            chunk,
            key,
            height_field,
            blocks_ready,
        }
    }
}

impl Task for ChunkFillTask {
    fn process(self: Box<Self>) {
        let blocks = Chunk::generate_blocks(self.key, self.height_field.as_ref());
        self.chunk.get_mut().replace_blocks(blocks);
        trace!("Filled chunk {:?}", self.key.origin());

        // A closed channel means the terrain is shutting down.
        let _ = self.blocks_ready.send(self.key);
    }

    fn name(&self) -> &'static str {
        "chunk fill"
    }
}
