//! # Task System Core Trait
//!
//! This module defines the unit of work executed by the `TaskManager` pool.
//!
//! ## Task Lifecycle
//! 1. A `Task` is created on the main thread, owning everything it needs
//! 2. It is scheduled via `TaskManager::publish_task()`
//! 3. A worker thread calls `process()`, consuming the task
//! 4. The task reports its outcome over the stage channel it was built with
//! 5. The main thread drains that channel once per tick
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred between threads
//! - Shared chunk data is reached through `MtResource` handles only

/// A trait representing a unit of work that can be executed asynchronously.
///
/// Tasks are the primary mechanism for offloading work from the main thread to
/// background workers. They should be self-contained and own all the data they
/// need, including the sender half of the channel their result goes to.
///
/// # Implementation Guidelines
/// - Should be relatively coarse-grained to amortize scheduling overhead
/// - Must never touch the render backend
/// - A send failure means the consumer is gone; drop the result silently
pub trait Task: Send {
    /// Performs the work on a worker thread.
    fn process(self: Box<Self>);

    /// Short label used in log output.
    fn name(&self) -> &'static str;
}
