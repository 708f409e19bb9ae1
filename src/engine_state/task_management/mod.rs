//! # Task Management System
//!
//! This module provides a small worker pool for executing terrain work off the main
//! thread.
//!
//! ## Architecture Overview
//!
//! - `TaskManager`: owns the worker threads and the shared job queue
//! - `Task`: a unit of work that can be executed on any worker
//!
//! Every worker pulls from one shared unbounded job queue, so an idle worker always
//! picks up the oldest pending job. Results do not flow back through the manager:
//! each task carries a sender for the bounded result channel of its pipeline stage,
//! and the owner of that stage drains it on the main thread.
//!
//! ## Task Lifecycle
//! 1. Tasks are created and published via `TaskManager::publish_task()`
//! 2. Any idle worker receives the task and calls `process()`
//! 3. The task sends its result over its stage channel
//! 4. The in-flight counter drops once `process()` returns
//!
//! ## Shutdown
//! Dropping the `TaskManager` closes the job queue. Workers finish the jobs that
//! are already queued, then exit and are joined. There is no cancellation.
//!
//! Tasks never run on the publishing thread: they block on their bounded stage
//! channel, which only the publishing thread drains.
//!
//! ## Example Usage
//! ```rust,ignore
//! let task_manager = TaskManager::new(num_workers)?;
//! task_manager.publish_task(Box::new(ChunkFillTask::new(...)));
//!
//! // In the main loop, drain the stage channels the tasks report to.
//! ```

pub mod task;

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, error, info};

pub use task::Task;

type BoxedTask = Box<dyn Task + Send>;

/// Manages a pool of worker threads sharing one job queue.
///
/// # Fields
/// - `job_sender`: Sends jobs to whichever worker is free (`None` once shutting down)
/// - `workers`: Join handles, joined on drop
/// - `in_flight`: Jobs published but not yet finished
pub struct TaskManager {
    job_sender: Option<Sender<BoxedTask>>,
    workers: Vec<JoinHandle<()>>,
    in_flight: Arc<AtomicUsize>,
}

impl TaskManager {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads to create, at least one is always
    ///   spawned.
    ///
    /// Workers that fail to spawn are logged and skipped.
    ///
    /// # Errors
    /// The spawn error of the last worker if not a single worker could be started.
    pub fn new(num_workers: usize) -> io::Result<Self> {
        let (job_sender, job_receiver) = unbounded::<BoxedTask>();
        let in_flight = Arc::new(AtomicUsize::new(0));

        info!(
            "Available parallelism: {:?}, spawning {} terrain workers",
            thread::available_parallelism(),
            num_workers.max(1)
        );

        let mut workers = Vec::with_capacity(num_workers.max(1));
        let mut last_error = None;
        for index in 0..num_workers.max(1) {
            let receiver = job_receiver.clone();
            let counter = Arc::clone(&in_flight);
            let spawned = thread::Builder::new()
                .name(format!("terrain-worker-{index}"))
                .spawn(move || worker_loop(receiver, counter));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(err) => {
                    error!("Failed to spawn terrain worker {index}: {err}");
                    last_error = Some(err);
                }
            }
        }

        if workers.is_empty() {
            return Err(last_error.unwrap_or_else(|| {
                io::Error::other("no terrain worker was spawned")
            }));
        }

        Ok(TaskManager {
            job_sender: Some(job_sender),
            workers,
            in_flight,
        })
    }

    /// Publishes a new task for execution on the pool.
    ///
    /// Never blocks: the job queue is unbounded. If every worker has died the task is
    /// dropped and an error is logged.
    pub fn publish_task(&self, task: BoxedTask) {
        debug!("Publishing {} task", task.name());
        self.in_flight.fetch_add(1, Ordering::SeqCst);

        let Some(sender) = &self.job_sender else {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            return;
        };
        if let Err(err) = sender.send(task) {
            error!("No terrain worker is running, dropping {} task", err.into_inner().name());
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Number of tasks published but not yet completed.
    pub fn tasks_in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }
}

/// Counts a job as finished when dropped, even if the job panicked.
struct FinishedGuard<'a>(&'a AtomicUsize);

impl Drop for FinishedGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn worker_loop(receiver: Receiver<BoxedTask>, in_flight: Arc<AtomicUsize>) {
    while let Ok(task) = receiver.recv() {
        let _finished = FinishedGuard(&in_flight);
        task.process();
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        // Closing the queue lets workers drain what is left and return.
        self.job_sender.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                error!("A terrain worker panicked before shutdown");
            }
        }
    }
}
