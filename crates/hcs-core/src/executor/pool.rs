use std::time::Instant;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::consts::PARALLEL_TASK_THRESHOLD;
use crate::error::{HcsError, Result};

use super::{Executor, GraphReport, Pending, Task, TaskGraph};

/// Executor backed by a dedicated rayon thread pool.
pub struct RayonExecutor {
    pool: ThreadPool,
    name: String,
}

impl RayonExecutor {
    /// `threads = None` uses rayon's default (one thread per core).
    pub fn new(threads: Option<usize>) -> Result<Self> {
        let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("hcs-worker-{i}"));
        if let Some(n) = threads {
            if n == 0 {
                return Err(HcsError::config("executor thread count must be at least 1"));
            }
            builder = builder.num_threads(n);
        }
        let pool = builder
            .build()
            .map_err(|e| HcsError::Executor(format!("failed to build thread pool: {e}")))?;
        let name = format!("rayon ({} threads)", pool.current_num_threads());
        Ok(Self { pool, name })
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl Executor for RayonExecutor {
    fn name(&self) -> &str {
        &self.name
    }

    fn submit(&self, graph: TaskGraph) -> Pending {
        let (tx, pending) = Pending::channel(graph.name());
        self.pool.spawn(move || {
            let (name, tasks) = graph.into_parts();
            let count = tasks.len();
            let started = Instant::now();
            debug!(graph = %name, tasks = count, "Running task graph");

            let result = if count >= PARALLEL_TASK_THRESHOLD {
                tasks.into_par_iter().try_for_each(Task::run)
            } else {
                tasks.into_iter().try_for_each(Task::run)
            };

            // The receiver may be gone if the caller stopped waiting.
            let _ = tx.send(result.map(|()| GraphReport {
                name,
                tasks: count,
                elapsed: started.elapsed(),
            }));
        });
        pending
    }
}
