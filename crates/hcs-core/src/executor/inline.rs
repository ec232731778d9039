use std::time::Instant;

use super::{Executor, GraphReport, Pending, Task, TaskGraph};

/// Runs every task on the submitting thread, in order. Useful for tests and
/// for debugging a single well.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn name(&self) -> &str {
        "inline"
    }

    fn submit(&self, graph: TaskGraph) -> Pending {
        let (tx, pending) = Pending::channel(graph.name());
        let (name, tasks) = graph.into_parts();
        let count = tasks.len();
        let started = Instant::now();
        let result = tasks.into_iter().try_for_each(Task::run);
        let _ = tx.send(result.map(|()| GraphReport {
            name,
            tasks: count,
            elapsed: started.elapsed(),
        }));
        pending
    }
}
