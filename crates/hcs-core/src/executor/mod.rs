//! Task graphs and the executors that run them.
//!
//! The conversion core only ever builds a [`TaskGraph`], hands it to an
//! [`Executor`] with [`Executor::submit`], and blocks on [`Pending::wait`].
//! How and where the tasks run is up to the executor.

mod inline;
mod pool;

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HcsError, Result};
use crate::lazy::NodeInfo;

pub use inline::InlineExecutor;
pub use pool::RayonExecutor;

type TaskFn = Box<dyn FnOnce() -> Result<()> + Send>;

/// One unit of work, e.g. computing and writing one persist block.
pub struct Task {
    key: String,
    run: TaskFn,
}

impl Task {
    pub fn new(key: impl Into<String>, run: impl FnOnce() -> Result<()> + Send + 'static) -> Self {
        Self {
            key: key.into(),
            run: Box::new(run),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn run(self) -> Result<()> {
        (self.run)()
    }
}

/// Independent tasks that together materialize one lazy graph.
pub struct TaskGraph {
    name: String,
    graph: NodeInfo,
    tasks: Vec<Task>,
}

impl TaskGraph {
    pub fn new(name: impl Into<String>, graph: NodeInfo) -> Self {
        Self {
            name: name.into(),
            graph,
            tasks: Vec::new(),
        }
    }

    pub fn push(&mut self, task: Task) {
        self.tasks.push(task);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The lazy computation every task draws from.
    pub fn graph(&self) -> &NodeInfo {
        &self.graph
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn task_keys(&self) -> Vec<&str> {
        self.tasks.iter().map(Task::key).collect()
    }

    pub(crate) fn into_parts(self) -> (String, Vec<Task>) {
        (self.name, self.tasks)
    }
}

/// Summary of a completed graph.
#[derive(Clone, Debug)]
pub struct GraphReport {
    pub name: String,
    pub tasks: usize,
    pub elapsed: Duration,
}

/// Handle to a submitted graph.
pub struct Pending {
    name: String,
    rx: mpsc::Receiver<Result<GraphReport>>,
}

impl Pending {
    /// Sender and handle for implementing [`Executor`]. Send exactly one
    /// result once the graph is done.
    pub fn channel(name: &str) -> (mpsc::Sender<Result<GraphReport>>, Self) {
        let (tx, rx) = mpsc::channel();
        (
            tx,
            Self {
                name: name.to_string(),
                rx,
            },
        )
    }

    /// Block until every task finished; the first task error is returned.
    pub fn wait(self) -> Result<GraphReport> {
        self.rx.recv().map_err(|_| {
            HcsError::Executor(format!("executor dropped graph '{}' before completion", self.name))
        })?
    }
}

/// Runs task graphs. Implementations may run tasks in any order and in
/// parallel; tasks of one graph never depend on each other.
pub trait Executor: Send + Sync {
    fn name(&self) -> &str;

    fn submit(&self, graph: TaskGraph) -> Pending;
}

/// Which executor to build.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum ExecutorPreference {
    /// Run every graph on the calling thread.
    Inline,
    /// Dedicated rayon pool with one thread per core.
    #[default]
    Rayon,
    /// Dedicated rayon pool with a fixed thread count.
    RayonThreads(usize),
}

impl std::fmt::Display for ExecutorPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inline => write!(f, "Inline"),
            Self::Rayon => write!(f, "Rayon"),
            Self::RayonThreads(n) => write!(f, "Rayon ({n} threads)"),
        }
    }
}

pub fn create_executor(preference: &ExecutorPreference) -> Result<Arc<dyn Executor>> {
    match preference {
        ExecutorPreference::Inline => Ok(Arc::new(InlineExecutor)),
        ExecutorPreference::Rayon => Ok(Arc::new(RayonExecutor::new(None)?)),
        ExecutorPreference::RayonThreads(n) => Ok(Arc::new(RayonExecutor::new(Some(*n))?)),
    }
}
