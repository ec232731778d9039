use std::sync::Arc;

use tracing::{debug, info};

use crate::element::Element;
use crate::error::{HcsError, Result};
use crate::executor::{Executor, GraphReport, Task, TaskGraph};
use crate::lazy::LazyArray;

use super::ZarrArray;

/// Build the task graph that writes `array` into `target`.
///
/// One task per block of the lazy array's chunk grid. Every block must cover
/// whole storage chunks (or the whole axis) so that no two tasks ever touch
/// the same chunk file.
pub fn persist_graph<T: Element>(array: &LazyArray<T>, target: ZarrArray<T>) -> Result<TaskGraph> {
    if array.shape() != target.shape() {
        return Err(HcsError::config(format!(
            "cannot persist array of shape {:?} into {} with shape {:?}",
            array.shape(),
            target.dir().display(),
            target.shape()
        )));
    }
    for (axis, (&block, &chunk)) in array.chunks().iter().zip(target.chunks()).enumerate() {
        if block % chunk != 0 && block < array.shape()[axis] {
            return Err(HcsError::config(format!(
                "persist block {:?} is not a multiple of storage chunks {:?} along axis {axis}",
                array.chunks(),
                target.chunks()
            )));
        }
    }

    let target = Arc::new(target);
    let mut graph = TaskGraph::new(target.dir().display().to_string(), array.graph());
    for region in array.chunk_regions() {
        let array = array.clone();
        let target = Arc::clone(&target);
        let key = format!("write{region}");
        graph.push(Task::new(key, move || {
            let data = array.compute_region(&region)?;
            target.write_region(&region, data.view())?;
            debug!(region = %region, "Block written");
            Ok(())
        }));
    }
    Ok(graph)
}

/// Write `array` into `target` and block until every chunk is on disk.
pub fn persist<T: Element>(
    array: &LazyArray<T>,
    target: ZarrArray<T>,
    executor: &dyn Executor,
) -> Result<GraphReport> {
    let path = target.dir().display().to_string();
    let graph = persist_graph(array, target)?;
    let report = executor
        .submit(graph)
        .wait()
        .map_err(|e| HcsError::Persistence {
            path: path.clone(),
            source: Box::new(e),
        })?;
    info!(
        path = %path,
        tasks = report.tasks,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Array persisted"
    );
    Ok(report)
}
