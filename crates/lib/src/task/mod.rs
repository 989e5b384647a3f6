//! Named tasks, their actions, and the graph that orders them.

pub mod graph;
pub mod types;

pub use graph::{GraphError, TaskGraph};
pub use types::{Action, DescriptorDoc, ExecOpts, INTEGRATION_TASK, Lifecycle, Task, TaskKind, file_task_name};
