//! Task module
//!
//! This module contains per-user task types and the persistent task store.

mod model;
mod store;

pub use model::{Task, TaskDraft, TaskFilter, TaskPatch};
pub use store::TaskStore;
