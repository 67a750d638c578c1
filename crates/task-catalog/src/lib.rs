//! Task-definition loader and resolver.
//!
//! This crate reads a declarative JSON catalog of automation steps and
//! materializes an in-memory task graph for the process-task executor.
//! Definitions support `baseTask` inheritance, implicit `child@parent`
//! template specialization, and a small `#`/`*`/`+` algebra over task-list
//! entries; the resolver expands all of it into concrete, cycle-free name
//! lists while keeping task identity stable across lazy on-demand
//! derivation.
//!
//! # Key Types
//!
//! - [`TaskCatalog`]: parse documents, then look resolved tasks up by name
//! - [`Error`]: everything that can abort a load
//! - [`TaskInfo`] (re-exported): the record handed to the executor

mod catalog;
mod error;
mod expand;
mod fields;
mod loader;
mod materialize;
mod store;
mod syntax;

pub use catalog::TaskCatalog;
pub use error::{Error, Result};
pub use store::MAX_TASKS;

pub use uitask_task_model::{
    AlgorithmType, ListField, ProcessTaskAction, Rect, TaskInfo, TaskPayload,
};
