//! Task entity model for the uitask catalog.
//!
//! This crate holds the value types shared between the catalog resolver and
//! the process-task executor: integer rectangles, the algorithm/action tags,
//! the task entity with its per-algorithm payload, and the default
//! prototypes applied when a definition declares no parent.
//!
//! # Key Types
//!
//! - [`TaskInfo`]: a fully materialized task record
//! - [`TaskPayload`]: the algorithm-specific part of a task
//! - [`ListField`]: selector for the five task-name list fields
//! - [`TaskDefaults`]: the per-algorithm default prototypes

mod defaults;
mod rect;
mod task;
mod types;

pub use defaults::TaskDefaults;
pub use rect::{Rect, WINDOW_HEIGHT_DEFAULT, WINDOW_WIDTH_DEFAULT};
pub use task::{
    append_prefix, template_parent, HashParams, ListField, MatchParams, OcrParams, TaskInfo,
    TaskPayload, TEMPL_THRESHOLD_DEFAULT,
};
pub use types::{AlgorithmType, ProcessTaskAction};
