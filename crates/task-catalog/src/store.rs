//! The raw and resolved task tables.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, error};
use uitask_task_model::{template_parent, TaskDefaults, TaskInfo};

/// Resolved-task interning cap. Expansion past this point still produces
/// entities, but they are returned by value and recomputed on later lookups.
pub const MAX_TASKS: usize = 65535;

/// Backing tables behind the catalog facade.
///
/// `raw` holds materialized tasks before list-expression expansion;
/// `resolved` holds the expanded form served to the executor. Both are
/// append-only apart from overlay re-materialization during `parse`.
#[derive(Debug, Clone)]
pub(crate) struct TaskStore {
    pub(crate) defaults: TaskDefaults,
    pub(crate) raw: HashMap<String, Arc<TaskInfo>>,
    pub(crate) resolved: HashMap<String, Arc<TaskInfo>>,
    pub(crate) templ_required: HashSet<String>,
}

impl TaskStore {
    pub(crate) fn new() -> Self {
        Self {
            defaults: TaskDefaults::new(),
            raw: HashMap::new(),
            resolved: HashMap::new(),
            templ_required: HashSet::new(),
        }
    }

    /// Look up a raw task, deriving and interning an implicit
    /// `prefix@parent` specialization when the name itself is unknown.
    pub(crate) fn get_raw(&mut self, name: &str) -> Option<Arc<TaskInfo>> {
        if let Some(task) = self.raw.get(name) {
            return Some(Arc::clone(task));
        }
        let (prefix, parent_name) = template_parent(name)?;
        let parent = self.get_raw(parent_name)?;
        let derived = Arc::new(parent.derive_with_prefix(prefix));
        debug!("derived task '{}' from '{}'", derived.name, parent_name);
        self.raw.insert(derived.name.clone(), Arc::clone(&derived));
        Some(derived)
    }

    /// Look up a resolved task, expanding the raw form on first access.
    ///
    /// Lookup failures are non-fatal: they are logged and reported as
    /// `None` so executor flow can treat dangling references as absent.
    pub(crate) fn get(&mut self, name: &str) -> Option<Arc<TaskInfo>> {
        if let Some(task) = self.resolved.get(name) {
            return Some(Arc::clone(task));
        }
        let raw = self.get_raw(name)?;
        match self.expand(name, &raw) {
            Ok(task) => Some(task),
            Err(err) => {
                error!("failed to expand task '{}': {}", name, err);
                None
            }
        }
    }
}
