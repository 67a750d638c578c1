//! The public read facade over the resolved task tables.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use uitask_task_model::TaskInfo;

use crate::error::{Error, Result};
use crate::loader::Loader;
use crate::store::TaskStore;

/// Loads task documents and serves resolved tasks by name.
///
/// `parse` is an initialization-time operation: it stages into a scratch
/// copy of the tables and swaps it in only on success, so a failing
/// document leaves the catalog exactly as it was. Lookups may run
/// concurrently with each other and with lazy interning of
/// previously-unseen `@`-derivations; entries become visible atomically.
///
/// ```
/// use serde_json::json;
/// use uitask_task_catalog::TaskCatalog;
///
/// let catalog = TaskCatalog::new();
/// catalog
///     .parse(&json!({
///         "Confirm": { "roi": [1000, 600, 200, 100], "next": ["Done"] },
///         "Done": { "algorithm": "JustReturn" },
///     }))
///     .unwrap();
/// let confirm = catalog.get("Confirm").unwrap();
/// assert_eq!(confirm.next, vec!["Done"]);
/// ```
pub struct TaskCatalog {
    store: RwLock<TaskStore>,
}

impl TaskCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: RwLock::new(TaskStore::new()),
        }
    }

    /// Load a document mapping task name to task object.
    ///
    /// May be called again with overlay documents: tasks declared earlier
    /// stay available and same-name declarations re-materialize on top of
    /// them (unless they opt out with an empty `baseTask`).
    ///
    /// # Errors
    ///
    /// Any generation, expansion or (debug) validation failure aborts the
    /// whole load and leaves the previous state in place.
    pub fn parse(&self, document: &Value) -> Result<()> {
        let object = document.as_object().ok_or(Error::InvalidDocument)?;
        let mut guard = self.store.write().unwrap_or_else(PoisonError::into_inner);
        let mut staging = guard.clone();
        Loader::new(object, &mut staging).run()?;
        *guard = staging;
        Ok(())
    }

    /// Fully expanded task by name, or `None` if it cannot be resolved.
    ///
    /// Unknown `@`-names are derived from their parent and interned on
    /// first access; repeated calls return handles to the same entity.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<TaskInfo>> {
        {
            let guard = self.store.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(task) = guard.resolved.get(name) {
                return Some(Arc::clone(task));
            }
        }
        let mut guard = self.store.write().unwrap_or_else(PoisonError::into_inner);
        guard.get(name)
    }

    /// Raw (un-expanded) task by name, deriving `@`-templates on demand.
    #[must_use]
    pub fn get_raw(&self, name: &str) -> Option<Arc<TaskInfo>> {
        {
            let guard = self.store.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(task) = guard.raw.get(name) {
                return Some(Arc::clone(task));
            }
        }
        let mut guard = self.store.write().unwrap_or_else(PoisonError::into_inner);
        guard.get_raw(name)
    }

    /// Template asset names referenced by every MatchTemplate task
    /// materialized so far; drives asset loading after `parse`.
    #[must_use]
    pub fn templates_required(&self) -> HashSet<String> {
        self.store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .templ_required
            .clone()
    }
}

impl Default for TaskCatalog {
    fn default() -> Self {
        Self::new()
    }
}
