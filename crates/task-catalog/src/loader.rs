//! Multi-pass generation of every declared task.
//!
//! Generation walks each declared name and recursively produces its
//! `baseTask` chain (or implicit `child@parent` template) first, guarded by
//! a per-name status marker that turns revisits into cycle errors. A second
//! pass runs the list-expression expander over every raw task, and debug
//! builds finish with the syntax checker. The loader operates on a staging
//! store; the facade swaps it in only when the whole run succeeds.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use uitask_task_model::{template_parent, TaskInfo};

use crate::error::{Error, Result};
use crate::fields::TaskFields;
use crate::materialize::build_task;
use crate::store::TaskStore;

/// Generation status of one task name.
///
/// Names not declared in the current document report `Done`: they are
/// either already interned from an earlier `parse` (overlay documents), an
/// implicit-template redirect, or genuinely missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GenState {
    Pending,
    InProgress,
    Done,
    Missing,
}

pub(crate) struct Loader<'a> {
    pub(crate) doc: &'a Map<String, Value>,
    pub(crate) store: &'a mut TaskStore,
    status: HashMap<String, GenState>,
}

impl<'a> Loader<'a> {
    pub(crate) fn new(doc: &'a Map<String, Value>, store: &'a mut TaskStore) -> Self {
        let status = doc
            .keys()
            .map(|name| (name.clone(), GenState::Pending))
            .collect();
        Self { doc, store, status }
    }

    /// Generate, expand and (in debug builds) validate the whole document.
    pub(crate) fn run(mut self) -> Result<()> {
        let declared: Vec<String> = self.doc.keys().cloned().collect();
        for name in &declared {
            self.generate(name, true)?;
        }

        // expansion runs over every raw task, including survivors of
        // earlier overlay documents; derived tasks created along the way
        // resolve lazily on first lookup
        let mut names: Vec<String> = self.store.raw.keys().cloned().collect();
        names.sort_unstable();
        for name in names {
            let raw = match self.store.raw.get(&name) {
                Some(task) => Arc::clone(task),
                None => continue,
            };
            self.store.expand(&name, &raw)?;
        }

        if cfg!(debug_assertions) {
            self.validate()?;
        }
        Ok(())
    }

    fn state(&self, name: &str) -> GenState {
        self.status
            .get(name)
            .copied()
            .unwrap_or(GenState::Done)
    }

    /// Generate `name` and everything it derives from.
    ///
    /// Returns whether a task by that name exists afterwards; a missing
    /// name is an error only when `must_exist` is set (an `@`-template may
    /// legitimately point at a parent that was never declared).
    fn generate(&mut self, name: &str, must_exist: bool) -> Result<bool> {
        match self.state(name) {
            GenState::Done => {
                if self.store.raw.contains_key(name) {
                    return Ok(true);
                }
                if let Some((_, parent_name)) = template_parent(name) {
                    let parent_name = parent_name.to_string();
                    return self.generate(&parent_name, must_exist);
                }
                self.status.insert(name.to_string(), GenState::Missing);
                self.missing(name, must_exist)
            }
            GenState::Missing => self.missing(name, must_exist),
            GenState::InProgress => Err(Error::CyclicDefinition {
                name: name.to_string(),
            }),
            GenState::Pending => {
                self.status.insert(name.to_string(), GenState::InProgress);
                let value = self.doc.get(name).ok_or_else(|| Error::UnknownTask {
                    name: name.to_string(),
                })?;
                let fields = TaskFields::deserialize(value).map_err(|source| Error::Decode {
                    name: name.to_string(),
                    source,
                })?;

                if let Some(base) = fields.base_task.as_deref() {
                    if !base.is_empty() {
                        let base = base.to_string();
                        if !self.generate(&base, must_exist)? {
                            // leave the name generatable so a later
                            // must-exist pass reports the missing base
                            // rather than a spurious cycle
                            self.status.insert(name.to_string(), GenState::Pending);
                            return Ok(false);
                        }
                        let parent = self.store.get_raw(&base);
                        return self.materialize(name, &fields, parent.as_deref(), "");
                    }
                    // an empty baseTask starts over from the defaults,
                    // ignoring any previously interned same-name task
                } else if self.store.raw.contains_key(name) {
                    // overlay document re-materializing an earlier task
                    let parent = self.store.raw.get(name).cloned();
                    return self.materialize(name, &fields, parent.as_deref(), "");
                }

                if let Some((prefix, parent_name)) = template_parent(name) {
                    let prefix = prefix.to_string();
                    let parent_name = parent_name.to_string();
                    if self.generate(&parent_name, false)? {
                        let parent = self.store.get_raw(&parent_name);
                        return self.materialize(name, &fields, parent.as_deref(), &prefix);
                    }
                }
                self.materialize(name, &fields, None, "")
            }
        }
    }

    fn missing(&mut self, name: &str, must_exist: bool) -> Result<bool> {
        if must_exist {
            return Err(Error::UnknownTask {
                name: name.to_string(),
            });
        }
        Ok(false)
    }

    fn materialize(
        &mut self,
        name: &str,
        fields: &TaskFields,
        parent: Option<&TaskInfo>,
        prefix: &str,
    ) -> Result<bool> {
        let task = build_task(
            name,
            fields,
            parent,
            prefix,
            &self.store.defaults,
            &mut self.store.templ_required,
        )?;
        self.status.insert(name.to_string(), GenState::Done);
        self.store.raw.insert(name.to_string(), Arc::new(task));
        Ok(true)
    }
}
