//! Debug-build document validation.
//!
//! Added after a malformed resource slipped through a review: every task
//! object is checked against the allow-list of its algorithm (plus
//! action-specific extras), with an escape hatch for documentation keys.
//! Resolved task lists are checked for the JustReturn finality rule, and
//! unresolved references are surfaced as warnings.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{error, warn};
use uitask_task_model::{AlgorithmType, ListField, ProcessTaskAction, TaskInfo};

use crate::error::{Error, Result};
use crate::loader::Loader;

const ALLOWED_MATCH_TEMPLATE: &[&str] = &[
    "action",
    "algorithm",
    "baseTask",
    "cache",
    "exceededNext",
    "maskRange",
    "maxTimes",
    "next",
    "onErrorNext",
    "postDelay",
    "preDelay",
    "rectMove",
    "reduceOtherTimes",
    "roi",
    "sub",
    "subErrorIgnored",
    "templThreshold",
    "template",
];

const ALLOWED_OCR_DETECT: &[&str] = &[
    "action",
    "algorithm",
    "baseTask",
    "cache",
    "exceededNext",
    "fullMatch",
    "isAscii",
    "maxTimes",
    "next",
    "ocrReplace",
    "onErrorNext",
    "postDelay",
    "preDelay",
    "rectMove",
    "reduceOtherTimes",
    "roi",
    "sub",
    "subErrorIgnored",
    "text",
    "withoutDet",
];

const ALLOWED_JUST_RETURN: &[&str] = &[
    "action",
    "algorithm",
    "baseTask",
    "exceededNext",
    "maxTimes",
    "next",
    "onErrorNext",
    "postDelay",
    "preDelay",
    "reduceOtherTimes",
    "specialParams",
    "sub",
    "subErrorIgnored",
];

const ALLOWED_HASH: &[&str] = &[
    "action",
    "algorithm",
    "baseTask",
    "bound",
    "cache",
    "exceededNext",
    "hash",
    "maskRange",
    "maxTimes",
    "next",
    "onErrorNext",
    "postDelay",
    "preDelay",
    "rectMove",
    "reduceOtherTimes",
    "roi",
    "specialParams",
    "sub",
    "subErrorIgnored",
    "threshold",
];

fn allowed_for_algorithm(algorithm: AlgorithmType) -> &'static [&'static str] {
    match algorithm {
        AlgorithmType::MatchTemplate | AlgorithmType::Invalid => ALLOWED_MATCH_TEMPLATE,
        AlgorithmType::OcrDetect => ALLOWED_OCR_DETECT,
        AlgorithmType::JustReturn => ALLOWED_JUST_RETURN,
        AlgorithmType::Hash => ALLOWED_HASH,
    }
}

fn allowed_for_action(action: ProcessTaskAction) -> &'static [&'static str] {
    match action {
        ProcessTaskAction::ClickRect => &["specificRect"],
        ProcessTaskAction::Swipe => &["specificRect", "rectMove"],
        _ => &[],
    }
}

fn is_doc_key(key: &str) -> bool {
    key.contains("doc") || key.contains("Doc")
}

impl Loader<'_> {
    /// Check every declared object and every resolved task list, logging
    /// all findings and failing on the first hard error.
    pub(crate) fn validate(&mut self) -> Result<()> {
        let mut errors = Vec::new();

        for (name, value) in self.doc.clone() {
            self.check_keys(&name, &value, &mut errors);
        }

        let mut names: Vec<String> = self.store.resolved.keys().cloned().collect();
        names.sort_unstable();
        for name in names {
            let task = match self.store.resolved.get(&name) {
                Some(task) => std::sync::Arc::clone(task),
                None => continue,
            };
            self.check_task_lists(&task, &mut errors);
        }

        for err in &errors {
            error!("{err}");
        }
        match errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Unknown-key detection against the algorithm/action allow-lists.
    ///
    /// A key mentioning `doc`, or shadowed by a `<key>_doc`/`<key>_Doc`
    /// sibling, is accepted as documentation.
    fn check_keys(&mut self, name: &str, value: &Value, errors: &mut Vec<Error>) {
        let Some(object) = value.as_object() else {
            errors.push(Error::Decode {
                name: name.to_string(),
                source: serde::de::Error::custom("task definition is not a JSON object"),
            });
            return;
        };
        let Some(task) = self.store.raw.get(name).cloned() else {
            return;
        };

        let by_algorithm = allowed_for_algorithm(task.algorithm());
        let by_action = allowed_for_action(task.action);
        for key in object.keys() {
            let documented = is_doc_key(key)
                || object.contains_key(&format!("{key}_doc"))
                || object.contains_key(&format!("{key}_Doc"));
            if !by_algorithm.contains(&key.as_str())
                && !by_action.contains(&key.as_str())
                && !documented
            {
                errors.push(Error::UnknownKey {
                    name: name.to_string(),
                    key: key.clone(),
                });
            }
        }
    }

    /// Flow lists must not continue past a JustReturn task; every
    /// reference should resolve, though implicit-template fallbacks are
    /// allowed to be absent and only warn.
    fn check_task_lists(&mut self, task: &TaskInfo, errors: &mut Vec<Error>) {
        for field in ListField::ALL {
            let list = task.list(field).to_vec();
            let mut seen = HashSet::new();
            let mut just_return: Option<String> = None;
            for entry in list {
                if seen.contains(&entry) {
                    continue;
                }
                if field.is_flow() {
                    if let Some(blocker) = &just_return {
                        errors.push(Error::NonFinalJustReturn {
                            name: task.name.clone(),
                            list: field.key(),
                            task: blocker.clone(),
                        });
                    }
                }
                match self.store.get_raw(&entry) {
                    None => warn!(
                        "task '{}' in {} of '{}' does not resolve",
                        entry,
                        field.key(),
                        task.name
                    ),
                    Some(target) => {
                        if target.algorithm() == AlgorithmType::JustReturn {
                            just_return = Some(target.name.clone());
                        }
                    }
                }
                seen.insert(entry);
            }
        }
    }
}
