//! Field materialization: one decoded object plus a parent prototype
//! becomes one task entity.

use std::collections::HashSet;

use tracing::warn;
use uitask_task_model::{
    append_prefix, AlgorithmType, HashParams, MatchParams, OcrParams, ProcessTaskAction,
    TaskDefaults, TaskInfo, TaskPayload,
};

use crate::error::{Error, Result};
use crate::fields::TaskFields;

/// Build a task entity from its decoded fields.
///
/// Fields the object defines override; everything else inherits from
/// `parent` (the default prototype when `None`, in which case the prefix is
/// dropped as well). Inherited list fields are rewritten into the prefixed
/// namespace so that a `child@parent` derivation follows its own task
/// chain. Variant fields only inherit when the algorithm matches the
/// parent's; switching algorithm falls back to the defaults registry.
pub(crate) fn build_task(
    name: &str,
    fields: &TaskFields,
    parent: Option<&TaskInfo>,
    prefix: &str,
    defaults: &TaskDefaults,
    templ_required: &mut HashSet<String>,
) -> Result<TaskInfo> {
    let (parent, prefix) = match parent {
        Some(parent) => (parent, prefix),
        None => (defaults.base().as_ref(), ""),
    };

    let algorithm = match fields.algorithm.as_deref() {
        Some(tag) => {
            let algorithm = AlgorithmType::from_name(tag);
            if algorithm == AlgorithmType::Invalid {
                return Err(Error::UnknownAlgorithm {
                    name: name.to_string(),
                    algorithm: tag.to_string(),
                });
            }
            algorithm
        }
        None => parent.algorithm(),
    };
    let inherit_variant = algorithm == parent.algorithm();

    let payload = match algorithm {
        AlgorithmType::MatchTemplate => {
            let proto = if inherit_variant {
                parent.match_params().unwrap_or(defaults.match_params())
            } else {
                defaults.match_params()
            };
            // the template asset is never inherited: it is the declared
            // filename or the task's own name
            let templ_name = fields
                .templ_name
                .clone()
                .unwrap_or_else(|| format!("{name}.png"));
            templ_required.insert(templ_name.clone());
            TaskPayload::MatchTemplate(MatchParams {
                templ_name,
                templ_threshold: fields.templ_threshold.unwrap_or(proto.templ_threshold),
                mask_range: fields.mask_range.or(proto.mask_range),
            })
        }
        AlgorithmType::OcrDetect => {
            let proto = if inherit_variant {
                parent.ocr_params().unwrap_or(defaults.ocr_params())
            } else {
                defaults.ocr_params()
            };
            let text = fields.text.clone().unwrap_or_else(|| proto.text.clone());
            if cfg!(debug_assertions) && fields.text.is_none() && text.is_empty() {
                warn!("ocr task '{}' has implicit empty text", name);
            }
            TaskPayload::OcrDetect(OcrParams {
                text,
                full_match: fields.full_match.unwrap_or(proto.full_match),
                is_ascii: fields.is_ascii.unwrap_or(proto.is_ascii),
                without_det: fields.without_det.unwrap_or(proto.without_det),
                replace_map: fields
                    .replace_map
                    .clone()
                    .unwrap_or_else(|| proto.replace_map.clone()),
            })
        }
        AlgorithmType::Hash => {
            let proto = if inherit_variant {
                parent.hash_params().unwrap_or(defaults.hash_params())
            } else {
                defaults.hash_params()
            };
            let hashes = fields
                .hashes
                .clone()
                .unwrap_or_else(|| proto.hashes.clone());
            if cfg!(debug_assertions) && fields.hashes.is_none() && hashes.is_empty() {
                warn!("hash task '{}' has implicit empty hashes", name);
            }
            TaskPayload::Hash(HashParams {
                hashes,
                dist_threshold: fields.dist_threshold.unwrap_or(proto.dist_threshold),
                mask_range: fields.mask_range.or(proto.mask_range),
                bound: fields.bound.unwrap_or(proto.bound),
            })
        }
        AlgorithmType::JustReturn => TaskPayload::JustReturn,
        AlgorithmType::Invalid => unreachable!("invalid algorithm is rejected above"),
    };

    let action = match fields.action.as_deref() {
        Some(tag) => {
            let action = ProcessTaskAction::from_name(tag);
            if action == ProcessTaskAction::Invalid {
                return Err(Error::UnknownAction {
                    name: name.to_string(),
                    action: tag.to_string(),
                });
            }
            action
        }
        None => parent.action,
    };

    let roi = match fields.roi {
        Some(roi) => {
            if cfg!(debug_assertions) && !roi.fits_window() {
                return Err(Error::RoiOutOfBounds {
                    name: name.to_string(),
                });
            }
            roi
        }
        None => parent.roi,
    };

    let list_or_inherit = |own: &Option<Vec<String>>, inherited: &[String]| match own {
        Some(list) => list.clone(),
        None => append_prefix(inherited, prefix),
    };

    Ok(TaskInfo {
        name: name.to_string(),
        payload,
        action,
        cache: fields.cache.unwrap_or(parent.cache),
        max_times: fields.max_times.unwrap_or(parent.max_times),
        pre_delay: fields.pre_delay.unwrap_or(parent.pre_delay),
        post_delay: fields.post_delay.unwrap_or(parent.post_delay),
        roi,
        rect_move: fields.rect_move.unwrap_or(parent.rect_move),
        specific_rect: fields.specific_rect.unwrap_or(parent.specific_rect),
        sub_error_ignored: fields.sub_error_ignored.unwrap_or(parent.sub_error_ignored),
        special_params: fields
            .special_params
            .clone()
            .unwrap_or_else(|| parent.special_params.clone()),
        next: list_or_inherit(&fields.next, &parent.next),
        sub: list_or_inherit(&fields.sub, &parent.sub),
        exceeded_next: list_or_inherit(&fields.exceeded_next, &parent.exceeded_next),
        on_error_next: list_or_inherit(&fields.on_error_next, &parent.on_error_next),
        reduce_other_times: list_or_inherit(&fields.reduce_other_times, &parent.reduce_other_times),
    })
}
