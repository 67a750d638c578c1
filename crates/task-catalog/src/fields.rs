//! Typed view of one decoded task object.

use serde::Deserialize;
use uitask_task_model::Rect;

/// Every key a task object may carry, all optional.
///
/// Absent fields fall back to the parent prototype (or the defaults
/// registry) during materialization. Unknown keys are ignored here; the
/// syntax checker owns their rejection so that documentation keys and
/// per-action extras can be special-cased in one place.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TaskFields {
    pub algorithm: Option<String>,
    pub base_task: Option<String>,
    pub action: Option<String>,
    pub cache: Option<bool>,
    pub max_times: Option<u32>,
    pub pre_delay: Option<u32>,
    pub post_delay: Option<u32>,
    pub roi: Option<Rect>,
    pub rect_move: Option<Rect>,
    pub specific_rect: Option<Rect>,
    pub sub: Option<Vec<String>>,
    pub sub_error_ignored: Option<bool>,
    pub next: Option<Vec<String>>,
    pub exceeded_next: Option<Vec<String>>,
    pub on_error_next: Option<Vec<String>>,
    pub reduce_other_times: Option<Vec<String>>,
    pub special_params: Option<Vec<i32>>,

    // MatchTemplate
    #[serde(rename = "template")]
    pub templ_name: Option<String>,
    pub templ_threshold: Option<f64>,
    pub mask_range: Option<(i32, i32)>,

    // OcrDetect
    pub text: Option<Vec<String>>,
    pub full_match: Option<bool>,
    pub is_ascii: Option<bool>,
    pub without_det: Option<bool>,
    #[serde(rename = "ocrReplace")]
    pub replace_map: Option<Vec<(String, String)>>,

    // Hash
    #[serde(rename = "hash")]
    pub hashes: Option<Vec<String>>,
    #[serde(rename = "threshold")]
    pub dist_threshold: Option<i32>,
    pub bound: Option<bool>,
}
