//! The task entity: common header plus per-algorithm payload.

use crate::rect::Rect;
use crate::types::{AlgorithmType, ProcessTaskAction};

/// Template-match threshold applied when a definition does not override it.
pub const TEMPL_THRESHOLD_DEFAULT: f64 = 0.8;

/// Fields specific to `MatchTemplate` tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchParams {
    /// Image asset filename; defaults to `<task_name>.png` at materialization.
    pub templ_name: String,
    pub templ_threshold: f64,
    /// Gray levels `(low, high)` masked out of the match, if any.
    pub mask_range: Option<(i32, i32)>,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            templ_name: "__INVALID__".to_string(),
            templ_threshold: TEMPL_THRESHOLD_DEFAULT,
            mask_range: None,
        }
    }
}

/// Fields specific to `OcrDetect` tasks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrParams {
    /// Target strings, any of which satisfies the detection.
    pub text: Vec<String>,
    pub full_match: bool,
    pub is_ascii: bool,
    pub without_det: bool,
    /// `(pattern, replacement)` rewrites applied to recognized text, in order.
    pub replace_map: Vec<(String, String)>,
}

/// Fields specific to `Hash` tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct HashParams {
    pub hashes: Vec<String>,
    pub dist_threshold: i32,
    pub mask_range: Option<(i32, i32)>,
    pub bound: bool,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            hashes: Vec::new(),
            dist_threshold: 0,
            mask_range: None,
            bound: true,
        }
    }
}

/// Algorithm-specific part of a task; the variant is the algorithm tag.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskPayload {
    JustReturn,
    MatchTemplate(MatchParams),
    OcrDetect(OcrParams),
    Hash(HashParams),
}

/// Selector for the five task-name list fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListField {
    Next,
    Sub,
    ExceededNext,
    OnErrorNext,
    ReduceOtherTimes,
}

impl ListField {
    /// All list fields, in expansion order.
    pub const ALL: [ListField; 5] = [
        ListField::Next,
        ListField::Sub,
        ListField::ExceededNext,
        ListField::OnErrorNext,
        ListField::ReduceOtherTimes,
    ];

    /// Document key / `#` projection name of the field.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Sub => "sub",
            Self::ExceededNext => "exceeded_next",
            Self::OnErrorNext => "on_error_next",
            Self::ReduceOtherTimes => "reduce_other_times",
        }
    }

    /// Look a field up by its `#` projection name.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "next" => Some(Self::Next),
            "sub" => Some(Self::Sub),
            "exceeded_next" => Some(Self::ExceededNext),
            "on_error_next" => Some(Self::OnErrorNext),
            "reduce_other_times" => Some(Self::ReduceOtherTimes),
            _ => None,
        }
    }

    /// Whether repeated names are meaningful in this field.
    ///
    /// `sub` runs children once per mention and `reduce_other_times`
    /// decrements once per mention; the flow lists are candidate sets where
    /// a repeat is noise.
    #[must_use]
    pub const fn allows_duplicates(self) -> bool {
        matches!(self, Self::Sub | Self::ReduceOtherTimes)
    }

    /// Whether this is a flow list subject to the JustReturn finality rule.
    #[must_use]
    pub const fn is_flow(self) -> bool {
        matches!(self, Self::Next | Self::ExceededNext | Self::OnErrorNext)
    }
}

/// A fully materialized task record.
///
/// The common header is consumed by the executor for every algorithm; the
/// payload is read only once the executor selects an algorithm branch.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskInfo {
    pub name: String,
    pub payload: TaskPayload,
    pub action: ProcessTaskAction,
    /// Whether the executor may cache detection results for this task.
    pub cache: bool,
    /// Maximum hit count; `u32::MAX` means unbounded.
    pub max_times: u32,
    /// Milliseconds to wait before acting.
    pub pre_delay: u32,
    /// Milliseconds to wait after acting.
    pub post_delay: u32,
    pub roi: Rect,
    pub rect_move: Rect,
    pub specific_rect: Rect,
    pub sub_error_ignored: bool,
    pub special_params: Vec<i32>,
    pub next: Vec<String>,
    pub sub: Vec<String>,
    pub exceeded_next: Vec<String>,
    pub on_error_next: Vec<String>,
    pub reduce_other_times: Vec<String>,
}

impl TaskInfo {
    /// The algorithm tag carried by the payload.
    #[must_use]
    pub fn algorithm(&self) -> AlgorithmType {
        match self.payload {
            TaskPayload::JustReturn => AlgorithmType::JustReturn,
            TaskPayload::MatchTemplate(_) => AlgorithmType::MatchTemplate,
            TaskPayload::OcrDetect(_) => AlgorithmType::OcrDetect,
            TaskPayload::Hash(_) => AlgorithmType::Hash,
        }
    }

    #[must_use]
    pub fn match_params(&self) -> Option<&MatchParams> {
        match &self.payload {
            TaskPayload::MatchTemplate(params) => Some(params),
            _ => None,
        }
    }

    #[must_use]
    pub fn ocr_params(&self) -> Option<&OcrParams> {
        match &self.payload {
            TaskPayload::OcrDetect(params) => Some(params),
            _ => None,
        }
    }

    #[must_use]
    pub fn hash_params(&self) -> Option<&HashParams> {
        match &self.payload {
            TaskPayload::Hash(params) => Some(params),
            _ => None,
        }
    }

    /// Borrow one of the five list fields.
    #[must_use]
    pub fn list(&self, field: ListField) -> &[String] {
        match field {
            ListField::Next => &self.next,
            ListField::Sub => &self.sub,
            ListField::ExceededNext => &self.exceeded_next,
            ListField::OnErrorNext => &self.on_error_next,
            ListField::ReduceOtherTimes => &self.reduce_other_times,
        }
    }

    /// Replace one of the five list fields.
    pub fn set_list(&mut self, field: ListField, names: Vec<String>) {
        match field {
            ListField::Next => self.next = names,
            ListField::Sub => self.sub = names,
            ListField::ExceededNext => self.exceeded_next = names,
            ListField::OnErrorNext => self.on_error_next = names,
            ListField::ReduceOtherTimes => self.reduce_other_times = names,
        }
    }

    /// Derive the implicit `<prefix>@<self>` template specialization.
    ///
    /// The copy keeps the payload (including any template asset name) and
    /// rewrites every list reference into the prefixed namespace, so the
    /// specialization flows through the same task chain as its parent.
    #[must_use]
    pub fn derive_with_prefix(&self, prefix: &str) -> TaskInfo {
        let mut derived = self.clone();
        if !prefix.is_empty() {
            derived.name = format!("{prefix}@{}", self.name);
            for field in ListField::ALL {
                let prefixed = append_prefix(derived.list(field), prefix);
                derived.set_list(field, prefixed);
            }
        }
        derived
    }
}

/// Rewrite each name into `<prefix>@<name>`; a no-op for an empty prefix.
#[must_use]
pub fn append_prefix(names: &[String], prefix: &str) -> Vec<String> {
    if prefix.is_empty() {
        return names.to_vec();
    }
    names.iter().map(|n| format!("{prefix}@{n}")).collect()
}

/// Split an implicit-template name at its first `@` into `(prefix, parent)`.
#[must_use]
pub fn template_parent(name: &str) -> Option<(&str, &str)> {
    name.find('@').map(|at| (&name[..at], &name[at + 1..]))
}
