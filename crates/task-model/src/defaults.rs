//! Default prototypes applied when a definition declares no parent.

use std::sync::Arc;

use crate::rect::Rect;
use crate::task::{HashParams, MatchParams, OcrParams, TaskInfo, TaskPayload};
use crate::types::ProcessTaskAction;

/// The four default prototypes.
///
/// The base prototype seeds every common field; the per-algorithm params
/// seed variant fields when a definition switches algorithm away from its
/// parent (variant fields never inherit across algorithms). Read-only after
/// construction.
#[derive(Debug, Clone)]
pub struct TaskDefaults {
    base: Arc<TaskInfo>,
    match_params: MatchParams,
    ocr_params: OcrParams,
    hash_params: HashParams,
}

impl TaskDefaults {
    #[must_use]
    pub fn new() -> Self {
        let base = TaskInfo {
            name: String::new(),
            payload: TaskPayload::MatchTemplate(MatchParams::default()),
            action: ProcessTaskAction::DoNothing,
            cache: true,
            max_times: u32::MAX,
            pre_delay: 0,
            post_delay: 0,
            roi: Rect::default(),
            rect_move: Rect::default(),
            specific_rect: Rect::default(),
            sub_error_ignored: false,
            special_params: Vec::new(),
            next: Vec::new(),
            sub: Vec::new(),
            exceeded_next: Vec::new(),
            on_error_next: Vec::new(),
            reduce_other_times: Vec::new(),
        };
        Self {
            base: Arc::new(base),
            match_params: MatchParams::default(),
            ocr_params: OcrParams::default(),
            hash_params: HashParams::default(),
        }
    }

    /// The parentless prototype (`MatchTemplate`, `DoNothing`, cached,
    /// unbounded, empty lists and rects).
    #[must_use]
    pub fn base(&self) -> &Arc<TaskInfo> {
        &self.base
    }

    #[must_use]
    pub fn match_params(&self) -> &MatchParams {
        &self.match_params
    }

    #[must_use]
    pub fn ocr_params(&self) -> &OcrParams {
        &self.ocr_params
    }

    #[must_use]
    pub fn hash_params(&self) -> &HashParams {
        &self.hash_params
    }
}

impl Default for TaskDefaults {
    fn default() -> Self {
        Self::new()
    }
}
