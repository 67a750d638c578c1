//! Integer rectangles in window coordinates.

use serde::{Deserialize, Serialize};

/// Nominal window width used for ROI bounds checking.
pub const WINDOW_WIDTH_DEFAULT: i32 = 1280;

/// Nominal window height used for ROI bounds checking.
pub const WINDOW_HEIGHT_DEFAULT: i32 = 720;

/// An axis-aligned rectangle, encoded in task documents as `[x, y, w, h]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Create a rectangle from its components.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (`x + width`).
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Bottom edge (`y + height`).
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Whether the rectangle lies inside the nominal window.
    #[must_use]
    pub const fn fits_window(&self) -> bool {
        self.right() <= WINDOW_WIDTH_DEFAULT && self.bottom() <= WINDOW_HEIGHT_DEFAULT
    }
}

impl From<[i32; 4]> for Rect {
    fn from([x, y, width, height]: [i32; 4]) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl From<Rect> for [i32; 4] {
    fn from(r: Rect) -> Self {
        [r.x, r.y, r.width, r.height]
    }
}
