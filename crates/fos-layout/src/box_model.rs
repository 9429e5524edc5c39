//! Box Geometry
//!
//! Whole-pixel rectangles used for overflow tracking and float placement.

use serde::Serialize;

/// Point in block coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Rectangle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Grow to include the horizontal span `[left, right)`
    pub fn include_x(&mut self, left: i32, right: i32) {
        let new_left = self.x.min(left);
        let new_right = self.right().max(right);
        self.x = new_left;
        self.width = new_right - new_left;
    }

    /// Grow to include the vertical span `[top, bottom)`
    pub fn include_y(&mut self, top: i32, bottom: i32) {
        let new_top = self.y.min(top);
        let new_bottom = self.bottom().max(bottom);
        self.y = new_top;
        self.height = new_bottom - new_top;
    }
}
