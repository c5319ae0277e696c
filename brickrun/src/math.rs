use serde::{Deserialize, Serialize};

/// 2D vector type used throughout Brickrun.
///
/// World space has its origin at the top-left corner with `y` growing
/// downward, so a positive `y` velocity means falling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned box described by its top-left corner and size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_position(position: Vec2, size: Vec2) -> Self {
        Self::new(position.x, position.y, size.x, size.y)
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Move the box so its left edge sits at `left`.
    pub fn set_left(&mut self, left: f32) {
        self.x = left;
    }

    /// Move the box so its right edge sits at `right`.
    pub fn set_right(&mut self, right: f32) {
        self.x = right - self.width;
    }

    /// Move the box so its top edge sits at `top`.
    pub fn set_top(&mut self, top: f32) {
        self.y = top;
    }

    /// Move the box so its bottom edge sits at `bottom`.
    pub fn set_bottom(&mut self, bottom: f32) {
        self.y = bottom - self.height;
    }

    /// Strict overlap test: boxes that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Clamp the box horizontally so it stays within `[min_x, max_x]`.
    pub fn clamp_x(&mut self, min_x: f32, max_x: f32) {
        if self.left() < min_x {
            self.set_left(min_x);
        }
        if self.right() > max_x {
            self.set_right(max_x);
        }
    }
}
