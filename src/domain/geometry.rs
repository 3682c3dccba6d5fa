/// Axis-aligned boxes in world space.
///
/// World space is y-up: `bottom < top`, origin at the bottom-left corner
/// of the playfield.

/// Playfield size in world units.
pub const PLAYFIELD_WIDTH: f32 = 800.0;
pub const PLAYFIELD_HEIGHT: f32 = 600.0;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rect {
    pub left: f32,
    pub bottom: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Box of the given size centered on `(cx, cy)`.
    pub fn centered(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Rect {
            left: cx - width / 2.0,
            bottom: cy - height / 2.0,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 { self.left + self.width }
    pub fn top(&self) -> f32 { self.bottom + self.height }

    /// Strict overlap: boxes that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right()
            && other.left < self.right()
            && self.bottom < other.top()
            && other.bottom < self.top()
    }

    /// Offset needed to pull this box inside `[0, max_x] × [0, max_y]`.
    ///
    /// Left and bottom edges win when the box is larger than the bounds.
    pub fn clamp_offset(&self, max_x: f32, max_y: f32) -> (f32, f32) {
        let dx = if self.left < 0.0 {
            -self.left
        } else if self.right() > max_x {
            max_x - self.right()
        } else {
            0.0
        };
        let dy = if self.bottom < 0.0 {
            -self.bottom
        } else if self.top() > max_y {
            max_y - self.top()
        } else {
            0.0
        };
        (dx, dy)
    }
}
