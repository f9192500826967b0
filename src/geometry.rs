use glam::{vec2, Vec2};
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in canvas coordinates, with `y` growing downwards.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

/// Insets applied inside a container or canvas.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Padding {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: vec2(x, y),
            size: vec2(width, height),
        }
    }

    pub fn from_size(size: Vec2) -> Self {
        Self {
            origin: Vec2::ZERO,
            size,
        }
    }

    pub fn x(&self) -> f32 {
        self.origin.x
    }

    pub fn y(&self) -> f32 {
        self.origin.y
    }

    pub fn width(&self) -> f32 {
        self.size.x
    }

    pub fn height(&self) -> f32 {
        self.size.y
    }

    pub fn right(&self) -> f32 {
        self.origin.x + self.size.x
    }

    pub fn bottom(&self) -> f32 {
        self.origin.y + self.size.y
    }

    pub fn center(&self) -> Vec2 {
        self.origin + 0.5 * self.size
    }

    /// Whether both dimensions are at least those of `min_size`.
    pub fn fits(&self, min_size: Vec2) -> bool {
        self.size.cmpge(min_size).all()
    }

    /// Whether the interiors of the two rectangles overlap. Rectangles that
    /// only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x() < other.right()
            && other.x() < self.right()
            && self.y() < other.bottom()
            && other.y() < self.bottom()
    }

    /// Shrinks the rectangle by `padding` on each side. The result may have a
    /// non-positive size.
    pub fn inset(&self, padding: &Padding) -> Rect {
        Rect::new(
            self.x() + padding.left,
            self.y() + padding.top,
            self.width() - padding.left - padding.right,
            self.height() - padding.top - padding.bottom,
        )
    }
}

impl Padding {
    pub fn uniform(inset: f32) -> Self {
        Self {
            top: inset,
            right: inset,
            bottom: inset,
            left: inset,
        }
    }
}
