//! Pixel and page-space geometry primitives.

use crate::util::{SlideError, SlideResult};

/// Integer pixel coordinate (column `x`, row `y`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned pixel rectangle with a non-zero area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    x: usize,
    y: usize,
    width: usize,
    height: usize,
}

impl BoundingBox {
    /// Creates a box, rejecting zero-area rectangles and edges past `usize::MAX`.
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> SlideResult<Self> {
        if width == 0 || height == 0 {
            return Err(SlideError::InvalidDimensions { width, height });
        }
        if x.checked_add(width).is_none() || y.checked_add(height).is_none() {
            return Err(SlideError::InvalidInput("bounding box edge overflows"));
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// Smallest box containing both inclusive corners.
    pub(crate) fn from_corners(x0: usize, y0: usize, x1: usize, y1: usize) -> Self {
        Self {
            x: x0,
            y: y0,
            width: x1 - x0 + 1,
            height: y1 - y0 + 1,
        }
    }

    pub fn x(&self) -> usize {
        self.x
    }

    pub fn y(&self) -> usize {
        self.y
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Exclusive right edge.
    pub fn right(&self) -> usize {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> usize {
        self.y + self.height
    }

    pub fn area(&self) -> usize {
        self.width * self.height
    }

    /// Returns true when pixel `(x, y)` lies inside the box.
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// Pointer position in page coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Element rectangle in page coordinates, as reported by the automation layer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Center of the rectangle, where a drag gesture starts.
    pub fn center(&self) -> Position {
        Position::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}
