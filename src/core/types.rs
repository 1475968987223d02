//! Basic types used throughout toarudock.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A rectangle in screen coordinates.
///
/// Whether the coordinates are absolute or relative to the current
/// viewport depends on the active backend; see
/// [`WmCapabilities`](crate::platform::WmCapabilities).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rectangle {
    /// The x coordinate of the top left corner.
    pub x: i32,
    /// The y coordinate of the top left corner.
    pub y: i32,
    /// The width of the rectangle.
    pub width: i32,
    /// The height of the rectangle.
    pub height: i32,
}

impl Rectangle {
    /// Creates a new Rectangle.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Returns a Rectangle with all fields zeroed.
    pub const fn zeroed() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Whether the rectangle has a positive area.
    #[inline]
    pub fn has_area(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Whether `self` overlaps `other`.
    ///
    /// Rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rectangle) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }
}

/// A unique identifier for a [`WindowActor`](crate::core::WindowActor).
///
/// Ids are never reused within a single [`Runtime`](crate::manager::Runtime).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ActorId(pub(crate) u64);

impl ActorId {
    /// Returns the internal value of the id.
    pub const fn val(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Actor({})", self.0)
    }
}
