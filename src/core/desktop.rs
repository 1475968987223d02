//! The layout of desktops and viewports as reported by the backend.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::types::Rectangle;

/// The most desktops a backend is trusted to report.
pub(crate) const MAX_DESKTOP_NUM: u32 = 128;

/// The geometry of the virtual desktop.
///
/// A desktop (workspace) may be split into a grid of viewports,
/// each the size of the screen. The number of viewports can differ
/// between desktops on some Wayland compositors, so it is tracked
/// per desktop.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopGeometry {
    /// The geometry of each physical screen.
    pub screens: Vec<Rectangle>,
    /// The logical screen, covering all physical screens.
    pub xscreen: Rectangle,
    /// The number of desktops.
    pub nb_desktops: i32,
    /// The number of horizontal viewports on each desktop.
    pub viewports_x: Vec<i32>,
    /// The number of vertical viewports on each desktop.
    pub viewports_y: Vec<i32>,
    /// The index of the current desktop.
    pub current_desktop: i32,
    /// The horizontal index of the current viewport.
    pub current_viewport_x: i32,
    /// The vertical index of the current viewport.
    pub current_viewport_y: i32,
}

impl Default for DesktopGeometry {
    fn default() -> Self {
        Self {
            screens: Vec::new(),
            xscreen: Rectangle::zeroed(),
            nb_desktops: 1,
            viewports_x: vec![1],
            viewports_y: vec![1],
            current_desktop: 0,
            current_viewport_x: 0,
            current_viewport_y: 0,
        }
    }
}

impl DesktopGeometry {
    /// Creates a geometry of `nb_desktops` desktops, each with
    /// the same grid of viewports.
    pub fn uniform(xscreen: Rectangle, nb_desktops: i32, vx: i32, vy: i32) -> Self {
        let n = nb_desktops.max(1) as usize;
        Self {
            screens: vec![xscreen],
            xscreen,
            nb_desktops: nb_desktops.max(1),
            viewports_x: vec![vx.max(1); n],
            viewports_y: vec![vy.max(1); n],
            ..Self::default()
        }
    }

    /// The width of one viewport.
    #[inline]
    pub fn desktop_width(&self) -> i32 {
        self.xscreen.width
    }

    /// The height of one viewport.
    #[inline]
    pub fn desktop_height(&self) -> i32 {
        self.xscreen.height
    }

    /// The viewport grid of the given desktop.
    ///
    /// Returns `(1, 1)` for a desktop that is not tracked.
    pub fn viewports_of(&self, desktop: i32) -> (i32, i32) {
        if desktop < 0 {
            return (1, 1);
        }
        let idx = desktop as usize;
        (
            self.viewports_x.get(idx).copied().unwrap_or(1),
            self.viewports_y.get(idx).copied().unwrap_or(1),
        )
    }

    /// The geometry of the screen, at the origin of the current viewport.
    #[inline]
    pub fn current_screen(&self) -> Rectangle {
        Rectangle::new(0, 0, self.desktop_width(), self.desktop_height())
    }
}
