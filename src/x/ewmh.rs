//! Reading and requesting EWMH state.
//!
//! The [`Ewmh`] trait is implemented for every [`XConn`], and wraps
//! the properties and client messages of the Extended Window Manager
//! Hints that the X11 backend uses. Requests are sent the way a pager
//! or taskbar would send them.

use std::str::FromStr;

use super::atom::Atom;
use super::core::{Result, XConn, XWindowID, XID_NONE};
use super::event::ClientMessageEvent;
use super::property::Property;
use crate::core::Rectangle;
use crate::platform::IconData;

/// The source indication of requests sent by pagers and taskbars.
pub const SOURCE_PAGER: u32 = 2;

/// The value of `_NET_WM_DESKTOP` for windows on all desktops.
pub const ALL_DESKTOPS: u32 = 0xFFFFFFFF;

// StaticGravity, with x and y set
const MOVE_FLAGS: u32 = 10 | 1 << 8 | 1 << 9;

bitflags! {

/// The `_NET_WM_STATE` atoms the backend cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NetWmStates: u32 {
    /// `_NET_WM_STATE_SKIP_TASKBAR`
    const SKIP_TASKBAR      = 1 << 0;
    /// `_NET_WM_STATE_HIDDEN`
    const HIDDEN            = 1 << 1;
    /// `_NET_WM_STATE_MAXIMIZED_VERT`
    const MAXIMIZED_VERT    = 1 << 2;
    /// `_NET_WM_STATE_MAXIMIZED_HORZ`
    const MAXIMIZED_HORZ    = 1 << 3;
    /// `_NET_WM_STATE_FULLSCREEN`
    const FULLSCREEN        = 1 << 4;
    /// `_NET_WM_STATE_DEMANDS_ATTENTION`
    const DEMANDS_ATTENTION = 1 << 5;
    /// `_NET_WM_STATE_STICKY`
    const STICKY            = 1 << 6;
    /// `_NET_WM_STATE_ABOVE`
    const ABOVE             = 1 << 7;
    /// `_NET_WM_STATE_BELOW`
    const BELOW             = 1 << 8;
}
}

impl NetWmStates {
    /// Parses a list of atom names, ignoring unknown states.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        names
            .iter()
            .filter_map(|n| Atom::from_str(n.as_ref()).ok())
            .fold(Self::empty(), |acc, atom| acc | Self::from_atom(atom))
    }

    fn from_atom(atom: Atom) -> Self {
        match atom {
            Atom::NetWmStateSkipTaskbar => Self::SKIP_TASKBAR,
            Atom::NetWmStateHidden => Self::HIDDEN,
            Atom::NetWmStateMaximizedVert => Self::MAXIMIZED_VERT,
            Atom::NetWmStateMaximizedHorz => Self::MAXIMIZED_HORZ,
            Atom::NetWmStateFullscreen => Self::FULLSCREEN,
            Atom::NetWmStateDemandsAttention => Self::DEMANDS_ATTENTION,
            Atom::NetWmStateSticky => Self::STICKY,
            Atom::NetWmStateAbove => Self::ABOVE,
            Atom::NetWmStateBelow => Self::BELOW,
            _ => Self::empty(),
        }
    }

    /// A window is maximized only if it is in both directions.
    pub fn is_maximized(&self) -> bool {
        self.contains(Self::MAXIMIZED_VERT | Self::MAXIMIZED_HORZ)
    }
}

/// The action of a `_NET_WM_STATE` request.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateAction {
    /// Unset the state.
    Remove = 0,
    /// Set the state.
    Add = 1,
    /// Toggle the state.
    Toggle = 2,
}

impl From<bool> for StateAction {
    fn from(set: bool) -> Self {
        if set {
            StateAction::Add
        } else {
            StateAction::Remove
        }
    }
}

/// EWMH functionality, provided for every [`XConn`].
pub trait Ewmh: XConn {
    //* Queries *//

    /// Returns the numbers stored in `prop`, or nothing if it is not set.
    fn cardinals(&self, prop: Atom, window: XWindowID) -> Result<Vec<u32>> {
        Ok(self
            .get_property(prop.as_ref(), window)?
            .and_then(|p| p.as_cardinals().map(|v| v.to_vec()))
            .unwrap_or_default())
    }

    /// Returns the managed windows, bottom first.
    fn client_list_stacking(&self) -> Result<Vec<XWindowID>> {
        Ok(self
            .get_property(Atom::NetClientListStacking.as_ref(), self.root())?
            .and_then(|p| p.as_windows().map(|v| v.to_vec()))
            .unwrap_or_default())
    }

    /// Returns the active window.
    fn active_window(&self) -> Result<Option<XWindowID>> {
        let active = self
            .get_property(Atom::NetActiveWindow.as_ref(), self.root())?
            .and_then(|p| p.first_cardinal());
        Ok(active.map(XWindowID::from).filter(|w| *w != XID_NONE))
    }

    /// Returns the states of `window`.
    fn window_states(&self, window: XWindowID) -> Result<NetWmStates> {
        Ok(self
            .get_property(Atom::NetWmState.as_ref(), window)?
            .and_then(|p| p.as_atoms().map(NetWmStates::from_names))
            .unwrap_or_default())
    }

    /// Returns the window types of `window`, in order of preference.
    fn window_types(&self, window: XWindowID) -> Result<Vec<String>> {
        Ok(self
            .get_property(Atom::NetWmWindowType.as_ref(), window)?
            .and_then(|p| p.as_atoms().map(|v| v.to_vec()))
            .unwrap_or_default())
    }

    /// Returns the desktop of `window`, or -1 if it is on all desktops.
    ///
    /// Windows that do not say are put on the first desktop.
    fn window_desktop(&self, window: XWindowID) -> Result<i32> {
        Ok(match self.cardinals(Atom::NetWmDesktop, window)?.first() {
            Some(&ALL_DESKTOPS) => -1,
            Some(d) => *d as i32,
            None => 0,
        })
    }

    /// Returns the current desktop.
    fn current_desktop(&self) -> Result<i32> {
        let current = self.cardinals(Atom::NetCurrentDesktop, self.root())?;
        Ok(current.first().copied().unwrap_or(0) as i32)
    }

    /// Returns the offset of the current viewport, in pixels.
    fn desktop_viewport(&self) -> Result<(i32, i32)> {
        let viewport = self.cardinals(Atom::NetDesktopViewport, self.root())?;
        match viewport.as_slice() {
            [x, y, ..] => Ok((*x as i32, *y as i32)),
            _ => Ok((0, 0)),
        }
    }

    /// Returns the number of desktops, which is at least one.
    fn number_of_desktops(&self) -> Result<i32> {
        let nb = self.cardinals(Atom::NetNumberOfDesktops, self.root())?;
        Ok((nb.first().copied().unwrap_or(1) as i32).max(1))
    }

    /// Returns the size of the whole desktop, if the window manager
    /// publishes it.
    fn desktop_geometry(&self) -> Result<Option<(i32, i32)>> {
        let geom = self.cardinals(Atom::NetDesktopGeometry, self.root())?;
        Ok(match geom.as_slice() {
            [w, h, ..] => Some((*w as i32, *h as i32)),
            _ => None,
        })
    }

    /// Returns the names of the desktops.
    fn desktop_names(&self) -> Result<Vec<String>> {
        Ok(self
            .get_property(Atom::NetDesktopNames.as_ref(), self.root())?
            .and_then(|p| p.as_strings().map(|v| v.to_vec()))
            .unwrap_or_default())
    }

    /// Whether the window manager is in "showing the desktop" mode.
    fn showing_desktop(&self) -> Result<bool> {
        let showing = self.cardinals(Atom::NetShowingDesktop, self.root())?;
        Ok(showing.first().is_some_and(|s| *s != 0))
    }

    /// Returns the actions the window manager allows on `window`.
    fn allowed_actions(&self, window: XWindowID) -> Result<Vec<Atom>> {
        Ok(self
            .get_property(Atom::NetWmAllowedActions.as_ref(), window)?
            .and_then(|p| {
                p.as_atoms()
                    .map(|v| v.iter().filter_map(|a| Atom::from_str(a).ok()).collect())
            })
            .unwrap_or_default())
    }

    /// Returns the raw `_NET_WM_ICON` data of `window`.
    fn wm_icon(&self, window: XWindowID) -> Result<Vec<u32>> {
        self.cardinals(Atom::NetWmIcon, window)
    }

    /// Returns the pixmap of the desktop background.
    fn root_pixmap(&self) -> Result<Option<u32>> {
        Ok(self
            .get_property(Atom::XRootPmapId.as_ref(), self.root())?
            .and_then(|p| p.first_cardinal())
            .filter(|p| *p != 0))
    }

    //* Requests *//

    /// Sends a client message of type `type_` about `window`.
    fn request(&self, window: XWindowID, type_: Atom, data: [u32; 5]) -> Result<()> {
        let type_ = self.atom(type_.as_ref())?;
        self.send_client_message(ClientMessageEvent::new(window, type_, data))
    }

    /// Asks the window manager to activate `window`.
    fn request_activate(&self, window: XWindowID) -> Result<()> {
        self.request(window, Atom::NetActiveWindow, [SOURCE_PAGER, 0, 0, 0, 0])
    }

    /// Asks the window manager to close `window`.
    fn request_close(&self, window: XWindowID) -> Result<()> {
        self.request(window, Atom::NetCloseWindow, [0, SOURCE_PAGER, 0, 0, 0])
    }

    /// Asks the window manager to change up to two states of `window`.
    fn request_state(
        &self,
        window: XWindowID,
        action: StateAction,
        first: Atom,
        second: Option<Atom>,
    ) -> Result<()> {
        let first = self.atom(first.as_ref())?;
        let second = match second {
            Some(atom) => self.atom(atom.as_ref())?,
            None => XID_NONE,
        };
        self.request(
            window,
            Atom::NetWmState,
            [action as u32, first.val(), second.val(), SOURCE_PAGER, 0],
        )
    }

    /// Asks the window manager to move `window` to `desktop`.
    fn request_desktop(&self, window: XWindowID, desktop: u32) -> Result<()> {
        self.request(window, Atom::NetWmDesktop, [desktop, SOURCE_PAGER, 0, 0, 0])
    }

    /// Asks the window manager to move `window` to `(x, y)`.
    fn request_move(&self, window: XWindowID, x: i32, y: i32) -> Result<()> {
        self.request(
            window,
            Atom::NetMoveResizeWindow,
            [MOVE_FLAGS, x as u32, y as u32, 0, 0],
        )
    }

    /// Asks the window manager to switch to `desktop`.
    fn request_current_desktop(&self, desktop: u32) -> Result<()> {
        self.request(self.root(), Atom::NetCurrentDesktop, [desktop, 0, 0, 0, 0])
    }

    /// Asks the window manager to scroll to the viewport at `(x, y)`, in pixels.
    fn request_viewport(&self, x: u32, y: u32) -> Result<()> {
        self.request(self.root(), Atom::NetDesktopViewport, [x, y, 0, 0, 0])
    }

    /// Asks the window manager to enter or leave "showing the desktop" mode.
    fn request_showing_desktop(&self, show: bool) -> Result<()> {
        self.request(self.root(), Atom::NetShowingDesktop, [show as u32, 0, 0, 0, 0])
    }

    /// Asks the window manager to change the number of desktops.
    fn request_number_of_desktops(&self, nb: u32) -> Result<()> {
        self.request(
            self.root(),
            Atom::NetNumberOfDesktops,
            [nb, 0, 0, SOURCE_PAGER, 0],
        )
    }

    /// Renames the desktops.
    fn set_desktop_names(&self, names: &[String]) -> Result<()> {
        self.set_property(
            self.root(),
            Atom::NetDesktopNames.as_ref(),
            Property::UTF8String(names.to_vec()),
        )
    }

    /// Tells the window manager where the taskbar entry of `window` is.
    fn set_icon_geometry(&self, window: XWindowID, area: Rectangle) -> Result<()> {
        self.set_property(
            window,
            Atom::NetWmIconGeometry.as_ref(),
            Property::Cardinal(vec![
                area.x as u32,
                area.y as u32,
                area.width as u32,
                area.height as u32,
            ]),
        )
    }

    /// Shows or hides the decorations of `window` through the Motif hints.
    fn set_motif_border(&self, window: XWindowID, border: bool) -> Result<()> {
        // flags: MWM_HINTS_DECORATIONS
        let hints = vec![2, 0, border as u32, 0, 0];
        self.set_property(
            window,
            Atom::MotifWmHints.as_ref(),
            Property::U32List(Atom::MotifWmHints.to_string(), hints),
        )
    }
}

impl<X: XConn> Ewmh for X {}

/// Picks the icon of `_NET_WM_ICON` data that fits `width` best.
///
/// The smallest icon at least as wide as `width` is preferred,
/// then the largest one. Truncated entries are ignored.
pub fn best_icon(data: &[u32], width: u32) -> Option<IconData> {
    let mut icons = Vec::new();
    let mut idx = 0;
    while idx + 2 <= data.len() {
        let (w, h) = (data[idx], data[idx + 1]);
        let len = (w as usize).saturating_mul(h as usize);
        let start = idx + 2;
        let Some(end) = start.checked_add(len).filter(|e| *e <= data.len()) else {
            break;
        };
        if len > 0 {
            icons.push((w, h, start..end));
        }
        idx = end;
    }

    let best = icons
        .iter()
        .filter(|(w, _, _)| *w >= width)
        .min_by_key(|(w, _, _)| *w)
        .or_else(|| icons.iter().max_by_key(|(w, _, _)| *w))?;

    let (w, h, range) = best.clone();
    Some(IconData {
        width: w,
        height: h,
        argb: data[range].to_vec(),
    })
}
