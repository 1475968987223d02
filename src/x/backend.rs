//! The request side of the X11 backend.

use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use super::atom::Atom;
use super::core::{Result, XConn, XWindowID};
use super::ewmh::{best_icon, Ewmh, NetWmStates, StateAction, ALL_DESKTOPS};
use super::icccm::Icccm;
use super::manager::XState;
use crate::core::{ActorId, DesktopGeometry, Rectangle};
use crate::platform::{
    DesktopBackend, DesktopOp, IconData, Op, SupportedActions, WindowBackend, WindowRef,
    WmCapabilities,
};

// every combination of caps lock, num lock and scroll lock
const LOCK_COMBINATIONS: [u16; 8] = [0, 0x10, 0x2, 0x80, 0x12, 0x90, 0x82, 0x92];

/// The [`WindowBackend`] for windows tracked by the X11 manager.
///
/// Requests go to the window manager as EWMH client messages.
/// Requests for actors that are not X windows are passed on.
pub(crate) struct X11WindowBackend<X: XConn> {
    conn: Rc<X>,
    state: Rc<XState>,
}

impl<X: XConn> fmt::Debug for X11WindowBackend<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("X11WindowBackend")
            .field("clients", &self.state.clients.borrow().len())
            .finish()
    }
}

impl<X: XConn> X11WindowBackend<X> {
    pub(crate) fn new(conn: Rc<X>, state: Rc<XState>) -> Self {
        Self { conn, state }
    }

    fn request<F>(&self, w: WindowRef<'_>, what: &str, f: F) -> Op<()>
    where
        F: FnOnce(&X, XWindowID) -> Result<()>,
    {
        let window = *w.handle::<XWindowID>()?;
        trace!("Request '{}' for {}", what, window);
        if let Err(e) = f(&*self.conn, window) {
            warn!("Could not {} {}: {}", what, window, e);
        }
        Some(())
    }

    fn query<T, F>(&self, w: WindowRef<'_>, default: T, f: F) -> Op<T>
    where
        F: FnOnce(&X, XWindowID) -> Result<T>,
    {
        let window = *w.handle::<XWindowID>()?;
        Some(f(&*self.conn, window).unwrap_or_else(|e| {
            debug!("Could not query {}: {}", window, e);
            default
        }))
    }
}

impl<X: XConn> WindowBackend for X11WindowBackend<X> {
    fn name(&self) -> &str {
        "x11"
    }

    fn capabilities(&self) -> Op<WmCapabilities> {
        Some(WmCapabilities::HAVE_WINDOW_GEOMETRY | WmCapabilities::HAVE_WORKSPACES)
    }

    fn move_to_nth_desktop(&self, w: WindowRef<'_>, desktop: i32, dx: i32, dy: i32) -> Op<()> {
        let geometry = w.actor.geometry();
        self.request(w, "move", |conn, window| {
            let screen = conn.get_geometry(conn.root())?;
            // position on its own viewport
            let x = geometry.x.rem_euclid(screen.width.max(1));
            let y = geometry.y.rem_euclid(screen.height.max(1));
            let desktop = u32::try_from(desktop).unwrap_or(ALL_DESKTOPS);
            conn.request_desktop(window, desktop)?;
            conn.request_move(window, x + dx, y + dy)
        })
    }

    fn show(&self, w: WindowRef<'_>) -> Op<()> {
        self.request(w, "show", |conn, window| {
            let desktop = conn.window_desktop(window)?;
            let sticky = conn.window_states(window)?.contains(NetWmStates::STICKY);
            // the window manager may not switch desktops by itself
            if desktop >= 0 && !sticky {
                conn.request_current_desktop(desktop as u32)?;
            }
            conn.request_activate(window)
        })
    }

    fn close(&self, w: WindowRef<'_>) -> Op<()> {
        self.request(w, "close", |conn, window| conn.request_close(window))
    }

    fn kill(&self, w: WindowRef<'_>) -> Op<()> {
        self.request(w, "kill", |conn, window| conn.kill_client(window))
    }

    fn minimize(&self, w: WindowRef<'_>) -> Op<()> {
        self.request(w, "minimize", |conn, window| conn.request_iconify(window))
    }

    fn lower(&self, w: WindowRef<'_>) -> Op<()> {
        self.request(w, "lower", |conn, window| conn.lower_window(window))
    }

    fn maximize(&self, w: WindowRef<'_>, maximize: bool) -> Op<()> {
        self.request(w, "maximize", |conn, window| {
            conn.request_state(
                window,
                maximize.into(),
                Atom::NetWmStateMaximizedVert,
                Some(Atom::NetWmStateMaximizedHorz),
            )
        })
    }

    fn set_fullscreen(&self, w: WindowRef<'_>, fullscreen: bool) -> Op<()> {
        self.request(w, "fullscreen", |conn, window| {
            conn.request_state(window, fullscreen.into(), Atom::NetWmStateFullscreen, None)
        })
    }

    fn set_above(&self, w: WindowRef<'_>, above: bool) -> Op<()> {
        self.request(w, "keep above", |conn, window| {
            conn.request_state(window, above.into(), Atom::NetWmStateAbove, None)
        })
    }

    fn set_sticky(&self, w: WindowRef<'_>, sticky: bool) -> Op<()> {
        self.request(w, "stick", |conn, window| {
            conn.request_state(window, StateAction::from(sticky), Atom::NetWmStateSticky, None)
        })
    }

    fn set_thumbnail_area(&self, w: WindowRef<'_>, area: Rectangle) -> Op<()> {
        self.request(w, "set the icon geometry of", |conn, window| {
            conn.set_icon_geometry(window, area)
        })
    }

    fn set_border(&self, w: WindowRef<'_>, border: bool) -> Op<()> {
        self.request(w, "set the border of", |conn, window| {
            conn.set_motif_border(window, border)
        })
    }

    fn icon_surface(&self, w: WindowRef<'_>, width: u32, _: u32) -> Op<Option<IconData>> {
        self.query(w, None, |conn, window| {
            Ok(best_icon(&conn.wm_icon(window)?, width))
        })
    }

    fn transient_for(&self, w: WindowRef<'_>) -> Op<Option<ActorId>> {
        let window = *w.handle::<XWindowID>()?;
        let parent = self
            .state
            .clients
            .borrow()
            .get(&window)
            .and_then(|c| c.transient_for);
        Some(parent.and_then(|p| self.state.actor_of(p)))
    }

    fn is_above_or_below(&self, w: WindowRef<'_>) -> Op<(bool, bool)> {
        self.query(w, (false, false), |conn, window| {
            let states = conn.window_states(window)?;
            Ok((
                states.contains(NetWmStates::ABOVE),
                states.contains(NetWmStates::BELOW),
            ))
        })
    }

    fn can_minimize_maximize_close(&self, w: WindowRef<'_>) -> Op<(bool, bool, bool)> {
        self.query(w, (true, true, true), |conn, window| {
            let actions = conn.allowed_actions(window)?;
            let has = |a| actions.contains(&a);
            Ok((
                has(Atom::NetWmActionMinimize),
                has(Atom::NetWmActionMaximizeHorz) && has(Atom::NetWmActionMaximizeVert),
                has(Atom::NetWmActionClose),
            ))
        })
    }

    fn supported_actions(&self, w: WindowRef<'_>) -> Op<SupportedActions> {
        w.handle::<XWindowID>().map(|_| SupportedActions::all())
    }

    fn window_id(&self, w: WindowRef<'_>) -> Op<u32> {
        w.handle::<XWindowID>().map(|xid| xid.val())
    }
}

/// The [`DesktopBackend`] of an EWMH-compliant window manager.
pub(crate) struct X11DesktopBackend<X: XConn> {
    conn: Rc<X>,
    state: Rc<XState>,
}

impl<X: XConn> fmt::Debug for X11DesktopBackend<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("X11DesktopBackend")
            .field("refresh", &self.state.refresh.get())
            .finish()
    }
}

impl<X: XConn> X11DesktopBackend<X> {
    pub(crate) fn new(conn: Rc<X>, state: Rc<XState>) -> Self {
        Self { conn, state }
    }

    fn run<T, F>(&self, what: &str, default: T, f: F) -> T
    where
        F: FnOnce(&X) -> Result<T>,
    {
        f(&*self.conn).unwrap_or_else(|e| {
            warn!("Could not {}: {}", what, e);
            default
        })
    }
}

impl<X: XConn> DesktopBackend for X11DesktopBackend<X> {
    fn name(&self) -> &str {
        "x11"
    }

    fn implements(&self, op: DesktopOp) -> bool {
        matches!(
            op,
            DesktopOp::ShowHideDesktop
                | DesktopOp::SetDesktopNames
                | DesktopOp::SetCurrentDesktop
                | DesktopOp::GrabShortkey
                | DesktopOp::AddWorkspace
                | DesktopOp::RemoveLastWorkspace
        )
    }

    fn show_hide_desktop(&self, show: bool) -> Op<bool> {
        Some(self.run("show the desktop", false, |conn| {
            conn.request_showing_desktop(show).map(|_| true)
        }))
    }

    fn desktop_is_visible(&self) -> Op<bool> {
        Some(self.run("read the desktop state", false, |conn| conn.showing_desktop()))
    }

    fn desktop_names(&self) -> Op<Vec<String>> {
        Some(self.run("read the desktop names", Vec::new(), |conn| {
            conn.desktop_names()
        }))
    }

    fn set_desktop_names(&self, names: &[String]) -> Op<bool> {
        Some(self.run("rename the desktops", false, |conn| {
            conn.set_desktop_names(names).map(|_| true)
        }))
    }

    fn desktop_background(&self) -> Op<Option<u32>> {
        Some(self.run("read the wallpaper", None, |conn| conn.root_pixmap()))
    }

    fn set_current_desktop(&self, geom: &DesktopGeometry, desktop: i32, vx: i32, vy: i32) -> Op<bool> {
        Some(self.run("switch desktops", false, |conn| {
            if desktop >= 0 {
                conn.request_current_desktop(desktop as u32)?;
            }
            if vx >= 0 && vy >= 0 {
                conn.request_viewport(
                    (vx * geom.desktop_width()) as u32,
                    (vy * geom.desktop_height()) as u32,
                )?;
            }
            Ok(true)
        }))
    }

    fn refresh(&self) -> Op<()> {
        self.state.refresh.set(true);
        Some(())
    }

    fn grab_shortkey(&self, keycode: u32, modifiers: u32, grab: bool) -> Op<bool> {
        let (Ok(keycode), Ok(modifiers)) = (u8::try_from(keycode), u16::try_from(modifiers)) else {
            warn!("Invalid shortkey {} with modifiers {:#x}", keycode, modifiers);
            return Some(false);
        };
        Some(self.run("grab a shortkey", false, |conn| {
            // the grab has to ignore the lock keys
            for locks in LOCK_COMBINATIONS {
                if grab {
                    conn.grab_key(keycode, modifiers | locks)?;
                } else {
                    conn.ungrab_key(keycode, modifiers | locks)?;
                }
            }
            Ok(true)
        }))
    }

    fn add_workspace(&self) -> Op<()> {
        self.run("add a desktop", (), |conn| {
            let nb = conn.number_of_desktops()?;
            conn.request_number_of_desktops((nb + 1) as u32)
        });
        Some(())
    }

    fn remove_last_workspace(&self) -> Op<()> {
        self.run("remove a desktop", (), |conn| {
            let nb = conn.number_of_desktops()?;
            if nb > 1 {
                conn.request_number_of_desktops((nb - 1) as u32)?;
            }
            Ok(())
        });
        Some(())
    }
}
