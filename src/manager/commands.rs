//! Requests issued by the dock, dispatched to the registered backends.
//!
//! Every request is a no-op returning a default value if no backend
//! implements it, or if the actor is not known.

use tracing::warn;

use super::Runtime;
use crate::core::{ActorId, Rectangle};
use crate::platform::{
    DesktopBackend, DesktopOp, IconData, Op, SupportedActions, WindowBackend, WindowRef,
    WmCapabilities,
};

impl Runtime {
    fn with_window<T, F>(&self, id: ActorId, mut f: F) -> Op<T>
    where
        F: FnMut(&dyn WindowBackend, WindowRef<'_>) -> Op<T>,
    {
        let Some((actor, handle)) = self.registry.entry(id) else {
            warn!("Request for unknown actor {}", id);
            return None;
        };
        let w = WindowRef { actor, handle };
        let ret = self.windows.dispatch(|b| f(b, w));
        if ret.is_none() {
            trace!("No backend handled the request for {}", id);
        }
        ret
    }

    fn with_desktop<T, F>(&self, mut f: F) -> Op<T>
    where
        F: FnMut(&dyn DesktopBackend) -> Op<T>,
    {
        self.desktops.dispatch(|b| f(b))
    }

    //* Window requests *//

    /// Raises and activates the window.
    pub fn show(&self, id: ActorId) {
        self.with_window(id, |b, w| b.show(w));
    }

    /// Asks the window to close.
    pub fn close(&self, id: ActorId) {
        self.with_window(id, |b, w| b.close(w));
    }

    /// Kills the client owning the window.
    pub fn kill(&self, id: ActorId) {
        self.with_window(id, |b, w| b.kill(w));
    }

    /// Minimizes the window.
    pub fn minimize(&self, id: ActorId) {
        self.with_window(id, |b, w| b.minimize(w));
    }

    /// Lowers the window to the bottom of the stack.
    pub fn lower(&self, id: ActorId) {
        self.with_window(id, |b, w| b.lower(w));
    }

    /// Maximizes or restores the window.
    pub fn maximize(&self, id: ActorId, maximize: bool) {
        self.with_window(id, |b, w| b.maximize(w, maximize));
    }

    /// Sets or unsets the fullscreen state of the window.
    pub fn set_fullscreen(&self, id: ActorId, fullscreen: bool) {
        self.with_window(id, |b, w| b.set_fullscreen(w, fullscreen));
    }

    /// Keeps the window above others, or stops doing so.
    pub fn set_above(&self, id: ActorId, above: bool) {
        self.with_window(id, |b, w| b.set_above(w, above));
    }

    /// Makes the window present on all desktops, or only on its own.
    pub fn set_sticky(&self, id: ActorId, sticky: bool) {
        self.with_window(id, |b, w| b.set_sticky(w, sticky));
    }

    /// Whether the window is present on all desktops.
    pub fn is_sticky(&self, id: ActorId) -> bool {
        self.registry.get(id).is_some_and(|a| a.is_sticky())
    }

    /// Moves the window to the given desktop and viewport.
    ///
    /// The viewport is given in absolute coordinates; backends that
    /// expect a relative move receive the offset from the current
    /// viewport, in pixels.
    pub fn move_to_desktop(&self, id: ActorId, desktop: i32, vx: i32, vy: i32) {
        let geom = &self.geometry;
        let dx = (vx - geom.current_viewport_x) * geom.desktop_width();
        let dy = (vy - geom.current_viewport_y) * geom.desktop_height();
        self.with_window(id, |b, w| {
            b.move_to_nth_desktop(w, desktop, dx, dy)
                .or_else(|| b.move_to_viewport_abs(w, desktop, vx, vy))
        });
    }

    /// Moves the window to the given desktop and absolute viewport.
    pub fn move_to_viewport_abs(&self, id: ActorId, desktop: i32, vx: i32, vy: i32) {
        self.with_window(id, |b, w| b.move_to_viewport_abs(w, desktop, vx, vy));
    }

    /// Moves the window to the current desktop and viewport.
    pub fn move_to_current_desktop(&self, id: ActorId) {
        let geom = &self.geometry;
        self.move_to_desktop(
            id,
            geom.current_desktop,
            geom.current_viewport_x,
            geom.current_viewport_y,
        )
    }

    /// Tells the window system where the window's taskbar entry is.
    pub fn set_thumbnail_area(&self, id: ActorId, area: Rectangle) {
        self.with_window(id, |b, w| b.set_thumbnail_area(w, area));
    }

    /// Tells the window system where to minimize the window to.
    pub fn set_minimize_position(&self, id: ActorId, x: i32, y: i32) {
        self.set_thumbnail_area(id, Rectangle::new(x, y, 1, 1))
    }

    /// Shows or hides the window's decorations.
    pub fn set_border(&self, id: ActorId, border: bool) {
        self.with_window(id, |b, w| b.set_border(w, border));
    }

    /// Returns the icon of the window.
    pub fn icon_surface(&self, id: ActorId, width: u32, height: u32) -> Option<IconData> {
        self.with_window(id, |b, w| b.icon_surface(w, width, height))
            .flatten()
    }

    /// Returns a thumbnail of the window.
    pub fn thumbnail_surface(&self, id: ActorId, width: u32, height: u32) -> Option<IconData> {
        self.with_window(id, |b, w| b.thumbnail_surface(w, width, height))
            .flatten()
    }

    /// Returns a texture holding the window contents, or 0.
    pub fn texture(&self, id: ActorId) -> u32 {
        self.with_window(id, |b, w| b.texture(w)).unwrap_or(0)
    }

    /// Returns the parent of the window.
    pub fn transient_for(&self, id: ActorId) -> Option<ActorId> {
        self.with_window(id, |b, w| b.transient_for(w)).flatten()
    }

    /// Returns whether the window is kept above and below others.
    pub fn is_above_or_below(&self, id: ActorId) -> (bool, bool) {
        self.with_window(id, |b, w| b.is_above_or_below(w))
            .unwrap_or((false, false))
    }

    /// Returns whether the window can be minimized, maximized and closed.
    pub fn can_minimize_maximize_close(&self, id: ActorId) -> (bool, bool, bool) {
        self.with_window(id, |b, w| b.can_minimize_maximize_close(w))
            .unwrap_or((true, true, true))
    }

    /// Returns the optional actions supported for the window.
    pub fn supported_actions(&self, id: ActorId) -> SupportedActions {
        self.with_window(id, |b, w| b.supported_actions(w))
            .unwrap_or_default()
    }

    /// Returns the protocol id of the window, or 0.
    pub fn window_id(&self, id: ActorId) -> u32 {
        self.with_window(id, |b, w| b.window_id(w)).unwrap_or(0)
    }

    /// Whether the window is visible on the current desktop and viewport.
    pub fn is_on_current_desktop(&self, id: ActorId) -> bool {
        self.registry
            .get(id)
            .is_some_and(|a| a.is_on_current_desktop(&self.geometry))
    }

    /// Whether the window is on the given desktop and viewport.
    pub fn is_on_desktop(&self, id: ActorId, desktop: i32, vx: i32, vy: i32) -> bool {
        self.registry
            .get(id)
            .is_some_and(|a| a.is_on_desktop(&self.geometry, desktop, vx, vy))
    }

    //* Capabilities *//

    /// Whether actor geometry is real.
    pub fn have_coordinates(&self) -> bool {
        self.capabilities().contains(WmCapabilities::HAVE_WINDOW_GEOMETRY)
    }

    /// Whether actors report which desktop they are on.
    pub fn can_track_workspaces(&self) -> bool {
        self.capabilities().contains(WmCapabilities::HAVE_WORKSPACES)
    }

    /// Whether actor positions are given in screen coordinates of the
    /// current viewport, rather than relative to the window's own.
    pub fn is_position_relative_to_current_viewport(&self) -> bool {
        !self.capabilities().contains(WmCapabilities::GEOM_REL_TO_VIEWPORT)
    }

    /// Whether a window can span several viewports.
    pub fn viewports_can_overlap(&self) -> bool {
        !self.capabilities().contains(WmCapabilities::NO_VIEWPORT_OVERLAP)
    }

    //* Desktop requests *//

    /// Whether some desktop backend implements `op`.
    pub fn desktop_can(&self, op: DesktopOp) -> bool {
        self.desktops.implements(op)
    }

    /// Shows all windows of the given class.
    pub fn present_class(&self, class: &str) -> bool {
        self.with_desktop(|b| b.present_class(class)).unwrap_or(false)
    }

    /// Shows all windows of the current desktop.
    pub fn present_windows(&self) -> bool {
        self.with_desktop(|b| b.present_windows()).unwrap_or(false)
    }

    /// Shows all desktops.
    pub fn present_desktops(&self) -> bool {
        self.with_desktop(|b| b.present_desktops()).unwrap_or(false)
    }

    /// Shows the widget layer.
    pub fn show_widget_layer(&self) -> bool {
        self.with_desktop(|b| b.show_widget_layer()).unwrap_or(false)
    }

    /// Puts a window on the widget layer, or takes it off.
    pub fn set_on_widget_layer(&self, id: ActorId, on: bool) -> bool {
        let xid = self.window_id(id);
        self.with_desktop(|b| b.set_on_widget_layer(xid, on))
            .unwrap_or(false)
    }

    /// Shows or hides the desktop.
    pub fn show_hide_desktop(&self, show: bool) -> bool {
        self.with_desktop(|b| b.show_hide_desktop(show))
            .unwrap_or(false)
    }

    /// Whether the desktop is currently shown.
    pub fn desktop_is_visible(&self) -> bool {
        self.with_desktop(|b| b.desktop_is_visible()).unwrap_or(false)
    }

    /// The names of the desktops.
    pub fn desktop_names(&self) -> Vec<String> {
        self.with_desktop(|b| b.desktop_names()).unwrap_or_default()
    }

    /// Renames the desktops.
    pub fn set_desktop_names(&self, names: &[String]) -> bool {
        self.with_desktop(|b| b.set_desktop_names(names))
            .unwrap_or(false)
    }

    /// An id of the desktop background, if there is one.
    pub fn desktop_background(&self) -> Option<u32> {
        self.with_desktop(|b| b.desktop_background()).flatten()
    }

    /// Switches to the given desktop and viewport.
    ///
    /// Requests outside of the current layout are rejected.
    pub fn set_current_desktop(&self, desktop: i32, vx: i32, vy: i32) -> bool {
        let geom = &self.geometry;
        let (nx, ny) = geom.viewports_of(desktop);
        if desktop < 0 || desktop >= geom.nb_desktops || vx < 0 || vx >= nx || vy < 0 || vy >= ny {
            warn!("Cannot switch to desktop {} ({}, {})", desktop, vx, vy);
            return false;
        }
        self.with_desktop(|b| b.set_current_desktop(geom, desktop, vx, vy))
            .unwrap_or(false)
    }

    /// Asks the desktop backends to re-read the desktop state.
    pub fn refresh_desktop(&self) {
        self.with_desktop(|b| b.refresh());
    }

    /// Grabs or releases a global shortcut.
    pub fn grab_shortkey(&self, keycode: u32, modifiers: u32, grab: bool) -> bool {
        self.with_desktop(|b| b.grab_shortkey(keycode, modifiers, grab))
            .unwrap_or(false)
    }

    /// Adds a workspace at the end.
    pub fn add_workspace(&self) {
        self.with_desktop(|b| b.add_workspace());
    }

    /// Removes the last workspace.
    pub fn remove_last_workspace(&self) {
        self.with_desktop(|b| b.remove_last_workspace());
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::core::{DesktopGeometry, ProtocolHandle};
    use crate::manager::DockConfig;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Call {
        Nth(i32, i32, i32),
        Abs(i32, i32, i32),
        Thumb(Rectangle),
    }

    struct Recorder {
        relative: bool,
        calls: Rc<RefCell<Vec<Call>>>,
    }

    impl WindowBackend for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn move_to_nth_desktop(&self, _: WindowRef<'_>, d: i32, dx: i32, dy: i32) -> Op<()> {
            if !self.relative {
                return None;
            }
            self.calls.borrow_mut().push(Call::Nth(d, dx, dy));
            Some(())
        }

        fn move_to_viewport_abs(&self, _: WindowRef<'_>, d: i32, vx: i32, vy: i32) -> Op<()> {
            self.calls.borrow_mut().push(Call::Abs(d, vx, vy));
            Some(())
        }

        fn set_thumbnail_area(&self, _: WindowRef<'_>, area: Rectangle) -> Op<()> {
            self.calls.borrow_mut().push(Call::Thumb(area));
            Some(())
        }
    }

    fn setup(relative: bool) -> (Runtime, ActorId, Rc<RefCell<Vec<Call>>>) {
        let mut rt = Runtime::new(DockConfig::default());
        let mut geom = DesktopGeometry::uniform(Rectangle::new(0, 0, 1920, 1080), 2, 3, 1);
        geom.current_viewport_x = 1;
        rt.set_desktop_geometry(geom);
        let calls = Rc::new(RefCell::new(Vec::new()));
        rt.register_window_backend(Box::new(Recorder {
            relative,
            calls: calls.clone(),
        }));
        let id = rt.create_actor(ProtocolHandle::new(()), |_| {});
        (rt, id, calls)
    }

    #[test]
    fn test_move_to_desktop_converts_to_offset() {
        let (rt, id, calls) = setup(true);
        rt.move_to_desktop(id, 1, 0, 0);
        rt.move_to_desktop(id, 0, 2, 0);
        assert_eq!(
            *calls.borrow(),
            vec![Call::Nth(1, -1920, 0), Call::Nth(0, 1920, 0)]
        );
    }

    #[test]
    fn test_move_to_desktop_falls_back_to_absolute() {
        let (rt, id, calls) = setup(false);
        rt.move_to_current_desktop(id);
        assert_eq!(*calls.borrow(), vec![Call::Abs(0, 1, 0)]);
    }

    #[test]
    fn test_defaults_when_unsupported() {
        let (rt, id, calls) = setup(true);
        rt.set_minimize_position(id, 10, 20);
        assert_eq!(*calls.borrow(), vec![Call::Thumb(Rectangle::new(10, 20, 1, 1))]);

        assert_eq!(rt.can_minimize_maximize_close(id), (true, true, true));
        assert_eq!(rt.is_above_or_below(id), (false, false));
        assert_eq!(rt.window_id(id), 0);
        assert!(rt.icon_surface(id, 32, 32).is_none());
        assert!(!rt.present_windows());
        assert!(!rt.desktop_can(DesktopOp::PresentWindows));
        assert!(rt.viewports_can_overlap());
        assert!(!rt.have_coordinates());
    }

    #[test]
    fn test_set_current_desktop_rejects_out_of_range() {
        let (rt, _, _) = setup(true);
        assert!(!rt.set_current_desktop(2, 0, 0));
        assert!(!rt.set_current_desktop(0, 3, 0));
    }
}
