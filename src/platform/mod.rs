//! Traits for the backends that drive a [`Runtime`][1].
//!
//! A backend is a protocol-specific module (X11, or one of the Wayland
//! taskbar protocols) that knows how to carry out requests on the
//! windows and desktops it tracks. The rest of the dock never talks
//! to a concrete protocol; it goes through the [`Runtime`][1], which
//! dispatches every request through the registered backends.
//!
//! ## Optional operations
//!
//! Every operation on [`WindowBackend`] and [`DesktopBackend`] is
//! optional, since many are only supported by some compositors.
//! Each method returns an [`Op`]: `None` means the backend does not
//! implement that operation, and the default implementation of every
//! method does exactly that.
//!
//! ## Composition
//!
//! Backends are stacked. When an operation is requested, the most
//! recently registered backend that implements it is used, so a
//! backend only has to implement what it adds on top of the ones
//! registered before it. For example, the X11 backend implements
//! all window operations, while a shell-integration module might
//! only provide "present windows" on top of it. If no backend
//! implements an operation, the request is a no-op and returns a
//! default value; it is never an error.
//!
//! [1]: crate::manager::Runtime

use strum::{AsRefStr, Display, EnumIter};

use crate::core::{ActorId, DesktopGeometry, ProtocolHandle, Rectangle, WindowActor};

mod stack;

#[doc(inline)]
pub use stack::BackendStack;

/// The result of an optional backend operation.
///
/// `None` means the operation is not implemented by the backend.
pub type Op<T> = Option<T>;

bitflags! {

/// Flags published by a window backend to describe what its
/// geometry and desktop information mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WmCapabilities: u32 {
    /// Window geometry is relative to the current viewport,
    /// instead of being absolute.
    const GEOM_REL_TO_VIEWPORT = 1 << 0;
    /// Windows cannot span more than one viewport.
    const NO_VIEWPORT_OVERLAP  = 1 << 1;
    /// The backend reports real window geometry.
    const HAVE_WINDOW_GEOMETRY = 1 << 2;
    /// The backend reports which desktop a window is on.
    const HAVE_WORKSPACES      = 1 << 3;
}
}

bitflags! {

/// Optional window actions a backend may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SupportedActions: u32 {
    /// The window can be made fullscreen.
    const FULLSCREEN = 1 << 0;
    /// The window can be made sticky.
    const STICKY     = 1 << 1;
    /// The window can be kept below others.
    const BELOW      = 1 << 2;
    /// The window can be kept above others.
    const ABOVE      = 1 << 3;
    /// The client owning the window can be killed.
    const KILL       = 1 << 4;
}
}

/// Desktop operations whose availability can be queried without
/// performing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumIter)]
pub enum DesktopOp {
    /// [`DesktopBackend::present_class`]
    PresentClass,
    /// [`DesktopBackend::present_windows`]
    PresentWindows,
    /// [`DesktopBackend::present_desktops`]
    PresentDesktops,
    /// [`DesktopBackend::show_widget_layer`]
    ShowWidgetLayer,
    /// [`DesktopBackend::set_on_widget_layer`]
    SetOnWidgetLayer,
    /// [`DesktopBackend::show_hide_desktop`]
    ShowHideDesktop,
    /// [`DesktopBackend::set_desktop_names`]
    SetDesktopNames,
    /// [`DesktopBackend::set_current_desktop`]
    SetCurrentDesktop,
    /// [`DesktopBackend::grab_shortkey`]
    GrabShortkey,
    /// [`DesktopBackend::add_workspace`]
    AddWorkspace,
    /// [`DesktopBackend::remove_last_workspace`]
    RemoveLastWorkspace,
}

/// Pixel data of an icon or thumbnail, in ARGB32 format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconData {
    /// The width of the image.
    pub width: u32,
    /// The height of the image.
    pub height: u32,
    /// The pixels, row by row.
    pub argb: Vec<u32>,
}

/// A borrowed view of an actor and its protocol handle, passed
/// to backends.
#[derive(Debug, Clone, Copy)]
pub struct WindowRef<'a> {
    /// The actor the request is for.
    pub actor: &'a WindowActor,
    /// The protocol handle attached to the actor.
    pub handle: &'a ProtocolHandle,
}

impl<'a> WindowRef<'a> {
    /// The id of the actor.
    #[inline]
    pub fn id(&self) -> ActorId {
        self.actor.id()
    }

    /// Returns the protocol handle if it is of type `H`.
    #[inline]
    pub fn handle<H: 'static>(&self) -> Option<&'a H> {
        self.handle.downcast_ref::<H>()
    }
}

/// The operations a window backend can provide.
///
/// All operations except [`name`](Self::name) are optional. See
/// the [module-level documentation](self) for how backends are
/// combined.
#[allow(unused_variables)]
pub trait WindowBackend {
    /// The name of the backend.
    fn name(&self) -> &str;

    /// What the geometry and desktop fields of actors mean
    /// for this backend.
    fn capabilities(&self) -> Op<WmCapabilities> {
        None
    }

    /// Moves the window to the given desktop, offset by the given
    /// number of pixels from its current viewport.
    fn move_to_nth_desktop(&self, w: WindowRef<'_>, desktop: i32, dx: i32, dy: i32) -> Op<()> {
        None
    }

    /// Moves the window to the given desktop and absolute viewport.
    fn move_to_viewport_abs(&self, w: WindowRef<'_>, desktop: i32, vx: i32, vy: i32) -> Op<()> {
        None
    }

    /// Raises and activates the window, unminimizing it if needed.
    fn show(&self, w: WindowRef<'_>) -> Op<()> {
        None
    }

    /// Asks the window to close.
    fn close(&self, w: WindowRef<'_>) -> Op<()> {
        None
    }

    /// Forcibly kills the client owning the window.
    fn kill(&self, w: WindowRef<'_>) -> Op<()> {
        None
    }

    /// Minimizes the window.
    fn minimize(&self, w: WindowRef<'_>) -> Op<()> {
        None
    }

    /// Lowers the window to the bottom of the stack.
    fn lower(&self, w: WindowRef<'_>) -> Op<()> {
        None
    }

    /// Maximizes or unmaximizes the window.
    fn maximize(&self, w: WindowRef<'_>, maximize: bool) -> Op<()> {
        None
    }

    /// Sets or unsets the fullscreen state of the window.
    fn set_fullscreen(&self, w: WindowRef<'_>, fullscreen: bool) -> Op<()> {
        None
    }

    /// Keeps the window above other windows.
    fn set_above(&self, w: WindowRef<'_>, above: bool) -> Op<()> {
        None
    }

    /// Makes the window present on all desktops.
    fn set_sticky(&self, w: WindowRef<'_>, sticky: bool) -> Op<()> {
        None
    }

    /// Tells the window system where the window's taskbar entry is,
    /// which it can use as the target of a minimize animation.
    fn set_thumbnail_area(&self, w: WindowRef<'_>, area: Rectangle) -> Op<()> {
        None
    }

    /// Shows or hides the window's decorations.
    fn set_border(&self, w: WindowRef<'_>, border: bool) -> Op<()> {
        None
    }

    /// Returns the icon of the window, scaled as close as possible
    /// to the given size.
    fn icon_surface(&self, w: WindowRef<'_>, width: u32, height: u32) -> Op<Option<IconData>> {
        None
    }

    /// Returns a thumbnail of the window contents.
    fn thumbnail_surface(&self, w: WindowRef<'_>, width: u32, height: u32) -> Op<Option<IconData>> {
        None
    }

    /// Returns a texture name holding the window contents.
    fn texture(&self, w: WindowRef<'_>) -> Op<u32> {
        None
    }

    /// Returns the parent of the window.
    fn transient_for(&self, w: WindowRef<'_>) -> Op<Option<ActorId>> {
        None
    }

    /// Returns whether the window is kept above and below others.
    fn is_above_or_below(&self, w: WindowRef<'_>) -> Op<(bool, bool)> {
        None
    }

    /// Returns whether the window can be minimized, maximized and closed.
    fn can_minimize_maximize_close(&self, w: WindowRef<'_>) -> Op<(bool, bool, bool)> {
        None
    }

    /// Returns the optional actions supported for the window.
    fn supported_actions(&self, w: WindowRef<'_>) -> Op<SupportedActions> {
        None
    }

    /// Returns a numeric id for the window, if the protocol has one.
    fn window_id(&self, w: WindowRef<'_>) -> Op<u32> {
        None
    }
}

/// The operations a desktop backend can provide.
///
/// As with [`WindowBackend`], everything except [`name`](Self::name)
/// is optional.
#[allow(unused_variables)]
pub trait DesktopBackend {
    /// The name of the backend.
    fn name(&self) -> &str;

    /// Whether the backend implements `op`.
    ///
    /// Used to decide whether to offer an action at all, without
    /// carrying it out.
    fn implements(&self, op: DesktopOp) -> bool {
        false
    }

    /// Shows all windows of the given class (exposé-like).
    fn present_class(&self, class: &str) -> Op<bool> {
        None
    }

    /// Shows all windows of the current desktop.
    fn present_windows(&self) -> Op<bool> {
        None
    }

    /// Shows all desktops.
    fn present_desktops(&self) -> Op<bool> {
        None
    }

    /// Shows the widget layer.
    fn show_widget_layer(&self) -> Op<bool> {
        None
    }

    /// Puts a window on the widget layer, or takes it off.
    fn set_on_widget_layer(&self, window: u32, on: bool) -> Op<bool> {
        None
    }

    /// Shows or hides the desktop.
    fn show_hide_desktop(&self, show: bool) -> Op<bool> {
        None
    }

    /// Whether the desktop is currently shown.
    fn desktop_is_visible(&self) -> Op<bool> {
        None
    }

    /// Returns the names of all desktops.
    fn desktop_names(&self) -> Op<Vec<String>> {
        None
    }

    /// Renames the desktops.
    fn set_desktop_names(&self, names: &[String]) -> Op<bool> {
        None
    }

    /// Returns an id of the desktop background, if the window system
    /// exposes one.
    fn desktop_background(&self) -> Op<Option<u32>> {
        None
    }

    /// Switches to the given desktop and viewport.
    fn set_current_desktop(&self, geom: &DesktopGeometry, desktop: i32, vx: i32, vy: i32) -> Op<bool> {
        None
    }

    /// Re-reads the desktop state.
    fn refresh(&self) -> Op<()> {
        None
    }

    /// Grabs or releases a global keyboard shortcut.
    fn grab_shortkey(&self, keycode: u32, modifiers: u32, grab: bool) -> Op<bool> {
        None
    }

    /// Adds a workspace at the end.
    fn add_workspace(&self) -> Op<()> {
        None
    }

    /// Removes the last workspace.
    fn remove_last_workspace(&self) -> Op<()> {
        None
    }
}
