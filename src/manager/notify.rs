//! The notification stream delivered to the rest of the dock.

use std::collections::VecDeque;
use std::fmt;

use strum::{AsRefStr, Display};

use super::Runtime;
use crate::core::ActorId;

/// A change to a window.
#[derive(Debug, Clone, PartialEq, Eq, AsRefStr, Display)]
pub enum WindowEvent {
    /// A window appeared in the taskbar.
    Created(ActorId),
    /// A window disappeared from the taskbar.
    ///
    /// The actor can still be queried while this is being delivered.
    Destroyed(ActorId),
    /// The title of a window changed.
    NameChanged(ActorId),
    /// The icon of a window changed.
    IconChanged(ActorId),
    /// A window started or stopped demanding attention.
    AttentionChanged(ActorId),
    /// A window was moved or resized.
    SizePositionChanged(ActorId),
    /// The minimized, maximized or fullscreen state of a window changed.
    StateChanged {
        /// The window.
        id: ActorId,
        /// Whether the minimized state changed.
        hidden_changed: bool,
        /// Whether the maximized state changed.
        maximized_changed: bool,
        /// Whether the fullscreen state changed.
        fullscreen_changed: bool,
    },
    /// The class of a window changed.
    ClassChanged {
        /// The window.
        id: ActorId,
        /// The parsed class before the change.
        old_class: Option<String>,
        /// The raw class before the change.
        old_wm_class: Option<String>,
    },
    /// The stacking order of windows changed.
    ZOrderChanged,
    /// A window was activated, or no window is active anymore.
    Activated(Option<ActorId>),
    /// A window moved to another desktop or viewport.
    DesktopChanged(ActorId),
}

impl WindowEvent {
    /// The window this event is about, if any.
    pub fn actor(&self) -> Option<ActorId> {
        use WindowEvent::*;
        match self {
            Created(id) | Destroyed(id) | NameChanged(id) | IconChanged(id)
            | AttentionChanged(id) | SizePositionChanged(id) | DesktopChanged(id) => Some(*id),
            StateChanged { id, .. } | ClassChanged { id, .. } => Some(*id),
            Activated(id) => *id,
            ZOrderChanged => None,
        }
    }
}

/// A change to the desktop.
#[derive(Debug, Clone, PartialEq, Eq, AsRefStr, Display)]
pub enum DesktopEvent {
    /// The current desktop or viewport changed.
    DesktopChanged,
    /// The number or layout of desktops changed.
    GeometryChanged {
        /// Whether the screen resolution changed too.
        resolution_changed: bool,
    },
    /// The desktop was shown or hidden.
    VisibilityChanged,
    /// The desktop names changed.
    NamesChanged,
    /// The wallpaper changed.
    WallpaperChanged,
    /// The keyboard state changed, while the given window was active.
    KbdStateChanged(Option<ActorId>),
    /// A grabbed shortcut was pressed.
    ShortkeyPressed {
        /// The key code.
        keycode: u32,
        /// The modifier mask.
        modifiers: u32,
    },
    /// The keymap is about to change, or has changed.
    KeymapChanged {
        /// Whether this is sent after the change.
        after: bool,
    },
}

/// A notification delivered to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A change to a window.
    Window(WindowEvent),
    /// A change to the desktop.
    Desktop(DesktopEvent),
}

impl From<WindowEvent> for Notification {
    fn from(e: WindowEvent) -> Self {
        Notification::Window(e)
    }
}

impl From<DesktopEvent> for Notification {
    fn from(e: DesktopEvent) -> Self {
        Notification::Desktop(e)
    }
}

/// A callback receiving notifications.
///
/// Listeners get mutable access to the runtime, so they can query
/// actors and issue requests. Anything they emit in turn is queued
/// and delivered after the current notification.
pub type Listener = Box<dyn FnMut(&mut Runtime, &Notification)>;

/// Macro for creating a notification [`Listener`].
///
/// It accepts closure syntax, for example:
///
/// ## Example
/// ```rust
/// use toarudock::{listener, Runtime, DockConfig};
///
/// let mut rt = Runtime::new(DockConfig::default());
/// rt.subscribe(listener!(|rt, n| {
///     println!("{:?} ({} windows)", n, rt.registry().len());
/// }));
/// ```
#[macro_export]
macro_rules! listener {
    (|$rt:ident, $n:ident| $code:tt) => {
        Box::new(|$rt: &mut $crate::Runtime, $n: &$crate::manager::Notification| $code)
        as $crate::manager::Listener
    };
    (move |$rt:ident, $n:ident| $code:tt) => {
        Box::new(move |$rt: &mut $crate::Runtime, $n: &$crate::manager::Notification| $code)
        as $crate::manager::Listener
    }
}

/// Delivers notifications to listeners, one at a time.
#[derive(Default)]
pub(crate) struct Notifier {
    pub(crate) listeners: Vec<Listener>,
    pub(crate) dispatching: bool,
    pub(crate) deferred: VecDeque<Notification>,
    pub(crate) graveyard: Vec<ActorId>,
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listeners.len())
            .field("dispatching", &self.dispatching)
            .field("deferred", &self.deferred)
            .field("graveyard", &self.graveyard)
            .finish()
    }
}
