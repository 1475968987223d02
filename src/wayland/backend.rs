use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::core::{ActorId, ProtocolHandle, Rectangle};
use crate::manager::Runtime;
use crate::platform::{Op, SupportedActions, WindowBackend, WindowRef, WmCapabilities};

bitflags! {

/// The requests a compositor accepts on toplevels.
///
/// Protocols with a capabilities event update these at runtime with
/// [`ToplevelMap::set_actions`]; requests not in the set are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ToplevelActions: u32 {
    /// The window can be asked to close.
    const CLOSE             = 1 << 0;
    /// The window can be activated.
    const ACTIVATE          = 1 << 1;
    /// The window can be maximized and unmaximized.
    const MAXIMIZE          = 1 << 2;
    /// The window can be minimized and unminimized.
    const MINIMIZE          = 1 << 3;
    /// The window can be made fullscreen.
    const FULLSCREEN        = 1 << 4;
    /// The window can be moved to another workspace.
    const MOVE_TO_WORKSPACE = 1 << 5;
    /// The window can be made sticky.
    const STICKY            = 1 << 6;
    /// The window can be kept above others.
    const ABOVE             = 1 << 7;
}
}

/// Sends requests for toplevels to the compositor.
///
/// Implemented by the host, which owns the Wayland connection. Every
/// request is optional; returning `None` means the protocol has no
/// such request, and it is passed on to the next backend.
#[allow(unused_variables)]
pub trait ToplevelRequests: 'static {
    /// The protocol object identifying a toplevel.
    type Handle: Any + Clone + PartialEq + fmt::Debug;

    /// Activates the toplevel.
    fn activate(&self, handle: &Self::Handle) -> Op<()> {
        None
    }

    /// Asks the toplevel to close.
    fn close(&self, handle: &Self::Handle) -> Op<()> {
        None
    }

    /// Minimizes or unminimizes the toplevel.
    fn set_minimized(&self, handle: &Self::Handle, minimized: bool) -> Op<()> {
        None
    }

    /// Maximizes or unmaximizes the toplevel.
    fn set_maximized(&self, handle: &Self::Handle, maximized: bool) -> Op<()> {
        None
    }

    /// Sets or unsets the fullscreen state of the toplevel.
    fn set_fullscreen(&self, handle: &Self::Handle, fullscreen: bool) -> Op<()> {
        None
    }

    /// Makes the toplevel sticky, or not.
    fn set_sticky(&self, handle: &Self::Handle, sticky: bool) -> Op<()> {
        None
    }

    /// Keeps the toplevel above others, or not.
    fn set_always_on_top(&self, handle: &Self::Handle, above: bool) -> Op<()> {
        None
    }

    /// Tells the compositor where the taskbar entry of the toplevel is,
    /// relative to the dock's surface.
    fn set_rectangle(&self, handle: &Self::Handle, area: Rectangle) -> Op<()> {
        None
    }

    /// Moves the toplevel to the workspace at the given position.
    fn move_to_workspace(&self, handle: &Self::Handle, desktop: i32, vx: i32, vy: i32) -> Op<()> {
        None
    }

    /// Destroys the protocol object. Called once the actor is released.
    fn destroy(&self, handle: Self::Handle) {}
}

#[derive(Debug, Default)]
struct Shared {
    actions: Cell<ToplevelActions>,
    above: RefCell<HashSet<ActorId>>,
}

/// The [`WindowBackend`] of a toplevel protocol.
///
/// Requests for actors whose handle is not an `R::Handle` are passed
/// on to the next backend.
pub struct ToplevelBackend<R: ToplevelRequests> {
    name: &'static str,
    flags: WmCapabilities,
    requests: Rc<R>,
    shared: Rc<Shared>,
}

impl<R: ToplevelRequests> fmt::Debug for ToplevelBackend<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToplevelBackend")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("actions", &self.shared.actions.get())
            .finish()
    }
}

impl<R: ToplevelRequests> ToplevelBackend<R> {
    fn allows(&self, action: ToplevelActions) -> bool {
        self.shared.actions.get().contains(action)
    }

    fn request<F>(&self, w: WindowRef<'_>, action: ToplevelActions, f: F) -> Op<()>
    where
        F: FnOnce(&R, &R::Handle) -> Op<()>,
    {
        let handle = w.handle::<R::Handle>()?;
        if !self.allows(action) {
            trace!("{}: {:?} not supported by the compositor", self.name, action);
            return Some(());
        }
        f(&*self.requests, handle)
    }
}

impl<R: ToplevelRequests> WindowBackend for ToplevelBackend<R> {
    fn name(&self) -> &str {
        self.name
    }

    fn capabilities(&self) -> Op<WmCapabilities> {
        Some(self.flags)
    }

    fn move_to_viewport_abs(&self, w: WindowRef<'_>, desktop: i32, vx: i32, vy: i32) -> Op<()> {
        self.request(w, ToplevelActions::MOVE_TO_WORKSPACE, |r, h| {
            r.move_to_workspace(h, desktop, vx, vy)
        })
    }

    fn show(&self, w: WindowRef<'_>) -> Op<()> {
        let hidden = w.actor.is_hidden();
        self.request(w, ToplevelActions::ACTIVATE, |r, h| {
            if hidden {
                r.set_minimized(h, false);
            }
            r.activate(h)
        })
    }

    fn close(&self, w: WindowRef<'_>) -> Op<()> {
        self.request(w, ToplevelActions::CLOSE, |r, h| r.close(h))
    }

    fn minimize(&self, w: WindowRef<'_>) -> Op<()> {
        self.request(w, ToplevelActions::MINIMIZE, |r, h| r.set_minimized(h, true))
    }

    fn maximize(&self, w: WindowRef<'_>, maximize: bool) -> Op<()> {
        self.request(w, ToplevelActions::MAXIMIZE, |r, h| r.set_maximized(h, maximize))
    }

    fn set_fullscreen(&self, w: WindowRef<'_>, fullscreen: bool) -> Op<()> {
        self.request(w, ToplevelActions::FULLSCREEN, |r, h| {
            r.set_fullscreen(h, fullscreen)
        })
    }

    fn set_above(&self, w: WindowRef<'_>, above: bool) -> Op<()> {
        self.request(w, ToplevelActions::ABOVE, |r, h| r.set_always_on_top(h, above))
    }

    fn set_sticky(&self, w: WindowRef<'_>, sticky: bool) -> Op<()> {
        self.request(w, ToplevelActions::STICKY, |r, h| r.set_sticky(h, sticky))
    }

    fn set_thumbnail_area(&self, w: WindowRef<'_>, area: Rectangle) -> Op<()> {
        if area.width < 0 || area.height < 0 {
            return w.handle::<R::Handle>().map(|_| ());
        }
        self.request(w, ToplevelActions::empty(), |r, h| r.set_rectangle(h, area))
    }

    fn transient_for(&self, w: WindowRef<'_>) -> Op<Option<ActorId>> {
        w.handle::<R::Handle>()?;
        Some(w.actor.parent())
    }

    fn is_above_or_below(&self, w: WindowRef<'_>) -> Op<(bool, bool)> {
        w.handle::<R::Handle>()?;
        Some((self.shared.above.borrow().contains(&w.id()), false))
    }

    fn can_minimize_maximize_close(&self, w: WindowRef<'_>) -> Op<(bool, bool, bool)> {
        w.handle::<R::Handle>()?;
        Some((
            self.allows(ToplevelActions::MINIMIZE),
            self.allows(ToplevelActions::MAXIMIZE),
            self.allows(ToplevelActions::CLOSE),
        ))
    }

    fn supported_actions(&self, w: WindowRef<'_>) -> Op<SupportedActions> {
        w.handle::<R::Handle>()?;
        let mut actions = SupportedActions::empty();
        actions.set(SupportedActions::FULLSCREEN, self.allows(ToplevelActions::FULLSCREEN));
        actions.set(SupportedActions::STICKY, self.allows(ToplevelActions::STICKY));
        actions.set(SupportedActions::ABOVE, self.allows(ToplevelActions::ABOVE));
        Some(actions)
    }
}

/// Maps the protocol handles of a toplevel protocol to actors.
///
/// Created together with the protocol's [`ToplevelBackend`], which
/// it shares the requests and the supported actions with.
pub struct ToplevelMap<R: ToplevelRequests> {
    requests: Rc<R>,
    shared: Rc<Shared>,
}

impl<R: ToplevelRequests> fmt::Debug for ToplevelMap<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToplevelMap")
            .field("actions", &self.shared.actions.get())
            .field("above", &self.shared.above.borrow().len())
            .finish()
    }
}

impl<R: ToplevelRequests> ToplevelMap<R> {
    /// Registers a window backend named `name` issuing requests through
    /// `requests`, and returns the map feeding it.
    pub fn register(
        rt: &mut Runtime,
        requests: R,
        name: &'static str,
        flags: WmCapabilities,
        actions: ToplevelActions,
    ) -> Self {
        let requests = Rc::new(requests);
        let shared = Rc::new(Shared::default());
        shared.actions.set(actions);
        rt.register_window_backend(Box::new(ToplevelBackend {
            name,
            flags,
            requests: requests.clone(),
            shared: shared.clone(),
        }));
        Self { requests, shared }
    }

    /// The requests of the protocol.
    pub fn requests(&self) -> &R {
        &self.requests
    }

    /// Creates an actor for a new toplevel.
    ///
    /// The handle is passed to [`ToplevelRequests::destroy`] once the
    /// actor is released.
    pub fn insert(&self, rt: &mut Runtime, handle: R::Handle) -> ActorId {
        let requests = self.requests.clone();
        let id = rt.new_toplevel(ProtocolHandle::with_release(handle, move |h| {
            requests.destroy(h)
        }));
        debug!("New toplevel {}", id);
        id
    }

    /// Returns the actor of the given handle.
    pub fn get(&self, rt: &Runtime, handle: &R::Handle) -> Option<ActorId> {
        let id = rt.registry().find_by_handle(handle);
        if id.is_none() {
            warn!("Event for unknown toplevel {:?}", handle);
        }
        id
    }

    /// Forgets everything known about a closed toplevel.
    pub fn remove(&self, id: ActorId) {
        self.shared.above.borrow_mut().remove(&id);
    }

    /// The requests currently accepted by the compositor.
    pub fn actions(&self) -> ToplevelActions {
        self.shared.actions.get()
    }

    /// Sets the requests accepted by the compositor.
    pub fn set_actions(&self, actions: ToplevelActions) {
        debug!("Toplevel actions: {:?}", actions);
        self.shared.actions.set(actions);
    }

    /// Records whether a toplevel is kept above others.
    pub fn set_above(&self, id: ActorId, above: bool) {
        let mut set = self.shared.above.borrow_mut();
        if above {
            set.insert(id);
        } else {
            set.remove(&id);
        }
    }
}
