//! The [`Runtime`], which owns all window tracking state.
//!
//! The runtime is the single point of contact between the backends
//! and the rest of the dock. Backends create and destroy actors and
//! emit notifications through it; the dock issues requests through
//! it, and they are dispatched to the most recently registered
//! backend that implements them.

use custom_debug_derive::Debug;
use tracing::{debug, info};

use crate::core::{ActorId, ActorRegistry, DesktopGeometry, ProtocolHandle, WindowActor};
use crate::platform::{BackendStack, DesktopBackend, WindowBackend, WmCapabilities};
use crate::wayland::reconcile::Reconciler;
use crate::{DefaultErrorHandler, DockError, ErrorHandler};

mod commands;
/// Configuration of the runtime.
pub mod config;
mod hooks;
mod idle;
/// Notifications and listeners.
pub mod notify;

#[doc(inline)]
pub use config::{DockConfig, DockConfigBuilder};
#[doc(inline)]
pub use hooks::{Hook, PickCallback};
#[doc(inline)]
pub use idle::IdleWork;
#[doc(inline)]
pub use notify::{DesktopEvent, Listener, Notification, WindowEvent};

use hooks::Hooks;
use notify::Notifier;

/// Owns the actor registry, the registered backends, the listeners
/// and the Wayland reconciler.
///
/// There is exactly one runtime per dock. It is single-threaded and
/// does not run an event loop of its own: the host feeds protocol
/// events to the backends, and calls [`run_idle`](Self::run_idle)
/// when [`has_idle_work`](Self::has_idle_work) is true.
#[derive(Debug)]
pub struct Runtime {
    pub(crate) config: DockConfig,
    pub(crate) registry: ActorRegistry,
    pub(crate) windows: BackendStack<dyn WindowBackend>,
    pub(crate) desktops: BackendStack<dyn DesktopBackend>,
    pub(crate) notifier: Notifier,
    pub(crate) hooks: Hooks,
    pub(crate) reconciler: Reconciler,
    pub(crate) active: Option<ActorId>,
    pub(crate) last_active: Option<ActorId>,
    pub(crate) geometry: DesktopGeometry,
    pub(crate) idle: IdleWork,
    pub(crate) ready: bool,
    #[debug(skip)]
    error_handler: Box<dyn ErrorHandler>,
}

impl Runtime {
    /// Creates a new runtime with no backends registered.
    pub fn new(config: DockConfig) -> Self {
        info!("Creating runtime for '{}'", config.app_id());
        Self {
            config,
            registry: ActorRegistry::new(),
            windows: BackendStack::new(),
            desktops: BackendStack::new(),
            notifier: Notifier::default(),
            hooks: Hooks::default(),
            reconciler: Reconciler::default(),
            active: None,
            last_active: None,
            geometry: DesktopGeometry::default(),
            idle: IdleWork::empty(),
            ready: false,
            error_handler: Box::new(DefaultErrorHandler),
        }
    }

    /// The configuration of the runtime.
    pub fn config(&self) -> &DockConfig {
        &self.config
    }

    /// The actor registry.
    pub fn registry(&self) -> &ActorRegistry {
        &self.registry
    }

    /// Returns the actor with the given id.
    pub fn window(&self, id: ActorId) -> Option<&WindowActor> {
        self.registry.get(id)
    }

    /// Calls `f` on every actor, in stacking order (bottom first)
    /// if `ordered_by_z` is true, or by age (oldest first) otherwise.
    pub fn for_each_window<F>(&mut self, ordered_by_z: bool, f: F)
    where
        F: FnMut(&WindowActor),
    {
        self.registry.for_each(ordered_by_z, f)
    }

    /// Returns the first actor (by age) matching `pred`.
    pub fn find_window<P>(&self, pred: P) -> Option<ActorId>
    where
        P: FnMut(&WindowActor) -> bool,
    {
        self.registry.find(pred).map(|a| a.id())
    }

    /// Creates a new actor owning `handle`, and initializes it with `init`.
    ///
    /// No notification is emitted; the backend decides when the
    /// actor becomes visible to the dock.
    pub fn create_actor<F>(&mut self, handle: ProtocolHandle, init: F) -> ActorId
    where
        F: FnOnce(&mut WindowActor),
    {
        let id = self.registry.create(handle, init);
        trace!("Created {}", id);
        id
    }

    /// Releases an actor and its protocol handle.
    ///
    /// If a notification is being delivered, destruction is deferred
    /// until all listeners have run, so that the actor can still be
    /// looked up by any of them.
    pub fn release_actor(&mut self, id: ActorId) {
        self.forget_pointers(id);
        if self.notifier.dispatching {
            trace!("Deferring release of {}", id);
            self.notifier.graveyard.push(id);
        } else {
            self.registry.destroy(id);
        }
    }

    pub(crate) fn forget_pointers(&mut self, id: ActorId) {
        if self.active == Some(id) {
            self.active = None;
        }
        if self.last_active == Some(id) {
            self.last_active = None;
        }
        self.reconciler.forget(id);
    }

    //* Backends *//

    /// Registers a window backend on top of the existing ones.
    pub fn register_window_backend(&mut self, backend: Box<dyn WindowBackend>) {
        self.windows.register(backend)
    }

    /// Registers a desktop backend on top of the existing ones.
    pub fn register_desktop_backend(&mut self, backend: Box<dyn DesktopBackend>) {
        self.desktops.register(backend)
    }

    /// The names of the registered window backends.
    pub fn window_backend_names(&self) -> String {
        self.windows.names()
    }

    /// The names of the registered desktop backends.
    pub fn desktop_backend_names(&self) -> String {
        self.desktops.names()
    }

    /// The capabilities of the window backend.
    pub fn capabilities(&self) -> WmCapabilities {
        self.windows.capabilities()
    }

    //* Desktop geometry *//

    /// The current desktop layout.
    pub fn desktop_geometry(&self) -> &DesktopGeometry {
        &self.geometry
    }

    /// Replaces the desktop layout.
    ///
    /// Called by desktop backends; does not notify.
    pub fn set_desktop_geometry(&mut self, geometry: DesktopGeometry) {
        self.geometry = geometry;
    }

    pub(crate) fn desktop_geometry_mut(&mut self) -> &mut DesktopGeometry {
        &mut self.geometry
    }

    //* Active window *//

    /// The currently active window.
    pub fn active_window(&self) -> Option<ActorId> {
        self.active
    }

    /// The last window that was active.
    ///
    /// Unlike [`active_window`](Self::active_window), this is kept
    /// when focus moves to something the dock does not track.
    pub fn last_active_window(&self) -> Option<ActorId> {
        self.last_active
    }

    pub(crate) fn set_active(&mut self, id: Option<ActorId>) {
        self.active = id;
        if id.is_some() {
            self.last_active = id;
        }
    }

    //* Notifications *//

    /// Adds a listener receiving every notification.
    pub fn subscribe(&mut self, listener: Listener) {
        self.notifier.listeners.push(listener);
    }

    /// Delivers a notification to all listeners.
    ///
    /// Notifications emitted while another one is being delivered
    /// are queued and delivered in order once it is done.
    pub fn emit<N: Into<Notification>>(&mut self, n: N) {
        let n = n.into();
        if matches!(n, Notification::Window(WindowEvent::ZOrderChanged)) {
            self.registry.invalidate_z_order();
        }
        if self.notifier.dispatching {
            self.notifier.deferred.push_back(n);
            return;
        }

        self.notifier.dispatching = true;
        let mut listeners = std::mem::take(&mut self.notifier.listeners);
        let mut next = Some(n);
        while let Some(n) = next {
            trace!("Delivering {:?}", n);
            for listener in listeners.iter_mut() {
                listener(self, &n);
            }
            next = self.notifier.deferred.pop_front();
        }
        // keep listeners subscribed from within a listener
        listeners.append(&mut self.notifier.listeners);
        self.notifier.listeners = listeners;
        self.notifier.dispatching = false;

        for id in std::mem::take(&mut self.notifier.graveyard) {
            self.registry.destroy(id);
        }
    }

    //* Errors *//

    /// Sets the handler for errors raised by backends.
    pub fn set_error_handler(&mut self, handler: Box<dyn ErrorHandler>) {
        self.error_handler = handler;
    }

    /// Passes an error to the error handler.
    pub fn handle_error(&mut self, err: DockError) {
        let handler = std::mem::replace(&mut self.error_handler, Box::new(DefaultErrorHandler));
        handler.call(self, err);
        self.error_handler = handler;
    }
}
