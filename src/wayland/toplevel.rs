use tracing::warn;

use crate::core::{ActorId, ProtocolHandle, Rectangle};
use crate::manager::Runtime;

/// Updates received for a toplevel since its last commit.
///
/// Boolean and desktop fields hold the latest value reported by the
/// compositor and are compared against the actor at commit time;
/// `title` and `class` are only set when a new value arrived.
#[derive(Debug, Clone, Default)]
pub struct PendingState {
    pub(crate) title: Option<String>,
    pub(crate) class: Option<String>,
    pub(crate) class_extra: Option<String>,

    pub(crate) minimized: bool,
    pub(crate) maximized: bool,
    pub(crate) fullscreen: bool,
    pub(crate) attention: bool,
    pub(crate) sticky: bool,

    pub(crate) desktop: i32,
    pub(crate) viewport: (i32, i32),
    pub(crate) geometry: Rectangle,
    pub(crate) stacking_order: i32,

    pub(crate) close: bool,
    pub(crate) unfocused: bool,
    pub(crate) init_done: bool,
    pub(crate) in_queue: bool,
}

impl PendingState {
    pub(crate) fn new() -> Self {
        Self {
            desktop: -1,
            ..Self::default()
        }
    }

    /// Whether the compositor has sent a first complete snapshot.
    pub fn init_done(&self) -> bool {
        self.init_done
    }

    /// Whether the toplevel is waiting in the commit queue.
    pub fn in_queue(&self) -> bool {
        self.in_queue
    }
}

/// A mutable view of a Wayland toplevel, used by protocol adapters
/// to record updates.
///
/// Every setter stores its value as pending state. Nothing is visible
/// to the rest of the dock until [`done`](Self::done) is called, either
/// explicitly or by passing `notify = true` to a setter (for protocols
/// that have no `done` event of their own).
#[derive(Debug)]
pub struct Toplevel<'rt> {
    rt: &'rt mut Runtime,
    id: ActorId,
}

impl Runtime {
    /// Creates a new Wayland toplevel actor owning `handle`.
    ///
    /// The actor is not displayed until its first commit makes it
    /// eligible.
    pub fn new_toplevel(&mut self, handle: ProtocolHandle) -> ActorId {
        self.create_actor(handle, |actor| {
            actor.num_desktop = -1;
            actor.pending = Some(Box::new(PendingState::new()));
        })
    }

    /// Returns a view of the toplevel with the given id.
    ///
    /// Returns `None` if there is no such actor, or if it is not a
    /// Wayland toplevel.
    pub fn toplevel(&mut self, id: ActorId) -> Option<Toplevel<'_>> {
        if !self.registry.get(id)?.is_wayland() {
            return None;
        }
        Some(Toplevel { rt: self, id })
    }
}

impl<'rt> Toplevel<'rt> {
    /// The id of the actor.
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// The runtime this toplevel belongs to.
    pub fn runtime(&mut self) -> &mut Runtime {
        self.rt
    }

    /// The pending state of the toplevel.
    pub fn pending(&self) -> Option<&PendingState> {
        self.rt.registry.get(self.id)?.pending.as_deref()
    }

    fn update<F>(&mut self, notify: bool, f: F)
    where
        F: FnOnce(&mut PendingState),
    {
        let pending = self
            .rt
            .registry
            .get_mut(self.id)
            .and_then(|a| a.pending.as_deref_mut());
        let Some(pending) = pending else {
            warn!("Update for unknown toplevel {}", self.id);
            return;
        };
        f(pending);
        if notify {
            self.done();
        }
    }

    /// The title changed.
    pub fn title_changed(&mut self, title: &str, notify: bool) {
        self.update(notify, |p| p.title = Some(title.into()));
    }

    /// The app-id changed.
    ///
    /// Some compositors append extra information after a space; it is
    /// split off and kept separately from the class.
    pub fn app_id_changed(&mut self, app_id: &str, notify: bool) {
        let (class, extra) = match app_id.split_once(' ') {
            Some((class, extra)) if !extra.is_empty() => (class, Some(extra.to_string())),
            Some((class, _)) => (class, None),
            None => (app_id, None),
        };
        self.update(notify, |p| {
            p.class = Some(class.into());
            p.class_extra = extra;
        });
    }

    /// The window was maximized or unmaximized.
    pub fn maximized_changed(&mut self, maximized: bool, notify: bool) {
        self.update(notify, |p| p.maximized = maximized);
    }

    /// The window was minimized or unminimized.
    pub fn minimized_changed(&mut self, minimized: bool, notify: bool) {
        self.update(notify, |p| p.minimized = minimized);
    }

    /// The window entered or left fullscreen.
    pub fn fullscreen_changed(&mut self, fullscreen: bool, notify: bool) {
        self.update(notify, |p| p.fullscreen = fullscreen);
    }

    /// The window started or stopped demanding attention.
    pub fn attention_changed(&mut self, attention: bool, notify: bool) {
        self.update(notify, |p| p.attention = attention);
    }

    /// The window became sticky, or stopped being sticky.
    pub fn sticky_changed(&mut self, sticky: bool, notify: bool) {
        self.update(notify, |p| p.sticky = sticky);
    }

    /// The window moved to another desktop or viewport.
    pub fn viewport_changed(&mut self, desktop: i32, vx: i32, vy: i32, notify: bool) {
        self.update(notify, |p| {
            p.desktop = desktop;
            p.viewport = (vx, vy);
        });
    }

    /// The window was moved or resized.
    pub fn geometry_changed(&mut self, geometry: Rectangle, notify: bool) {
        self.update(notify, |p| p.geometry = geometry);
    }

    /// The skip-taskbar hint changed.
    ///
    /// Takes effect immediately, since it only matters for eligibility,
    /// which is evaluated at every commit.
    pub fn skip_taskbar_changed(&mut self, skip: bool, notify: bool) {
        if let Some(actor) = self.rt.registry.get_mut(self.id) {
            actor.skip_taskbar = skip;
        }
        self.update(notify, |_| {});
    }

    /// The parent of the window changed.
    pub fn parent_changed(&mut self, parent: Option<ActorId>, notify: bool) {
        if let Some(actor) = self.rt.registry.get_mut(self.id) {
            actor.parent = parent;
            actor.transient = parent.is_some();
        }
        self.update(notify, |_| {});
    }

    /// The window was activated or deactivated.
    ///
    /// Only the last activation reported before a commit is taken into
    /// account; an earlier one for another window is overridden.
    pub fn activated(&mut self, active: bool, notify: bool) {
        let id = self.id;
        let reconciler = &mut self.rt.reconciler;
        if active {
            reconciler.maybe_active = Some(id);
        } else if reconciler.maybe_active == Some(id) {
            reconciler.maybe_active = None;
        }
        self.update(notify, |p| p.unfocused = !active);
    }

    /// The window was closed.
    ///
    /// The actor is destroyed at the next commit, regardless of any
    /// other pending update.
    pub fn closed(&mut self, notify: bool) {
        self.update(notify, |p| p.close = true);
    }

    /// Gives the window a geometry, if the protocol does not report one.
    ///
    /// Used for protocols that report no geometry, so that the window
    /// is considered to be on the current viewport.
    pub fn placeholder_geometry(&mut self, geometry: Rectangle) {
        if let Some(actor) = self.rt.registry.get_mut(self.id) {
            actor.geometry = geometry;
            if let Some(p) = actor.pending.as_deref_mut() {
                p.geometry = geometry;
            }
        }
    }

    /// Puts the window on top of the stacking order.
    ///
    /// The new order is published from the idle handler.
    pub fn stack_on_top(&mut self) {
        self.rt.stack_on_top(self.id);
    }

    /// Marks the pending state as a consistent snapshot, and commits it.
    ///
    /// See [`Runtime::toplevel_done`].
    pub fn done(&mut self) {
        self.rt.toplevel_done(self.id);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::manager::DockConfig;

    #[test]
    fn test_setters_only_touch_pending() {
        let mut rt = Runtime::new(DockConfig::default());
        let id = rt.new_toplevel(ProtocolHandle::new(()));
        let mut t = rt.toplevel(id).expect("not a toplevel");
        t.title_changed("Terminal", false);
        t.app_id_changed("foot", false);
        t.maximized_changed(true, false);

        let pending = t.pending().expect("no pending state");
        assert_eq!(pending.title.as_deref(), Some("Terminal"));
        assert_eq!(pending.class.as_deref(), Some("foot"));
        assert!(pending.maximized);

        let actor = rt.window(id).expect("actor vanished");
        assert_eq!(actor.name(), None);
        assert!(!actor.is_maximized());
        assert_eq!(actor.num_desktop(), -1);
    }

    #[test]
    fn test_app_id_extra_is_split() {
        let mut rt = Runtime::new(DockConfig::default());
        let id = rt.new_toplevel(ProtocolHandle::new(()));
        let mut t = rt.toplevel(id).expect("not a toplevel");

        t.app_id_changed("steam_app_1234 Some Game", false);
        let pending = t.pending().expect("no pending state");
        assert_eq!(pending.class.as_deref(), Some("steam_app_1234"));
        assert_eq!(pending.class_extra.as_deref(), Some("Some Game"));

        t.app_id_changed("firefox ", false);
        let pending = t.pending().expect("no pending state");
        assert_eq!(pending.class.as_deref(), Some("firefox"));
        assert_eq!(pending.class_extra, None);
    }

    #[test]
    fn test_x11_actor_is_not_a_toplevel() {
        let mut rt = Runtime::new(DockConfig::default());
        let id = rt.create_actor(ProtocolHandle::new(42u32), |_| {});
        assert!(rt.toplevel(id).is_none());
    }

    #[test]
    fn test_last_activation_wins() {
        let mut rt = Runtime::new(DockConfig::default());
        let a = rt.new_toplevel(ProtocolHandle::new(1u32));
        let b = rt.new_toplevel(ProtocolHandle::new(2u32));

        rt.toplevel(a).expect("not a toplevel").activated(true, false);
        rt.toplevel(b).expect("not a toplevel").activated(true, false);
        assert_eq!(rt.reconciler.maybe_active, Some(b));

        // deactivating a window that is no longer the candidate changes nothing
        rt.toplevel(a).expect("not a toplevel").activated(false, false);
        assert_eq!(rt.reconciler.maybe_active, Some(b));

        rt.toplevel(b).expect("not a toplevel").activated(false, false);
        assert_eq!(rt.reconciler.maybe_active, None);
    }
}
