//! Committing pending toplevel state.
//!
//! A commit applies the pending state of one toplevel one change at a
//! time, restarting from the highest priority change after each one:
//!
//! 1. closing, which discards everything else;
//! 2. the class, and with it whether the window is displayed at all;
//! 3. the title;
//! 4. the minimized, maximized and fullscreen states, together;
//! 5. the attention flag;
//! 6. the sticky flag, then the desktop and viewport;
//! 7. the geometry;
//! 8. focus loss and activation.
//!
//! Commits never nest. A toplevel becoming ready while another one is
//! being committed (from a listener pumping the event queue, for
//! instance) is queued, and the queue is drained before returning.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};

use tracing::debug;

use crate::core::{parse_class, ActorId, WindowActor};
use crate::manager::{DockConfig, IdleWork, Runtime, WindowEvent};

use super::toplevel::PendingState;

/// The state of toplevel commits, owned by the runtime.
#[derive(Debug, Default)]
pub(crate) struct Reconciler {
    queue: VecDeque<ActorId>,
    current: Option<ActorId>,
    processing: bool,
    unfocused: bool,
    pub(crate) maybe_active: Option<ActorId>,
    own_window: Option<ActorId>,
    stack_counter: i32,
}

impl Reconciler {
    pub(crate) fn has_queued(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Drops every reference to an actor that is going away.
    pub(crate) fn forget(&mut self, id: ActorId) {
        if self.maybe_active == Some(id) {
            self.maybe_active = None;
        }
        if self.own_window == Some(id) {
            self.own_window = None;
        }
        self.queue.retain(|&q| q != id);
    }
}

/// Marks a commit as in progress for as long as it lives.
struct Committing<'rt> {
    rt: &'rt mut Runtime,
}

impl<'rt> Committing<'rt> {
    fn enter(rt: &'rt mut Runtime) -> Self {
        debug_assert!(!rt.reconciler.processing, "nested toplevel commit");
        rt.reconciler.processing = true;
        Self { rt }
    }
}

impl Deref for Committing<'_> {
    type Target = Runtime;

    fn deref(&self) -> &Runtime {
        self.rt
    }
}

impl DerefMut for Committing<'_> {
    fn deref_mut(&mut self) -> &mut Runtime {
        self.rt
    }
}

impl Drop for Committing<'_> {
    fn drop(&mut self) {
        self.rt.reconciler.processing = false;
        self.rt.reconciler.current = None;
    }
}

/// The outcome of one step of a commit.
#[derive(Debug, PartialEq)]
enum Change {
    Closed { displayed: bool },
    /// Not displayed, before or after; everything was applied silently.
    Hidden,
    Created,
    Removed,
    Class {
        old_class: Option<String>,
        old_wm_class: Option<String>,
    },
    Title,
    State {
        hidden: bool,
        maximized: bool,
        fullscreen: bool,
    },
    Attention,
    Desktop,
    Geometry,
    Settled { unfocused: bool },
}

impl Runtime {
    /// Marks the pending state of a toplevel as consistent, and
    /// commits it.
    ///
    /// The commit is deferred to the idle handler if the dock is not
    /// ready, if commits are configured to always be deferred, or if a
    /// notification is being delivered. If another commit is in
    /// progress, the toplevel is queued behind it. Calling this several
    /// times before the commit happens has no further effect.
    pub fn toplevel_done(&mut self, id: ActorId) {
        let Some(pending) = self
            .registry
            .get_mut(id)
            .and_then(|a| a.pending.as_deref_mut())
        else {
            return;
        };
        if self.reconciler.current != Some(id) && !pending.in_queue {
            pending.in_queue = true;
            self.reconciler.queue.push_back(id);
        }

        if self.reconciler.processing {
            trace!("Commit in progress, queued {}", id);
            return;
        }
        if !self.ready || self.config.commit_on_idle() || self.notifier.dispatching {
            self.schedule_idle(IdleWork::COMMIT);
            return;
        }
        self.run_pre_notify_hooks();
        self.commit_queued();
    }

    /// Commits every queued toplevel, in the order they were queued.
    pub(crate) fn commit_queued(&mut self) {
        if self.reconciler.processing {
            return;
        }
        let mut rt = Committing::enter(self);
        rt.reconciler.unfocused = false;
        loop {
            while let Some(id) = rt.reconciler.queue.pop_front() {
                rt.commit_one(id);
            }
            if rt.reconciler.unfocused && rt.active.is_none() {
                rt.reconciler.unfocused = false;
                rt.emit(WindowEvent::Activated(None));
            }
            if rt.reconciler.queue.is_empty() {
                break;
            }
        }
    }

    fn commit_one(&mut self, id: ActorId) {
        let Some(pending) = self
            .registry
            .get_mut(id)
            .and_then(|a| a.pending.as_deref_mut())
        else {
            return;
        };
        pending.in_queue = false;
        pending.init_done = true;
        self.reconciler.current = Some(id);

        loop {
            let Some(actor) = self.registry.get_mut(id) else {
                break;
            };
            let change = next_change(actor, &self.config);
            trace!("Commit of {}: {:?}", id, change);
            match change {
                Change::Closed { displayed } => {
                    if displayed {
                        self.emit(WindowEvent::Destroyed(id));
                    }
                    debug!("Toplevel {} closed", id);
                    self.reconciler.unfocused = true;
                    self.release_actor(id);
                    self.schedule_idle(IdleWork::RESTACK);
                    break;
                }
                Change::Hidden => break,
                Change::Created => {
                    self.track_own_window(id);
                    self.emit(WindowEvent::Created(id));
                }
                Change::Removed => {
                    self.emit(WindowEvent::Destroyed(id));
                    self.forget_pointers(id);
                }
                Change::Class {
                    old_class,
                    old_wm_class,
                } => {
                    self.track_own_window(id);
                    self.emit(WindowEvent::ClassChanged {
                        id,
                        old_class,
                        old_wm_class,
                    });
                }
                Change::Title => self.emit(WindowEvent::NameChanged(id)),
                Change::State {
                    hidden,
                    maximized,
                    fullscreen,
                } => self.emit(WindowEvent::StateChanged {
                    id,
                    hidden_changed: hidden,
                    maximized_changed: maximized,
                    fullscreen_changed: fullscreen,
                }),
                Change::Attention => self.emit(WindowEvent::AttentionChanged(id)),
                Change::Desktop => self.emit(WindowEvent::DesktopChanged(id)),
                Change::Geometry => self.emit(WindowEvent::SizePositionChanged(id)),
                Change::Settled { unfocused } => {
                    if unfocused && self.active == Some(id) {
                        self.active = None;
                        self.reconciler.unfocused = true;
                    }
                    if self.reconciler.maybe_active != Some(id) {
                        break;
                    }
                    self.reconciler.maybe_active = None;
                    if self.active == Some(id) {
                        break;
                    }
                    self.set_active(Some(id));
                    self.reconciler.unfocused = false;
                    self.stack_on_top(id);
                    self.emit(WindowEvent::Activated(Some(id)));
                    self.pick_activated(id);
                }
            }
        }
        self.reconciler.current = None;
    }

    fn track_own_window(&mut self, id: ActorId) {
        let own = self
            .registry
            .get(id)
            .and_then(|a| a.class())
            .is_some_and(|c| c == self.config.app_id());
        if own {
            self.reconciler.own_window = Some(id);
        } else if self.reconciler.own_window == Some(id) {
            self.reconciler.own_window = None;
        }
    }

    /// The dock's own main window, if it is a tracked toplevel.
    pub fn own_window(&self) -> Option<ActorId> {
        self.reconciler.own_window
    }

    /// Puts a toplevel on top of the stacking order.
    ///
    /// Wayland protocols do not report the stacking order, so it is
    /// approximated by the order windows were raised in. The new order
    /// is published from the idle handler.
    pub fn stack_on_top(&mut self, id: ActorId) {
        if self.reconciler.stack_counter == i32::MAX {
            self.reconciler.stack_counter = 0;
            for other in self.registry.ids(true) {
                if let Some(p) = self
                    .registry
                    .get_mut(other)
                    .and_then(|a| a.pending.as_deref_mut())
                {
                    self.reconciler.stack_counter += 1;
                    p.stacking_order = self.reconciler.stack_counter;
                }
            }
        }
        if let Some(p) = self
            .registry
            .get_mut(id)
            .and_then(|a| a.pending.as_deref_mut())
        {
            self.reconciler.stack_counter += 1;
            p.stacking_order = self.reconciler.stack_counter;
            self.schedule_idle(IdleWork::RESTACK);
        }
    }

    /// Applies the pending stacking order of every toplevel.
    pub(crate) fn restack(&mut self) {
        self.registry.for_each_unordered(|actor| {
            if let Some(order) = actor.pending.as_ref().map(|p| p.stacking_order) {
                actor.stack_order = order;
            }
        });
        self.emit(WindowEvent::ZOrderChanged);
    }
}

/// Applies the highest priority pending change of an actor.
fn next_change(actor: &mut WindowActor, config: &DockConfig) -> Change {
    let Some(mut pending) = actor.pending.take() else {
        return Change::Settled { unfocused: false };
    };
    let change = apply_next(actor, &mut pending, config);
    actor.pending = Some(pending);
    change
}

fn apply_next(actor: &mut WindowActor, p: &mut PendingState, config: &DockConfig) -> Change {
    if p.close {
        return Change::Closed {
            displayed: actor.displayed,
        };
    }

    let mut old = None;
    if let Some(raw) = p.class.take() {
        let class = parse_class(&raw, actor.name.as_deref());
        let old_class = actor.class.replace(class);
        let old_wm_class = actor.wm_class.replace(raw);
        actor.class_extra = p.class_extra.take();
        if old_class != actor.class {
            old = Some((old_class, old_wm_class));
        }
    }

    let title = p.title.as_deref().or(actor.name.as_deref());
    let eligible = actor.is_eligible(title, config.app_id(), config.desklet_title_prefix());
    match (actor.displayed, eligible) {
        (false, false) => {
            fold(actor, p);
            return Change::Hidden;
        }
        (false, true) => {
            actor.displayed = true;
            fold(actor, p);
            return Change::Created;
        }
        (true, false) => {
            actor.displayed = false;
            fold(actor, p);
            return Change::Removed;
        }
        (true, true) => {}
    }
    if let Some((old_class, old_wm_class)) = old {
        return Change::Class {
            old_class,
            old_wm_class,
        };
    }

    if let Some(title) = p.title.take() {
        if actor.name.as_deref() != Some(title.as_str()) {
            actor.name = Some(title);
            return Change::Title;
        }
    }
    if let Some(change) = apply_state(actor, p) {
        return change;
    }
    if p.attention != actor.demands_attention {
        actor.demands_attention = p.attention;
        return Change::Attention;
    }
    if p.sticky != actor.sticky {
        actor.sticky = p.sticky;
        return Change::Desktop;
    }
    if apply_desktop(actor, p) {
        return Change::Desktop;
    }
    if apply_geometry(actor, p) {
        return Change::Geometry;
    }
    Change::Settled {
        unfocused: std::mem::take(&mut p.unfocused),
    }
}

fn apply_state(actor: &mut WindowActor, p: &PendingState) -> Option<Change> {
    let hidden = p.minimized != actor.hidden;
    let maximized = p.maximized != actor.maximized;
    let fullscreen = p.fullscreen != actor.fullscreen;
    if !(hidden || maximized || fullscreen) {
        return None;
    }
    actor.hidden = p.minimized;
    actor.maximized = p.maximized;
    actor.fullscreen = p.fullscreen;
    Some(Change::State {
        hidden,
        maximized,
        fullscreen,
    })
}

fn apply_desktop(actor: &mut WindowActor, p: &PendingState) -> bool {
    if p.desktop == actor.num_desktop && p.viewport == actor.viewport() {
        return false;
    }
    actor.num_desktop = p.desktop;
    (actor.viewport_x, actor.viewport_y) = p.viewport;
    true
}

fn apply_geometry(actor: &mut WindowActor, p: &PendingState) -> bool {
    if !p.geometry.has_area() || p.geometry == actor.geometry {
        return false;
    }
    actor.geometry = p.geometry;
    true
}

/// Applies everything pending without reporting it.
fn fold(actor: &mut WindowActor, p: &mut PendingState) {
    if let Some(title) = p.title.take() {
        actor.name = Some(title);
    }
    apply_state(actor, p);
    actor.demands_attention = p.attention;
    actor.sticky = p.sticky;
    apply_desktop(actor, p);
    apply_geometry(actor, p);
}

#[cfg(test)]
mod test {
    use super::*;

    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crate::core::{ProtocolHandle, Rectangle};
    use crate::manager::Notification;

    fn runtime() -> Runtime {
        let mut rt = Runtime::new(DockConfig::default());
        rt.set_ready(true);
        rt
    }

    fn recorder(rt: &mut Runtime) -> Rc<RefCell<Vec<WindowEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let inner = log.clone();
        rt.subscribe(Box::new(move |_, n| {
            if let Notification::Window(e) = n {
                inner.borrow_mut().push(e.clone());
            }
        }));
        log
    }

    fn displayed(rt: &mut Runtime, class: &str) -> ActorId {
        let id = rt.new_toplevel(ProtocolHandle::new(()));
        let mut t = rt.toplevel(id).expect("not a toplevel");
        t.app_id_changed(class, false);
        t.title_changed(class, false);
        t.done();
        id
    }

    fn state(id: ActorId, hidden: bool, maximized: bool, fullscreen: bool) -> WindowEvent {
        WindowEvent::StateChanged {
            id,
            hidden_changed: hidden,
            maximized_changed: maximized,
            fullscreen_changed: fullscreen,
        }
    }

    #[test]
    fn test_created_with_fields_applied() {
        let mut rt = runtime();
        let seen = Rc::new(RefCell::new(None));
        let inner = seen.clone();
        rt.subscribe(Box::new(move |rt, n| {
            if let Notification::Window(WindowEvent::Created(id)) = n {
                let actor = rt.window(*id).expect("created actor missing");
                *inner.borrow_mut() = Some((
                    actor.class().map(String::from),
                    actor.name().map(String::from),
                ));
            }
        }));
        let log = recorder(&mut rt);

        let id = rt.new_toplevel(ProtocolHandle::new(()));
        let mut t = rt.toplevel(id).expect("not a toplevel");
        t.app_id_changed("firefox", false);
        t.title_changed("Mozilla Firefox", false);
        t.done();

        assert_eq!(*log.borrow(), vec![WindowEvent::Created(id)]);
        assert_eq!(
            *seen.borrow(),
            Some((Some("firefox".into()), Some("Mozilla Firefox".into())))
        );
    }

    #[test]
    fn test_done_is_idempotent() {
        let mut rt = runtime();
        let log = recorder(&mut rt);
        let id = rt.new_toplevel(ProtocolHandle::new(()));
        let mut t = rt.toplevel(id).expect("not a toplevel");
        t.app_id_changed("foot", false);
        t.maximized_changed(true, false);
        t.done();
        t.done();
        t.done();

        assert_eq!(*log.borrow(), vec![WindowEvent::Created(id)]);
        assert!(rt.window(id).expect("actor missing").is_maximized());
    }

    #[test]
    fn test_changes_are_ordered() {
        let mut rt = runtime();
        let id = displayed(&mut rt, "gedit");
        let log = recorder(&mut rt);

        let mut t = rt.toplevel(id).expect("not a toplevel");
        t.fullscreen_changed(true, false);
        t.title_changed("notes.txt", false);
        t.app_id_changed("org.gnome.TextEditor", false);
        t.done();

        assert_eq!(
            *log.borrow(),
            vec![
                WindowEvent::ClassChanged {
                    id,
                    old_class: Some("gedit".into()),
                    old_wm_class: Some("gedit".into()),
                },
                WindowEvent::NameChanged(id),
                state(id, false, false, true),
            ]
        );
    }

    #[test]
    fn test_state_changes_are_reported_separately() {
        let mut rt = runtime();
        let id = displayed(&mut rt, "foot");
        let log = recorder(&mut rt);

        let mut t = rt.toplevel(id).expect("not a toplevel");
        t.maximized_changed(true, false);
        t.done();
        t.maximized_changed(false, false);
        t.done();

        assert_eq!(
            *log.borrow(),
            vec![state(id, false, true, false), state(id, false, true, false)]
        );
    }

    #[test]
    fn test_unchanged_title_is_not_reported() {
        let mut rt = runtime();
        let id = displayed(&mut rt, "foot");
        let log = recorder(&mut rt);

        rt.toplevel(id).expect("not a toplevel").title_changed("foot", true);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_eligibility_flips() {
        let mut rt = runtime();
        let id = displayed(&mut rt, "foot");
        let log = recorder(&mut rt);

        let mut t = rt.toplevel(id).expect("not a toplevel");
        t.skip_taskbar_changed(true, false);
        t.title_changed("hidden", false);
        t.done();
        assert_eq!(*log.borrow(), vec![WindowEvent::Destroyed(id)]);
        let actor = rt.window(id).expect("actor missing");
        assert!(!actor.is_displayed());
        assert_eq!(actor.name(), Some("hidden"));

        log.borrow_mut().clear();
        let mut t = rt.toplevel(id).expect("not a toplevel");
        t.skip_taskbar_changed(false, false);
        t.minimized_changed(true, false);
        t.attention_changed(true, false);
        t.done();
        assert_eq!(*log.borrow(), vec![WindowEvent::Created(id)]);
        let actor = rt.window(id).expect("actor missing");
        assert!(actor.is_displayed());
        assert!(actor.is_hidden());
        assert!(actor.demands_attention());
    }

    #[test]
    fn test_transient_is_never_displayed() {
        let mut rt = runtime();
        let parent = displayed(&mut rt, "gimp");
        let log = recorder(&mut rt);

        let id = rt.new_toplevel(ProtocolHandle::new(()));
        let mut t = rt.toplevel(id).expect("not a toplevel");
        t.parent_changed(Some(parent), false);
        t.app_id_changed("gimp", false);
        t.done();

        assert!(log.borrow().is_empty());
        assert!(rt.window(id).expect("actor missing").is_transient());
    }

    #[test]
    fn test_own_desklets_are_filtered() {
        let mut rt = runtime();
        let log = recorder(&mut rt);

        let desklet = rt.new_toplevel(ProtocolHandle::new(()));
        let mut t = rt.toplevel(desklet).expect("not a toplevel");
        t.app_id_changed("cairo-dock", false);
        t.title_changed("cairo-dock-desklet", false);
        t.done();
        assert!(log.borrow().is_empty());

        let settings = rt.new_toplevel(ProtocolHandle::new(()));
        let mut t = rt.toplevel(settings).expect("not a toplevel");
        t.app_id_changed("cairo-dock", false);
        t.title_changed("Cairo-Dock configuration", false);
        t.done();
        assert_eq!(*log.borrow(), vec![WindowEvent::Created(settings)]);
        assert_eq!(rt.own_window(), Some(settings));
    }

    #[test]
    fn test_close_discards_other_changes() {
        let mut rt = runtime();
        let id = displayed(&mut rt, "foot");
        let log = recorder(&mut rt);

        let mut t = rt.toplevel(id).expect("not a toplevel");
        t.title_changed("bye", false);
        t.maximized_changed(true, false);
        t.closed(false);
        t.done();

        // nothing is active once it is gone
        assert_eq!(
            *log.borrow(),
            vec![WindowEvent::Destroyed(id), WindowEvent::Activated(None)]
        );
        assert!(rt.window(id).is_none());
        assert!(rt.has_idle_work());
    }

    #[test]
    fn test_close_keeps_other_active_window() {
        let mut rt = runtime();
        let a = displayed(&mut rt, "foot");
        let b = displayed(&mut rt, "firefox");
        rt.toplevel(a).expect("not a toplevel").activated(true, true);
        let log = recorder(&mut rt);

        rt.toplevel(b).expect("not a toplevel").closed(true);
        assert_eq!(*log.borrow(), vec![WindowEvent::Destroyed(b)]);
        assert_eq!(rt.active_window(), Some(a));

        log.borrow_mut().clear();
        rt.toplevel(a).expect("not a toplevel").closed(true);
        assert_eq!(
            *log.borrow(),
            vec![WindowEvent::Destroyed(a), WindowEvent::Activated(None)]
        );
        assert_eq!(rt.active_window(), None);
    }

    #[test]
    fn test_done_during_commit_is_queued() {
        let mut rt = runtime();
        let b = rt.new_toplevel(ProtocolHandle::new(2u32));
        rt.toplevel(b).expect("not a toplevel").app_id_changed("b", false);

        let order = Rc::new(RefCell::new(Vec::new()));
        let inner = order.clone();
        rt.subscribe(Box::new(move |rt, n| {
            let Notification::Window(e) = n else { return };
            inner.borrow_mut().push(e.clone());
            if matches!(e, WindowEvent::Created(id) if *id != b) {
                rt.toplevel_done(b);
                // b must not be committed while a is
                assert!(!rt.window(b).expect("b missing").is_displayed());
            }
        }));

        let a = rt.new_toplevel(ProtocolHandle::new(1u32));
        let mut t = rt.toplevel(a).expect("not a toplevel");
        t.app_id_changed("a", false);
        t.title_changed("A", false);
        t.done();

        assert_eq!(
            *order.borrow(),
            vec![WindowEvent::Created(a), WindowEvent::Created(b)]
        );
        assert!(!rt.reconciler.has_queued());
    }

    #[test]
    fn test_not_ready_defers_to_idle() {
        let mut rt = Runtime::new(DockConfig::default());
        let log = recorder(&mut rt);
        let id = rt.new_toplevel(ProtocolHandle::new(()));
        rt.toplevel(id).expect("not a toplevel").app_id_changed("foot", true);

        assert!(log.borrow().is_empty());
        assert!(rt.has_idle_work());

        rt.set_ready(true);
        rt.run_idle();
        assert_eq!(*log.borrow(), vec![WindowEvent::Created(id)]);
        assert!(!rt.has_idle_work());
    }

    #[test]
    fn test_activation_and_focus_loss() {
        let mut rt = runtime();
        let a = displayed(&mut rt, "foot");
        let b = displayed(&mut rt, "firefox");
        let log = recorder(&mut rt);

        // a contradicting report for b before the commit wins
        rt.toplevel(a).expect("not a toplevel").activated(true, false);
        rt.toplevel(b).expect("not a toplevel").activated(true, false);
        rt.toplevel(a).expect("not a toplevel").done();
        rt.toplevel(b).expect("not a toplevel").done();
        assert_eq!(*log.borrow(), vec![WindowEvent::Activated(Some(b))]);
        assert_eq!(rt.active_window(), Some(b));

        log.borrow_mut().clear();
        rt.toplevel(b).expect("not a toplevel").activated(false, true);
        assert_eq!(*log.borrow(), vec![WindowEvent::Activated(None)]);
        assert_eq!(rt.active_window(), None);
        assert_eq!(rt.last_active_window(), Some(b));
    }

    #[test]
    fn test_run_idle_before_ready_holds_commits() {
        let mut rt = Runtime::new(DockConfig::default());
        let log = recorder(&mut rt);
        let a = rt.new_toplevel(ProtocolHandle::new(()));
        rt.toplevel(a).expect("not a toplevel").app_id_changed("foot", true);
        rt.schedule_idle(IdleWork::RESTACK);

        rt.run_idle();
        assert_eq!(*log.borrow(), vec![WindowEvent::ZOrderChanged]);
        assert!(!rt.window(a).expect("actor missing").is_displayed());
        assert!(!rt.has_idle_work());

        log.borrow_mut().clear();
        rt.set_ready(true);
        assert!(rt.has_idle_work());
        rt.run_idle();
        assert_eq!(*log.borrow(), vec![WindowEvent::Created(a)]);
    }

    #[test]
    fn test_done_from_listener_is_deferred() {
        let mut rt = runtime();
        let a = displayed(&mut rt, "foot");
        let b = displayed(&mut rt, "firefox");
        rt.toplevel(b)
            .expect("not a toplevel")
            .title_changed("Mozilla Firefox", false);

        let calls = Rc::new(Cell::new(0));
        let inner = calls.clone();
        rt.subscribe(Box::new(move |rt, n| {
            if let Notification::Window(WindowEvent::ZOrderChanged) = n {
                inner.set(inner.get() + 1);
                rt.toplevel_done(b);
            }
        }));
        let log = recorder(&mut rt);

        rt.stack_on_top(a);
        rt.run_idle();
        assert_eq!(calls.get(), 1);
        assert_eq!(*log.borrow(), vec![WindowEvent::ZOrderChanged]);
        assert_eq!(rt.window(b).and_then(|w| w.name()), Some("firefox"));
        assert!(rt.has_idle_work());

        rt.run_idle();
        assert_eq!(
            *log.borrow(),
            vec![WindowEvent::ZOrderChanged, WindowEvent::NameChanged(b)]
        );
        assert!(!rt.has_idle_work());
        assert!(!rt.reconciler.has_queued());
    }

    #[test]
    fn test_pick_skips_own_window_once() {
        let mut rt = runtime();
        let own = rt.new_toplevel(ProtocolHandle::new(()));
        let mut t = rt.toplevel(own).expect("not a toplevel");
        t.app_id_changed("cairo-dock", false);
        t.title_changed("Cairo-Dock configuration", false);
        t.done();
        let other = displayed(&mut rt, "foot");

        let picked = Rc::new(RefCell::new(Vec::new()));
        let inner = picked.clone();
        rt.start_pick(Box::new(move |_, id| inner.borrow_mut().push(id)));

        rt.toplevel(own).expect("not a toplevel").activated(true, true);
        assert!(picked.borrow().is_empty());
        assert!(rt.is_picking());

        rt.toplevel(other).expect("not a toplevel").activated(true, true);
        assert_eq!(*picked.borrow(), vec![other]);
        assert!(!rt.is_picking());

        // the callback only runs once
        rt.toplevel(own).expect("not a toplevel").activated(true, true);
        assert_eq!(*picked.borrow(), vec![other]);
        assert_eq!(rt.active_window(), Some(own));
    }

    #[test]
    fn test_exe_title_with_multibyte_app_id() {
        let mut rt = runtime();
        let log = recorder(&mut rt);
        let id = rt.new_toplevel(ProtocolHandle::new(()));
        rt.toplevel(id)
            .expect("not a toplevel")
            .title_changed("INSTALL.EXE", true);
        rt.toplevel(id)
            .expect("not a toplevel")
            .app_id_changed("/ééa", true);

        assert_eq!(*log.borrow(), vec![WindowEvent::Created(id)]);
        assert_eq!(rt.window(id).and_then(|w| w.class()), Some("ééa"));
    }

    #[test]
    fn test_geometry_needs_area() {
        let mut rt = runtime();
        let id = displayed(&mut rt, "foot");
        let log = recorder(&mut rt);

        let mut t = rt.toplevel(id).expect("not a toplevel");
        t.geometry_changed(Rectangle::new(10, 10, 0, 0), true);
        assert!(log.borrow().is_empty());

        let mut t = rt.toplevel(id).expect("not a toplevel");
        t.geometry_changed(Rectangle::new(10, 10, 300, 200), false);
        t.viewport_changed(1, 0, 0, false);
        t.done();
        assert_eq!(
            *log.borrow(),
            vec![
                WindowEvent::DesktopChanged(id),
                WindowEvent::SizePositionChanged(id)
            ]
        );
    }

    #[test]
    fn test_stack_on_top() {
        let mut rt = runtime();
        let a = displayed(&mut rt, "foot");
        let b = displayed(&mut rt, "firefox");
        let log = recorder(&mut rt);

        rt.stack_on_top(b);
        rt.stack_on_top(a);
        assert!(log.borrow().is_empty());
        rt.run_idle();

        assert_eq!(*log.borrow(), vec![WindowEvent::ZOrderChanged]);
        assert_eq!(rt.registry.ids(true), vec![b, a]);
    }

    #[test]
    fn test_stack_counter_saturation() {
        let mut rt = runtime();
        let a = displayed(&mut rt, "foot");
        let b = displayed(&mut rt, "firefox");
        rt.stack_on_top(a);
        rt.stack_on_top(b);
        rt.run_idle();

        rt.reconciler.stack_counter = i32::MAX;
        rt.stack_on_top(a);
        rt.run_idle();

        assert_eq!(rt.window(b).map(|w| w.stack_order()), Some(2));
        assert_eq!(rt.window(a).map(|w| w.stack_order()), Some(3));
    }
}
