use crate::core::{ActorId, Rectangle};
use crate::manager::Runtime;
use crate::platform::WmCapabilities;

use super::activation::{ActivationPolicy, ActivationTracker};
use super::backend::{ToplevelActions, ToplevelMap, ToplevelRequests};

bitflags! {

/// The state of an `ext_foreign_toplevel_handle_v1`.
///
/// The protocol itself only identifies toplevels; the state comes
/// from a companion protocol of the compositor, which the host maps
/// onto these flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ExtState: u32 {
    /// The toplevel is active.
    const ACTIVATED     = 1 << 0;
    /// The toplevel is maximized.
    const MAXIMIZED     = 1 << 1;
    /// The toplevel is minimized.
    const MINIMIZED     = 1 << 2;
    /// The toplevel is fullscreen.
    const FULLSCREEN    = 1 << 3;
    /// The toplevel is on all workspaces.
    const STICKY        = 1 << 4;
    /// The toplevel is kept above others.
    const ALWAYS_ON_TOP = 1 << 5;
}
}

/// An event of an `ext_foreign_toplevel_handle_v1`, or of the state
/// protocol attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtEvent<H> {
    /// The title changed.
    Title(String),
    /// The app-id changed.
    AppId(String),
    /// The state changed.
    State(ExtState),
    /// The parent changed.
    Parent(Option<H>),
    /// All changes since the last `done` were sent.
    Done,
    /// The toplevel was closed.
    Closed,
}

/// Tracks windows through `ext_foreign_toplevel_list_v1`.
#[derive(Debug)]
pub struct ExtToplevels<R: ToplevelRequests> {
    map: ToplevelMap<R>,
    activation: ActivationTracker,
}

impl<R: ToplevelRequests> ExtToplevels<R> {
    /// The name of the window backend.
    pub const NAME: &'static str = "ext-toplevel";

    /// Registers the window backend, issuing requests through `requests`.
    ///
    /// `actions` are the requests the state protocol of the compositor
    /// supports.
    pub fn new(rt: &mut Runtime, requests: R, actions: ToplevelActions) -> Self {
        let flags = WmCapabilities::NO_VIEWPORT_OVERLAP | WmCapabilities::GEOM_REL_TO_VIEWPORT;
        Self {
            map: ToplevelMap::register(rt, requests, Self::NAME, flags, actions),
            activation: ActivationTracker::new(ActivationPolicy::SingleCandidate),
        }
    }

    /// The handle map of the protocol.
    pub fn map(&self) -> &ToplevelMap<R> {
        &self.map
    }

    /// The list announced a new toplevel.
    pub fn new_toplevel(&mut self, rt: &mut Runtime, handle: R::Handle) -> ActorId {
        let id = self.map.insert(rt, handle);
        let screen = rt.desktop_geometry().current_screen();
        if let Some(mut t) = rt.toplevel(id) {
            t.placeholder_geometry(Rectangle::new(screen.width / 2, screen.height / 2, 1, 1));
        }
        id
    }

    /// Handles an event of a toplevel handle.
    pub fn handle_event(&mut self, rt: &mut Runtime, handle: &R::Handle, event: ExtEvent<R::Handle>) {
        let Some(id) = self.map.get(rt, handle) else {
            return;
        };
        match &event {
            ExtEvent::State(state) => {
                self.activation
                    .report(rt, id, state.contains(ExtState::ACTIVATED));
                self.map.set_above(id, state.contains(ExtState::ALWAYS_ON_TOP));
            }
            ExtEvent::Closed => {
                self.activation.forget(rt, id);
                self.map.remove(id);
            }
            _ => {}
        }
        let parent = match &event {
            ExtEvent::Parent(Some(parent)) => self.map.get(rt, parent),
            _ => None,
        };

        let Some(mut t) = rt.toplevel(id) else {
            return;
        };
        match event {
            ExtEvent::Title(title) => t.title_changed(&title, false),
            ExtEvent::AppId(app_id) => t.app_id_changed(&app_id, false),
            ExtEvent::State(state) => {
                t.maximized_changed(state.contains(ExtState::MAXIMIZED), false);
                t.minimized_changed(state.contains(ExtState::MINIMIZED), false);
                t.fullscreen_changed(state.contains(ExtState::FULLSCREEN), false);
                t.sticky_changed(state.contains(ExtState::STICKY), false);
            }
            ExtEvent::Parent(_) => t.parent_changed(parent, false),
            ExtEvent::Done => t.done(),
            ExtEvent::Closed => t.closed(true),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::manager::{DockConfig, Notification, WindowEvent};
    use crate::wayland::backend::test::Requests;

    fn setup(actions: ToplevelActions) -> (Runtime, ExtToplevels<Requests>, Rc<RefCell<Vec<WindowEvent>>>) {
        let mut rt = Runtime::new(DockConfig::default());
        rt.set_ready(true);
        let log = Rc::new(RefCell::new(Vec::new()));
        let inner = log.clone();
        rt.subscribe(Box::new(move |_, n| {
            if let Notification::Window(e) = n {
                inner.borrow_mut().push(e.clone());
            }
        }));
        let ext = ExtToplevels::new(&mut rt, Requests::default(), actions);
        (rt, ext, log)
    }

    #[test]
    fn test_state_and_above() {
        let (mut rt, mut ext, log) = setup(ToplevelActions::all());
        let id = ext.new_toplevel(&mut rt, 4);
        ext.handle_event(&mut rt, &4, ExtEvent::AppId("org.gnome.Nautilus".into()));
        ext.handle_event(&mut rt, &4, ExtEvent::Done);
        log.borrow_mut().clear();

        ext.handle_event(
            &mut rt,
            &4,
            ExtEvent::State(ExtState::MAXIMIZED | ExtState::ALWAYS_ON_TOP | ExtState::STICKY),
        );
        ext.handle_event(&mut rt, &4, ExtEvent::Done);

        assert_eq!(
            *log.borrow(),
            vec![
                WindowEvent::StateChanged {
                    id,
                    hidden_changed: false,
                    maximized_changed: true,
                    fullscreen_changed: false,
                },
                WindowEvent::DesktopChanged(id),
            ]
        );
        assert_eq!(rt.is_above_or_below(id), (true, false));
        assert!(rt.is_sticky(id));
    }

    #[test]
    fn test_closing_active_candidate() {
        let (mut rt, mut ext, log) = setup(ToplevelActions::all());
        let a = ext.new_toplevel(&mut rt, 1);
        let b = ext.new_toplevel(&mut rt, 2);
        for h in [1, 2] {
            ext.handle_event(&mut rt, &h, ExtEvent::AppId("foot".into()));
            ext.handle_event(&mut rt, &h, ExtEvent::State(ExtState::ACTIVATED));
            ext.handle_event(&mut rt, &h, ExtEvent::Done);
        }
        // both claim to be active; only the first one got through
        assert_eq!(rt.active_window(), Some(a));
        log.borrow_mut().clear();

        ext.handle_event(&mut rt, &1, ExtEvent::Closed);
        ext.handle_event(&mut rt, &2, ExtEvent::Done);
        assert_eq!(
            *log.borrow(),
            vec![
                WindowEvent::Destroyed(a),
                WindowEvent::Activated(None),
                WindowEvent::Activated(Some(b)),
            ]
        );
        assert_eq!(rt.active_window(), Some(b));
    }

    #[test]
    fn test_unsupported_request() {
        let (mut rt, mut ext, _) = setup(ToplevelActions::CLOSE);
        let id = ext.new_toplevel(&mut rt, 1);
        rt.show(id);
        rt.maximize(id, true);
        assert!(ext.map().requests().log.borrow().is_empty());
        assert_eq!(rt.window(id).map(|w| w.geometry().width), Some(1));
    }
}
