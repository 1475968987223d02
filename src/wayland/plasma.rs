use crate::core::{ActorId, Rectangle};
use crate::manager::Runtime;
use crate::platform::WmCapabilities;

use super::activation::{ActivationPolicy, ActivationTracker};
use super::backend::{ToplevelActions, ToplevelMap, ToplevelRequests};

bitflags! {

/// The `state` enum of `org_kde_plasma_window_management`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PlasmaState: u32 {
    /// The window is active.
    const ACTIVE            = 1 << 0;
    /// The window is minimized.
    const MINIMIZED         = 1 << 1;
    /// The window is maximized.
    const MAXIMIZED         = 1 << 2;
    /// The window is fullscreen.
    const FULLSCREEN        = 1 << 3;
    /// The window is kept above others.
    const KEEP_ABOVE        = 1 << 4;
    /// The window is kept below others.
    const KEEP_BELOW        = 1 << 5;
    /// The window is on all virtual desktops.
    const ON_ALL_DESKTOPS   = 1 << 6;
    /// The window demands attention.
    const DEMANDS_ATTENTION = 1 << 7;
    /// The window can be closed.
    const CLOSEABLE         = 1 << 8;
    /// The window can be minimized.
    const MINIMIZABLE       = 1 << 9;
    /// The window can be maximized.
    const MAXIMIZABLE       = 1 << 10;
    /// The window can be made fullscreen.
    const FULLSCREENABLE    = 1 << 11;
    /// The window is not shown in taskbars.
    const SKIPTASKBAR       = 1 << 12;
}
}

/// An event of an `org_kde_plasma_window`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlasmaEvent<H> {
    /// The title changed.
    Title(String),
    /// The app-id changed.
    AppId(String),
    /// The state changed.
    State(PlasmaState),
    /// The parent window changed.
    Parent(Option<H>),
    /// The window was moved or resized.
    Geometry(Rectangle),
    /// The initial state was sent. Sent once.
    InitialState,
    /// The window was unmapped, and will not be used anymore.
    Unmapped,
}

/// Tracks windows through `org_kde_plasma_window_management`.
///
/// This protocol has no `done` event besides the first one; every
/// later event is committed as it arrives.
#[derive(Debug)]
pub struct PlasmaWindows<R: ToplevelRequests> {
    map: ToplevelMap<R>,
    activation: ActivationTracker,
}

impl<R: ToplevelRequests> PlasmaWindows<R> {
    /// The name of the window backend.
    pub const NAME: &'static str = "plasma-window-management";

    /// Registers the window backend, issuing requests through `requests`.
    ///
    /// Activation is requested by setting the active state, which also
    /// unminimizes the window.
    pub fn new(rt: &mut Runtime, requests: R) -> Self {
        let actions = ToplevelActions::CLOSE
            | ToplevelActions::ACTIVATE
            | ToplevelActions::MAXIMIZE
            | ToplevelActions::MINIMIZE
            | ToplevelActions::FULLSCREEN;
        Self {
            map: ToplevelMap::register(
                rt,
                requests,
                Self::NAME,
                WmCapabilities::HAVE_WINDOW_GEOMETRY,
                actions,
            ),
            activation: ActivationTracker::new(ActivationPolicy::ExplicitSignal),
        }
    }

    /// The handle map of the protocol.
    pub fn map(&self) -> &ToplevelMap<R> {
        &self.map
    }

    /// The manager announced a new window.
    pub fn new_toplevel(&mut self, rt: &mut Runtime, handle: R::Handle) -> ActorId {
        let id = self.map.insert(rt, handle);
        let screen = rt.desktop_geometry().current_screen();
        if let Some(mut t) = rt.toplevel(id) {
            t.placeholder_geometry(Rectangle::new(screen.width / 2, screen.height / 2, 1, 1));
        }
        id
    }

    /// Handles an event of a window.
    pub fn handle_event(&mut self, rt: &mut Runtime, handle: &R::Handle, event: PlasmaEvent<R::Handle>) {
        let Some(id) = self.map.get(rt, handle) else {
            return;
        };
        let notify = initialized(rt, id);
        match &event {
            PlasmaEvent::State(state) => {
                self.map.set_above(id, state.contains(PlasmaState::KEEP_ABOVE));
                self.report_activation(rt, id, state.contains(PlasmaState::ACTIVE));
            }
            PlasmaEvent::Unmapped => {
                self.activation.forget(rt, id);
                self.map.remove(id);
            }
            _ => {}
        }
        let parent = match &event {
            PlasmaEvent::Parent(Some(parent)) => self.map.get(rt, parent),
            _ => None,
        };

        let Some(mut t) = rt.toplevel(id) else {
            return;
        };
        match event {
            PlasmaEvent::Title(title) => t.title_changed(&title, notify),
            PlasmaEvent::AppId(app_id) => t.app_id_changed(&app_id, notify),
            PlasmaEvent::State(state) => {
                t.skip_taskbar_changed(state.contains(PlasmaState::SKIPTASKBAR), false);
                t.maximized_changed(state.contains(PlasmaState::MAXIMIZED), false);
                t.minimized_changed(state.contains(PlasmaState::MINIMIZED), false);
                t.fullscreen_changed(state.contains(PlasmaState::FULLSCREEN), false);
                t.sticky_changed(state.contains(PlasmaState::ON_ALL_DESKTOPS), false);
                t.attention_changed(state.contains(PlasmaState::DEMANDS_ATTENTION), notify);
            }
            PlasmaEvent::Parent(_) => t.parent_changed(parent, notify),
            PlasmaEvent::Geometry(geometry) => t.geometry_changed(geometry, notify),
            PlasmaEvent::InitialState => t.done(),
            PlasmaEvent::Unmapped => t.closed(true),
        }
    }

    /// Activating a dialog activates the window it belongs to.
    fn report_activation(&mut self, rt: &mut Runtime, id: ActorId, active: bool) {
        let root = if active { root_of(rt, id) } else { id };
        self.activation.report(rt, root, active);
        if root != id && initialized(rt, root) {
            if let Some(mut t) = rt.toplevel(root) {
                t.done();
            }
        }
    }
}

fn initialized(rt: &mut Runtime, id: ActorId) -> bool {
    rt.toplevel(id)
        .and_then(|t| t.pending().map(|p| p.init_done() || p.in_queue()))
        .unwrap_or(false)
}

/// Follows the parent chain of a window up to its top-level ancestor.
fn root_of(rt: &Runtime, id: ActorId) -> ActorId {
    let mut root = id;
    // a chain longer than the number of windows has a cycle
    for _ in 0..rt.registry().len() {
        match rt.window(root).and_then(|a| a.parent()) {
            Some(parent) => root = parent,
            None => break,
        }
    }
    root
}
