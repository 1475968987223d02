use crate::core::ActorId;
use crate::manager::Runtime;
use crate::platform::WmCapabilities;

use super::activation::{ActivationPolicy, ActivationTracker};
use super::backend::{ToplevelActions, ToplevelMap, ToplevelRequests};

/// Values of the `state` enum of `zwlr_foreign_toplevel_handle_v1`.
pub mod state {
    /// The toplevel is maximized.
    pub const MAXIMIZED: u32 = 0;
    /// The toplevel is minimized.
    pub const MINIMIZED: u32 = 1;
    /// The toplevel is active.
    pub const ACTIVATED: u32 = 2;
    /// The toplevel is fullscreen.
    pub const FULLSCREEN: u32 = 3;
}

/// An event of a `zwlr_foreign_toplevel_handle_v1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WlrEvent<H> {
    /// The title changed.
    Title(String),
    /// The app-id changed.
    AppId(String),
    /// The state changed; holds every [`state`] value that applies.
    State(Vec<u32>),
    /// The parent changed.
    Parent(Option<H>),
    /// All changes since the last `done` were sent.
    Done,
    /// The toplevel was closed.
    Closed,
}

/// Tracks windows through `zwlr_foreign_toplevel_manager_v1`.
#[derive(Debug)]
pub struct WlrToplevels<R: ToplevelRequests> {
    map: ToplevelMap<R>,
    activation: ActivationTracker,
}

impl<R: ToplevelRequests> WlrToplevels<R> {
    /// The name of the window backend.
    pub const NAME: &'static str = "wlr-foreign-toplevel";

    /// Registers the window backend, issuing requests through `requests`.
    pub fn new(rt: &mut Runtime, requests: R) -> Self {
        let actions = ToplevelActions::CLOSE
            | ToplevelActions::ACTIVATE
            | ToplevelActions::MAXIMIZE
            | ToplevelActions::MINIMIZE
            | ToplevelActions::FULLSCREEN;
        Self {
            map: ToplevelMap::register(rt, requests, Self::NAME, WmCapabilities::empty(), actions),
            activation: ActivationTracker::new(ActivationPolicy::ExplicitSignal),
        }
    }

    /// The handle map of the protocol.
    pub fn map(&self) -> &ToplevelMap<R> {
        &self.map
    }

    /// The manager announced a new toplevel.
    pub fn new_toplevel(&mut self, rt: &mut Runtime, handle: R::Handle) -> ActorId {
        self.map.insert(rt, handle)
    }

    /// Handles an event of a toplevel handle.
    pub fn handle_event(&mut self, rt: &mut Runtime, handle: &R::Handle, event: WlrEvent<R::Handle>) {
        let Some(id) = self.map.get(rt, handle) else {
            return;
        };
        match &event {
            WlrEvent::State(states) => {
                self.activation
                    .report(rt, id, states.contains(&state::ACTIVATED))
            }
            WlrEvent::Closed => {
                self.activation.forget(rt, id);
                self.map.remove(id);
            }
            _ => {}
        }
        let parent = match &event {
            WlrEvent::Parent(Some(parent)) => self.map.get(rt, parent),
            _ => None,
        };

        let Some(mut t) = rt.toplevel(id) else {
            return;
        };
        match event {
            WlrEvent::Title(title) => t.title_changed(&title, false),
            WlrEvent::AppId(app_id) => t.app_id_changed(&app_id, false),
            WlrEvent::State(states) => {
                let has = |s: u32| states.contains(&s);
                t.maximized_changed(has(state::MAXIMIZED), false);
                t.minimized_changed(has(state::MINIMIZED), false);
                t.fullscreen_changed(has(state::FULLSCREEN), false);
            }
            WlrEvent::Parent(_) => t.parent_changed(parent, false),
            WlrEvent::Done => t.done(),
            WlrEvent::Closed => t.closed(true),
        }
    }
}
