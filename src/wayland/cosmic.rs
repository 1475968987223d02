use tracing::debug;

use crate::core::{ActorId, Rectangle};
use crate::manager::Runtime;
use crate::platform::WmCapabilities;

use super::activation::{ActivationPolicy, ActivationTracker};
use super::backend::{ToplevelActions, ToplevelMap, ToplevelRequests};

/// Values of the `state` enum of `zcosmic_toplevel_handle_v1`.
pub mod state {
    /// The toplevel is maximized.
    pub const MAXIMIZED: u32 = 0;
    /// The toplevel is minimized.
    pub const MINIMIZED: u32 = 1;
    /// The toplevel is active.
    pub const ACTIVATED: u32 = 2;
    /// The toplevel is fullscreen.
    pub const FULLSCREEN: u32 = 3;
    /// The toplevel is on all workspaces.
    pub const STICKY: u32 = 4;
}

/// Values of the capabilities enum of `zcosmic_toplevel_manager_v1`.
pub mod capability {
    /// Toplevels can be closed.
    pub const CLOSE: u32 = 1;
    /// Toplevels can be activated.
    pub const ACTIVATE: u32 = 2;
    /// Toplevels can be maximized.
    pub const MAXIMIZE: u32 = 3;
    /// Toplevels can be minimized.
    pub const MINIMIZE: u32 = 4;
    /// Toplevels can be made fullscreen.
    pub const FULLSCREEN: u32 = 5;
    /// Toplevels can be moved to another workspace.
    pub const MOVE_TO_WORKSPACE: u32 = 6;
    /// Toplevels can be made sticky.
    pub const STICKY: u32 = 7;
}

/// An event of a `zcosmic_toplevel_handle_v1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CosmicEvent {
    /// The title changed.
    Title(String),
    /// The app-id changed.
    AppId(String),
    /// The state changed; holds every [`state`] value that applies.
    State(Vec<u32>),
    /// The toplevel entered a workspace.
    ///
    /// The host resolves the workspace handle to its position with
    /// [`WorkspaceTracker::position`](super::WorkspaceTracker::position).
    WorkspaceEnter {
        /// The desktop (workspace group) index.
        desktop: i32,
        /// The horizontal viewport index.
        vx: i32,
        /// The vertical viewport index.
        vy: i32,
    },
    /// All changes since the last `done` were sent.
    Done,
    /// The toplevel was closed.
    Closed,
}

/// Tracks windows through `zcosmic_toplevel_info_v1`, with requests
/// sent through `zcosmic_toplevel_manager_v1`.
#[derive(Debug)]
pub struct CosmicToplevels<R: ToplevelRequests> {
    map: ToplevelMap<R>,
    activation: ActivationTracker,
}

impl<R: ToplevelRequests> CosmicToplevels<R> {
    /// The name of the window backend.
    pub const NAME: &'static str = "cosmic-toplevel";

    /// Registers the window backend, issuing requests through `requests`.
    ///
    /// No request is sent until the manager reports its capabilities.
    pub fn new(rt: &mut Runtime, requests: R) -> Self {
        let flags = WmCapabilities::NO_VIEWPORT_OVERLAP
            | WmCapabilities::GEOM_REL_TO_VIEWPORT
            | WmCapabilities::HAVE_WORKSPACES;
        Self {
            map: ToplevelMap::register(rt, requests, Self::NAME, flags, ToplevelActions::empty()),
            activation: ActivationTracker::new(ActivationPolicy::SingleCandidate),
        }
    }

    /// The handle map of the protocol.
    pub fn map(&self) -> &ToplevelMap<R> {
        &self.map
    }

    /// The manager reported its capabilities.
    pub fn capabilities(&self, caps: &[u32]) {
        let mut actions = ToplevelActions::empty();
        for cap in caps {
            actions |= match *cap {
                capability::CLOSE => ToplevelActions::CLOSE,
                capability::ACTIVATE => ToplevelActions::ACTIVATE,
                capability::MAXIMIZE => ToplevelActions::MAXIMIZE,
                capability::MINIMIZE => ToplevelActions::MINIMIZE,
                capability::FULLSCREEN => ToplevelActions::FULLSCREEN,
                capability::MOVE_TO_WORKSPACE => ToplevelActions::MOVE_TO_WORKSPACE,
                capability::STICKY => ToplevelActions::STICKY,
                other => {
                    debug!("Unknown cosmic toplevel capability {}", other);
                    ToplevelActions::empty()
                }
            };
        }
        self.map.set_actions(actions);
    }

    /// The manager announced a new toplevel.
    ///
    /// The protocol reports no geometry, so the window is placed in
    /// the middle of the screen.
    pub fn new_toplevel(&mut self, rt: &mut Runtime, handle: R::Handle) -> ActorId {
        let id = self.map.insert(rt, handle);
        let screen = rt.desktop_geometry().current_screen();
        if let Some(mut t) = rt.toplevel(id) {
            t.placeholder_geometry(Rectangle::new(screen.width / 2, screen.height / 2, 1, 1));
        }
        id
    }

    /// Handles an event of a toplevel handle.
    pub fn handle_event(&mut self, rt: &mut Runtime, handle: &R::Handle, event: CosmicEvent) {
        let Some(id) = self.map.get(rt, handle) else {
            return;
        };
        match &event {
            CosmicEvent::State(states) => {
                self.activation
                    .report(rt, id, states.contains(&state::ACTIVATED))
            }
            CosmicEvent::Closed => {
                self.activation.forget(rt, id);
                self.map.remove(id);
            }
            _ => {}
        }

        let Some(mut t) = rt.toplevel(id) else {
            return;
        };
        match event {
            CosmicEvent::Title(title) => t.title_changed(&title, false),
            CosmicEvent::AppId(app_id) => t.app_id_changed(&app_id, false),
            CosmicEvent::State(states) => {
                let has = |s: u32| states.contains(&s);
                t.maximized_changed(has(state::MAXIMIZED), false);
                t.minimized_changed(has(state::MINIMIZED), false);
                t.fullscreen_changed(has(state::FULLSCREEN), false);
                t.sticky_changed(has(state::STICKY), false);
            }
            CosmicEvent::WorkspaceEnter { desktop, vx, vy } => {
                t.viewport_changed(desktop, vx, vy, false)
            }
            CosmicEvent::Done => t.done(),
            CosmicEvent::Closed => t.closed(true),
        }
    }
}
