//! Workspaces reported by `ext-workspace-v1` and `cosmic-workspace-v1`.
//!
//! Both protocols describe workspaces, grouped into workspace groups,
//! with optional coordinates. Each group becomes one desktop. When
//! the coordinates of a group are usable they define the viewport
//! grid of that desktop; otherwise its workspaces are laid out as a
//! single row of viewports, in the order they were announced.
//!
//! Changes are buffered until the manager's `done` event, and
//! published from the idle handler (or right before the next toplevel
//! commit, whichever comes first).

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::core::desktop::MAX_DESKTOP_NUM;
use crate::core::DesktopGeometry;
use crate::manager::{DesktopEvent, IdleWork, Runtime};
use crate::platform::{DesktopBackend, DesktopOp, Op};

// coordinates beyond these are not trusted
const MAX_DESKTOP_DIM: u32 = 16;

#[derive(Debug)]
struct Workspace<W, G> {
    handle: W,
    name: Option<String>,
    x: Option<u32>,
    y: Option<u32>,
    pending_x: Option<u32>,
    pending_y: Option<u32>,
    pending_name: Option<String>,
    group: Option<G>,
    hidden: bool,
    removed: bool,
}

#[derive(Debug)]
struct Group<G> {
    handle: G,
    /// Indices of the visible workspaces of this group.
    members: Vec<usize>,
    valid_x: bool,
    valid_y: bool,
    x_offset: u32,
    y_offset: u32,
    removed: bool,
}

impl<G> Group<G> {
    /// Computes the viewport grid of the group.
    fn update_layout<W>(&mut self, workspaces: &[Workspace<W, G>]) -> (i32, i32) {
        let (mut cols, mut rows) = (0, 0);
        let (mut x_offset, mut y_offset) = (u32::MAX, u32::MAX);
        let mut invalid_x = false;
        let mut invalid_y = false;
        let mut all_invalid_y = true;

        let members = self.members.iter().filter_map(|&i| workspaces.get(i));
        for ws in members {
            match ws.x {
                Some(x) => {
                    cols = cols.max(x);
                    x_offset = x_offset.min(x);
                }
                None => invalid_x = true,
            }
            match ws.y {
                Some(y) => {
                    all_invalid_y = false;
                    rows = rows.max(y);
                    y_offset = y_offset.min(y);
                }
                None => invalid_y = true,
            }
        }
        self.x_offset = x_offset;
        self.y_offset = y_offset;

        let n = self.members.len() as u32;
        if n > 0 && !invalid_x {
            if all_invalid_y && cols < MAX_DESKTOP_NUM && cols / 8 <= n {
                self.valid_x = true;
                self.valid_y = false;
                return ((cols + 1 - x_offset) as i32, 1);
            }
            if !invalid_y
                && cols < MAX_DESKTOP_DIM
                && rows < MAX_DESKTOP_DIM
                && rows * cols < MAX_DESKTOP_NUM
                && (rows * cols) / 8 <= n
            {
                self.valid_x = true;
                self.valid_y = true;
                return ((cols + 1 - x_offset) as i32, (rows + 1 - y_offset) as i32);
            }
        }
        self.valid_x = false;
        self.valid_y = false;
        (n.max(1) as i32, 1)
    }
}

/// The workspaces and workspace groups announced by a compositor.
///
/// `W` identifies a workspace and `G` a workspace group; usually these
/// are the protocol objects themselves.
#[derive(Debug)]
pub struct WorkspaceTracker<W, G> {
    workspaces: Vec<Workspace<W, G>>,
    groups: Vec<Group<G>>,
    current: Option<W>,
    pending_active: Option<W>,
    layout_changed: bool,
    layout_notify: bool,
    names_notify: bool,
    scheduled: bool,
}

impl<W, G> Default for WorkspaceTracker<W, G> {
    fn default() -> Self {
        Self {
            workspaces: Vec::new(),
            groups: Vec::new(),
            current: None,
            pending_active: None,
            layout_changed: false,
            layout_notify: false,
            names_notify: false,
            scheduled: false,
        }
    }
}

impl<W, G> WorkspaceTracker<W, G>
where
    W: Clone + PartialEq + fmt::Debug,
    G: Clone + PartialEq + fmt::Debug,
{
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    fn workspace_mut(&mut self, handle: &W) -> Option<&mut Workspace<W, G>> {
        let ws = self.workspaces.iter_mut().find(|ws| &ws.handle == handle);
        if ws.is_none() {
            warn!("Event for unknown workspace {:?}", handle);
        }
        ws
    }

    //* Manager and group events *//

    /// A workspace group was announced.
    pub fn new_group(&mut self, handle: G) {
        self.groups.push(Group {
            handle,
            members: Vec::new(),
            valid_x: false,
            valid_y: false,
            x_offset: 0,
            y_offset: 0,
            removed: false,
        });
        self.layout_changed = true;
    }

    /// A workspace group was removed.
    pub fn group_removed(&mut self, handle: &G) {
        if let Some(group) = self.groups.iter_mut().find(|g| &g.handle == handle) {
            group.removed = true;
            self.layout_changed = true;
        }
    }

    /// A workspace was added to a group.
    pub fn workspace_enter(&mut self, group: &G, workspace: &W) {
        if let Some(ws) = self.workspace_mut(workspace) {
            ws.group = Some(group.clone());
            self.layout_changed = true;
        }
    }

    /// A workspace was taken out of a group.
    pub fn workspace_leave(&mut self, group: &G, workspace: &W) {
        if let Some(ws) = self.workspace_mut(workspace) {
            if ws.group.as_ref() == Some(group) {
                ws.group = None;
                self.layout_changed = true;
            }
        }
    }

    /// A workspace was announced.
    ///
    /// It takes part in the layout once it is added to a group.
    pub fn new_workspace(&mut self, handle: W) {
        self.workspaces.push(Workspace {
            handle,
            name: None,
            x: None,
            y: None,
            pending_x: None,
            pending_y: None,
            pending_name: None,
            group: None,
            hidden: false,
            removed: false,
        });
    }

    //* Workspace events *//

    /// The name of a workspace changed.
    pub fn name(&mut self, workspace: &W, name: &str) {
        if let Some(ws) = self.workspace_mut(workspace) {
            ws.pending_name = Some(name.to_string());
        }
    }

    /// The coordinates of a workspace changed.
    ///
    /// Only one or two coordinates can be used; anything else leaves
    /// the workspace without coordinates.
    pub fn coordinates(&mut self, workspace: &W, coords: &[u32]) {
        let (x, y) = match *coords {
            [x] => (Some(x), None),
            [x, y] => (Some(x), Some(y)),
            _ => (None, None),
        };
        if let Some(ws) = self.workspace_mut(workspace) {
            ws.pending_x = x;
            ws.pending_y = y;
        }
    }

    /// The state of a workspace changed.
    pub fn state(&mut self, workspace: &W, active: bool, hidden: bool) {
        let Some(ws) = self.workspace_mut(workspace) else {
            return;
        };
        if ws.hidden != hidden {
            ws.hidden = hidden;
            self.layout_changed = true;
        }
        if active {
            self.pending_active = Some(workspace.clone());
        }
    }

    /// A workspace was removed.
    pub fn removed(&mut self, workspace: &W) {
        if let Some(ws) = self.workspace_mut(workspace) {
            ws.removed = true;
            self.layout_changed = true;
        }
        if self.pending_active.as_ref() == Some(workspace) {
            self.pending_active = None;
        }
    }

    /// Applies everything received since the last `done`.
    ///
    /// Returns whether there are changes to [`flush`](Self::flush).
    pub fn done(&mut self) -> bool {
        let update_groups = self.layout_changed;
        if update_groups {
            self.groups.retain(|g| !g.removed);
            for group in self.groups.iter_mut() {
                group.members.clear();
            }
        }
        self.workspaces.retain(|ws| !ws.removed);

        for (i, ws) in self.workspaces.iter_mut().enumerate() {
            if update_groups && !ws.hidden {
                let group = ws
                    .group
                    .as_ref()
                    .and_then(|h| self.groups.iter_mut().find(|g| &g.handle == h));
                if let Some(group) = group {
                    group.members.push(i);
                }
            }
            if ws.pending_x != ws.x || ws.pending_y != ws.y {
                ws.x = ws.pending_x;
                ws.y = ws.pending_y;
                if !ws.hidden {
                    self.layout_changed = true;
                }
            }
            if let Some(name) = ws.pending_name.take() {
                ws.name = Some(name);
                if !ws.hidden {
                    self.names_notify = true;
                }
            }
        }

        self.layout_notify |= self.layout_changed;
        self.layout_changed = false;
        if self.current != self.pending_active || self.layout_notify || self.names_notify {
            self.current = self.pending_active.clone();
            self.scheduled = true;
        }
        self.scheduled
    }

    /// Publishes the changes applied by [`done`](Self::done) to the
    /// desktop geometry, and returns the notifications to emit.
    pub fn flush(&mut self, geom: &mut DesktopGeometry) -> Vec<DesktopEvent> {
        let mut events = Vec::new();
        if !std::mem::take(&mut self.scheduled) {
            return events;
        }
        let layout = std::mem::take(&mut self.layout_notify);
        let names = std::mem::take(&mut self.names_notify);

        if layout {
            self.update_layout(geom);
        }
        let desktop_changed = self.update_current(geom);

        if layout {
            events.push(DesktopEvent::GeometryChanged {
                resolution_changed: false,
            });
        }
        if layout || desktop_changed {
            events.push(DesktopEvent::DesktopChanged);
        }
        if names {
            events.push(DesktopEvent::NamesChanged);
        }
        events
    }

    fn update_layout(&mut self, geom: &mut DesktopGeometry) {
        let n = self.groups.len().max(1);
        geom.nb_desktops = n as i32;
        geom.viewports_x = vec![1; n];
        geom.viewports_y = vec![1; n];
        for (ix, group) in self.groups.iter_mut().enumerate() {
            let (vx, vy) = group.update_layout(&self.workspaces);
            geom.viewports_x[ix] = vx;
            geom.viewports_y[ix] = vy;
        }
        debug!(
            "Workspace layout: {} desktops, {:?} x {:?}",
            geom.nb_desktops, geom.viewports_x, geom.viewports_y
        );
    }

    fn update_current(&self, geom: &mut DesktopGeometry) -> bool {
        let Some((desktop, vx, vy)) = self.current.as_ref().and_then(|h| self.position(h)) else {
            return false;
        };
        let changed = (desktop, vx, vy)
            != (geom.current_desktop, geom.current_viewport_x, geom.current_viewport_y);
        geom.current_desktop = desktop;
        geom.current_viewport_x = vx;
        geom.current_viewport_y = vy;
        changed
    }

    //* Queries *//

    /// Whether there are changes waiting for [`flush`](Self::flush).
    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    /// The currently active workspace.
    pub fn current(&self) -> Option<&W> {
        self.current.as_ref()
    }

    /// The desktop and viewport of a workspace, as of the last flush.
    pub fn position(&self, workspace: &W) -> Option<(i32, i32, i32)> {
        for (desktop, group) in self.groups.iter().enumerate() {
            let members = group.members.iter().filter_map(|&i| self.workspaces.get(i));
            for (j, ws) in members.enumerate() {
                if &ws.handle != workspace {
                    continue;
                }
                let (vx, vy) = if group.valid_x {
                    let vx = ws.x.map_or(0, |x| x.saturating_sub(group.x_offset));
                    let vy = match (group.valid_y, ws.y) {
                        (true, Some(y)) => y.saturating_sub(group.y_offset),
                        _ => 0,
                    };
                    (vx as i32, vy as i32)
                } else {
                    (j as i32, 0)
                };
                return Some((desktop as i32, vx, vy));
            }
        }
        None
    }

    /// The workspace at the given desktop and viewport.
    pub fn handle_at(&self, desktop: i32, vx: i32, vy: i32) -> Option<&W> {
        let group = self.groups.get(usize::try_from(desktop).ok()?)?;
        let (vx, vy) = (u32::try_from(vx).ok()?, u32::try_from(vy).ok()?);
        let mut members = group
            .members
            .iter()
            .filter_map(|&i| self.workspaces.get(i))
            .filter(|ws| !ws.removed);
        let ws = if group.valid_x {
            members.find(|ws| {
                ws.x == Some(vx + group.x_offset)
                    && (!group.valid_y || ws.y == Some(vy + group.y_offset))
            })
        } else {
            members.nth(vx as usize)
        };
        ws.map(|ws| &ws.handle)
    }

    /// The names of the visible workspaces, desktop by desktop.
    ///
    /// Workspaces without a name get an empty one.
    pub fn names(&self) -> Vec<String> {
        self.groups
            .iter()
            .flat_map(|g| g.members.iter())
            .filter_map(|&i| self.workspaces.get(i))
            .map(|ws| ws.name.clone().unwrap_or_default())
            .collect()
    }

    /// The number of visible workspaces.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.members.len()).sum()
    }

    /// Whether there are no visible workspaces.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The group new workspaces are created in: the one holding the
    /// current workspace, or else the first one.
    fn target_group(&self) -> Option<&G> {
        let current = self
            .current
            .as_ref()
            .and_then(|h| self.workspaces.iter().find(|ws| &ws.handle == h))
            .and_then(|ws| ws.group.as_ref());
        current.or_else(|| self.groups.first().map(|g| &g.handle))
    }

    /// The last visible workspace, in layout order.
    fn last(&self) -> Option<&W> {
        self.groups
            .iter()
            .flat_map(|g| g.members.iter())
            .filter_map(|&i| self.workspaces.get(i))
            .last()
            .map(|ws| &ws.handle)
    }
}

/// Sends workspace requests to the compositor.
///
/// Implemented by the host, which owns the Wayland connection.
#[allow(unused_variables)]
pub trait WorkspaceRequests: 'static {
    /// The protocol object identifying a workspace.
    type Workspace: Clone + PartialEq + fmt::Debug + 'static;
    /// The protocol object identifying a workspace group.
    type Group: Clone + PartialEq + fmt::Debug + 'static;

    /// Activates a workspace.
    fn activate(&self, workspace: &Self::Workspace) -> Op<()>;

    /// Whether workspaces can be created and removed.
    fn can_create_remove(&self) -> bool {
        false
    }

    /// Creates a workspace in the given group.
    fn create_workspace(&self, group: &Self::Group, name: &str) -> Op<()> {
        None
    }

    /// Removes a workspace.
    fn remove_workspace(&self, workspace: &Self::Workspace) -> Op<()> {
        None
    }

    /// Commits the requests sent so far.
    fn commit(&self) {}
}

type SharedTracker<R> =
    Rc<RefCell<WorkspaceTracker<<R as WorkspaceRequests>::Workspace, <R as WorkspaceRequests>::Group>>>;

/// The [`DesktopBackend`] of a workspace protocol.
struct WorkspaceBackend<R: WorkspaceRequests> {
    name: &'static str,
    tracker: SharedTracker<R>,
    requests: Rc<R>,
}

impl<R: WorkspaceRequests> DesktopBackend for WorkspaceBackend<R> {
    fn name(&self) -> &str {
        self.name
    }

    fn implements(&self, op: DesktopOp) -> bool {
        match op {
            DesktopOp::SetCurrentDesktop => true,
            DesktopOp::AddWorkspace | DesktopOp::RemoveLastWorkspace => {
                self.requests.can_create_remove()
            }
            _ => false,
        }
    }

    fn desktop_names(&self) -> Op<Vec<String>> {
        Some(self.tracker.borrow().names())
    }

    fn set_current_desktop(&self, _: &DesktopGeometry, desktop: i32, vx: i32, vy: i32) -> Op<bool> {
        let Some(ws) = self.tracker.borrow().handle_at(desktop, vx, vy).cloned() else {
            warn!("{}: no workspace at {} ({}, {})", self.name, desktop, vx, vy);
            return Some(false);
        };
        self.requests.activate(&ws)?;
        self.requests.commit();
        Some(true)
    }

    fn add_workspace(&self) -> Op<()> {
        let (group, n) = {
            let tracker = self.tracker.borrow();
            (tracker.target_group().cloned(), tracker.len())
        };
        let Some(group) = group else {
            warn!("{}: no workspace group to add a workspace to", self.name);
            return Some(());
        };
        self.requests
            .create_workspace(&group, &format!("Workspace {}", n + 1))?;
        self.requests.commit();
        Some(())
    }

    fn remove_last_workspace(&self) -> Op<()> {
        let last = {
            let tracker = self.tracker.borrow();
            if tracker.len() <= 1 {
                return Some(());
            }
            tracker.last().cloned()
        };
        if let Some(ws) = last {
            self.requests.remove_workspace(&ws)?;
            self.requests.commit();
        }
        Some(())
    }
}

/// Feeds a [`WorkspaceTracker`] and publishes its changes.
///
/// The tracker is shared with the desktop backend registered by
/// [`new`](Self::new). Borrows returned by [`tracker`](Self::tracker)
/// and [`tracker_mut`](Self::tracker_mut) must not be held across
/// calls into the runtime.
pub struct WorkspaceManager<R: WorkspaceRequests> {
    tracker: SharedTracker<R>,
    requests: Rc<R>,
}

impl<R: WorkspaceRequests> fmt::Debug for WorkspaceManager<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkspaceManager")
            .field("workspaces", &self.tracker.borrow().len())
            .finish()
    }
}

impl<R: WorkspaceRequests> WorkspaceManager<R> {
    /// Registers a desktop backend named `name`, issuing requests
    /// through `requests`.
    pub fn new(rt: &mut Runtime, requests: R, name: &'static str) -> Self {
        let tracker: SharedTracker<R> = Rc::new(RefCell::new(WorkspaceTracker::new()));
        let requests = Rc::new(requests);
        rt.register_desktop_backend(Box::new(WorkspaceBackend {
            name,
            tracker: tracker.clone(),
            requests: requests.clone(),
        }));

        let shared = tracker.clone();
        rt.add_pre_notify_hook(crate::hook!(move |rt| {
            let events = shared.borrow_mut().flush(rt.desktop_geometry_mut());
            for event in events {
                rt.emit(event);
            }
        }));
        Self { tracker, requests }
    }

    /// The requests of the protocol.
    pub fn requests(&self) -> &R {
        &self.requests
    }

    /// The tracker, for queries.
    pub fn tracker(&self) -> Ref<'_, WorkspaceTracker<R::Workspace, R::Group>> {
        self.tracker.borrow()
    }

    /// The tracker, to feed it protocol events.
    pub fn tracker_mut(&self) -> RefMut<'_, WorkspaceTracker<R::Workspace, R::Group>> {
        self.tracker.borrow_mut()
    }

    /// The manager sent `done`: applies the changes and schedules
    /// their publication.
    pub fn done(&self, rt: &mut Runtime) {
        if self.tracker.borrow_mut().done() {
            rt.schedule_idle(IdleWork::DESKTOP);
        }
    }

    /// The desktop and viewport of a workspace.
    pub fn position(&self, workspace: &R::Workspace) -> Option<(i32, i32, i32)> {
        self.tracker.borrow().position(workspace)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::core::Rectangle;
    use crate::manager::{DockConfig, Notification};

    type Tracker = WorkspaceTracker<u32, u32>;

    fn geometry() -> DesktopGeometry {
        DesktopGeometry::uniform(Rectangle::new(0, 0, 1920, 1080), 1, 1, 1)
    }

    /// One group (0) holding workspaces `1..=n`.
    fn tracker(n: u32) -> Tracker {
        let mut t = Tracker::new();
        t.new_group(0);
        for ws in 1..=n {
            t.new_workspace(ws);
            t.workspace_enter(&0, &ws);
        }
        t
    }

    #[test]
    fn test_single_row_without_coordinates() {
        let mut t = tracker(3);
        t.name(&1, "one");
        t.name(&3, "three");
        t.state(&2, true, false);
        assert!(t.done());

        let mut geom = geometry();
        let events = t.flush(&mut geom);
        assert_eq!(
            events,
            vec![
                DesktopEvent::GeometryChanged { resolution_changed: false },
                DesktopEvent::DesktopChanged,
                DesktopEvent::NamesChanged,
            ]
        );
        assert_eq!((geom.nb_desktops, geom.viewports_of(0)), (1, (3, 1)));
        assert_eq!((geom.current_desktop, geom.current_viewport_x), (0, 1));
        assert_eq!(t.names(), vec!["one".to_string(), String::new(), "three".to_string()]);
        assert_eq!(t.handle_at(0, 2, 0), Some(&3));
        assert!(t.flush(&mut geom).is_empty());
    }

    #[test]
    fn test_grid_from_coordinates() {
        // x starting from 1, as some compositors do
        let mut t = tracker(4);
        for (ws, coords) in [(1, [1, 0]), (2, [2, 0]), (3, [1, 1]), (4, [2, 1])] {
            t.coordinates(&ws, &coords);
        }
        t.state(&4, true, false);
        t.done();

        let mut geom = geometry();
        t.flush(&mut geom);
        assert_eq!(geom.viewports_of(0), (2, 2));
        assert_eq!((geom.current_viewport_x, geom.current_viewport_y), (1, 1));
        assert_eq!(t.position(&3), Some((0, 0, 1)));
        assert_eq!(t.handle_at(0, 1, 0), Some(&2));
        assert_eq!(t.handle_at(0, 2, 0), None);
    }

    #[test]
    fn test_single_coordinate() {
        let mut t = tracker(3);
        for ws in 1..=3 {
            t.coordinates(&ws, &[ws * 2]);
        }
        t.done();
        let mut geom = geometry();
        t.flush(&mut geom);
        // 2, 4 and 6 with an offset of 2
        assert_eq!(geom.viewports_of(0), (5, 1));
        assert_eq!(t.position(&3), Some((0, 4, 0)));
    }

    #[test]
    fn test_unusable_coordinates() {
        let mut t = tracker(2);
        t.coordinates(&1, &[0, 0]);
        t.coordinates(&2, &[40, 40]);
        t.done();
        let mut geom = geometry();
        t.flush(&mut geom);
        assert_eq!(geom.viewports_of(0), (2, 1));
        assert_eq!(t.position(&2), Some((0, 1, 0)));

        let mut t = tracker(2);
        t.coordinates(&1, &[0, 0, 0]);
        t.coordinates(&2, &[1]);
        t.done();
        t.flush(&mut geom);
        assert_eq!(geom.viewports_of(0), (2, 1));
    }

    #[test]
    fn test_hidden_and_removed_workspaces() {
        let mut t = tracker(3);
        t.state(&2, false, true);
        t.state(&1, true, false);
        t.done();
        let mut geom = geometry();
        t.flush(&mut geom);
        assert_eq!(geom.viewports_of(0), (2, 1));
        assert_eq!(t.position(&2), None);
        assert_eq!(t.position(&3), Some((0, 1, 0)));

        t.removed(&1);
        t.done();
        assert_eq!(
            t.flush(&mut geom),
            vec![
                DesktopEvent::GeometryChanged { resolution_changed: false },
                DesktopEvent::DesktopChanged,
            ]
        );
        assert_eq!(geom.viewports_of(0), (1, 1));
        assert_eq!(t.position(&3), Some((0, 0, 0)));
        assert_eq!(t.current(), None);
    }

    #[test]
    fn test_groups_are_desktops() {
        let mut t = tracker(2);
        t.new_group(1);
        t.new_workspace(3);
        t.workspace_enter(&1, &3);
        t.state(&3, true, false);
        t.done();
        let mut geom = geometry();
        t.flush(&mut geom);
        assert_eq!(geom.nb_desktops, 2);
        assert_eq!((geom.viewports_of(0), geom.viewports_of(1)), ((2, 1), (1, 1)));
        assert_eq!(geom.current_desktop, 1);

        t.workspace_leave(&1, &3);
        t.group_removed(&1);
        t.done();
        t.flush(&mut geom);
        assert_eq!(geom.nb_desktops, 1);
        assert_eq!(t.position(&3), None);
    }

    #[test]
    fn test_only_names_changed() {
        let mut t = tracker(1);
        t.done();
        let mut geom = geometry();
        t.flush(&mut geom);

        t.name(&1, "main");
        assert!(t.done());
        assert_eq!(t.flush(&mut geom), vec![DesktopEvent::NamesChanged]);
        assert!(!t.done());
    }

    #[derive(Debug, Default)]
    struct Requests {
        log: RefCell<Vec<String>>,
    }

    impl WorkspaceRequests for Requests {
        type Workspace = u32;
        type Group = u32;

        fn activate(&self, ws: &u32) -> Op<()> {
            self.log.borrow_mut().push(format!("activate {}", ws));
            Some(())
        }

        fn can_create_remove(&self) -> bool {
            true
        }

        fn create_workspace(&self, group: &u32, name: &str) -> Op<()> {
            self.log.borrow_mut().push(format!("create {} {}", group, name));
            Some(())
        }

        fn remove_workspace(&self, ws: &u32) -> Op<()> {
            self.log.borrow_mut().push(format!("remove {}", ws));
            Some(())
        }

        fn commit(&self) {
            self.log.borrow_mut().push("commit".into());
        }
    }

    fn feed(manager: &WorkspaceManager<Requests>, rt: &mut Runtime) {
        {
            let mut t = manager.tracker_mut();
            t.new_group(0);
            for ws in 1..=3 {
                t.new_workspace(ws);
                t.workspace_enter(&0, &ws);
            }
            t.state(&1, true, false);
        }
        manager.done(rt);
    }

    #[test]
    fn test_manager_publishes_on_idle() {
        let mut rt = Runtime::new(DockConfig::default());
        let log = Rc::new(RefCell::new(Vec::new()));
        let inner = log.clone();
        rt.subscribe(Box::new(move |_, n| {
            if let Notification::Desktop(e) = n {
                inner.borrow_mut().push(e.clone());
            }
        }));
        let manager = WorkspaceManager::new(&mut rt, Requests::default(), "ext-workspace");
        feed(&manager, &mut rt);
        assert!(log.borrow().is_empty());
        assert!(rt.has_idle_work());

        rt.run_idle();
        assert_eq!(
            *log.borrow(),
            vec![
                DesktopEvent::GeometryChanged { resolution_changed: false },
                DesktopEvent::DesktopChanged,
            ]
        );
        assert_eq!(rt.desktop_geometry().viewports_of(0), (3, 1));
        assert_eq!(rt.desktop_names(), vec![String::new(); 3]);
    }

    #[test]
    fn test_manager_requests() {
        let mut rt = Runtime::new(DockConfig::default());
        let manager = WorkspaceManager::new(&mut rt, Requests::default(), "cosmic-workspace");
        feed(&manager, &mut rt);
        rt.run_idle();

        assert!(rt.desktop_can(DesktopOp::AddWorkspace));
        assert!(rt.set_current_desktop(0, 2, 0));
        assert!(!rt.set_current_desktop(0, 3, 0));
        rt.add_workspace();
        rt.remove_last_workspace();
        assert_eq!(
            *manager.requests().log.borrow(),
            vec![
                "activate 3".to_string(),
                "commit".to_string(),
                "create 0 Workspace 4".to_string(),
                "commit".to_string(),
                "remove 3".to_string(),
                "commit".to_string(),
            ]
        );
        assert_eq!(manager.position(&2), Some((0, 1, 0)));
    }
}
