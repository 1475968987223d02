//! The event side of the X11 backend.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use super::atom::Atom;
use super::backend::{X11DesktopBackend, X11WindowBackend};
use super::core::{InputMask, Result, XConn, XWindowID, LOCK_MODIFIERS};
use super::event::{ConfigureEvent, KeypressEvent, PropertyEvent, XEvent};
use super::ewmh::{Ewmh, NetWmStates};
use super::icccm::Icccm;
use crate::core::desktop::MAX_DESKTOP_NUM;
use crate::core::{parse_class, ActorId, DesktopGeometry, ProtocolHandle, Rectangle};
use crate::manager::{DesktopEvent, Runtime, WindowEvent};

bitflags! {

/// Where an attention demand comes from.
///
/// A window demands attention as long as one of these is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct AttentionFlags: u8 {
    const DEMANDS_ATTENTION = 1 << 0;
    const URGENCY_HINT      = 1 << 1;
}
}

/// What the backend knows about a window in the stacking list.
///
/// Windows that are not shown in the taskbar are kept too, without
/// an actor, so that they are only inspected once.
#[derive(Debug, Clone, Default)]
pub(crate) struct XClient {
    pub(crate) actor: Option<ActorId>,
    pub(crate) transient_for: Option<XWindowID>,
    // has a type shown in the taskbar
    normal: bool,
    skips_taskbar: bool,
    attention: AttentionFlags,
    last_check: u64,
}

/// State shared between the manager and the backends it registers.
#[derive(Debug, Default)]
pub(crate) struct XState {
    pub(crate) clients: RefCell<IndexMap<XWindowID, XClient>>,
    /// Set by the desktop backend when the layout should be read again.
    pub(crate) refresh: Cell<bool>,
}

impl XState {
    pub(crate) fn actor_of(&self, window: XWindowID) -> Option<ActorId> {
        self.clients.borrow().get(&window).and_then(|c| c.actor)
    }
}

/// Tracks the windows and desktops of an EWMH-compliant window manager.
///
/// The manager owns the event side of the connection: the host calls
/// [`dispatch_pending`](Self::dispatch_pending) whenever the connection
/// may have events (on a timer, or when its file descriptor is readable),
/// and the manager updates the actors and emits notifications. Requests
/// go through the window and desktop backends registered by
/// [`init`](Self::init), which share the connection.
pub struct X11Manager<X: XConn> {
    conn: Rc<X>,
    state: Rc<XState>,
    time: u64,
    active: Option<XWindowID>,
}

impl<X: XConn + fmt::Debug> fmt::Debug for X11Manager<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("X11Manager")
            .field("conn", &self.conn)
            .field("clients", &self.state.clients.borrow().len())
            .field("time", &self.time)
            .field("active", &self.active)
            .finish()
    }
}

impl<X: XConn + 'static> X11Manager<X> {
    /// Reads the current state of the desktop and registers the X11
    /// backends with `rt`.
    ///
    /// Actors are created for the windows already open, without
    /// notifying; the dock is expected to enumerate them once it is
    /// ready.
    pub fn init(rt: &mut Runtime, conn: X) -> Result<Self> {
        let conn = Rc::new(conn);
        let root = conn.root();
        conn.select_input(root, InputMask::PROPERTY_CHANGE | InputMask::KEY_PRESS)?;

        let geom = rt.desktop_geometry_mut();
        read_screens(&*conn, geom)?;
        read_layout(&*conn, geom)?;
        info!(
            "X11 desktop: {} desktops of {}x{} viewports, screen {}x{}",
            geom.nb_desktops,
            geom.viewports_of(0).0,
            geom.viewports_of(0).1,
            geom.desktop_width(),
            geom.desktop_height()
        );

        let state = Rc::new(XState::default());
        rt.register_window_backend(Box::new(X11WindowBackend::new(conn.clone(), state.clone())));
        rt.register_desktop_backend(Box::new(X11DesktopBackend::new(conn.clone(), state.clone())));

        let mut manager = Self {
            conn,
            state,
            time: 0,
            active: None,
        };
        manager.update_stacking(rt, false)?;

        manager.active = manager.conn.active_window()?;
        let active = manager.active.and_then(|w| manager.state.actor_of(w));
        rt.set_active(active);

        Ok(manager)
    }

    /// The connection to the X server.
    pub fn conn(&self) -> &X {
        &self.conn
    }

    /// The X window behind an actor, if it is tracked by this backend.
    pub fn window_of(&self, id: ActorId) -> Option<XWindowID> {
        self.state
            .clients
            .borrow()
            .iter()
            .find(|(_, c)| c.actor == Some(id))
            .map(|(w, _)| *w)
    }

    /// Processes every queued event, then flushes the connection.
    ///
    /// An error while handling a single event is passed to the error
    /// handler of `rt`; only connection errors are returned.
    pub fn dispatch_pending(&mut self, rt: &mut Runtime) -> Result<()> {
        if self.state.refresh.replace(false) {
            read_layout(&*self.conn, rt.desktop_geometry_mut())?;
            let geom = rt.desktop_geometry();
            debug!(
                "Desktop refresh: {} desktops, {:?} viewports",
                geom.nb_desktops,
                geom.viewports_of(geom.current_desktop)
            );
        }
        while let Some(event) = self.conn.poll_next_event()? {
            if let Err(e) = self.handle_event(rt, event) {
                rt.handle_error(e.into());
            }
        }
        self.conn.flush()
    }

    fn handle_event(&mut self, rt: &mut Runtime, event: XEvent) -> Result<()> {
        match event {
            XEvent::PropertyNotify(ev) if ev.id == self.conn.root() => self.on_root_property(rt, ev),
            XEvent::PropertyNotify(ev) => self.on_window_property(rt, ev),
            XEvent::ConfigureNotify(ev) if !ev.is_root => self.on_configure(rt, ev),
            XEvent::ConfigureNotify(_) => Ok(()),
            XEvent::KeyPress(KeypressEvent { state, keycode }) => {
                rt.emit(DesktopEvent::ShortkeyPressed {
                    keycode: keycode as u32,
                    modifiers: (state & !LOCK_MODIFIERS) as u32,
                });
                Ok(())
            }
            XEvent::MappingNotify => {
                rt.emit(DesktopEvent::KeymapChanged { after: false });
                rt.emit(DesktopEvent::KeymapChanged { after: true });
                Ok(())
            }
            XEvent::ClientMessage(msg) => {
                trace!("Ignoring client message about {}", msg.window);
                Ok(())
            }
            XEvent::Unknown(ev) => {
                trace!("Unhandled event {}", ev);
                Ok(())
            }
        }
    }

    //* Root window *//

    fn on_root_property(&mut self, rt: &mut Runtime, ev: PropertyEvent) -> Result<()> {
        let name = self.conn.lookup_atom(ev.atom)?;
        let Ok(atom) = Atom::from_str(&name) else {
            return Ok(());
        };
        match atom {
            Atom::NetClientListStacking => self.update_stacking(rt, true)?,
            Atom::NetActiveWindow => self.update_active(rt)?,
            Atom::NetCurrentDesktop | Atom::NetDesktopViewport => {
                read_current(&*self.conn, rt.desktop_geometry_mut())?;
                rt.emit(DesktopEvent::DesktopChanged);
            }
            Atom::NetNumberOfDesktops => {
                read_layout(&*self.conn, rt.desktop_geometry_mut())?;
                rt.emit(DesktopEvent::GeometryChanged {
                    resolution_changed: false,
                });
            }
            // some compositors only update the workarea when the screen shrinks
            Atom::NetDesktopGeometry | Atom::NetWorkarea => {
                let geom = rt.desktop_geometry_mut();
                let resized = read_screens(&*self.conn, geom)?;
                read_layout(&*self.conn, geom)?;
                rt.emit(DesktopEvent::GeometryChanged {
                    resolution_changed: resized || atom == Atom::NetDesktopGeometry,
                });
            }
            Atom::XRootPmapId => rt.emit(DesktopEvent::WallpaperChanged),
            Atom::NetShowingDesktop => rt.emit(DesktopEvent::VisibilityChanged),
            Atom::XklavierState => rt.emit(DesktopEvent::KbdStateChanged(None)),
            Atom::NetDesktopNames => rt.emit(DesktopEvent::NamesChanged),
            _ => {}
        }
        Ok(())
    }

    /// Diffs the stacking list against the known windows.
    ///
    /// New windows get an actor if they belong in the taskbar, windows
    /// that left the list are destroyed, and every actor is given its
    /// position in the list as stacking order.
    fn update_stacking(&mut self, rt: &mut Runtime, notify: bool) -> Result<()> {
        self.time += 1;
        let time = self.time;
        let windows = self.conn.client_list_stacking()?;

        let mut order = 0;
        for window in windows {
            let known = self
                .state
                .clients
                .borrow_mut()
                .get_mut(&window)
                .map(|c| {
                    c.last_check = time;
                    c.actor
                });
            let actor = match known {
                Some(actor) => {
                    if let Some(a) = actor.and_then(|id| rt.registry.get_mut(id)) {
                        a.stack_order = order;
                    }
                    actor
                }
                None => {
                    trace!("{} is new in the stacking list", window);
                    let client = self.make_client(rt, window, order).unwrap_or_else(|e| {
                        warn!("Could not read the properties of {}: {}", window, e);
                        XClient {
                            last_check: time,
                            ..XClient::default()
                        }
                    });
                    let actor = client.actor;
                    self.state.clients.borrow_mut().insert(window, client);
                    if let (Some(id), true) = (actor, notify) {
                        rt.emit(WindowEvent::Created(id));
                    }
                    actor
                }
            };
            if actor.is_some() {
                order += 1;
            }
        }

        let gone: Vec<(XWindowID, Option<ActorId>)> = {
            let mut clients = self.state.clients.borrow_mut();
            let gone = clients
                .iter()
                .filter(|(_, c)| c.last_check < time)
                .map(|(w, c)| (*w, c.actor))
                .collect();
            clients.retain(|_, c| c.last_check >= time);
            gone
        };
        for (window, actor) in gone {
            let Some(id) = actor else {
                continue;
            };
            debug!("{} left the stacking list", window);
            if notify {
                rt.emit(WindowEvent::Destroyed(id));
            }
            self.forget_window(window);
            rt.release_actor(id);
        }

        if notify {
            rt.emit(WindowEvent::ZOrderChanged);
        } else {
            rt.registry.invalidate_z_order();
        }
        Ok(())
    }

    fn make_client(&self, rt: &mut Runtime, window: XWindowID, order: i32) -> Result<XClient> {
        let conn = &*self.conn;
        let states = conn.window_states(window)?;
        let transient_for = conn.wm_transient_for(window)?;
        let mut client = XClient {
            transient_for,
            skips_taskbar: states.contains(NetWmStates::SKIP_TASKBAR),
            last_check: self.time,
            ..XClient::default()
        };
        if client.skips_taskbar {
            debug!("{} skips the taskbar", window);
            return Ok(client);
        }

        let normal = is_normal_window(&conn.window_types(window)?, transient_for);
        if !normal && transient_for.is_none() {
            debug!("{} has an unwanted type, ignoring it", window);
            return Ok(client);
        }
        client.normal = normal;

        let name = conn.wm_name(window)?;
        let wm_class = conn.wm_class(window)?;
        if wm_class.is_none() {
            debug!(
                "{} ({:?}) doesn't belong to any class, it won't be displayed",
                window, name
            );
        }
        let class = wm_class
            .as_ref()
            .map(|(res_name, res_class)| parse_class(res_class, Some(res_name)));
        let desktop = conn.window_desktop(window)?;
        let geometry = conn.get_geometry(window)?;
        let (vx, vy) = viewport_of(rt.desktop_geometry(), geometry);
        let parent = transient_for.and_then(|w| self.state.actor_of(w));
        let attention = states.contains(NetWmStates::DEMANDS_ATTENTION);

        let id = rt.create_actor(ProtocolHandle::new(window), |a| {
            a.displayed = normal && class.is_some();
            a.class = class;
            a.wm_class = wm_class.map(|(_, res_class)| res_class);
            a.last_attention_demand = if attention { name.clone() } else { None };
            a.name = name;
            a.hidden = states.contains(NetWmStates::HIDDEN);
            a.maximized = states.is_maximized();
            a.fullscreen = states.contains(NetWmStates::FULLSCREEN);
            a.demands_attention = attention;
            a.sticky = states.contains(NetWmStates::STICKY);
            a.geometry = geometry;
            a.num_desktop = desktop;
            a.viewport_x = vx;
            a.viewport_y = vy;
            a.stack_order = order;
            a.transient = transient_for.is_some();
            a.parent = parent;
        });
        debug!("Tracking {} as {}", window, id);

        if let Err(e) = conn.select_input(
            window,
            InputMask::PROPERTY_CHANGE | InputMask::STRUCTURE_NOTIFY,
        ) {
            warn!("Could not watch {}: {}", window, e);
        }

        client.actor = Some(id);
        if attention {
            client.attention = AttentionFlags::DEMANDS_ATTENTION;
        }
        Ok(client)
    }

    // the window may already be destroyed
    fn forget_window(&self, window: XWindowID) {
        let res = self
            .conn
            .select_input(window, InputMask::empty())
            .and_then(|_| self.conn.set_icon_geometry(window, Rectangle::zeroed()));
        if let Err(e) = res {
            debug!("Could not reset {}: {}", window, e);
        }
    }

    fn update_active(&mut self, rt: &mut Runtime) -> Result<()> {
        let active = self.conn.active_window()?;
        if active == self.active {
            return Ok(());
        }
        // windows without keyboard focus do not report keyboard changes
        let refresh_kbd = self.active.is_none();
        self.active = active;

        let id = active.and_then(|w| self.state.actor_of(w));
        trace!("Active window is now {:?} ({:?})", active, id);
        rt.set_active(id);
        rt.emit(WindowEvent::Activated(id));
        if let Some(id) = id {
            rt.pick_activated(id);
        }
        if refresh_kbd {
            rt.emit(DesktopEvent::KbdStateChanged(id));
        }
        Ok(())
    }

    //* Client windows *//

    fn on_window_property(&mut self, rt: &mut Runtime, ev: PropertyEvent) -> Result<()> {
        let window = ev.id;
        let Some(actor) = self.state.clients.borrow().get(&window).map(|c| c.actor) else {
            return Ok(());
        };
        let name = self.conn.lookup_atom(ev.atom)?;
        let Ok(atom) = Atom::from_str(&name) else {
            return Ok(());
        };

        match (atom, actor) {
            (Atom::XklavierState, actor) => rt.emit(DesktopEvent::KbdStateChanged(actor)),
            (Atom::NetWmState, _) => self.on_state_changed(rt, window)?,
            (_, None) => {}
            (Atom::NetWmDesktop, Some(id)) => {
                let desktop = self.conn.window_desktop(window)?;
                if let Some(a) = rt.registry.get_mut(id) {
                    a.num_desktop = desktop;
                }
                rt.emit(WindowEvent::DesktopChanged(id));
            }
            (Atom::WmName | Atom::NetWmName, Some(id)) => {
                let name = self.conn.wm_name(window)?;
                if let Some(a) = rt.registry.get_mut(id) {
                    a.name = name;
                }
                rt.emit(WindowEvent::NameChanged(id));
            }
            (Atom::WmHints, Some(id)) => match self.conn.wm_hints(window)? {
                Some(hints) => {
                    if hints.urgent() {
                        self.set_attention(rt, window, id, AttentionFlags::URGENCY_HINT);
                    } else {
                        self.unset_attention(rt, window, id, AttentionFlags::URGENCY_HINT);
                    }
                    if !ev.deleted && hints.has_icon() {
                        rt.emit(WindowEvent::IconChanged(id));
                    }
                }
                // no hints means no urgency
                None => self.unset_attention(rt, window, id, AttentionFlags::URGENCY_HINT),
            },
            (Atom::NetWmIcon, Some(id)) => rt.emit(WindowEvent::IconChanged(id)),
            (Atom::WmClass, Some(id)) => self.on_class_changed(rt, window, id)?,
            _ => {}
        }
        Ok(())
    }

    fn on_state_changed(&mut self, rt: &mut Runtime, window: XWindowID) -> Result<()> {
        let states = self.conn.window_states(window)?;
        let skips = states.contains(NetWmStates::SKIP_TASKBAR);
        let (actor, skipped) = match self.state.clients.borrow().get(&window) {
            Some(c) => (c.actor, c.skips_taskbar),
            None => return Ok(()),
        };

        if skips != skipped {
            if skips {
                if let Some(c) = self.state.clients.borrow_mut().get_mut(&window) {
                    c.skips_taskbar = true;
                    c.actor = None;
                    c.attention = AttentionFlags::empty();
                }
                if let Some(id) = actor {
                    debug!("{} left the taskbar", window);
                    rt.emit(WindowEvent::Destroyed(id));
                    rt.release_actor(id);
                }
                return Ok(());
            }
            // inspect it again as if it was new
            debug!("{} entered the taskbar", window);
            self.state.clients.borrow_mut().shift_remove(&window);
            return self.update_stacking(rt, true);
        }

        let Some(id) = actor else {
            return Ok(());
        };
        let Some(a) = rt.registry.get_mut(id) else {
            return Ok(());
        };
        let hidden_changed = a.hidden != states.contains(NetWmStates::HIDDEN);
        let maximized_changed = a.maximized != states.is_maximized();
        let fullscreen_changed = a.fullscreen != states.contains(NetWmStates::FULLSCREEN);
        let sticky_changed = a.sticky != states.contains(NetWmStates::STICKY);
        a.hidden = states.contains(NetWmStates::HIDDEN);
        a.maximized = states.is_maximized();
        a.fullscreen = states.contains(NetWmStates::FULLSCREEN);

        if states.contains(NetWmStates::DEMANDS_ATTENTION) {
            self.set_attention(rt, window, id, AttentionFlags::DEMANDS_ATTENTION);
        } else {
            self.unset_attention(rt, window, id, AttentionFlags::DEMANDS_ATTENTION);
        }
        if hidden_changed || maximized_changed || fullscreen_changed {
            rt.emit(WindowEvent::StateChanged {
                id,
                hidden_changed,
                maximized_changed,
                fullscreen_changed,
            });
        }
        // sticky windows are on every desktop
        if sticky_changed {
            if let Some(a) = rt.registry.get_mut(id) {
                a.sticky = states.contains(NetWmStates::STICKY);
            }
            rt.emit(WindowEvent::DesktopChanged(id));
        }
        Ok(())
    }

    fn on_class_changed(&mut self, rt: &mut Runtime, window: XWindowID, id: ActorId) -> Result<()> {
        let Some((res_name, res_class)) = self.conn.wm_class(window)? else {
            return Ok(());
        };
        let class = parse_class(&res_class, Some(&res_name));
        let normal = self
            .state
            .clients
            .borrow()
            .get(&window)
            .is_some_and(|c| c.normal);
        let Some(a) = rt.registry.get_mut(id) else {
            return Ok(());
        };
        if a.class.as_deref() == Some(class.as_str()) {
            return Ok(());
        }
        debug!("{} changed class to {}", window, class);
        let old_class = a.class.replace(class);
        let old_wm_class = a.wm_class.replace(res_class);
        // windows without a class are never displayed
        a.displayed = normal;
        rt.emit(WindowEvent::ClassChanged {
            id,
            old_class,
            old_wm_class,
        });
        Ok(())
    }

    fn on_configure(&mut self, rt: &mut Runtime, ev: ConfigureEvent) -> Result<()> {
        let Some(id) = self.state.actor_of(ev.id) else {
            return Ok(());
        };
        // the event is relative to the parent, which may be a frame
        let geometry = self.conn.get_geometry(ev.id).unwrap_or(ev.geom);
        let (vx, vy) = viewport_of(rt.desktop_geometry(), geometry);
        if let Some(a) = rt.registry.get_mut(id) {
            a.geometry = geometry;
            a.viewport_x = vx;
            a.viewport_y = vy;
        }
        rt.emit(WindowEvent::SizePositionChanged(id));
        Ok(())
    }

    //* Attention *//

    fn set_attention(&self, rt: &mut Runtime, window: XWindowID, id: ActorId, flag: AttentionFlags) {
        let mut clients = self.state.clients.borrow_mut();
        let Some(client) = clients.get_mut(&window) else {
            return;
        };
        let Some(a) = rt.registry.get_mut(id) else {
            return;
        };
        let demanding = !client.attention.is_empty();
        client.attention |= flag;
        // some window managers set the state over and over
        if demanding && a.last_attention_demand == a.name {
            return;
        }
        drop(clients);

        a.last_attention_demand = a.name.clone();
        a.demands_attention = true;
        rt.emit(WindowEvent::AttentionChanged(id));
    }

    fn unset_attention(&self, rt: &mut Runtime, window: XWindowID, id: ActorId, flag: AttentionFlags) {
        {
            let mut clients = self.state.clients.borrow_mut();
            let Some(client) = clients.get_mut(&window) else {
                return;
            };
            if client.attention.is_empty() {
                return;
            }
            client.attention.remove(flag);
            if !client.attention.is_empty() {
                return;
            }
        }
        if let Some(a) = rt.registry.get_mut(id) {
            a.demands_attention = false;
        }
        rt.emit(WindowEvent::AttentionChanged(id));
    }
}

/// Whether a window of the given types belongs in the taskbar.
///
/// Types are listed in order of preference. Dialogs are kept unless
/// they are transient, since a modal dialog cannot be acted on
/// without its parent. Windows without a type are kept unless they
/// are transient.
fn is_normal_window(types: &[String], transient_for: Option<XWindowID>) -> bool {
    if types.is_empty() {
        return transient_for.is_none();
    }
    for ty in types {
        match Atom::from_str(ty) {
            Ok(Atom::NetWindowTypeNormal) => return true,
            Ok(Atom::NetWindowTypeDialog) if transient_for.is_none() => return true,
            // panels may add the normal type after this one
            Ok(Atom::NetWindowTypeDock) => return false,
            _ => {}
        }
    }
    false
}

/// The viewport containing the top left corner of `area`.
fn viewport_of(geom: &DesktopGeometry, area: Rectangle) -> (i32, i32) {
    (
        area.x / geom.desktop_width().max(1) + geom.current_viewport_x,
        area.y / geom.desktop_height().max(1) + geom.current_viewport_y,
    )
}

/// Reads the screens, returning whether the resolution changed.
fn read_screens<X: XConn>(conn: &X, geom: &mut DesktopGeometry) -> Result<bool> {
    let xscreen = conn.get_geometry(conn.root())?;
    let screens = conn.all_outputs()?;
    let changed = xscreen != geom.xscreen || screens != geom.screens;
    geom.xscreen = xscreen;
    geom.screens = screens;
    Ok(changed)
}

/// Reads the number of desktops and viewports, and the current ones.
///
/// EWMH has a single viewport grid for all desktops, given as the
/// size of the whole desktop.
fn read_layout<X: XConn>(conn: &X, geom: &mut DesktopGeometry) -> Result<()> {
    let mut nb = conn.number_of_desktops()?;
    if nb > MAX_DESKTOP_NUM as i32 {
        warn!("{} desktops reported, only tracking {}", nb, MAX_DESKTOP_NUM);
        nb = MAX_DESKTOP_NUM as i32;
    }
    let (w, h) = (geom.desktop_width().max(1), geom.desktop_height().max(1));
    let (vx, vy) = match conn.desktop_geometry()? {
        Some((dw, dh)) => ((dw / w).max(1), (dh / h).max(1)),
        None => (1, 1),
    };
    geom.nb_desktops = nb;
    geom.viewports_x = vec![vx; nb as usize];
    geom.viewports_y = vec![vy; nb as usize];
    read_current(conn, geom)
}

fn read_current<X: XConn>(conn: &X, geom: &mut DesktopGeometry) -> Result<()> {
    let (x, y) = conn.desktop_viewport()?;
    geom.current_desktop = conn.current_desktop()?;
    geom.current_viewport_x = x / geom.desktop_width().max(1);
    geom.current_viewport_y = y / geom.desktop_height().max(1);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::core::Rectangle;
    use crate::manager::{DockConfig, Notification};
    use crate::x::dummy::DummyConn;
    use crate::x::event::ClientMessageEvent;
    use crate::x::property::{Property, WmHints, WmHintsFlags};
    use crate::x::Xid;

    const ROOT: Xid = Xid(1);

    fn conn() -> DummyConn {
        let conn = DummyConn::new(ROOT, Rectangle::new(0, 0, 1000, 800));
        conn.put(ROOT, Atom::NetNumberOfDesktops, Property::Cardinal(vec![2]));
        conn.put(ROOT, Atom::NetDesktopGeometry, Property::Cardinal(vec![2000, 800]));
        conn.put(ROOT, Atom::NetCurrentDesktop, Property::Cardinal(vec![1]));
        conn.put(ROOT, Atom::NetDesktopViewport, Property::Cardinal(vec![1000, 0]));
        conn
    }

    fn setup(conn: DummyConn) -> (Runtime, X11Manager<DummyConn>, Rc<RefCell<Vec<Notification>>>) {
        let mut rt = Runtime::new(DockConfig::default());
        let x11 = X11Manager::init(&mut rt, conn).expect("init failed");
        rt.set_ready(true);
        let log = Rc::new(RefCell::new(Vec::new()));
        let inner = log.clone();
        rt.subscribe(Box::new(move |_, n| inner.borrow_mut().push(n.clone())));
        (rt, x11, log)
    }

    fn window_events(log: &Rc<RefCell<Vec<Notification>>>) -> Vec<WindowEvent> {
        log.borrow()
            .iter()
            .filter_map(|n| match n {
                Notification::Window(e) => Some(e.clone()),
                _ => None,
            })
            .collect()
    }

    fn states(names: &[Atom]) -> Property {
        Property::Atom(names.iter().map(|a| a.to_string()).collect())
    }

    #[test]
    fn test_init_reads_desktop_and_windows() {
        let conn = conn();
        conn.add_window(Xid(10), "Firefox", "Mozilla Firefox");
        conn.set_geometry(Xid(10), Rectangle::new(1100, 10, 400, 300));
        conn.put(Xid(10), Atom::NetWmDesktop, Property::Cardinal(vec![1]));
        conn.put(ROOT, Atom::NetClientListStacking, Property::Window(vec![Xid(10)]));
        conn.put(ROOT, Atom::NetActiveWindow, Property::Window(vec![Xid(10)]));

        let (rt, x11, log) = setup(conn);
        assert!(log.borrow().is_empty());

        let geom = rt.desktop_geometry();
        assert_eq!(geom.nb_desktops, 2);
        assert_eq!(geom.viewports_of(1), (2, 1));
        assert_eq!((geom.current_desktop, geom.current_viewport_x), (1, 1));

        let id = rt.find_window(|a| a.class() == Some("firefox")).expect("no actor");
        let actor = rt.window(id).expect("no actor");
        assert!(actor.is_displayed());
        assert_eq!(actor.name(), Some("Mozilla Firefox"));
        assert_eq!(actor.num_desktop(), 1);
        // one viewport to the right of the current one
        assert_eq!(actor.viewport(), (2, 0));
        assert_eq!(rt.active_window(), Some(id));
        assert_eq!(x11.window_of(id), Some(Xid(10)));
        assert_eq!(rt.window_backend_names(), "x11");
    }

    #[test]
    fn test_desktop_count_is_capped() {
        let conn = conn();
        conn.put(ROOT, Atom::NetNumberOfDesktops, Property::Cardinal(vec![1_000_000]));
        let (rt, _x11, _) = setup(conn);

        let geom = rt.desktop_geometry();
        assert_eq!(geom.nb_desktops, MAX_DESKTOP_NUM as i32);
        assert_eq!(geom.viewports_x.len(), MAX_DESKTOP_NUM as usize);
    }

    #[test_log::test]
    fn test_stacking_creates_and_destroys() {
        let conn = conn();
        conn.add_window(Xid(10), "Firefox", "Firefox");
        conn.add_window(Xid(11), "Gimp-2.10", "GIMP");
        // a panel, never shown
        conn.add_window(Xid(12), "Xfce4-panel", "panel");
        conn.put(
            Xid(12),
            Atom::NetWmWindowType,
            states(&[Atom::NetWindowTypeDock, Atom::NetWindowTypeNormal]),
        );
        let (mut rt, mut x11, log) = setup(conn);

        x11.conn().set_stacking(&[11, 12, 10]);
        x11.dispatch_pending(&mut rt).expect("dispatch failed");

        let gimp = rt.find_window(|a| a.class() == Some("gimp")).expect("no gimp");
        let firefox = rt.find_window(|a| a.class() == Some("firefox")).expect("no firefox");
        assert_eq!(
            window_events(&log),
            vec![
                WindowEvent::Created(gimp),
                WindowEvent::Created(firefox),
                WindowEvent::ZOrderChanged
            ]
        );
        assert_eq!(rt.registry().len(), 2);
        assert!(rt.window(gimp).expect("no gimp").stack_order() < rt.window(firefox).expect("no firefox").stack_order());

        log.borrow_mut().clear();
        x11.conn().set_stacking(&[10]);
        x11.dispatch_pending(&mut rt).expect("dispatch failed");
        assert_eq!(
            window_events(&log),
            vec![WindowEvent::Destroyed(gimp), WindowEvent::ZOrderChanged]
        );
        assert!(rt.window(gimp).is_none());
    }

    #[test]
    fn test_window_without_class_is_not_displayed() {
        let conn = conn();
        conn.add_window(Xid(10), "Firefox", "Firefox");
        conn.remove(Xid(10), Atom::WmClass);
        let (mut rt, mut x11, log) = setup(conn);

        x11.conn().set_stacking(&[10]);
        x11.dispatch_pending(&mut rt).expect("dispatch failed");
        let id = rt.find_window(|_| true).expect("no actor");
        assert_eq!(
            window_events(&log),
            vec![WindowEvent::Created(id), WindowEvent::ZOrderChanged]
        );
        assert!(!rt.window(id).expect("no actor").is_displayed());

        // the class shows up late
        log.borrow_mut().clear();
        x11.conn().change(
            Xid(10),
            Atom::WmClass,
            Property::String(vec!["Navigator".into(), "firefox".into()]),
        );
        x11.dispatch_pending(&mut rt).expect("dispatch failed");
        assert_eq!(
            window_events(&log),
            vec![WindowEvent::ClassChanged {
                id,
                old_class: None,
                old_wm_class: None
            }]
        );
        let actor = rt.window(id).expect("no actor");
        assert!(actor.is_displayed());
        assert_eq!(actor.class(), Some("firefox"));
    }

    #[test]
    fn test_transient_dialog_is_not_displayed() {
        let conn = conn();
        conn.add_window(Xid(10), "Gimp", "GIMP");
        conn.add_window(Xid(11), "Gimp", "Export Image");
        conn.put(
            Xid(11),
            Atom::NetWmWindowType,
            states(&[Atom::NetWindowTypeDialog]),
        );
        conn.put(Xid(11), Atom::WmTransientFor, Property::Window(vec![Xid(10)]));
        conn.put(ROOT, Atom::NetClientListStacking, Property::Window(vec![Xid(10), Xid(11)]));
        let (rt, x11, _) = setup(conn);

        let dialog = rt
            .find_window(|a| a.name() == Some("Export Image"))
            .expect("no dialog");
        let main = rt.find_window(|a| a.name() == Some("GIMP")).expect("no main window");
        assert!(!rt.window(dialog).expect("no dialog").is_displayed());
        assert_eq!(rt.window(dialog).and_then(|a| a.parent()), Some(main));
        assert_eq!(rt.transient_for(dialog), Some(main));
        assert_eq!(x11.window_of(dialog), Some(Xid(11)));
    }

    #[test]
    fn test_skip_taskbar_toggle() {
        let conn = conn();
        conn.add_window(Xid(10), "Firefox", "Firefox");
        conn.put(ROOT, Atom::NetClientListStacking, Property::Window(vec![Xid(10)]));
        let (mut rt, mut x11, log) = setup(conn);
        let id = rt.find_window(|_| true).expect("no actor");

        x11.conn()
            .change(Xid(10), Atom::NetWmState, states(&[Atom::NetWmStateSkipTaskbar]));
        x11.dispatch_pending(&mut rt).expect("dispatch failed");
        assert_eq!(window_events(&log), vec![WindowEvent::Destroyed(id)]);
        assert!(rt.registry().is_empty());

        log.borrow_mut().clear();
        x11.conn().change(Xid(10), Atom::NetWmState, states(&[]));
        x11.dispatch_pending(&mut rt).expect("dispatch failed");
        let new = rt.find_window(|_| true).expect("not tracked again");
        assert_ne!(new, id);
        assert_eq!(
            window_events(&log),
            vec![WindowEvent::Created(new), WindowEvent::ZOrderChanged]
        );
    }

    #[test]
    fn test_state_changes() {
        let conn = conn();
        conn.add_window(Xid(10), "Firefox", "Firefox");
        conn.put(ROOT, Atom::NetClientListStacking, Property::Window(vec![Xid(10)]));
        let (mut rt, mut x11, log) = setup(conn);
        let id = rt.find_window(|_| true).expect("no actor");

        x11.conn().change(
            Xid(10),
            Atom::NetWmState,
            states(&[
                Atom::NetWmStateMaximizedHorz,
                Atom::NetWmStateMaximizedVert,
                Atom::NetWmStateSticky,
            ]),
        );
        x11.dispatch_pending(&mut rt).expect("dispatch failed");
        assert_eq!(
            window_events(&log),
            vec![
                WindowEvent::StateChanged {
                    id,
                    hidden_changed: false,
                    maximized_changed: true,
                    fullscreen_changed: false
                },
                WindowEvent::DesktopChanged(id)
            ]
        );
        let actor = rt.window(id).expect("no actor");
        assert!(actor.is_maximized() && actor.is_sticky());
    }

    #[test]
    fn test_repeated_attention_is_ignored() {
        let conn = conn();
        conn.add_window(Xid(10), "Pidgin", "Buddy List");
        conn.put(ROOT, Atom::NetClientListStacking, Property::Window(vec![Xid(10)]));
        let (mut rt, mut x11, log) = setup(conn);
        let id = rt.find_window(|_| true).expect("no actor");

        let demand = states(&[Atom::NetWmStateDemandsAttention]);
        x11.conn().change(Xid(10), Atom::NetWmState, demand.clone());
        x11.conn().change(
            Xid(10),
            Atom::WmHints,
            Property::WMHints(WmHints::with_flags(WmHintsFlags::URGENCY_HINT)),
        );
        x11.conn().change(Xid(10), Atom::NetWmState, demand.clone());
        x11.dispatch_pending(&mut rt).expect("dispatch failed");
        assert_eq!(window_events(&log), vec![WindowEvent::AttentionChanged(id)]);
        assert!(rt.window(id).expect("no actor").demands_attention());

        // a new title is a new demand
        log.borrow_mut().clear();
        x11.conn()
            .change(Xid(10), Atom::NetWmName, Property::UTF8String(vec!["(1) Bob".into()]));
        x11.conn().change(Xid(10), Atom::NetWmState, demand);
        x11.dispatch_pending(&mut rt).expect("dispatch failed");
        assert_eq!(
            window_events(&log),
            vec![WindowEvent::NameChanged(id), WindowEvent::AttentionChanged(id)]
        );

        // both sources have to be cleared
        log.borrow_mut().clear();
        x11.conn().change(Xid(10), Atom::NetWmState, states(&[]));
        x11.dispatch_pending(&mut rt).expect("dispatch failed");
        assert!(window_events(&log).is_empty());
        x11.conn().remove(Xid(10), Atom::WmHints);
        x11.conn().notify(Xid(10), Atom::WmHints);
        x11.dispatch_pending(&mut rt).expect("dispatch failed");
        assert_eq!(window_events(&log), vec![WindowEvent::AttentionChanged(id)]);
        assert!(!rt.window(id).expect("no actor").demands_attention());
    }

    #[test]
    fn test_class_change() {
        let conn = conn();
        conn.add_window(Xid(10), "Soffice", "Untitled 1");
        conn.put(ROOT, Atom::NetClientListStacking, Property::Window(vec![Xid(10)]));
        let (mut rt, mut x11, log) = setup(conn);
        let id = rt.find_window(|_| true).expect("no actor");

        x11.conn().change(
            Xid(10),
            Atom::WmClass,
            Property::String(vec!["libreoffice-writer".into(), "libreoffice-writer".into()]),
        );
        // unchanged class
        x11.conn().notify(Xid(10), Atom::WmClass);
        x11.dispatch_pending(&mut rt).expect("dispatch failed");
        assert_eq!(
            window_events(&log),
            vec![WindowEvent::ClassChanged {
                id,
                old_class: Some("soffice".into()),
                old_wm_class: Some("Soffice".into())
            }]
        );
        assert_eq!(rt.window(id).and_then(|a| a.class()), Some("libreoffice-writer"));
    }

    #[test]
    fn test_active_window_and_keyboard() {
        let conn = conn();
        conn.add_window(Xid(10), "Firefox", "Firefox");
        conn.put(ROOT, Atom::NetClientListStacking, Property::Window(vec![Xid(10)]));
        let (mut rt, mut x11, log) = setup(conn);
        let id = rt.find_window(|_| true).expect("no actor");

        x11.conn()
            .change(ROOT, Atom::NetActiveWindow, Property::Window(vec![Xid(10)]));
        // not in the taskbar
        x11.conn()
            .change(ROOT, Atom::NetActiveWindow, Property::Window(vec![Xid(99)]));
        x11.conn()
            .change(ROOT, Atom::NetActiveWindow, Property::Window(vec![Xid(99)]));
        x11.dispatch_pending(&mut rt).expect("dispatch failed");

        assert_eq!(
            *log.borrow(),
            vec![
                WindowEvent::Activated(Some(id)).into(),
                DesktopEvent::KbdStateChanged(Some(id)).into(),
                WindowEvent::Activated(None).into(),
            ]
        );
        assert_eq!(rt.active_window(), None);
        assert_eq!(rt.last_active_window(), Some(id));
    }

    #[test]
    fn test_pick_receives_activated_window() {
        let conn = conn();
        conn.add_window(Xid(10), "Firefox", "Firefox");
        conn.put(ROOT, Atom::NetClientListStacking, Property::Window(vec![Xid(10)]));
        let (mut rt, mut x11, _) = setup(conn);
        let id = rt.find_window(|_| true).expect("no actor");

        let picked = Rc::new(Cell::new(None));
        let inner = picked.clone();
        rt.start_pick(Box::new(move |_, id| inner.set(Some(id))));
        x11.conn()
            .change(ROOT, Atom::NetActiveWindow, Property::Window(vec![Xid(10)]));
        x11.dispatch_pending(&mut rt).expect("dispatch failed");
        assert_eq!(picked.get(), Some(id));
        assert!(!rt.is_picking());
    }

    #[test]
    fn test_desktop_events() {
        let (mut rt, mut x11, log) = setup(conn());

        x11.conn()
            .change(ROOT, Atom::NetCurrentDesktop, Property::Cardinal(vec![0]));
        x11.conn()
            .change(ROOT, Atom::NetNumberOfDesktops, Property::Cardinal(vec![4]));
        x11.conn().notify(ROOT, Atom::NetDesktopGeometry);
        x11.conn().notify(ROOT, Atom::NetDesktopNames);
        x11.conn().add_event(XEvent::KeyPress(KeypressEvent {
            // Mod4 with num lock on
            state: 0x40 | 0x10,
            keycode: 38,
        }));
        x11.conn().add_event(XEvent::ClientMessage(ClientMessageEvent::new(
            Xid(10),
            Xid(999),
            [0; 5],
        )));
        x11.dispatch_pending(&mut rt).expect("dispatch failed");

        assert_eq!(
            *log.borrow(),
            vec![
                DesktopEvent::DesktopChanged.into(),
                DesktopEvent::GeometryChanged {
                    resolution_changed: false
                }
                .into(),
                DesktopEvent::GeometryChanged {
                    resolution_changed: true
                }
                .into(),
                DesktopEvent::NamesChanged.into(),
                DesktopEvent::ShortkeyPressed {
                    keycode: 38,
                    modifiers: 0x40
                }
                .into(),
            ]
        );
        let geom = rt.desktop_geometry();
        assert_eq!(geom.nb_desktops, 4);
        assert_eq!(geom.current_desktop, 0);
    }

    #[test]
    fn test_configure_updates_geometry() {
        let conn = conn();
        conn.add_window(Xid(10), "Firefox", "Firefox");
        conn.put(ROOT, Atom::NetClientListStacking, Property::Window(vec![Xid(10)]));
        let (mut rt, mut x11, log) = setup(conn);
        let id = rt.find_window(|_| true).expect("no actor");

        let moved = Rectangle::new(-900, 20, 500, 400);
        x11.conn().set_geometry(Xid(10), moved);
        x11.conn().add_event(XEvent::ConfigureNotify(ConfigureEvent {
            id: Xid(10),
            geom: Rectangle::new(0, 0, 500, 400),
            is_root: false,
        }));
        x11.dispatch_pending(&mut rt).expect("dispatch failed");

        assert_eq!(window_events(&log), vec![WindowEvent::SizePositionChanged(id)]);
        let actor = rt.window(id).expect("no actor");
        assert_eq!(actor.geometry(), moved);
        // partly on the viewport to the left
        assert_eq!(actor.viewport(), (1, 0));
    }
}
