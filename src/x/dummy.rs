#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

use crate::core::Rectangle;
use crate::x::{
    atom::{Atom, Atoms},
    core::{InputMask, Result, XAtom, XConn, XError, XWindowID, Xid},
    event::{ClientMessageEvent, PropertyEvent, XEvent},
    property::Property,
};

/// A request recorded by [`DummyConn`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// A client message, with its type resolved to a name.
    ClientMessage {
        window: XWindowID,
        type_: String,
        data: [u32; 5],
    },
    Kill(XWindowID),
    Lower(XWindowID),
    SelectInput(XWindowID, InputMask),
    GrabKey(u8, u16),
    UngrabKey(u8, u16),
}

/// A dummy connection implementing XConn but actually
/// does not interface with the X server at all, and
/// should mainly be used for testing.
///
/// `DummyConn` contains an internal queue that takes
/// XEvents and dequeues them when `poll_next_event` is
/// called, as well as an internal store of window properties
/// and geometries. Every request sent through it is recorded.
pub struct DummyConn {
    root: XWindowID,
    screen: Rectangle,
    atoms: RefCell<Atoms>,
    next_atom: Cell<u32>,
    properties: RefCell<HashMap<(XWindowID, String), Property>>,
    geometries: RefCell<HashMap<XWindowID, Rectangle>>,
    events: RefCell<VecDeque<XEvent>>,
    requests: RefCell<Vec<Request>>,
}

impl DummyConn {
    /// Creates a new DummyConn with a root window covering `screen`.
    pub fn new(root: XWindowID, screen: Rectangle) -> Self {
        Self {
            root,
            screen,
            atoms: RefCell::new(Atoms::new()),
            next_atom: Cell::new(1),
            properties: RefCell::new(HashMap::new()),
            geometries: RefCell::new(HashMap::new()),
            events: RefCell::new(VecDeque::new()),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Adds a single event to the internal queue to be sent out by
    /// `XConn::poll_next_event`.
    pub fn add_event(&self, event: XEvent) {
        self.events.borrow_mut().push_back(event);
    }

    /// Sets a property without generating an event.
    pub fn put(&self, window: XWindowID, prop: Atom, data: Property) {
        self.properties
            .borrow_mut()
            .insert((window, prop.to_string()), data);
    }

    /// Removes a property without generating an event.
    pub fn remove(&self, window: XWindowID, prop: Atom) {
        self.properties
            .borrow_mut()
            .remove(&(window, prop.to_string()));
    }

    /// Sets a property and queues the matching PropertyNotify.
    pub fn change(&self, window: XWindowID, prop: Atom, data: Property) {
        self.put(window, prop, data);
        self.notify(window, prop);
    }

    /// Queues a PropertyNotify for `prop` without changing anything.
    pub fn notify(&self, window: XWindowID, prop: Atom) {
        let atom = self.intern(prop.as_ref());
        self.add_event(XEvent::PropertyNotify(PropertyEvent {
            id: window,
            atom,
            time: 0,
            deleted: false,
        }));
    }

    /// Sets the geometry of a window.
    pub fn set_geometry(&self, window: XWindowID, geom: Rectangle) {
        self.geometries.borrow_mut().insert(window, geom);
    }

    /// Adds a normal window with a class and a title.
    pub fn add_window(&self, window: XWindowID, class: &str, title: &str) {
        self.put(
            window,
            Atom::WmClass,
            Property::String(vec![class.to_lowercase(), class.into()]),
        );
        self.put(window, Atom::NetWmName, Property::UTF8String(vec![title.into()]));
        self.put(
            window,
            Atom::NetWmWindowType,
            Property::Atom(vec![Atom::NetWindowTypeNormal.to_string()]),
        );
        self.set_geometry(window, Rectangle::new(10, 10, 400, 300));
    }

    /// Sets the stacking list on the root window, bottom first.
    pub fn set_stacking(&self, windows: &[u32]) {
        let root = self.root;
        self.change(
            root,
            Atom::NetClientListStacking,
            Property::Window(windows.iter().copied().map(Xid).collect()),
        );
    }

    /// Takes the requests recorded so far.
    pub fn take_requests(&self) -> Vec<Request> {
        std::mem::take(&mut *self.requests.borrow_mut())
    }

    fn intern(&self, name: &str) -> XAtom {
        if let Some(atom) = self.atoms.borrow().retrieve(name) {
            return atom;
        }
        let atom = Xid(self.next_atom.get());
        self.next_atom.set(atom.val() + 1);
        self.atoms.borrow_mut().insert(name, atom);
        atom
    }
}

impl XConn for DummyConn {
    fn poll_next_event(&self) -> Result<Option<XEvent>> {
        Ok(self.events.borrow_mut().pop_front())
    }

    fn root(&self) -> XWindowID {
        self.root
    }

    fn get_geometry(&self, window: XWindowID) -> Result<Rectangle> {
        if window == self.root {
            return Ok(self.screen);
        }
        self.geometries
            .borrow()
            .get(&window)
            .copied()
            .ok_or(XError::ServerError(format!("no such window {}", window)))
    }

    fn all_outputs(&self) -> Result<Vec<Rectangle>> {
        Ok(vec![self.screen])
    }

    fn atom(&self, atom: &str) -> Result<XAtom> {
        Ok(self.intern(atom))
    }

    fn lookup_atom(&self, atom: XAtom) -> Result<String> {
        self.atoms
            .borrow()
            .retrieve_by_value(atom)
            .ok_or(XError::InvalidPropertyData(format!("unknown atom {}", atom)))
    }

    fn get_property(&self, prop: &str, window: XWindowID) -> Result<Option<Property>> {
        Ok(self
            .properties
            .borrow()
            .get(&(window, prop.to_string()))
            .cloned())
    }

    fn set_property(&self, window: XWindowID, prop: &str, data: Property) -> Result<()> {
        self.properties
            .borrow_mut()
            .insert((window, prop.to_string()), data);
        Ok(())
    }

    fn send_client_message(&self, data: ClientMessageEvent) -> Result<()> {
        let type_ = self.lookup_atom(data.type_)?;
        let words = data.data.as_u32().ok_or(XError::ConversionError)?;
        self.requests.borrow_mut().push(Request::ClientMessage {
            window: data.window,
            type_,
            data: words,
        });
        Ok(())
    }

    fn select_input(&self, window: XWindowID, mask: InputMask) -> Result<()> {
        self.requests
            .borrow_mut()
            .push(Request::SelectInput(window, mask));
        Ok(())
    }

    fn kill_client(&self, window: XWindowID) -> Result<()> {
        self.requests.borrow_mut().push(Request::Kill(window));
        Ok(())
    }

    fn lower_window(&self, window: XWindowID) -> Result<()> {
        self.requests.borrow_mut().push(Request::Lower(window));
        Ok(())
    }

    fn grab_key(&self, keycode: u8, modifiers: u16) -> Result<()> {
        self.requests
            .borrow_mut()
            .push(Request::GrabKey(keycode, modifiers));
        Ok(())
    }

    fn ungrab_key(&self, keycode: u8, modifiers: u16) -> Result<()> {
        self.requests
            .borrow_mut()
            .push(Request::UngrabKey(keycode, modifiers));
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
