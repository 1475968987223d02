//! An [`XConn`](super::XConn) backed by the x11rb library.

use core::marker::PhantomData;

use std::cell::RefCell;
use std::convert::TryFrom;
use std::fmt;

use x11rb::connection::Connection;
use x11rb::errors;
use x11rb::protocol::{
    randr::ConnectionExt as RConnectionExt,
    xproto::{self, ConnectionExt as XConnectionExt},
    Event,
};
use x11rb::rust_connection::RustConnection;

use strum::IntoEnumIterator;
use tracing::warn;

use super::{
    atom::{Atom, Atoms},
    core::{Result, XAtom, XConn, XError, XWindowID, Xid, XID_NONE},
    event::{
        ClientMessageData, ClientMessageEvent, ConfigureEvent, KeypressEvent, PropertyEvent,
        XEvent,
    },
    property::{Property, WmHints},
    ConnStatus, Initialized, Uninitialized,
};
use crate::core::Rectangle;

mod xconn;

// in 32-bit units, large enough for _NET_WM_ICON
const MAX_LONG_LENGTH: u32 = 1 << 20;

const RANDR_MAJ: u32 = 1;
const RANDR_MIN: u32 = 3;

/// A connection to an X server, backed by the x11rb library.
///
/// This is a very simple connection to the X server
/// and is completely synchronous, despite the async capabilities
/// of the underlying library.
///
/// # Usage
///
/// ```no_run
/// use toarudock::x::X11RBConn;
///
/// let conn = X11RBConn::connect().expect("Connection error");
/// let conn = conn.init().expect("Could not initialize");
///
/// /* or: */
/// let conn = X11RBConn::new().expect("Connection error");
/// ```
pub struct X11RBConn<S: ConnStatus> {
    conn: RustConnection,
    root: XWindowID,
    idx: usize,
    randr: bool,
    atoms: RefCell<Atoms>,
    _marker: PhantomData<S>,
}

impl X11RBConn<Uninitialized> {
    /// Connect to the X server and allocate a new Connection.
    pub fn connect() -> Result<Self> {
        let (conn, idx) = x11rb::connect(None)?;
        trace!("Connected to x server, got preferred screen {}", idx);

        Ok(Self {
            conn,
            root: XID_NONE,
            idx,
            randr: false,
            atoms: RefCell::new(Atoms::new()),
            _marker: PhantomData,
        })
    }

    /// Initializes the connection.
    ///
    /// It does the following:
    ///
    /// - Finds the root window of the preferred screen.
    /// - Checks whether RandR is present and recent enough.
    /// - Interns all known [atoms][1].
    ///
    /// Without RandR, the root window is reported as the only output.
    ///
    /// [1]: crate::x::atom::Atom
    pub fn init(mut self) -> Result<X11RBConn<Initialized>> {
        let root = match self.conn.setup().roots.get(self.idx) {
            Some(screen) => Xid(screen.root),
            None => return Err(XError::NoScreens),
        };
        trace!("Got root: {}", root);

        self.randr = match self
            .conn
            .randr_query_version(RANDR_MAJ, RANDR_MIN)
            .map(|cookie| cookie.reply())
        {
            Ok(Ok(res)) if res.major_version == RANDR_MAJ && res.minor_version >= RANDR_MIN => true,
            Ok(Ok(res)) => {
                warn!(
                    "Received randr version {}.{}, requires v{}.{} or higher",
                    res.major_version, res.minor_version, RANDR_MAJ, RANDR_MIN
                );
                false
            }
            _ => {
                warn!("RandR is not available, using the root window as the only screen");
                false
            }
        };

        // get cookies for all first
        let mut cookies = Vec::with_capacity(Atom::iter().count());
        for atom in Atom::iter() {
            cookies.push((atom, self.conn.intern_atom(false, atom.as_ref().as_bytes())?));
        }

        // then get replies
        let atoms = self.atoms.get_mut();
        for (atom, cookie) in cookies {
            atoms.insert(atom.as_ref(), Xid(cookie.reply()?.atom));
        }

        Ok(X11RBConn {
            conn: self.conn,
            root,
            idx: self.idx,
            randr: self.randr,
            atoms: self.atoms,
            _marker: PhantomData,
        })
    }
}

impl X11RBConn<Initialized> {
    /// Shortcut static method for directly creating
    /// an initialized connection.
    pub fn new() -> Result<Self> {
        X11RBConn::connect()?.init()
    }

    /// Exposes `X11RBConn`'s internal connection.
    pub fn conn(&self) -> &RustConnection {
        &self.conn
    }

    /// Whether RandR is used to find the screens.
    pub fn has_randr(&self) -> bool {
        self.randr
    }

    // geometry relative to the root window, including decorations
    pub(crate) fn get_geometry_inner(&self, window: XWindowID) -> Result<Rectangle> {
        trace!("Getting geometry for window {}", window);

        let geom = self.conn.get_geometry(*window)?.reply()?;
        if window == self.root {
            return Ok(Rectangle::new(
                0,
                0,
                geom.width as i32,
                geom.height as i32,
            ));
        }
        let pos = self
            .conn
            .translate_coordinates(*window, *self.root, 0, 0)?
            .reply()?;

        Ok(Rectangle::new(
            pos.dst_x as i32,
            pos.dst_y as i32,
            geom.width as i32,
            geom.height as i32,
        ))
    }

    pub(crate) fn outputs_inner(&self) -> Result<Vec<Rectangle>> {
        let res = self
            .conn
            .randr_get_screen_resources_current(*self.root)?
            .reply()?;

        Ok(res
            .crtcs
            .iter()
            // for each crtc, get its info
            .flat_map(|c| self.conn.randr_get_crtc_info(*c, res.config_timestamp))
            .flat_map(|cookie| cookie.reply())
            .map(|r| Rectangle::new(r.x as i32, r.y as i32, r.width as i32, r.height as i32))
            // disabled crtcs have no size
            .filter(|r| r.has_area())
            .collect())
    }

    fn process_raw_event(&self, event: Event) -> Result<XEvent> {
        Ok(match event {
            Event::ConfigureNotify(event) => XEvent::ConfigureNotify(ConfigureEvent {
                id: Xid(event.window),
                geom: Rectangle::new(
                    event.x as i32,
                    event.y as i32,
                    event.width as i32,
                    event.height as i32,
                ),
                is_root: event.window == *self.root,
            }),
            Event::PropertyNotify(event) => XEvent::PropertyNotify(PropertyEvent {
                id: Xid(event.window),
                atom: Xid(event.atom),
                time: event.time,
                deleted: event.state == xproto::Property::DELETE,
            }),
            Event::KeyPress(event) => XEvent::KeyPress(KeypressEvent {
                state: u16::from(event.state),
                keycode: event.detail,
            }),
            Event::MappingNotify(_) => XEvent::MappingNotify,
            Event::ClientMessage(event) => XEvent::ClientMessage(ClientMessageEvent {
                window: Xid(event.window),
                data: ClientMessageData::try_from(&event)?,
                type_: Xid(event.type_),
            }),
            unk => XEvent::Unknown(format!("{:?}", unk)),
        })
    }

    fn get_prop_atom(&self, prop: XAtom, window: XWindowID) -> Result<Option<Property>> {
        let r = self
            .conn
            .get_property(
                false,
                *window,
                *prop,
                xproto::AtomEnum::ANY,
                // start at offset 0
                0,
                MAX_LONG_LENGTH,
            )?
            .reply()?;

        if r.type_ == x11rb::NONE {
            trace!("prop type is none");
            return Ok(None);
        }

        let prop_type = self.lookup_atom(Xid(r.type_))?;
        trace!("got prop_type {}", prop_type);

        let words = |r: &xproto::GetPropertyReply| -> Result<Vec<u32>> {
            Ok(r.value32().ok_or(XError::ConversionError)?.collect())
        };

        Ok(Some(match prop_type.as_str() {
            "ATOM" => Property::Atom(
                words(&r)?
                    .into_iter()
                    .map(|a| self.lookup_atom(Xid(a)).unwrap_or_default())
                    .collect(),
            ),
            "CARDINAL" => Property::Cardinal(words(&r)?),
            "STRING" => Property::String(
                String::from_utf8_lossy(&r.value)
                    .trim_matches('\0')
                    .split('\0')
                    .map(|a| a.to_string())
                    .collect(),
            ),
            "UTF8_STRING" => Property::UTF8String(
                String::from_utf8(r.value)?
                    .trim_matches('\0')
                    .split('\0')
                    .map(|a| a.to_string())
                    .collect(),
            ),
            "WINDOW" => Property::Window(words(&r)?.into_iter().map(Xid).collect()),
            "WM_HINTS" => Property::WMHints(WmHints::try_from(&words(&r)?[..])?),
            n => match r.format {
                8 => Property::U8List(n.into(), r.value),
                16 => Property::U16List(
                    n.into(),
                    r.value16().ok_or(XError::ConversionError)?.collect(),
                ),
                32 => Property::U32List(n.into(), words(&r)?),
                n => {
                    return Err(XError::InvalidPropertyData(format!(
                        "received format {}",
                        n
                    )))
                }
            },
        }))
    }
}

impl<S: ConnStatus> fmt::Debug for X11RBConn<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("X11RBConn")
            .field("root", &self.root)
            .field("idx", &self.idx)
            .field("randr", &self.randr)
            .field("atoms", &self.atoms.borrow().len())
            .finish()
    }
}

impl From<std::io::Error> for XError {
    fn from(_: std::io::Error) -> XError {
        XError::ConversionError
    }
}

impl From<errors::ConnectionError> for XError {
    fn from(e: errors::ConnectionError) -> XError {
        use errors::ConnectionError::*;
        match e {
            UnknownError | InsufficientMemory | FdPassingFailed => {
                XError::Connection(e.to_string())
            }
            IoError(e) => XError::Connection(e.to_string()),
            other => XError::Protocol(other.to_string()),
        }
    }
}

impl From<errors::ConnectError> for XError {
    fn from(e: errors::ConnectError) -> XError {
        XError::Connection(e.to_string())
    }
}

impl From<errors::ReplyError> for XError {
    fn from(e: errors::ReplyError) -> XError {
        XError::Protocol(e.to_string())
    }
}

impl From<errors::ReplyOrIdError> for XError {
    fn from(e: errors::ReplyOrIdError) -> XError {
        if let errors::ReplyOrIdError::ConnectionError(e) = e {
            e.into()
        } else {
            XError::ServerError(e.to_string())
        }
    }
}

impl TryFrom<&xproto::ClientMessageEvent> for ClientMessageData {
    type Error = XError;

    fn try_from(event: &xproto::ClientMessageEvent) -> Result<Self> {
        match event.format {
            8 => Ok(Self::U8(event.data.as_data8())),
            16 => Ok(Self::U16(event.data.as_data16())),
            32 => Ok(Self::U32(event.data.as_data32())),
            _ => Err(XError::ConversionError),
        }
    }
}
