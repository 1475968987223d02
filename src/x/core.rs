//! Core types and traits for talking to the X server.
//!
//! This module defines the [`XConn`] trait, the minimal set of
//! requests the X11 backend needs from a connection, along with
//! the id and error types used throughout the [`x`](super) module.

use core::ops::Deref;
use std::fmt::{self, Display};

use thiserror::Error;

use super::event::{ClientMessageEvent, XEvent};
use super::property::Property;
use crate::core::Rectangle;

/// General constant for expressing None when passing X IDs.
pub const XID_NONE: Xid = Xid::zero();

/// Wrapper type to represent IDs used by the X server.
///
/// This is used by the server to identify all sorts
/// of X resources, including windows and atoms.
///
/// ```rust
/// use toarudock::x::Xid;
///
/// let id = Xid::from(69);
/// assert_eq!(id.val(), 69);
/// assert_eq!(*id, 69);
/// ```
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash, Default)]
pub struct Xid(pub(crate) u32);

impl Xid {
    /// Return an Xid set to 0.
    pub const fn zero() -> Self {
        Xid(0)
    }

    /// Returns the internal value of the Xid.
    pub const fn val(&self) -> u32 {
        self.0
    }
}

impl From<u32> for Xid {
    fn from(f: u32) -> Xid {
        Xid(f)
    }
}

impl Display for Xid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Xid({})", self.0)
    }
}

impl Deref for Xid {
    type Target = u32;

    fn deref(&self) -> &u32 {
        &self.0
    }
}

/// An X server ID for a given window.
pub type XWindowID = Xid;

/// An X Atom.
pub type XAtom = Xid;

bitflags! {

/// The events the backend asks the server to report on a window.
///
/// The values are those of the core protocol's event mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InputMask: u32 {
    /// KeyPress events.
    const KEY_PRESS        = 1 << 0;
    /// ConfigureNotify and friends.
    const STRUCTURE_NOTIFY = 1 << 17;
    /// PropertyNotify events.
    const PROPERTY_CHANGE  = 1 << 22;
}
}

/// Modifiers that do not change the meaning of a shortcut:
/// Lock, Mod2 (num lock) and Mod5 (scroll lock).
pub const LOCK_MODIFIERS: u16 = 0x2 | 0x10 | 0x80;

/// An error returned by an [`XConn`].
#[non_exhaustive]
#[derive(Debug, Clone, Error)]
pub enum XError {
    /// An error when establishing a connection with the server.
    #[error("X connection error: {0}")]
    Connection(String),

    /// An error caused by a malformed protocol request.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// No screens were found on the server.
    #[error("Could not find screens from X server")]
    NoScreens,

    /// Some error caused by a RandR request.
    #[error("RandR error: {0}")]
    RandrError(String),

    /// An internal server error.
    #[error("X server error: {0}")]
    ServerError(String),

    /// An error converting property or client message data.
    #[error("Error converting client message data")]
    ConversionError,

    /// A request for window properties returned malformed data.
    #[error("Invalid property data: {0}")]
    InvalidPropertyData(String),

    /// The request could not be fulfilled by the X server.
    #[error("Could not complete specified request: {0}")]
    RequestError(&'static str),
}

/// Result type for the X module.
pub type Result<T> = ::core::result::Result<T, XError>;

/// The requests the X11 backend sends to the server.
///
/// Atoms and property names are passed as strings; the connection
/// interns them as needed. Implementors must make every method
/// callable through a shared reference, since the connection is
/// shared between the event side and the request side of the
/// backend.
pub trait XConn {
    //* Events *//

    /// Returns the next queued event, without blocking.
    fn poll_next_event(&self) -> Result<Option<XEvent>>;

    //* General X server operations *//

    /// Returns the root window.
    fn root(&self) -> XWindowID;

    /// Returns the geometry of `window`, relative to the root window.
    fn get_geometry(&self, window: XWindowID) -> Result<Rectangle>;

    /// Returns the geometry of each physical screen.
    fn all_outputs(&self) -> Result<Vec<Rectangle>>;

    /// Interns the atom `atom`, returning its id.
    fn atom(&self, atom: &str) -> Result<XAtom>;

    /// Returns the name of the atom `atom`.
    fn lookup_atom(&self, atom: XAtom) -> Result<String>;

    /// Returns the property `prop` of `window`, or `None` if it is not set.
    fn get_property(&self, prop: &str, window: XWindowID) -> Result<Option<Property>>;

    /// Sets the property `prop` of `window`.
    fn set_property(&self, window: XWindowID, prop: &str, data: Property) -> Result<()>;

    /// Sends a client message to the root window, where the window
    /// manager will pick it up.
    fn send_client_message(&self, data: ClientMessageEvent) -> Result<()>;

    //* Window-related operations *//

    /// Selects the events to receive for `window`.
    fn select_input(&self, window: XWindowID, mask: InputMask) -> Result<()>;

    /// Kills the client owning `window`.
    fn kill_client(&self, window: XWindowID) -> Result<()>;

    /// Puts `window` at the bottom of the stack.
    fn lower_window(&self, window: XWindowID) -> Result<()>;

    //* Keyboard *//

    /// Grabs the key `keycode` with `modifiers` on the root window.
    fn grab_key(&self, keycode: u8, modifiers: u16) -> Result<()>;

    /// Releases a grab made with [`grab_key`](Self::grab_key).
    fn ungrab_key(&self, keycode: u8, modifiers: u16) -> Result<()>;

    /// Sends all queued requests to the server.
    fn flush(&self) -> Result<()>;
}

use std::string::FromUtf8Error;

impl From<FromUtf8Error> for XError {
    fn from(e: FromUtf8Error) -> XError {
        XError::InvalidPropertyData(format!("Invalid UTF8 data: {}", e))
    }
}
