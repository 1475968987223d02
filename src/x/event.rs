//! Events received from the X server, and client messages sent to it.

use super::core::{XAtom, XWindowID};
use crate::core::Rectangle;

/// Events the X11 backend reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XEvent {
    /// A window was moved or resized.
    ConfigureNotify(ConfigureEvent),
    /// A property of a window changed.
    PropertyNotify(PropertyEvent),
    /// A grabbed key was pressed.
    KeyPress(KeypressEvent),
    /// The keyboard mapping changed.
    MappingNotify,
    /// A client message sent to one of our windows.
    ClientMessage(ClientMessageEvent),
    /// Anything else.
    Unknown(String),
}

/// Data associated with a configure notify event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigureEvent {
    /// The window associated with the event.
    pub id: XWindowID,
    /// The new geometry of the window, relative to its parent.
    pub geom: Rectangle,
    /// Is the window the root window
    pub is_root: bool,
}

/// Data associated with a property notify event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyEvent {
    /// The window that had its property changed.
    pub id: XWindowID,
    /// The property that changed.
    pub atom: XAtom,
    /// The time of the property change.
    pub time: u32,
    /// Whether the property was removed.
    pub deleted: bool,
}

/// Data associated with a key press event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeypressEvent {
    /// The modifiers held down, as a core protocol key mask.
    pub state: u16,
    /// The keycode of the key pressed.
    pub keycode: u8,
}

/// Data associated with a client message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientMessageEvent {
    /// The window the message is about.
    pub window: XWindowID,
    /// The message data.
    pub data: ClientMessageData,
    /// The type of the message.
    pub type_: XAtom,
}

impl ClientMessageEvent {
    /// Creates a message of format 32.
    pub fn new(window: XWindowID, type_: XAtom, data: [u32; 5]) -> Self {
        Self {
            window,
            data: ClientMessageData::U32(data),
            type_,
        }
    }
}

/// The data of a client message, in one of the three formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessageData {
    /// Data of format 8.
    U8([u8; 20]),
    /// Data of format 16.
    U16([u16; 10]),
    /// Data of format 32.
    U32([u32; 5]),
}

impl ClientMessageData {
    /// Whether the message is of format 8.
    pub fn is_u8(&self) -> bool {
        matches!(self, Self::U8(_))
    }

    /// Whether the message is of format 16.
    pub fn is_u16(&self) -> bool {
        matches!(self, Self::U16(_))
    }

    /// Whether the message is of format 32.
    pub fn is_u32(&self) -> bool {
        matches!(self, Self::U32(_))
    }

    /// The data, if it is of format 32.
    pub fn as_u32(&self) -> Option<[u32; 5]> {
        match self {
            Self::U32(data) => Some(*data),
            _ => None,
        }
    }
}
