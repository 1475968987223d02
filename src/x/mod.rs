//! Tracking windows and desktops on X11.
//!
//! The core of this module is the [`XConn`] trait, which defines the
//! few requests the dock needs from the X server, and the
//! [`X11Manager`], which turns what the window manager publishes
//! through EWMH and ICCCM into actors and notifications. The
//! [`Ewmh`] and [`Icccm`] traits wrap the properties and client
//! messages of those two specifications for any `XConn`.
//!
//! [`X11RBConn`] implements `XConn` on top of the x11rb library.
//!
//! ## Connection Object Initialization
//!
//! `X11RBConn` has two states: uninitialized, and initialized,
//! marked in its type. Uninitialized connections have only
//! established a connection to the server, and have not interned
//! the atoms they need to be usable. Thus, `XConn` is only
//! implemented for initialized connections, and users will have
//! to call the `init` method for a connection object to be usable.

pub mod atom;
pub mod core;
pub mod event;
pub mod ewmh;
pub mod icccm;
pub mod property;

mod backend;
mod manager;

/// Implementation of `XConn` backed by the `x11rb` library.
pub mod x11rb;

#[doc(inline)]
pub use self::core::{InputMask, Result, XAtom, XConn, XError, XWindowID, Xid, XID_NONE};
#[doc(inline)]
pub use atom::{Atom, Atoms};
#[doc(inline)]
pub use event::XEvent;
#[doc(inline)]
pub use ewmh::Ewmh;
#[doc(inline)]
pub use icccm::Icccm;
#[doc(inline)]
pub use manager::X11Manager;

#[doc(inline)]
pub use self::x11rb::X11RBConn;
#[doc(inline)]
pub use status::ConnStatus;
pub(crate) use status::{Initialized, Uninitialized};

/* the dummy connection is used for testing the manager
and does not interact with an actual X server */
#[cfg(test)]
pub(crate) mod dummy;

pub mod status {
    //! Types for representing connection status.
    //!
    //! This module contains the [`ConnStatus`] sealed trait,
    //! as well as its two implementors, [`Initialized`] and
    //! [`Uninitialized`]. These are used to mark the state of
    //! a connection object, and act as guards to only
    //! expose [`XConn`](crate::x::XConn) methods when safe
    //! to do so.
    mod private {
        pub trait Sealed {}
    }

    /// A trait defining marker types `Uninitialized` and `Initialized`.
    pub trait ConnStatus: private::Sealed {}

    /// A marker struct indicating a connection is uninitialized.
    ///
    /// Uninitialized connections do not expose any methods.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Uninitialized;

    impl ConnStatus for Uninitialized {}
    impl private::Sealed for Uninitialized {}

    /// A marker type indicating a connection is initialized and can be used.
    ///
    /// Initialized connections expose all available methods.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Initialized;

    impl ConnStatus for Initialized {}
    impl private::Sealed for Initialized {}
}
