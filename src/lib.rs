//! # Toarudock - the window tracking core of a dock
//!
//! Toarudock keeps track of every open window on the desktop, across
//! window systems that share almost nothing with each other: X11 with
//! EWMH, and the various Wayland taskbar protocols (wlr-foreign-toplevel,
//! cosmic-toplevel, ext-foreign-toplevel and plasma-window-management,
//! plus their workspace companions). It presents all of them through a
//! single abstraction, the [`WindowActor`], and a single stream of
//! [notifications](manager::Notification) that the rest of a dock
//! (icons, animations, drag and drop) can react to.
//!
//! ## Design
//!
//! ### The Runtime
//!
//! All state lives in a [`Runtime`]: the actor registry, the stacks of
//! registered backends, the notification listeners and the Wayland
//! reconciler. It is passed by mutable reference to everything that needs
//! it; there are no global singletons.
//!
//! ### Backends
//!
//! A backend is a protocol-specific module that implements
//! [`WindowBackend`] and/or [`DesktopBackend`]. Every operation on these
//! traits is optional, and backends are stacked so that a later backend
//! can override only part of an earlier one. See the [`platform`] module
//! for details.
//!
//! ### Reconciling Wayland toplevels
//!
//! Wayland compositors deliver partial, unordered updates for each window
//! and mark a consistent snapshot with a "done" event. The [`wayland`]
//! module buffers these updates as pending state and commits them one
//! change at a time, in a fixed order, emitting one notification per
//! change. Commits never nest: a "done" arriving while another commit is
//! in progress (for instance, from a listener that pumps the event queue)
//! is queued and processed right after.
//!
//! ### Event Loops and Shared State
//!
//! This crate is single-threaded and does not run its own event loop. The
//! host calls into the backends when events arrive, and calls
//! [`Runtime::run_idle`] whenever [`Runtime::has_idle_work`] reports
//! deferred work. Backends that need to share state between their event
//! side and their request side do so with [`std::rc::Rc`] and
//! [`std::cell::RefCell`]; anything handed to this crate should expect
//! the same.
//!
//! ## Usage
//!
//! ```no_run
//! use toarudock::{Runtime, DockConfig};
//! use toarudock::manager::Notification;
//! use toarudock::x::{X11RBConn, X11Manager};
//!
//! let mut rt = Runtime::new(DockConfig::default());
//! rt.subscribe(Box::new(|_rt, n: &Notification| println!("{:?}", n)));
//!
//! let conn = X11RBConn::new().expect("could not connect to X");
//! let mut x11 = X11Manager::init(&mut rt, conn).expect("could not read X state");
//! rt.set_ready(true);
//!
//! loop {
//!     x11.dispatch_pending(&mut rt).expect("X error");
//!     rt.run_idle();
//! #   break;
//! }
//! ```
//!
//! [`Runtime::run_idle`]: manager::Runtime::run_idle
//! [`Runtime::has_idle_work`]: manager::Runtime::has_idle_work

#![warn(
    missing_debug_implementations,
    missing_copy_implementations,
    missing_docs
)]

#[macro_use]
extern crate bitflags;

#[macro_use]
mod log;

pub mod core;
pub mod manager;
pub mod platform;
pub mod wayland;
pub mod x;

pub use crate::core::types;
#[doc(inline)]
pub use crate::core::{ActorId, WindowActor};
#[doc(inline)]
pub use crate::manager::{DockConfig, Runtime};
#[doc(inline)]
pub use crate::platform::{DesktopBackend, WindowBackend};

pub use crate::log::DefaultErrorHandler;

use crate::x::XError;

use thiserror::Error;

/// Everything that could possibly go wrong while tracking windows.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DockError {
    /// An error with the underlying X connection.
    #[error("X connection error: {0}")]
    XConnError(#[from] XError),

    /// Received a reference to an actor not tracked by the registry.
    #[error("Unknown actor {0}")]
    UnknownActor(ActorId),

    /// A request for a desktop or viewport that does not exist.
    #[error("Invalid desktop {0} (viewport {1}, {2})")]
    InvalidDesktop(i32, i32, i32),

    /// One or more configuration invariants was not upheld.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An error not covered by toarudock.
    #[error("Error: {0}")]
    OtherError(String),
}

/// The general result type used by toarudock.
pub type Result<T> = ::core::result::Result<T, DockError>;

/// An error handler that can be used to handle an error type.
///
/// Typically this would be a standard logging function that writes
/// to a file or stdout, but it can be anything.
pub trait ErrorHandler {
    /// Calls the error handler.
    fn call(&self, rt: &mut Runtime, err: DockError);
}
