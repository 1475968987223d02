//! Tracking windows through the Wayland taskbar protocols.
//!
//! Wayland compositors describe each toplevel with a stream of small,
//! unordered updates (title, app-id, state, ...), followed by a `done`
//! event once they form a consistent snapshot. This module turns those
//! streams into actors and notifications:
//!
//! - [`Toplevel`] buffers updates as pending state on the actor;
//! - the reconciler commits that state when `done` arrives, one change
//!   at a time and in a fixed order, emitting one notification per change;
//! - [`ActivationTracker`] debounces activation for protocols that only
//!   report it as part of a state bitmask;
//! - [`ToplevelMap`] and [`ToplevelBackend`] map protocol handles to
//!   actors and carry out requests through a host-supplied
//!   [`ToplevelRequests`] implementation;
//! - [`WorkspaceTracker`] does the same for the workspace protocols.
//!
//! Wire marshalling is not done here: the host owns the Wayland
//! connection, decodes protocol events and feeds them to one of the
//! protocol adapters ([`wlr`], [`cosmic`], [`ext`], [`plasma`]).

/// Debouncing of activation reports.
pub mod activation;
/// The window backend shared by all toplevel protocols.
pub mod backend;
/// `zcosmic_toplevel_info_v1` and `zcosmic_toplevel_manager_v1`.
pub mod cosmic;
/// `ext_foreign_toplevel_list_v1` and its state extension.
pub mod ext;
/// `org_kde_plasma_window_management`.
pub mod plasma;
/// `org_kde_plasma_virtual_desktop_management`.
pub mod plasma_desktop;
pub(crate) mod reconcile;
/// Pending state and the setters used by protocol adapters.
pub mod toplevel;
/// `zwlr_foreign_toplevel_manager_v1`.
pub mod wlr;
/// The workspace tracker shared by all workspace protocols.
pub mod workspace;

#[doc(inline)]
pub use activation::{ActivationPolicy, ActivationTracker};
#[doc(inline)]
pub use backend::{ToplevelActions, ToplevelBackend, ToplevelMap, ToplevelRequests};
#[doc(inline)]
pub use toplevel::{PendingState, Toplevel};
#[doc(inline)]
pub use workspace::{WorkspaceManager, WorkspaceRequests, WorkspaceTracker};
