//! Known X atoms.

use std::collections::HashMap;
use std::str::FromStr;

use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::core::XAtom;

/// The atoms the X11 backend reads, writes or sends.
///
/// Using these instead of raw strings gives some measure of type
/// safety when dealing with atoms. Every variant is interned when
/// the connection is initialized.
#[derive(AsRefStr, Display, EnumString, EnumIter, Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Atom {
    /// UTF8_STRING
    #[strum(serialize = "UTF8_STRING")]
    UTF8String,
    /// WM_CLASS
    #[strum(serialize = "WM_CLASS")]
    WmClass,
    /// WM_HINTS
    #[strum(serialize = "WM_HINTS")]
    WmHints,
    /// WM_NAME
    #[strum(serialize = "WM_NAME")]
    WmName,
    /// WM_TRANSIENT_FOR
    #[strum(serialize = "WM_TRANSIENT_FOR")]
    WmTransientFor,
    /// WM_CHANGE_STATE
    #[strum(serialize = "WM_CHANGE_STATE")]
    WmChangeState,

    //* Root window properties *//
    /// _NET_CLIENT_LIST_STACKING
    #[strum(serialize = "_NET_CLIENT_LIST_STACKING")]
    NetClientListStacking,
    /// _NET_ACTIVE_WINDOW
    #[strum(serialize = "_NET_ACTIVE_WINDOW")]
    NetActiveWindow,
    /// _NET_CURRENT_DESKTOP
    #[strum(serialize = "_NET_CURRENT_DESKTOP")]
    NetCurrentDesktop,
    /// _NET_DESKTOP_VIEWPORT
    #[strum(serialize = "_NET_DESKTOP_VIEWPORT")]
    NetDesktopViewport,
    /// _NET_NUMBER_OF_DESKTOPS
    #[strum(serialize = "_NET_NUMBER_OF_DESKTOPS")]
    NetNumberOfDesktops,
    /// _NET_DESKTOP_GEOMETRY
    #[strum(serialize = "_NET_DESKTOP_GEOMETRY")]
    NetDesktopGeometry,
    /// _NET_DESKTOP_NAMES
    #[strum(serialize = "_NET_DESKTOP_NAMES")]
    NetDesktopNames,
    /// _NET_WORKAREA
    #[strum(serialize = "_NET_WORKAREA")]
    NetWorkarea,
    /// _NET_SHOWING_DESKTOP
    #[strum(serialize = "_NET_SHOWING_DESKTOP")]
    NetShowingDesktop,
    /// _XROOTPMAP_ID
    #[strum(serialize = "_XROOTPMAP_ID")]
    XRootPmapId,
    /// XKLAVIER_STATE
    #[strum(serialize = "XKLAVIER_STATE")]
    XklavierState,

    //* Client messages *//
    /// _NET_CLOSE_WINDOW
    #[strum(serialize = "_NET_CLOSE_WINDOW")]
    NetCloseWindow,
    /// _NET_MOVERESIZE_WINDOW
    #[strum(serialize = "_NET_MOVERESIZE_WINDOW")]
    NetMoveResizeWindow,

    //* Client window properties *//
    /// _NET_WM_NAME
    #[strum(serialize = "_NET_WM_NAME")]
    NetWmName,
    /// _NET_WM_DESKTOP
    #[strum(serialize = "_NET_WM_DESKTOP")]
    NetWmDesktop,
    /// _NET_WM_ICON
    #[strum(serialize = "_NET_WM_ICON")]
    NetWmIcon,
    /// _NET_WM_ICON_GEOMETRY
    #[strum(serialize = "_NET_WM_ICON_GEOMETRY")]
    NetWmIconGeometry,
    /// _MOTIF_WM_HINTS
    #[strum(serialize = "_MOTIF_WM_HINTS")]
    MotifWmHints,
    /// _NET_WM_ALLOWED_ACTIONS
    #[strum(serialize = "_NET_WM_ALLOWED_ACTIONS")]
    NetWmAllowedActions,
    /// _NET_WM_ACTION_MINIMIZE
    #[strum(serialize = "_NET_WM_ACTION_MINIMIZE")]
    NetWmActionMinimize,
    /// _NET_WM_ACTION_MAXIMIZE_HORZ
    #[strum(serialize = "_NET_WM_ACTION_MAXIMIZE_HORZ")]
    NetWmActionMaximizeHorz,
    /// _NET_WM_ACTION_MAXIMIZE_VERT
    #[strum(serialize = "_NET_WM_ACTION_MAXIMIZE_VERT")]
    NetWmActionMaximizeVert,
    /// _NET_WM_ACTION_CLOSE
    #[strum(serialize = "_NET_WM_ACTION_CLOSE")]
    NetWmActionClose,

    //* Window types *//
    /// _NET_WM_WINDOW_TYPE
    #[strum(serialize = "_NET_WM_WINDOW_TYPE")]
    NetWmWindowType,
    /// _NET_WM_WINDOW_TYPE_NORMAL
    #[strum(serialize = "_NET_WM_WINDOW_TYPE_NORMAL")]
    NetWindowTypeNormal,
    /// _NET_WM_WINDOW_TYPE_DIALOG
    #[strum(serialize = "_NET_WM_WINDOW_TYPE_DIALOG")]
    NetWindowTypeDialog,
    /// _NET_WM_WINDOW_TYPE_DOCK
    #[strum(serialize = "_NET_WM_WINDOW_TYPE_DOCK")]
    NetWindowTypeDock,

    //* Window states *//
    /// _NET_WM_STATE
    #[strum(serialize = "_NET_WM_STATE")]
    NetWmState,
    /// _NET_WM_STATE_SKIP_TASKBAR
    #[strum(serialize = "_NET_WM_STATE_SKIP_TASKBAR")]
    NetWmStateSkipTaskbar,
    /// _NET_WM_STATE_HIDDEN
    #[strum(serialize = "_NET_WM_STATE_HIDDEN")]
    NetWmStateHidden,
    /// _NET_WM_STATE_MAXIMIZED_VERT
    #[strum(serialize = "_NET_WM_STATE_MAXIMIZED_VERT")]
    NetWmStateMaximizedVert,
    /// _NET_WM_STATE_MAXIMIZED_HORZ
    #[strum(serialize = "_NET_WM_STATE_MAXIMIZED_HORZ")]
    NetWmStateMaximizedHorz,
    /// _NET_WM_STATE_FULLSCREEN
    #[strum(serialize = "_NET_WM_STATE_FULLSCREEN")]
    NetWmStateFullscreen,
    /// _NET_WM_STATE_DEMANDS_ATTENTION
    #[strum(serialize = "_NET_WM_STATE_DEMANDS_ATTENTION")]
    NetWmStateDemandsAttention,
    /// _NET_WM_STATE_STICKY
    #[strum(serialize = "_NET_WM_STATE_STICKY")]
    NetWmStateSticky,
    /// _NET_WM_STATE_ABOVE
    #[strum(serialize = "_NET_WM_STATE_ABOVE")]
    NetWmStateAbove,
    /// _NET_WM_STATE_BELOW
    #[strum(serialize = "_NET_WM_STATE_BELOW")]
    NetWmStateBelow,
}

/// A store associating atom names with their X ids.
///
/// Known atoms are stored as their [`Atom`] variant, anything
/// else by name.
#[derive(Debug, Default, Clone)]
pub struct Atoms {
    known: HashMap<Atom, XAtom>,
    interned: HashMap<String, XAtom>,
}

impl Atoms {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the id of `atom`.
    pub fn insert(&mut self, atom: &str, val: XAtom) {
        if let Ok(known) = Atom::from_str(atom) {
            self.known.insert(known, val);
        } else {
            self.interned.insert(atom.into(), val);
        }
    }

    /// Returns the id of `atom`, if it was stored.
    pub fn retrieve(&self, atom: &str) -> Option<XAtom> {
        if let Ok(known) = Atom::from_str(atom) {
            self.known.get(&known).copied()
        } else {
            self.interned.get(atom).copied()
        }
    }

    /// Returns the name of the atom with id `atom`, if it was stored.
    pub fn retrieve_by_value(&self, atom: XAtom) -> Option<String> {
        if let Some((known, _)) = self.known.iter().find(|(_, v)| **v == atom) {
            Some(known.to_string())
        } else {
            self.interned
                .iter()
                .find(|(_, v)| **v == atom)
                .map(|(k, _)| k.clone())
        }
    }

    /// The number of stored atoms.
    pub fn len(&self) -> usize {
        self.known.len() + self.interned.len()
    }

    /// Whether no atom was stored yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
