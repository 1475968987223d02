//! Reading ICCCM properties.

use super::atom::Atom;
use super::core::{Result, XConn, XWindowID, XID_NONE};
use super::event::ClientMessageEvent;
use super::property::{Property, WmHints};

/// The `WM_CHANGE_STATE` value asking for a window to be iconified.
const ICONIC_STATE: u32 = 3;

/// ICCCM functionality, provided for every [`XConn`].
pub trait Icccm: XConn {
    /// Returns the name of `window`.
    ///
    /// `_NET_WM_NAME` is preferred over `WM_NAME`.
    fn wm_name(&self, window: XWindowID) -> Result<Option<String>> {
        for prop in [Atom::NetWmName, Atom::WmName] {
            let name = self
                .get_property(prop.as_ref(), window)?
                .and_then(|p| p.as_strings().and_then(|s| s.first().cloned()));
            if name.is_some() {
                return Ok(name);
            }
        }
        Ok(None)
    }

    /// Returns the instance and class names of `window`.
    fn wm_class(&self, window: XWindowID) -> Result<Option<(String, String)>> {
        let Some(prop) = self.get_property(Atom::WmClass.as_ref(), window)? else {
            return Ok(None);
        };
        Ok(match prop.as_strings() {
            Some([name, class, ..]) => Some((name.clone(), class.clone())),
            Some([class]) => Some((String::new(), class.clone())),
            _ => None,
        })
    }

    /// Returns the WM_HINTS of `window`.
    fn wm_hints(&self, window: XWindowID) -> Result<Option<WmHints>> {
        Ok(match self.get_property(Atom::WmHints.as_ref(), window)? {
            Some(Property::WMHints(hints)) => Some(hints),
            _ => None,
        })
    }

    /// Returns the window `window` is transient for.
    fn wm_transient_for(&self, window: XWindowID) -> Result<Option<XWindowID>> {
        Ok(self
            .get_property(Atom::WmTransientFor.as_ref(), window)?
            .and_then(|p| p.as_windows().and_then(|w| w.first().copied()))
            .filter(|w| *w != XID_NONE))
    }

    /// Asks the window manager to iconify `window`.
    fn request_iconify(&self, window: XWindowID) -> Result<()> {
        let type_ = self.atom(Atom::WmChangeState.as_ref())?;
        self.send_client_message(ClientMessageEvent::new(
            window,
            type_,
            [ICONIC_STATE, 0, 0, 0, 0],
        ))
    }
}

impl<X: XConn> Icccm for X {}
