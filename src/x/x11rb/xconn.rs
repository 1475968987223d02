//! Implementation of the XConn trait for X11RBConn.

use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    self, ChangeWindowAttributesAux, ConfigureWindowAux, ConnectionExt as XConnectionExt,
    EventMask, GrabMode, ModMask, StackMode,
};

use byteorder::{LittleEndian, WriteBytesExt};

use tracing::{instrument, warn};

use super::X11RBConn;
use crate::core::Rectangle;
use crate::x::{
    core::{InputMask, Result, XAtom, XConn, XError, XWindowID, Xid},
    event::{ClientMessageData, ClientMessageEvent, XEvent},
    property::Property,
    Atom, Initialized,
};

impl XConn for X11RBConn<Initialized> {
    fn poll_next_event(&self) -> Result<Option<XEvent>> {
        match self.conn.poll_for_event()? {
            Some(event) => Ok(Some(self.process_raw_event(event)?)),
            None => Ok(None),
        }
    }

    fn root(&self) -> XWindowID {
        self.root
    }

    #[cfg_attr(
        debug_assertions,
        instrument(target = "xconn", level = "trace", skip(self))
    )]
    fn get_geometry(&self, window: XWindowID) -> Result<Rectangle> {
        self.get_geometry_inner(window)
    }

    fn all_outputs(&self) -> Result<Vec<Rectangle>> {
        let outputs = if self.randr {
            self.outputs_inner()?
        } else {
            Vec::new()
        };
        if outputs.is_empty() {
            return Ok(vec![self.get_geometry_inner(self.root)?]);
        }
        Ok(outputs)
    }

    fn atom(&self, atom: &str) -> Result<XAtom> {
        if let Some(known) = self.atoms.borrow().retrieve(atom) {
            return Ok(known);
        }
        trace!("Interning atom {}", atom);
        let x = Xid(self.conn.intern_atom(false, atom.as_bytes())?.reply()?.atom);
        self.atoms.borrow_mut().insert(atom, x);
        Ok(x)
    }

    fn lookup_atom(&self, atom: XAtom) -> Result<String> {
        if let Some(name) = self.atoms.borrow().retrieve_by_value(atom) {
            return Ok(name);
        }
        trace!("Name of {} not known, looking up via X connection", atom);
        let name = String::from_utf8(self.conn.get_atom_name(*atom)?.reply()?.name)?;

        if let Ok(mut atoms) = self.atoms.try_borrow_mut() {
            atoms.insert(&name, atom);
        } else {
            warn!("Attempted borrow failed, could not intern atom {}", name);
        }

        Ok(name)
    }

    fn get_property(&self, prop: &str, window: XWindowID) -> Result<Option<Property>> {
        let atom = self.atom(prop)?;
        self.get_prop_atom(atom, window)
    }

    fn set_property(&self, window: XWindowID, prop: &str, data: Property) -> Result<()> {
        // replace the property
        let mode = xproto::PropMode::REPLACE;
        let prop = self.atom(prop)?;

        /* (type of property, actual data) */
        let (ty, data): (XAtom, Vec<u32>) = match data {
            Property::Atom(atoms) => (
                Xid(xproto::AtomEnum::ATOM.into()),
                atoms
                    .iter()
                    .map(|a| self.atom(a).map(|a| a.val()))
                    .collect::<Result<_>>()?,
            ),
            Property::Cardinal(nums) => (Xid(xproto::AtomEnum::CARDINAL.into()), nums),
            Property::Window(ids) => (
                Xid(xproto::AtomEnum::WINDOW.into()),
                ids.iter().map(|w| w.val()).collect(),
            ),
            Property::U32List(ty, nums) => (self.atom(&ty)?, nums),
            Property::String(strs) => {
                let ty = Xid(xproto::AtomEnum::STRING.into());
                return self.set_strings(window, prop, ty, &strs);
            }
            Property::UTF8String(strs) => {
                let ty = self.atom(Atom::UTF8String.as_ref())?;
                return self.set_strings(window, prop, ty, &strs);
            }
            Property::U8List(..) | Property::U16List(..) | Property::WMHints(_) => {
                return Err(XError::InvalidPropertyData(
                    "cannot convert non-standard types".into(),
                ))
            }
        };

        let data_len = data.len();

        let mut new_data = Vec::<u8>::with_capacity(data_len * 4);
        for dword in data {
            new_data.write_u32::<LittleEndian>(dword)?;
        }

        Ok(self
            .conn
            .change_property(mode, *window, *prop, *ty, 32, data_len as u32, &new_data)?
            .check()?)
    }

    fn send_client_message(&self, data: ClientMessageEvent) -> Result<()> {
        use xproto::ClientMessageData as XClientMessageData;
        use ClientMessageData::*;

        trace!("Sending client message about window {}", data.window);

        let (format, to_send) = match data.data {
            U8(bytes) => (8, XClientMessageData::from(bytes)),
            U16(words) => (16, XClientMessageData::from(words)),
            U32(dwords) => (32, XClientMessageData::from(dwords)),
        };

        let event = xproto::ClientMessageEvent::new(format, *data.window, *data.type_, to_send);

        Ok(self
            .conn
            .send_event(
                false,
                *self.root,
                EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
                event,
            )?
            .check()?)
    }

    fn select_input(&self, window: XWindowID, mask: InputMask) -> Result<()> {
        trace!("Selecting input {:?} for {}", mask, window);
        let attrs = ChangeWindowAttributesAux::new().event_mask(EventMask::from(mask.bits()));
        Ok(self
            .conn
            .change_window_attributes(*window, &attrs)?
            .check()?)
    }

    fn kill_client(&self, window: XWindowID) -> Result<()> {
        Ok(self.conn.kill_client(*window)?.check()?)
    }

    fn lower_window(&self, window: XWindowID) -> Result<()> {
        let aux = ConfigureWindowAux::new().stack_mode(StackMode::BELOW);
        Ok(self.conn.configure_window(*window, &aux)?.check()?)
    }

    fn grab_key(&self, keycode: u8, modifiers: u16) -> Result<()> {
        trace!("Grabbing key {} with modifiers {:#x}", keycode, modifiers);
        self.conn
            .grab_key(
                true,
                *self.root,
                ModMask::from(modifiers),
                keycode,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
            )
            .map_err(|_| XError::ServerError(format!("Unable to grab key {}", keycode)))?
            .check()?;
        Ok(())
    }

    fn ungrab_key(&self, keycode: u8, modifiers: u16) -> Result<()> {
        self.conn
            .ungrab_key(keycode, *self.root, ModMask::from(modifiers))
            .map_err(|_| XError::ServerError(format!("Unable to ungrab key {}", keycode)))?
            .check()?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(self.conn.flush()?)
    }
}

impl X11RBConn<Initialized> {
    // every string is null-terminated
    fn set_strings(&self, window: XWindowID, prop: XAtom, ty: XAtom, strs: &[String]) -> Result<()> {
        let mut bytes = strs.join("\0").into_bytes();
        bytes.push(0);
        self.conn
            .change_property(
                xproto::PropMode::REPLACE,
                *window,
                *prop,
                *ty,
                8,
                bytes.len() as u32,
                &bytes,
            )?
            .check()?;
        Ok(())
    }
}
