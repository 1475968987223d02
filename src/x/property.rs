//! Representations of X window properties.

use std::convert::TryFrom;
use std::fmt;

use super::core::{Result, XError, XWindowID, Xid};

/// X server properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Property {
    /// a list of Atoms, expressed as strings.
    Atom(Vec<String>),
    /// A list of cardinal numbers.
    Cardinal(Vec<u32>),
    /// A list of strings.
    String(Vec<String>),
    /// A list of UTF-8 encoded strings.
    UTF8String(Vec<String>),
    /// A list of windows IDs.
    Window(Vec<XWindowID>),
    /// ICCCM WM_HINTS.
    WMHints(WmHints),
    /// Raw data as a vec of bytes.
    /// Returned if the format of the response is 8.
    ///
    /// Used if the property type is not recognized by toarudock.
    U8List(String, Vec<u8>),
    /// Raw data as a vec of words.
    /// Returned if the format of the response is 16.
    ///
    /// Used if the property type is not recognized by toarudock.
    U16List(String, Vec<u16>),
    /// Raw data as a vec of doublewords.
    /// Returned if the format of the response is 32.
    ///
    /// Used if the property type is not recognized by toarudock.
    U32List(String, Vec<u32>),
}

impl Property {
    /// If the property is a list of numbers of format 32, returns them.
    pub fn as_cardinals(&self) -> Option<&[u32]> {
        match self {
            Property::Cardinal(v) | Property::U32List(_, v) => Some(v),
            _ => None,
        }
    }

    /// If the property is a string, returns its parts.
    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            Property::String(v) | Property::UTF8String(v) => Some(v),
            _ => None,
        }
    }

    /// If the property is a list of atoms, returns their names.
    pub fn as_atoms(&self) -> Option<&[String]> {
        match self {
            Property::Atom(v) => Some(v),
            _ => None,
        }
    }

    /// If the property is a list of windows, returns them.
    pub fn as_windows(&self) -> Option<&[XWindowID]> {
        match self {
            Property::Window(v) => Some(v),
            _ => None,
        }
    }

    /// The first number of the property, if it has any.
    pub fn first_cardinal(&self) -> Option<u32> {
        match self {
            Property::Window(v) => v.first().map(|w| w.val()),
            other => other.as_cardinals().and_then(|v| v.first().copied()),
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Property::*;
        match self {
            Atom(atoms) => write!(f, "Atoms: {:?}", atoms),
            Cardinal(nums) => write!(f, "Cardinals: {:?}", nums),
            String(strs) | UTF8String(strs) => write!(f, "Strings: {:?}", strs),
            Window(ids) => write!(f, "Windows: {:?}", ids),
            WMHints(hints) => write!(f, "WmHints: {:?}", hints),
            U8List(ty, list) => write!(f, "{}: {} bytes", ty, list.len()),
            U16List(ty, list) => write!(f, "{}: {} words", ty, list.len()),
            U32List(ty, list) => write!(f, "{}: {} doublewords", ty, list.len()),
        }
    }
}

bitflags! {

/// The flags used inside WmHints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WmHintsFlags: u32 {
    /// The input hint is set
    const INPUT_HINT            = 0b0000000001;
    /// The state hint is set
    const STATE_HINT            = 0b0000000010;
    /// The icon pixmap hint is set
    const ICON_PIXMAP_HINT      = 0b0000000100;
    /// The icon window hint is set
    const ICON_WINDOW_HINT      = 0b0000001000;
    /// The icon position hint is set
    const ICON_POSITION_HINT    = 0b0000010000;
    /// The icon mask hint is set
    const ICON_MASK_HINT        = 0b0000100000;
    /// The window group hint is set
    const WINDOW_GROUP_HINT     = 0b0001000000;
    /// The urgency hint is set
    const URGENCY_HINT          = 0b0100000000;
}
}

/// The number of words in a full WM_HINTS property.
pub const WM_HINTS_LEN: usize = 9;

/// ICCCM-defined window hints (WM_HINTS).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WmHints {
    pub(crate) flags: WmHintsFlags,
    pub(crate) accepts_input: bool,
    pub(crate) icon_pixmap: u32,
    pub(crate) icon_window: XWindowID,
    pub(crate) icon_mask: u32,
    pub(crate) window_group: XWindowID,
}

impl WmHints {
    /// Creates a set of hints with only `flags` set.
    pub fn with_flags(flags: WmHintsFlags) -> Self {
        Self {
            flags,
            accepts_input: true,
            ..Self::default()
        }
    }

    /// Attempts to parse WmHints from a u32 slice.
    pub fn try_from_bytes(raw: &[u32]) -> Result<Self> {
        Self::try_from(raw)
    }

    /// Checks whether the given flag is set.
    pub fn is_set(&self, flag: WmHintsFlags) -> bool {
        self.flags.contains(flag)
    }

    /// Whether the urgency hint is set.
    pub fn urgent(&self) -> bool {
        self.flags.contains(WmHintsFlags::URGENCY_HINT)
    }

    /// Whether the hints carry an icon.
    pub fn has_icon(&self) -> bool {
        self.flags.intersects(
            WmHintsFlags::ICON_PIXMAP_HINT
                | WmHintsFlags::ICON_MASK_HINT
                | WmHintsFlags::ICON_WINDOW_HINT,
        )
    }
}

impl TryFrom<&[u32]> for WmHints {
    type Error = XError;

    // pre-ICCCM clients leave out the window group
    fn try_from(from: &[u32]) -> Result<Self> {
        if from.len() < WM_HINTS_LEN - 1 {
            return Err(XError::InvalidPropertyData(format!(
                "expected [u32; 9], got {}",
                from.len()
            )));
        }

        let flags = WmHintsFlags::from_bits_truncate(from[0]);
        let accepts_input = !flags.contains(WmHintsFlags::INPUT_HINT) || from[1] > 0;

        Ok(WmHints {
            flags,
            accepts_input,
            icon_pixmap: from[3],
            icon_window: Xid(from[4]),
            icon_mask: from[7],
            window_group: Xid(from.get(8).copied().unwrap_or(0)),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_wm_hints_parsing() {
        let raw = [
            (WmHintsFlags::URGENCY_HINT | WmHintsFlags::ICON_PIXMAP_HINT).bits(),
            0,
            1,
            0x400001,
            0,
            0,
            0,
            0,
            0,
        ];
        let hints = WmHints::try_from(&raw[..]).expect("valid hints");
        assert!(hints.urgent());
        assert!(hints.has_icon());
        assert!(hints.accepts_input);
        assert_eq!(hints.icon_pixmap, 0x400001);

        // old clients send 8 words
        let hints = WmHints::try_from(&raw[..8]).expect("valid hints");
        assert_eq!(hints.window_group, Xid(0));

        assert!(WmHints::try_from(&raw[..3]).is_err());
    }

    #[test]
    fn test_unknown_flags_are_dropped() {
        let mut raw = [0u32; WM_HINTS_LEN];
        raw[0] = 0b1000_0000 | WmHintsFlags::INPUT_HINT.bits();
        let hints = WmHints::try_from(&raw[..]).expect("valid hints");
        assert_eq!(hints.flags, WmHintsFlags::INPUT_HINT);
        assert!(!hints.accepts_input);
    }
}
