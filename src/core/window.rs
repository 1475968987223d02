//! This module exports WindowActor, the protocol-agnostic record
//! of a single top-level window, and the helpers used to derive
//! its application class.

use tracing::debug;

use super::desktop::DesktopGeometry;
use super::types::{ActorId, Rectangle};
use crate::wayland::toplevel::PendingState;

/// Represents one top-level window known to the dock.
///
/// Actors are owned by the [`ActorRegistry`](super::ActorRegistry)
/// and are referred to by their [`ActorId`] everywhere else.
/// Backends fill in the fields either directly (X11) or through
/// the pending/commit cycle of the
/// [Wayland reconciler](crate::wayland::Toplevel).
///
/// Whether `geometry` is absolute or relative to the current
/// viewport, and whether the desktop fields can be trusted at all,
/// is published by the backend as [`WmCapabilities`][1].
///
/// [1]: crate::platform::WmCapabilities
#[derive(Debug, Clone, Default)]
pub struct WindowActor {
    pub(crate) id: ActorId,
    pub(crate) displayed: bool,

    pub(crate) hidden: bool,
    pub(crate) maximized: bool,
    pub(crate) fullscreen: bool,
    pub(crate) demands_attention: bool,
    pub(crate) sticky: bool,
    pub(crate) skip_taskbar: bool,

    pub(crate) geometry: Rectangle,
    pub(crate) num_desktop: i32,
    pub(crate) viewport_x: i32,
    pub(crate) viewport_y: i32,
    pub(crate) stack_order: i32,

    pub(crate) class: Option<String>,
    pub(crate) wm_class: Option<String>,
    pub(crate) class_extra: Option<String>,
    pub(crate) name: Option<String>,
    pub(crate) last_attention_demand: Option<String>,

    pub(crate) age: i32,
    pub(crate) transient: bool,
    pub(crate) parent: Option<ActorId>,

    pub(crate) pending: Option<Box<PendingState>>,
}

impl PartialEq for WindowActor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl WindowActor {
    pub(crate) fn new(id: ActorId, age: i32) -> Self {
        Self {
            id,
            age,
            ..Self::default()
        }
    }

    /// The id of the actor.
    #[inline]
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Whether the window should currently appear in the taskbar.
    #[inline]
    pub fn is_displayed(&self) -> bool {
        self.displayed
    }

    /// Whether the window is minimized.
    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Whether the window is maximized.
    #[inline]
    pub fn is_maximized(&self) -> bool {
        self.maximized
    }

    /// Whether the window is fullscreen.
    #[inline]
    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Whether the window is demanding attention.
    #[inline]
    pub fn demands_attention(&self) -> bool {
        self.demands_attention
    }

    /// Whether the window is present on all desktops and viewports.
    #[inline]
    pub fn is_sticky(&self) -> bool {
        self.sticky
    }

    /// Whether the window asked not to be shown in the taskbar.
    #[inline]
    pub fn skips_taskbar(&self) -> bool {
        self.skip_taskbar
    }

    /// Whether the window has a parent window.
    #[inline]
    pub fn is_transient(&self) -> bool {
        self.transient
    }

    /// The parent of the window, if it is known to the registry.
    #[inline]
    pub fn parent(&self) -> Option<ActorId> {
        self.parent
    }

    /// The geometry of the window.
    #[inline]
    pub fn geometry(&self) -> Rectangle {
        self.geometry
    }

    /// The desktop the window is on, or -1 if it is on all desktops.
    #[inline]
    pub fn num_desktop(&self) -> i32 {
        self.num_desktop
    }

    /// The viewport the window is on.
    #[inline]
    pub fn viewport(&self) -> (i32, i32) {
        (self.viewport_x, self.viewport_y)
    }

    /// The z-order of the window.
    ///
    /// Only meaningful relative to other actors, and only until
    /// the next z-order change.
    #[inline]
    pub fn stack_order(&self) -> i32 {
        self.stack_order
    }

    /// The parsed application class.
    #[inline]
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    /// The raw class as reported by the window system.
    #[inline]
    pub fn wm_class(&self) -> Option<&str> {
        self.wm_class.as_deref()
    }

    /// Anything the window system reported after the class, such as
    /// the part of a Wayland app-id following the first space.
    #[inline]
    pub fn class_extra(&self) -> Option<&str> {
        self.class_extra.as_deref()
    }

    /// The title of the window.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The creation order of the window.
    #[inline]
    pub fn age(&self) -> i32 {
        self.age
    }

    /// Whether the window is tracked through the Wayland pending/commit cycle.
    #[inline]
    pub fn is_wayland(&self) -> bool {
        self.pending.is_some()
    }

    /// Tests whether the window is visible on the current desktop
    /// and viewport.
    pub fn is_on_current_desktop(&self, geom: &DesktopGeometry) -> bool {
        if self.sticky {
            return true;
        }
        let g = &self.geometry;
        (self.num_desktop == geom.current_desktop || self.num_desktop == -1)
            && g.x + g.width > 0
            && g.x < geom.desktop_width()
            && g.y + g.height > 0
            && g.y < geom.desktop_height()
    }

    /// Tests whether the window is on the given desktop and viewport.
    ///
    /// The geometry is converted to absolute coordinates first,
    /// wrapping around for windows placed left of or above the
    /// current viewport.
    pub fn is_on_desktop(&self, geom: &DesktopGeometry, desktop: i32, vx: i32, vy: i32) -> bool {
        if self.sticky || self.num_desktop == -1 {
            return true;
        }
        let (w, h) = (geom.desktop_width(), geom.desktop_height());
        let (nx, ny) = geom.viewports_of(self.num_desktop);

        let mut x = self.geometry.x + geom.current_viewport_x * w;
        if x < 0 {
            x += nx * w;
        }
        let mut y = self.geometry.y + geom.current_viewport_y * h;
        if y < 0 {
            y += ny * h;
        }

        self.num_desktop == desktop
            && x + self.geometry.width > vx * w
            && x < (vx + 1) * w
            && y + self.geometry.height > vy * h
            && y < (vy + 1) * h
    }

    /// Whether the window may be shown in the taskbar.
    ///
    /// A window is eligible if it has no parent, has a class, and
    /// does not skip the taskbar. Our own desklets are never
    /// eligible; they are recognized by `own_class` and a title
    /// starting with `desklet_prefix`.
    pub(crate) fn is_eligible(&self, title: Option<&str>, own_class: &str, desklet_prefix: &str) -> bool {
        if self.transient || self.skip_taskbar {
            return false;
        }
        match self.class.as_deref() {
            None => false,
            Some(class) if class == own_class => {
                !title.is_some_and(|t| t.starts_with(desklet_prefix))
            }
            Some(_) => true,
        }
    }
}

/// Derives the application class from the class and name reported
/// by the window system.
///
/// Wine programs and Chromium web applications are told apart by
/// their name rather than their (shared) class, and Mono programs
/// report a path as their class. Version numbers and extensions are
/// stripped from the result, which is always lowercase.
pub fn parse_class(res_class: &str, res_name: Option<&str>) -> String {
    let name = res_name.unwrap_or("");

    let mut class = if res_class == "Wine" && (name.ends_with(".exe") || name.ends_with(".EXE")) {
        debug!("wine application detected, using '{}' as class", name);
        name.to_ascii_lowercase()
    } else if is_chromium_app(res_class, name) {
        let mut class = name.to_ascii_lowercase();
        if let Some(idx) = class.find(' ') {
            class.truncate(idx);
        }
        // keep the domain parts, they are cut off at the first '.' below
        let class = class.replace('.', "_");
        debug!("chromium application detected, using '{}' as class", class);
        class
    } else if res_class.starts_with('/') && (res_class.ends_with(".exe") || name.ends_with(".EXE")) {
        let base = res_class.rsplit('/').next().unwrap_or(res_class);
        let mut class = base.to_ascii_lowercase();
        if class.ends_with(".exe") {
            class.truncate(class.len() - ".exe".len());
        }
        class
    } else {
        res_class.to_ascii_lowercase()
    };

    remove_version(&mut class);
    if let Some(idx) = class.find('.') {
        class.truncate(idx);
    }
    class
}

fn is_chromium_app(res_class: &str, name: &str) -> bool {
    if name.is_empty() || res_class.is_empty() {
        return false;
    }
    let chromium = matches!(res_class.get(..1), Some("c" | "C"))
        && matches!(res_class.get(1..), Some("hromium-browser" | "hromium"));
    let chrome = matches!(
        res_class,
        "Google-chrome" | "Google-chrome-beta" | "Google-chrome-unstable"
    );
    // the first letter may differ in case between class and name
    (chromium || chrome) && res_class.get(1..) != name.get(1..)
}

/// Removes a trailing version number such as `-2` or ` 3.1`.
///
/// Returns whether anything was removed.
pub(crate) fn remove_version(s: &mut String) -> bool {
    let bytes = s.as_bytes();
    let mut idx = bytes.len();
    while idx > 1 {
        idx -= 1;
        match bytes[idx] {
            b'0'..=b'9' | b'.' => continue,
            b'-' | b' ' => {
                s.truncate(idx);
                return true;
            }
            _ => return false,
        }
    }
    false
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_class_plain() {
        assert_eq!(parse_class("Firefox", Some("Navigator")), "firefox");
        assert_eq!(parse_class("org.gnome.Nautilus", None), "org");
    }

    #[test]
    fn test_parse_class_versions() {
        assert_eq!(parse_class("Glade-2", None), "glade");
        assert_eq!(parse_class("OpenOffice.org 3.1", None), "openoffice");
        assert_eq!(parse_class("Gimp-2.10", Some("gimp")), "gimp");
    }

    #[test]
    fn test_parse_class_special_cases() {
        assert_eq!(parse_class("Wine", Some("Notepad.EXE")), "notepad");
        assert_eq!(
            parse_class("Google-chrome", Some("www.example.com__calendar (/home/user)")),
            "www_example_com__calendar"
        );
        // the browser itself keeps its class
        assert_eq!(parse_class("Chromium", Some("chromium")), "chromium");
        assert_eq!(parse_class("/usr/lib/tomboy/Tomboy.exe", Some("tomboy")), "tomboy");
    }

    #[test]
    fn test_parse_class_path_with_multibyte_name() {
        assert_eq!(parse_class("/ééa", Some("setup.EXE")), "ééa");
        assert_eq!(parse_class("/opt/ÉDIT.EXE", Some("ÉDIT.EXE")), "Édit");
    }

    #[test]
    fn test_remove_version() {
        let mut s = String::from("openoffice.org-3.1");
        assert!(remove_version(&mut s));
        assert_eq!(s, "openoffice.org");

        let mut s = String::from("firefox");
        assert!(!remove_version(&mut s));
        assert_eq!(s, "firefox");
    }

    #[test]
    fn test_eligibility() {
        let mut actor = WindowActor::new(ActorId(1), 1);
        assert!(!actor.is_eligible(None, "cairo-dock", "cairo-dock-desklet"));

        actor.class = Some("firefox".into());
        assert!(actor.is_eligible(None, "cairo-dock", "cairo-dock-desklet"));

        actor.transient = true;
        assert!(!actor.is_eligible(None, "cairo-dock", "cairo-dock-desklet"));
        actor.transient = false;

        actor.class = Some("cairo-dock".into());
        assert!(actor.is_eligible(Some("Cairo-Dock configuration"), "cairo-dock", "cairo-dock-desklet"));
        assert!(!actor.is_eligible(Some("cairo-dock-desklet"), "cairo-dock", "cairo-dock-desklet"));
    }

    #[test]
    fn test_is_on_desktop() {
        let geom = DesktopGeometry::uniform(Rectangle::new(0, 0, 1000, 800), 2, 2, 1);
        let mut actor = WindowActor::new(ActorId(1), 1);
        actor.geometry = Rectangle::new(1100, 100, 200, 200);
        actor.num_desktop = 0;

        assert!(!actor.is_on_current_desktop(&geom));
        assert!(actor.is_on_desktop(&geom, 0, 1, 0));
        assert!(!actor.is_on_desktop(&geom, 0, 0, 0));
        assert!(!actor.is_on_desktop(&geom, 1, 1, 0));

        actor.sticky = true;
        assert!(actor.is_on_current_desktop(&geom));
    }
}
