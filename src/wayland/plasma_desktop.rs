use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, error, warn};

use crate::core::DesktopGeometry;
use crate::manager::{DesktopEvent, Runtime};
use crate::platform::{DesktopBackend, DesktopOp, Op};

/// Sends `org_kde_plasma_virtual_desktop` requests.
///
/// Desktops are identified by the id the compositor gave them.
pub trait PlasmaDesktopRequests: 'static {
    /// Activates the desktop with the given id.
    fn activate(&self, id: &str) -> Op<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PlasmaDesktop {
    id: String,
    name: String,
}

type Desktops = Rc<RefCell<Vec<PlasmaDesktop>>>;

struct PlasmaDesktopBackend<R> {
    desktops: Desktops,
    requests: Rc<R>,
}

impl<R: PlasmaDesktopRequests> DesktopBackend for PlasmaDesktopBackend<R> {
    fn name(&self) -> &str {
        PlasmaDesktops::<R>::NAME
    }

    fn implements(&self, op: DesktopOp) -> bool {
        matches!(op, DesktopOp::SetCurrentDesktop)
    }

    fn desktop_names(&self) -> Op<Vec<String>> {
        Some(self.desktops.borrow().iter().map(|d| d.name.clone()).collect())
    }

    // Plasma desktops have no viewports.
    fn set_current_desktop(&self, _: &DesktopGeometry, desktop: i32, _: i32, _: i32) -> Op<bool> {
        let id = usize::try_from(desktop)
            .ok()
            .and_then(|i| self.desktops.borrow().get(i).map(|d| d.id.clone()));
        let Some(id) = id else {
            return Some(false);
        };
        self.requests.activate(&id)?;
        Some(true)
    }
}

/// Tracks virtual desktops through
/// `org_kde_plasma_virtual_desktop_management`.
///
/// Each virtual desktop is a desktop with a single viewport. Changes
/// are published as soon as they arrive.
pub struct PlasmaDesktops<R: PlasmaDesktopRequests> {
    desktops: Desktops,
    requests: Rc<R>,
}

impl<R: PlasmaDesktopRequests> fmt::Debug for PlasmaDesktops<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlasmaDesktops")
            .field("desktops", &self.desktops.borrow())
            .finish()
    }
}

impl<R: PlasmaDesktopRequests> PlasmaDesktops<R> {
    /// The name of the desktop backend.
    pub const NAME: &'static str = "plasma-virtual-desktop";

    /// Registers the desktop backend, issuing requests through `requests`.
    pub fn new(rt: &mut Runtime, requests: R) -> Self {
        let desktops: Desktops = Rc::new(RefCell::new(Vec::new()));
        let requests = Rc::new(requests);
        rt.register_desktop_backend(Box::new(PlasmaDesktopBackend {
            desktops: desktops.clone(),
            requests: requests.clone(),
        }));
        Self { desktops, requests }
    }

    /// The requests of the protocol.
    pub fn requests(&self) -> &R {
        &self.requests
    }

    /// The number of desktops.
    pub fn len(&self) -> usize {
        self.desktops.borrow().len()
    }

    /// Whether no desktop was announced yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The index of the desktop with the given id.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.desktops.borrow().iter().position(|d| d.id == id)
    }

    /// The id of the desktop at `index`.
    pub fn id_at(&self, index: usize) -> Option<String> {
        self.desktops.borrow().get(index).map(|d| d.id.clone())
    }

    /// A desktop was created at `position`.
    ///
    /// Positions past the end append the desktop.
    pub fn desktop_created(&self, rt: &mut Runtime, id: &str, position: u32) {
        {
            let mut desktops = self.desktops.borrow_mut();
            let desktop = PlasmaDesktop {
                id: id.to_string(),
                name: String::new(),
            };
            let position = (position as usize).min(desktops.len());
            desktops.insert(position, desktop);
        }
        debug!("Plasma desktop {} created at {}", id, position);
        self.layout_changed(rt);
    }

    /// A desktop was removed, either through the manager or through
    /// the desktop object itself.
    ///
    /// Removing a desktop twice is harmless.
    pub fn desktop_removed(&self, rt: &mut Runtime, id: &str) {
        let Some(index) = self.index_of(id) else {
            return;
        };
        self.desktops.borrow_mut().remove(index);
        debug!("Plasma desktop {} removed", id);
        self.layout_changed(rt);
    }

    /// A desktop was renamed.
    pub fn name(&self, rt: &mut Runtime, id: &str, name: &str) {
        let found = {
            let mut desktops = self.desktops.borrow_mut();
            match desktops.iter_mut().find(|d| d.id == id) {
                Some(desktop) => {
                    desktop.name = name.to_string();
                    true
                }
                None => false,
            }
        };
        if found {
            rt.emit(DesktopEvent::NamesChanged);
        } else {
            warn!("Name for unknown plasma desktop {}", id);
        }
    }

    /// A desktop was activated.
    pub fn activated(&self, rt: &mut Runtime, id: &str) {
        let Some(index) = self.index_of(id) else {
            error!("Could not find the activated plasma desktop {}", id);
            return;
        };
        let geom = rt.desktop_geometry_mut();
        geom.current_desktop = index as i32;
        geom.current_viewport_x = 0;
        geom.current_viewport_y = 0;
        rt.emit(DesktopEvent::DesktopChanged);
    }

    fn layout_changed(&self, rt: &mut Runtime) {
        let n = self.len().max(1);
        let geom = rt.desktop_geometry_mut();
        geom.nb_desktops = n as i32;
        geom.viewports_x = vec![1; n];
        geom.viewports_y = vec![1; n];
        if geom.current_desktop >= geom.nb_desktops {
            geom.current_desktop = geom.nb_desktops - 1;
        }
        rt.emit(DesktopEvent::GeometryChanged {
            resolution_changed: false,
        });
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::manager::{DockConfig, Notification};

    #[derive(Debug, Default)]
    struct Requests {
        log: RefCell<Vec<String>>,
    }

    impl PlasmaDesktopRequests for Requests {
        fn activate(&self, id: &str) -> Op<()> {
            self.log.borrow_mut().push(format!("activate {}", id));
            Some(())
        }
    }

    fn setup() -> (Runtime, PlasmaDesktops<Requests>, Rc<RefCell<Vec<DesktopEvent>>>) {
        let mut rt = Runtime::new(DockConfig::default());
        let log = Rc::new(RefCell::new(Vec::new()));
        let inner = log.clone();
        rt.subscribe(Box::new(move |_, n| {
            if let Notification::Desktop(e) = n {
                inner.borrow_mut().push(e.clone());
            }
        }));
        let desktops = PlasmaDesktops::new(&mut rt, Requests::default());
        (rt, desktops, log)
    }

    #[test]
    fn test_created_at_position() {
        let (mut rt, desktops, log) = setup();
        desktops.desktop_created(&mut rt, "a", 0);
        desktops.desktop_created(&mut rt, "c", 5);
        desktops.desktop_created(&mut rt, "b", 1);
        desktops.name(&mut rt, "b", "Work");

        assert_eq!(desktops.index_of("c"), Some(2));
        assert_eq!(desktops.id_at(1).as_deref(), Some("b"));
        assert_eq!(rt.desktop_geometry().nb_desktops, 3);
        assert_eq!(
            rt.desktop_names(),
            vec![String::new(), "Work".to_string(), String::new()]
        );
        assert_eq!(log.borrow().len(), 4);
        assert_eq!(log.borrow()[3], DesktopEvent::NamesChanged);
    }

    #[test]
    fn test_removed_twice() {
        let (mut rt, desktops, log) = setup();
        desktops.desktop_created(&mut rt, "a", 0);
        desktops.desktop_created(&mut rt, "b", 1);
        desktops.activated(&mut rt, "b");
        log.borrow_mut().clear();

        desktops.desktop_removed(&mut rt, "b");
        desktops.desktop_removed(&mut rt, "b");
        assert_eq!(
            *log.borrow(),
            vec![DesktopEvent::GeometryChanged { resolution_changed: false }]
        );
        let geom = rt.desktop_geometry();
        assert_eq!((geom.nb_desktops, geom.current_desktop), (1, 0));
    }

    #[test]
    fn test_switch_desktop() {
        let (mut rt, desktops, log) = setup();
        for (i, id) in ["a", "b", "c"].into_iter().enumerate() {
            desktops.desktop_created(&mut rt, id, i as u32);
        }
        assert!(rt.desktop_can(DesktopOp::SetCurrentDesktop));
        assert!(!rt.desktop_can(DesktopOp::AddWorkspace));
        assert!(rt.set_current_desktop(2, 0, 0));
        assert!(!rt.set_current_desktop(3, 0, 0));
        assert_eq!(*desktops.requests().log.borrow(), vec!["activate c".to_string()]);

        log.borrow_mut().clear();
        desktops.activated(&mut rt, "c");
        desktops.activated(&mut rt, "nope");
        assert_eq!(*log.borrow(), vec![DesktopEvent::DesktopChanged]);
        assert_eq!(rt.desktop_geometry().current_desktop, 2);
    }
}
