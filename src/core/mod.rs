//! This module contains the core types used within toarudock.
//! It contains the protocol-agnostic types that the rest of the
//! dock uses to keep track of windows.

/// Types used to describe desktops and viewports.
pub mod desktop;
/// The registry owning all window actors.
pub mod registry;
/// Basic types used throughout toarudock.
pub mod types;
/// Types used to represent individual windows.
pub mod window;

pub use desktop::DesktopGeometry;
pub use registry::{ActorRegistry, ProtocolHandle};
pub use types::{ActorId, Rectangle};
pub use window::{parse_class, WindowActor};
