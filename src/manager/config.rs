//! Configuration for a [`Runtime`](super::Runtime).

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{DockError, Result};

/// The application id the dock reports for its own windows.
pub const DEFAULT_APP_ID: &str = "cairo-dock";
/// The title prefix of the dock's own desklet windows.
pub const DEFAULT_DESKLET_PREFIX: &str = "cairo-dock-desklet";

/// Configuration of the window tracking core.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use toarudock::DockConfig;
///
/// let config = DockConfig::builder()
///     .app_id("my-dock")
///     .x11_poll_interval(Duration::from_millis(50))
///     .finish()
///     .expect("invalid config");
///
/// assert_eq!(config.app_id(), "my-dock");
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct DockConfig {
    /// The application id (or class) of the dock itself.
    pub(crate) app_id: String,
    /// Windows of the dock whose title starts with this are desklets.
    pub(crate) desklet_title_prefix: String,
    /// Always defer Wayland commits to the idle handler.
    pub(crate) commit_on_idle: bool,
    /// How often the X connection is polled for events.
    pub(crate) x11_poll_interval: Duration,
}

impl Default for DockConfig {
    fn default() -> Self {
        Self {
            app_id: DEFAULT_APP_ID.into(),
            desklet_title_prefix: DEFAULT_DESKLET_PREFIX.into(),
            commit_on_idle: false,
            x11_poll_interval: Duration::from_millis(100),
        }
    }
}

impl DockConfig {
    /// Returns a builder starting from the default configuration.
    pub fn builder() -> DockConfigBuilder {
        DockConfigBuilder { inner: Self::default() }
    }

    /// The application id of the dock.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// The title prefix of the dock's desklets.
    pub fn desklet_title_prefix(&self) -> &str {
        &self.desklet_title_prefix
    }

    /// Whether Wayland commits are always deferred to the idle handler.
    pub fn commit_on_idle(&self) -> bool {
        self.commit_on_idle
    }

    /// How often the X connection should be polled.
    pub fn x11_poll_interval(&self) -> Duration {
        self.x11_poll_interval
    }

    /// Checks the configuration to verify that all invariants are upheld.
    pub fn validate(&self) -> Result<()> {
        if self.app_id.is_empty() {
            return Err(DockError::InvalidConfig("app_id cannot be empty".into()));
        }
        if self.desklet_title_prefix.is_empty() {
            return Err(DockError::InvalidConfig(
                "desklet title prefix cannot be empty".into(),
            ));
        }
        if self.x11_poll_interval.is_zero() {
            return Err(DockError::InvalidConfig(
                "X11 poll interval must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Builds a [`DockConfig`] with the builder idiom.
#[derive(Debug, Clone)]
pub struct DockConfigBuilder {
    inner: DockConfig,
}

impl DockConfigBuilder {
    /// Sets the application id of the dock.
    pub fn app_id<S: Into<String>>(mut self, app_id: S) -> Self {
        self.inner.app_id = app_id.into();
        self
    }

    /// Sets the title prefix of the dock's desklets.
    pub fn desklet_title_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.inner.desklet_title_prefix = prefix.into();
        self
    }

    /// Sets whether Wayland commits are always deferred.
    pub fn commit_on_idle(mut self, on_idle: bool) -> Self {
        self.inner.commit_on_idle = on_idle;
        self
    }

    /// Sets the X11 polling interval.
    pub fn x11_poll_interval(mut self, interval: Duration) -> Self {
        self.inner.x11_poll_interval = interval;
        self
    }

    /// Validates and returns the configuration.
    pub fn finish(self) -> Result<DockConfig> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}
