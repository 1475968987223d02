use std::fmt;

use tracing::debug;

use super::Runtime;
use crate::core::ActorId;

/// Arbitrary code that can be run by the runtime.
///
/// A `Hook` is just a wrapper around a boxed trait object
/// implementing [`FnMut`].
/// You would generally use this through the [`hook`] macro's
/// much more ergonomic interface.
pub type Hook = Box<dyn FnMut(&mut Runtime)>;

/// Macro for creating a hook that can be run by the runtime.
///
/// It accepts closure syntax, for example:
///
/// ## Example
/// ```rust
/// use toarudock::{hook, Runtime, DockConfig};
///
/// let mut rt = Runtime::new(DockConfig::default());
/// rt.add_pre_notify_hook(hook!(|rt| {
///     println!("{} windows", rt.registry().len());
/// }));
/// ```
#[macro_export]
macro_rules! hook {
    (|$rt:ident| $code:tt) => {
        Box::new(|$rt: &mut $crate::Runtime| $code)
        as Box<dyn FnMut(&mut $crate::Runtime)>
    };
    (move |$rt:ident| $code:tt) => {
        Box::new(move |$rt: &mut $crate::Runtime| $code)
        as Box<dyn FnMut(&mut $crate::Runtime)>
    }
}

/// A one-shot callback receiving the window picked by the user.
pub type PickCallback = Box<dyn FnOnce(&mut Runtime, ActorId)>;

struct Pick {
    skipped_self: bool,
    callback: PickCallback,
}

#[derive(Default)]
pub(crate) struct Hooks {
    pre_notify: Vec<Hook>,
    pick: Option<Pick>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("pre_notify", &self.pre_notify.len())
            .field("picking", &self.pick.is_some())
            .finish()
    }
}

impl Runtime {
    /// Adds a hook that runs before deferred commits are processed.
    ///
    /// Desktop backends use this to publish their pending desktop
    /// changes before any window notification that may depend on them.
    pub fn add_pre_notify_hook(&mut self, hook: Hook) {
        self.hooks.pre_notify.push(hook);
    }

    pub(crate) fn run_pre_notify_hooks(&mut self) {
        let mut hooks = std::mem::take(&mut self.hooks.pre_notify);
        for hook in hooks.iter_mut() {
            hook(self)
        }
        // keep hooks added while running
        hooks.append(&mut self.hooks.pre_notify);
        self.hooks.pre_notify = hooks;
    }

    /// Asks the user to pick a window.
    ///
    /// The next window to be activated is passed to `callback`. The
    /// first activation of the dock's own window is skipped, since
    /// the dock usually has focus when picking starts.
    pub fn start_pick(&mut self, callback: PickCallback) {
        debug!("Starting window pick");
        self.hooks.pick = Some(Pick {
            skipped_self: false,
            callback,
        });
    }

    /// Cancels a pick started by [`start_pick`](Self::start_pick).
    pub fn cancel_pick(&mut self) {
        self.hooks.pick = None;
    }

    /// Whether a pick is in progress.
    pub fn is_picking(&self) -> bool {
        self.hooks.pick.is_some()
    }

    pub(crate) fn pick_activated(&mut self, id: ActorId) {
        let Some(mut pick) = self.hooks.pick.take() else {
            return;
        };
        let own = self
            .registry
            .get(id)
            .and_then(|a| a.class())
            .is_some_and(|c| c == self.config.app_id());

        if own && !pick.skipped_self {
            trace!("Skipping activation of our own window while picking");
            pick.skipped_self = true;
            self.hooks.pick = Some(pick);
            return;
        }
        debug!("Picked window {}", id);
        (pick.callback)(self, id);
    }
}
