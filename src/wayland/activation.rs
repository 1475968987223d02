use indexmap::IndexSet;
use strum::{AsRefStr, Display};

use crate::core::ActorId;
use crate::manager::Runtime;

/// How activation reports from a protocol are turned into activation
/// of a toplevel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display)]
pub enum ActivationPolicy {
    /// Every report is passed on as it is; the last window reported
    /// active before a commit becomes the active window.
    ExplicitSignal,
    /// Windows reporting the active state are collected, and a window
    /// is only activated once it is the sole member of that set.
    ///
    /// Some compositors briefly report two windows as active, for
    /// instance while one of them is being moved.
    SingleCandidate,
}

/// Debounces activation reports according to an [`ActivationPolicy`].
#[derive(Debug, Clone)]
pub struct ActivationTracker {
    policy: ActivationPolicy,
    candidates: IndexSet<ActorId>,
}

impl ActivationTracker {
    /// Creates a tracker with the given policy.
    pub fn new(policy: ActivationPolicy) -> Self {
        Self {
            policy,
            candidates: IndexSet::new(),
        }
    }

    /// The policy of the tracker.
    pub fn policy(&self) -> ActivationPolicy {
        self.policy
    }

    /// The windows currently reporting the active state.
    ///
    /// Always empty with [`ActivationPolicy::ExplicitSignal`].
    pub fn candidates(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.candidates.iter().copied()
    }

    /// Records whether a toplevel reports itself as active.
    ///
    /// The result is stored as pending state; it takes effect at the
    /// next commit of the toplevel.
    pub fn report(&mut self, rt: &mut Runtime, id: ActorId, active: bool) {
        match self.policy {
            ActivationPolicy::ExplicitSignal => {
                if let Some(mut t) = rt.toplevel(id) {
                    t.activated(active, false);
                }
            }
            ActivationPolicy::SingleCandidate => {
                let changed = if active {
                    self.candidates.insert(id)
                } else {
                    self.candidates.shift_remove(&id)
                };
                if !changed {
                    return;
                }
                // harmless if the window was not the active one
                if !active {
                    if let Some(mut t) = rt.toplevel(id) {
                        t.activated(false, false);
                    }
                }
                if self.candidates.len() == 1 {
                    let sole = if active { Some(id) } else { self.candidates.first().copied() };
                    if let Some(mut t) = sole.and_then(|sole| rt.toplevel(sole)) {
                        t.activated(true, false);
                    }
                }
            }
        }
    }

    /// Forgets a toplevel that is being closed.
    pub fn forget(&mut self, rt: &mut Runtime, id: ActorId) {
        self.report(rt, id, false);
    }
}
