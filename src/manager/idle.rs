//! Work deferred to the idle handler of the host.

use tracing::debug;

use super::Runtime;

bitflags! {

/// Work deferred to the next call to [`Runtime::run_idle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IdleWork: u8 {
    /// Wayland toplevels are waiting to be committed.
    const COMMIT  = 1 << 0;
    /// The stacking order changed.
    const RESTACK = 1 << 1;
    /// Desktop backends have pending changes to publish.
    const DESKTOP = 1 << 2;
}
}

impl Runtime {
    /// Marks the dock as ready to receive window notifications.
    ///
    /// While the dock is not ready, Wayland commits are deferred to
    /// the idle handler.
    pub fn set_ready(&mut self, ready: bool) {
        debug!("Dock ready: {}", ready);
        self.ready = ready;
        if ready && self.reconciler.has_queued() {
            self.schedule_idle(IdleWork::COMMIT);
        }
    }

    /// Whether the dock is ready to receive window notifications.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Schedules work for the next call to [`run_idle`](Self::run_idle).
    pub fn schedule_idle(&mut self, work: IdleWork) {
        self.idle |= work;
    }

    /// Whether there is deferred work for [`run_idle`](Self::run_idle).
    pub fn has_idle_work(&self) -> bool {
        !self.idle.is_empty()
    }

    /// Runs all deferred work.
    ///
    /// Pre-notify hooks run first, so that desktop changes are
    /// published before the window changes that depend on them.
    ///
    /// Commits are skipped while the dock is not ready. They are
    /// scheduled again by [`set_ready`](Self::set_ready).
    pub fn run_idle(&mut self) {
        let mut work = std::mem::take(&mut self.idle);
        if !self.ready && work.contains(IdleWork::COMMIT) {
            trace!("Dock not ready, holding back commits");
            work.remove(IdleWork::COMMIT);
        }
        if work.is_empty() {
            return;
        }
        trace!("Running idle work {:?}", work);
        if work.intersects(IdleWork::COMMIT | IdleWork::DESKTOP) {
            self.run_pre_notify_hooks();
        }
        if work.contains(IdleWork::COMMIT) {
            self.commit_queued();
        }
        if work.contains(IdleWork::RESTACK) {
            self.restack();
        }
    }
}
