use std::fmt;

use tracing::debug;

use super::{DesktopBackend, DesktopOp, WindowBackend, WmCapabilities};

/// An ordered stack of backends.
///
/// Requests are dispatched to the most recently registered backend
/// that implements them, falling back to older ones.
pub struct BackendStack<B: ?Sized> {
    backends: Vec<Box<B>>,
}

impl<B: ?Sized> Default for BackendStack<B> {
    fn default() -> Self {
        Self { backends: Vec::new() }
    }
}

impl<B: ?Sized> BackendStack<B> {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no backend is registered.
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Returns the result of the first backend, newest first,
    /// for which `f` returns `Some`.
    pub fn dispatch<T, F>(&self, mut f: F) -> Option<T>
    where
        F: FnMut(&B) -> Option<T>,
    {
        self.backends.iter().rev().find_map(|b| f(&**b))
    }

    fn push(&mut self, backend: Box<B>) {
        self.backends.push(backend);
    }
}

impl BackendStack<dyn WindowBackend> {
    /// Adds a backend on top of the stack.
    pub fn register(&mut self, backend: Box<dyn WindowBackend>) {
        debug!("Registering window backend {}", backend.name());
        self.push(backend)
    }

    /// The names of all registered backends, oldest first.
    pub fn names(&self) -> String {
        join_names(self.backends.iter().map(|b| b.name()))
    }

    /// The capability flags of the active backend.
    pub fn capabilities(&self) -> WmCapabilities {
        self.dispatch(|b| b.capabilities()).unwrap_or_default()
    }
}

impl BackendStack<dyn DesktopBackend> {
    /// Adds a backend on top of the stack.
    pub fn register(&mut self, backend: Box<dyn DesktopBackend>) {
        debug!("Registering desktop backend {}", backend.name());
        self.push(backend)
    }

    /// The names of all registered backends, oldest first.
    pub fn names(&self) -> String {
        join_names(self.backends.iter().map(|b| b.name()))
    }

    /// Whether any registered backend implements `op`.
    pub fn implements(&self, op: DesktopOp) -> bool {
        self.backends.iter().any(|b| b.implements(op))
    }
}

fn join_names<'a, I: Iterator<Item = &'a str>>(names: I) -> String {
    let joined = names.collect::<Vec<_>>().join("; ");
    if joined.is_empty() {
        "none".into()
    } else {
        joined
    }
}

impl<B: ?Sized> fmt::Debug for BackendStack<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendStack")
            .field("len", &self.backends.len())
            .finish()
    }
}
