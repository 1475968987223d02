extern crate tracing;

macro_rules! trace {
    ($fmt:expr) => {
        #[cfg(debug_assertions)]
        tracing::trace!($fmt)
    };
    ($fmt:expr, $($arg:tt)*) => {
        #[cfg(debug_assertions)]
        tracing::trace!($fmt, $($arg)*)
    }
}

use crate::{DockError, ErrorHandler, Runtime};
use tracing::error;

/// An error handler that logs the error and carries on.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorHandler;

impl ErrorHandler for DefaultErrorHandler {
    fn call(&self, _: &mut Runtime, err: DockError) {
        error!("{}", err)
    }
}
