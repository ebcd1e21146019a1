//! Error types for the Strata renderers
//!
//! This module defines the error type shared by the device boundary and
//! the three renderers, plus the `gfx_err!` / `gfx_bail!` helpers that log
//! an error before handing it back to the caller.

use std::fmt;

/// Result type for Strata operations
pub type Result<T> = std::result::Result<T, Error>;

/// Strata rendering errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (driver, context loss, poisoned device lock)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (texture, buffer, program, framebuffer)
    InvalidResource(String),

    /// Initialization failed (program compilation, white texture, buffers)
    InitializationFailed(String),

    /// Operation called in the wrong renderer state (e.g. draw before `begin`)
    InvalidState(String),

    /// Operation called with arguments outside its contract (e.g. zero vertices)
    InvalidArgument(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Build an [`Error`] of the given kind and log it at ERROR level
///
/// # Example
///
/// ```ignore
/// let err = gfx_err!("strata::UiRenderer", InvalidState, "draw while idle");
/// ```
#[macro_export]
macro_rules! gfx_err {
    ($source:expr, $kind:ident, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::gfx_error!($source, "{}", message);
        $crate::error::Error::$kind(message)
    }};
}

/// Log an error of the given kind and return it from the enclosing function
///
/// # Example
///
/// ```ignore
/// gfx_bail!("strata::ShadowRenderer", InvalidState, "no shadow map attached");
/// ```
#[macro_export]
macro_rules! gfx_bail {
    ($source:expr, $kind:ident, $($arg:tt)*) => {
        return Err($crate::gfx_err!($source, $kind, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
