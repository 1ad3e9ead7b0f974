//! Unified error type.

use std::fmt;

/// The error type returned by seam's fallible operations.
///
/// Application-level errors (404, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// two kinds of failure:
///
/// - **Infrastructure** — binding a port, accepting a connection.
/// - **Configuration** — a stage function declared the same type twice in
///   its parameter list or in its return tuple. These are programming
///   errors; they are reported once, when [`chainable`](crate::chainable) or
///   [`terminal`](crate::terminal) wraps the function, and never at request
///   time.
#[derive(Debug)]
pub enum Error {
    /// An I/O failure from the transport layer.
    Io(std::io::Error),
    /// A stage function declares two parameters of the same type.
    DuplicateParameter {
        /// Type name of the offending stage function.
        stage: &'static str,
        /// The repeated parameter type.
        ty: &'static str,
    },
    /// A stage function's return tuple contains the same type twice.
    DuplicateReturn {
        /// Type name of the offending stage function.
        stage: &'static str,
        /// The repeated return type.
        ty: &'static str,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::DuplicateParameter { stage, ty } => {
                write!(f, "stage `{stage}` declares parameter type `{ty}` more than once")
            }
            Self::DuplicateReturn { stage, ty } => {
                write!(f, "stage `{stage}` returns type `{ty}` more than once")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
