use std::io;
use std::path::Path;

use thiserror::Error;

use super::table::AlgorithmId;

/// Failure of a driver operation. Only the instance or channel involved is affected.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("{what} not found")]
    NotFound { what: String },
    #[error("{id} already exited")]
    AlreadyExited { id: AlgorithmId },
    #[error("permission denied for {what}")]
    PermissionDenied {
        what: String,
        #[source]
        source: io::Error,
    },
    #[error("cannot start algorithm `{name}`")]
    ResourceExhausted {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("I/O error on {what}")]
    Io {
        what: String,
        #[source]
        source: io::Error,
    },
}

impl DriverError {
    pub(crate) fn not_found(what: impl ToString) -> Self {
        DriverError::NotFound {
            what: what.to_string(),
        }
    }

    /// Classifies a failure to open `path`.
    pub(crate) fn open(path: &Path, source: io::Error) -> Self {
        let what = format!("file {:?}", path);
        match source.kind() {
            io::ErrorKind::NotFound => DriverError::NotFound { what },
            io::ErrorKind::PermissionDenied => DriverError::PermissionDenied { what, source },
            _ => DriverError::Io { what, source },
        }
    }

    /// Classifies a failure to spawn algorithm `name`.
    ///
    /// Anything but a missing or forbidden executable means the host could
    /// not create the process (process, memory or descriptor limits).
    pub(crate) fn spawn(name: &str, source: io::Error) -> Self {
        let what = format!("algorithm `{}`", name);
        match source.kind() {
            io::ErrorKind::NotFound => DriverError::NotFound { what },
            io::ErrorKind::PermissionDenied => DriverError::PermissionDenied { what, source },
            _ => DriverError::ResourceExhausted {
                name: name.to_owned(),
                source,
            },
        }
    }

    pub(crate) fn io(what: impl ToString, source: io::Error) -> Self {
        DriverError::Io {
            what: what.to_string(),
            source,
        }
    }
}
