use thiserror::Error;

use crate::config::ConfigError;
use crate::core::CoreError;
use crate::snapshot::SnapshotError;

/// How far an error reaches.
///
/// The engine's propagation policy keeps failures contained: most errors are
/// scoped to one lens instance and recorded as that instance's `last_error`,
/// a few abort the surrounding operation, and migration failures abort an
/// import entirely.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Scope {
    /// Contained to a single lens instance; siblings are unaffected.
    Instance,
    /// Aborts the current operation (an import, an export, a command).
    Pass,
    /// Aborts with no partial effect; the store is left untouched.
    Fatal,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Instance => "instance",
            Scope::Pass => "pass",
            Scope::Fatal => "fatal",
        }
    }
}

/// Crate-level convenience error.
///
/// Not a "god error": it is a thin wrapper over canonical capability errors.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn scope(&self) -> Scope {
        match self {
            Error::Core(e) => e.scope(),
            Error::Snapshot(e) => e.scope(),
            Error::Config(_) | Error::Io(_) => Scope::Pass,
        }
    }
}
