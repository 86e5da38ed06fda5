//! Error types for loading, converting and saving networks.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by this crate.
///
/// The first three variants describe a file that could not be loaded or saved; the session is left untouched when
/// one of them is returned. `StructuralViolation` means a network broke one of its own invariants, which is a bug
/// in whatever produced that network rather than something the caller can fix.
#[derive(Debug, Error)]
pub enum Error {
    /// The file could not be opened, read or written.
    #[error("cannot access {}: {source}", path.display())]
    Io {
        /// The offending path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not a well-formed AIGER file.
    #[error("malformed AIGER input: {0}")]
    Parse(String),

    /// The file is valid AIGER but uses a feature this crate does not handle.
    #[error("unsupported AIGER feature: {0}")]
    Unsupported(String),

    /// A network broke a structural invariant (gate arity, topological order).
    #[error("structural assumption violated: {0}")]
    StructuralViolation(String),
}

impl Error {
    /// Whether this error came from reading an input file.
    #[must_use]
    pub const fn is_load_error(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Parse(_) | Self::Unsupported(_))
    }

    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub(crate) fn structural(msg: impl Into<String>) -> Self {
        Self::StructuralViolation(msg.into())
    }
}

/// Shorthand for results carrying [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
