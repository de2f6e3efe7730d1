// src/error.rs

//! Error taxonomy for the structure-to-mesh pipeline.
//!
//! Parse and request errors abort a generation before anything is written.
//! Geometric degeneracies (a bond parallel to the reference axis) are not
//! errors at all: see [`crate::rendering::primitives::Alignment`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Cif2StlError>;

#[derive(Error, Debug)]
pub enum Cif2StlError {
    /// Unreadable or unsupported structure file, or nothing left to draw
    #[error("parse error: {0}")]
    Parse(String),

    /// Malformed `index:[x,y,z]` / `El:[x,y,z]` spin assignment
    #[error("invalid spin assignment '{fragment}': {reason}")]
    SpinFormat { fragment: String, reason: String },

    /// Parameters that cannot describe a supercell or a bond search
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Primitive-cell reduction failed
    #[error("symmetry search failed: {0}")]
    Symmetry(String),

    /// Output (or staging) path could not be written
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Cif2StlError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn spin(fragment: &str, reason: impl Into<String>) -> Self {
        Self::SpinFormat {
            fragment: fragment.to_string(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Short category name used in CLI output
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse(_) => "ParseError",
            Self::SpinFormat { .. } => "SpinFormatError",
            Self::InvalidRequest(_) => "InvalidRequest",
            Self::Symmetry(_) => "SymmetryError",
            Self::Io { .. } => "IOError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spin_error_message() {
        let err = Cif2StlError::spin("3:[1,0]", "expected 3 components");
        let msg = err.to_string();
        assert!(msg.contains("3:[1,0]"));
        assert!(msg.contains("expected 3 components"));
        assert_eq!(err.kind(), "SpinFormatError");
    }

    #[test]
    fn test_io_error_keeps_path() {
        let err = Cif2StlError::io(
            "/nope/out.stl",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/nope/out.stl"));
        assert_eq!(err.kind(), "IOError");
    }
}
