// Error types for lank
use camino::Utf8PathBuf;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0} does not exist")]
    NotFound(Utf8PathBuf),

    #[error("{0} is not a symlink")]
    NotASymlink(Utf8PathBuf),

    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid replacement {replacement:?}: {reason}")]
    InvalidReplacement { replacement: String, reason: String },

    #[error("Invalid UTF-8 in target of {0}")]
    InvalidTargetUtf8(Utf8PathBuf),

    #[error("{path} changed while reading it (expected {expected} bytes, read {actual})")]
    LinkChanged {
        path: Utf8PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("{op} {path}: {source}")]
    Io {
        op: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to allocate {0} bytes for the new target")]
    AllocationFailure(usize),

    #[error("substitution produced {actual} bytes, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("temporary link {0} already exists")]
    TempPathCollision(Utf8PathBuf),
}

impl Error {
    /// Wrap an I/O failure with the operation and path it came from
    pub(crate) fn io(op: &'static str, path: impl Into<Utf8PathBuf>, source: io::Error) -> Self {
        Error::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// An owned copy, for reporting one failure against several paths.
    ///
    /// The OS error of `Io` keeps its kind and message.
    pub(crate) fn duplicate(&self) -> Self {
        match self {
            Error::NotFound(path) => Error::NotFound(path.clone()),
            Error::NotASymlink(path) => Error::NotASymlink(path.clone()),
            Error::InvalidPattern { pattern, source } => Error::InvalidPattern {
                pattern: pattern.clone(),
                source: source.clone(),
            },
            Error::InvalidReplacement {
                replacement,
                reason,
            } => Error::InvalidReplacement {
                replacement: replacement.clone(),
                reason: reason.clone(),
            },
            Error::InvalidTargetUtf8(path) => Error::InvalidTargetUtf8(path.clone()),
            Error::LinkChanged {
                path,
                expected,
                actual,
            } => Error::LinkChanged {
                path: path.clone(),
                expected: *expected,
                actual: *actual,
            },
            Error::Io { op, path, source } => Error::Io {
                op: *op,
                path: path.clone(),
                source: io::Error::new(source.kind(), source.to_string()),
            },
            Error::AllocationFailure(len) => Error::AllocationFailure(*len),
            Error::LengthMismatch { expected, actual } => Error::LengthMismatch {
                expected: *expected,
                actual: *actual,
            },
            Error::TempPathCollision(path) => Error::TempPathCollision(path.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_keeps_details() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = Error::InvalidPattern {
            pattern: "(".into(),
            source,
        };
        assert_eq!(err.duplicate().to_string(), err.to_string());

        let err = Error::io(
            "rename",
            "/srv/link",
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        let copy = err.duplicate();
        assert_eq!(copy.to_string(), err.to_string());
        assert!(matches!(
            copy,
            Error::Io { op: "rename", ref source, .. } if source.kind() == io::ErrorKind::PermissionDenied
        ));
    }
}
