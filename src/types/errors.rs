//! Error types used across efivarstore.
use std::path::PathBuf;

use rustix::io::Errno;
use thiserror::Error;

/// Failure of a variable-store operation.
///
/// Every variant maps onto an OS error code through [`VarError::raw_os_error`]
/// so callers that speak errno keep seeing the code produced by the failing
/// syscall, never one produced by cleanup.
#[derive(Debug, Error)]
pub enum VarError {
    #[error("no variable file at {path}")]
    NotFound { path: PathBuf },
    #[error("variable name too long ({len} of {max} bytes)")]
    NameTooLong { len: usize, max: usize },
    #[error("variable path too long ({len} bytes, limit {max})")]
    PathTooLong { len: usize, max: usize },
    #[error("data size too large ({len} bytes)")]
    SizeOverflow { len: usize },
    #[error("{path} was replaced between the read-only and write opens")]
    RaceDetected { path: PathBuf },
    #[error("permission denied: {op} {path}")]
    PermissionDenied {
        op: &'static str,
        path: PathBuf,
        errno: Errno,
    },
    #[error("operation not supported: {op} {path}")]
    Unsupported {
        op: &'static str,
        path: PathBuf,
        errno: Errno,
    },
    #[error("{path} is not on efivarfs (f_type {magic:#x})")]
    NotEfivarfs { path: PathBuf, magic: u64 },
    #[error("{path} is shorter than the attribute header")]
    Truncated { path: PathBuf },
    #[error("{op} {path} failed: {errno}")]
    Sys {
        op: &'static str,
        path: PathBuf,
        errno: Errno,
    },
}

impl VarError {
    /// Classify a syscall failure on `path`.
    pub(crate) fn from_errno(op: &'static str, path: &std::path::Path, errno: Errno) -> Self {
        let path = path.to_path_buf();
        if errno == Errno::NOENT {
            VarError::NotFound { path }
        } else if errno == Errno::ACCESS || errno == Errno::PERM {
            VarError::PermissionDenied { op, path, errno }
        } else if errno == Errno::NOTTY || errno == Errno::OPNOTSUPP {
            VarError::Unsupported { op, path, errno }
        } else {
            VarError::Sys { op, path, errno }
        }
    }

    /// Classify an `std::io::Error` raised while reading or writing an open file.
    pub(crate) fn from_io(op: &'static str, path: &std::path::Path, e: &std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            return VarError::Truncated {
                path: path.to_path_buf(),
            };
        }
        VarError::from_errno(op, path, Errno::from_io_error(e).unwrap_or(Errno::IO))
    }

    /// The errno a C caller would have observed for this failure.
    #[must_use]
    pub fn raw_os_error(&self) -> i32 {
        self.errno().raw_os_error()
    }

    /// Same as [`VarError::raw_os_error`], as a typed `Errno`.
    #[must_use]
    pub fn errno(&self) -> Errno {
        match self {
            VarError::NotFound { .. } => Errno::NOENT,
            VarError::NameTooLong { .. } | VarError::RaceDetected { .. } => Errno::INVAL,
            VarError::PathTooLong { .. } => Errno::NAMETOOLONG,
            VarError::SizeOverflow { .. } => Errno::OVERFLOW,
            VarError::NotEfivarfs { .. } => Errno::NODEV,
            VarError::Truncated { .. } => Errno::IO,
            VarError::PermissionDenied { errno, .. }
            | VarError::Unsupported { errno, .. }
            | VarError::Sys { errno, .. } => *errno,
        }
    }

    #[must_use]
    pub const fn id(&self) -> ErrorId {
        match self {
            VarError::NotFound { .. } => ErrorId::E_NOT_FOUND,
            VarError::NameTooLong { .. } => ErrorId::E_NAME_TOO_LONG,
            VarError::PathTooLong { .. } => ErrorId::E_PATH_TOO_LONG,
            VarError::SizeOverflow { .. } => ErrorId::E_SIZE_OVERFLOW,
            VarError::RaceDetected { .. } => ErrorId::E_RACE,
            VarError::PermissionDenied { .. } => ErrorId::E_PERMISSION,
            VarError::Unsupported { .. } => ErrorId::E_UNSUPPORTED,
            VarError::NotEfivarfs { .. } => ErrorId::E_PROBE,
            VarError::Truncated { .. } | VarError::Sys { .. } => ErrorId::E_SYSCALL,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, VarError::NotFound { .. })
    }
}

/// Convenient alias for results returning a `VarError`.
pub type Result<T> = std::result::Result<T, VarError>;

// Stable identifiers emitted in diagnostics.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorId {
    E_NOT_FOUND,
    E_NAME_TOO_LONG,
    E_PATH_TOO_LONG,
    E_SIZE_OVERFLOW,
    E_RACE,
    E_PERMISSION,
    E_UNSUPPORTED,
    E_PROBE,
    E_SYSCALL,
}

#[must_use]
pub const fn id_str(id: ErrorId) -> &'static str {
    match id {
        ErrorId::E_NOT_FOUND => "E_NOT_FOUND",
        ErrorId::E_NAME_TOO_LONG => "E_NAME_TOO_LONG",
        ErrorId::E_PATH_TOO_LONG => "E_PATH_TOO_LONG",
        ErrorId::E_SIZE_OVERFLOW => "E_SIZE_OVERFLOW",
        ErrorId::E_RACE => "E_RACE",
        ErrorId::E_PERMISSION => "E_PERMISSION",
        ErrorId::E_UNSUPPORTED => "E_UNSUPPORTED",
        ErrorId::E_PROBE => "E_PROBE",
        ErrorId::E_SYSCALL => "E_SYSCALL",
    }
}
