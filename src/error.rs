//! Error taxonomy for filesystem operations.
//!
//! Every fallible public operation returns [`FsResult<T>`]. Internally the core
//! never panics or throws for control flow (see the design notes on replacing
//! exceptions with explicit result values); every failure path produces an
//! [`FsError`] carrying a [`FsErrorKind`] and, where meaningful, the path that
//! triggered it.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// The semantic category of a filesystem failure.
///
/// This is deliberately a closed, semantic taxonomy (not a thin wrapper around
/// platform errno values): callers match on *what went wrong*, not on how the
/// host OS would have spelled it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum FsErrorKind {
    /// No entry exists at the given path.
    NotFound,
    /// An entry already exists where one is being created.
    AlreadyExists,
    /// A path component that was expected to be a directory is not one.
    NotADirectory,
    /// An operation that requires a non-directory was given a directory.
    IsADirectory,
    /// Symbolic link resolution exceeded the hop limit.
    TooManySymlinks,
    /// The path string itself is malformed for the filesystem's path type.
    InvalidPath,
    /// The disk's byte cap would be exceeded by the requested allocation.
    OutOfSpace,
    /// The operation is not permitted by the active permission/ACL checks.
    AccessDenied,
    /// The operation is recognized but not supported by this configuration.
    UnsupportedOperation,
    /// A move was requested with `ATOMIC_MOVE` across incompatible targets.
    AtomicMoveNotSupported,
    /// A directory was not empty where emptiness was required.
    DirectoryNotEmpty,
    /// An attribute name does not exist on the resolved view(s).
    IllegalAttribute,
    /// An attribute is not settable at file-creation time.
    UnsupportedOnCreate,
    /// The runtime type of an attribute value does not match what the view accepts.
    IllegalType,
    /// Two attribute providers were configured for the same view name.
    DuplicateView,
    /// An I/O failure occurred transferring to/from a caller-supplied channel.
    ChannelError,
}

impl FsErrorKind {
    /// A short, stable, machine-readable name for the kind. Used in `Display`.
    fn as_str(self) -> &'static str {
        match self {
            FsErrorKind::NotFound => "not found",
            FsErrorKind::AlreadyExists => "already exists",
            FsErrorKind::NotADirectory => "not a directory",
            FsErrorKind::IsADirectory => "is a directory",
            FsErrorKind::TooManySymlinks => "too many levels of symbolic links",
            FsErrorKind::InvalidPath => "invalid path",
            FsErrorKind::OutOfSpace => "out of space",
            FsErrorKind::AccessDenied => "access denied",
            FsErrorKind::UnsupportedOperation => "unsupported operation",
            FsErrorKind::AtomicMoveNotSupported => "atomic move not supported",
            FsErrorKind::DirectoryNotEmpty => "directory not empty",
            FsErrorKind::IllegalAttribute => "illegal attribute",
            FsErrorKind::UnsupportedOnCreate => "attribute not settable on create",
            FsErrorKind::IllegalType => "illegal attribute value type",
            FsErrorKind::DuplicateView => "duplicate attribute view",
            FsErrorKind::ChannelError => "channel I/O error",
        }
    }
}

/// A filesystem operation failure.
///
/// Carries the [`FsErrorKind`], the path that was being resolved or operated
/// on when known, and, for [`FsErrorKind::ChannelError`], the underlying
/// [`io::Error`] from the caller-supplied channel.
#[derive(Debug)]
pub struct FsError {
    kind: FsErrorKind,
    path: Option<PathBuf>,
    source: Option<io::Error>,
}

impl FsError {
    /// Construct an error of the given kind with no associated path.
    pub fn new(kind: FsErrorKind) -> Self {
        FsError {
            kind,
            path: None,
            source: None,
        }
    }

    /// Construct an error of the given kind, attaching the offending path.
    pub fn with_path(kind: FsErrorKind, path: impl Into<PathBuf>) -> Self {
        FsError {
            kind,
            path: Some(path.into()),
            source: None,
        }
    }

    /// Wrap an I/O error from a caller-supplied channel as a [`FsErrorKind::ChannelError`].
    pub fn from_channel(err: io::Error) -> Self {
        FsError {
            kind: FsErrorKind::ChannelError,
            path: None,
            source: Some(err),
        }
    }

    /// The semantic kind of this error.
    pub fn kind(&self) -> FsErrorKind {
        self.kind
    }

    /// The path associated with this error, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        self.path.as_deref()
    }

    /// Attach or replace the path associated with this error.
    pub fn with_path_context(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {}", self.kind.as_str(), path.display()),
            None => write!(f, "{}", self.kind.as_str()),
        }
    }
}

impl std::error::Error for FsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<FsErrorKind> for FsError {
    fn from(kind: FsErrorKind) -> Self {
        FsError::new(kind)
    }
}

/// Bridges core errors into `std::io::Error` for callers that compose this
/// crate with ordinary `std::io`-based code.
impl From<FsError> for io::Error {
    fn from(err: FsError) -> Self {
        let kind = match err.kind {
            FsErrorKind::NotFound => io::ErrorKind::NotFound,
            FsErrorKind::AlreadyExists => io::ErrorKind::AlreadyExists,
            FsErrorKind::InvalidPath => io::ErrorKind::InvalidInput,
            FsErrorKind::AccessDenied => io::ErrorKind::PermissionDenied,
            FsErrorKind::UnsupportedOperation => io::ErrorKind::Unsupported,
            FsErrorKind::DirectoryNotEmpty => io::ErrorKind::DirectoryNotEmpty,
            FsErrorKind::OutOfSpace => io::ErrorKind::StorageFull,
            FsErrorKind::NotADirectory
            | FsErrorKind::IsADirectory
            | FsErrorKind::TooManySymlinks
            | FsErrorKind::AtomicMoveNotSupported
            | FsErrorKind::IllegalAttribute
            | FsErrorKind::UnsupportedOnCreate
            | FsErrorKind::IllegalType
            | FsErrorKind::DuplicateView
            | FsErrorKind::ChannelError => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

/// The result type returned by every fallible operation in this crate.
pub type FsResult<T> = Result<T, FsError>;
