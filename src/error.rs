//! # error
//!
//! Error types for the connection pool and the share operations

use thiserror::Error;

/// Boxed error produced by a transport backend.
pub type ClientError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure while establishing the client → connection → session → share
/// chain. The step that failed is reflected in the variant; no partial
/// state survives the failure.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The low-level client could not be built from the configuration.
    #[error("cannot build SMB client: {0}")]
    ClientBuild(#[source] ClientError),
    /// Transport-level connect to the server failed.
    #[error("cannot reach host {host}: {source}")]
    Transport {
        host: String,
        #[source]
        source: ClientError,
    },
    /// The server rejected the supplied authentication context.
    #[error("authentication rejected by {host}: {source}")]
    Authentication {
        host: String,
        #[source]
        source: ClientError,
    },
    /// The authenticated session could not bind the named share.
    #[error(r"cannot bind share \\{host}\{share}: {source}")]
    ShareBind {
        host: String,
        share: String,
        #[source]
        source: ClientError,
    },
    /// The pool has not been started (or has been stopped).
    #[error("connection pool is not started")]
    NotStarted,
}

/// Failure releasing a single resource during teardown.
///
/// Never crosses the pool boundary: teardown is best-effort and close
/// failures are logged and swallowed.
#[derive(Debug, Error)]
#[error("close failed: {0}")]
pub struct CloseError(#[source] pub ClientError);

/// Failure of a file operation against a bound share.
#[derive(Debug, Error)]
pub enum SmbIoError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: ClientError,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: ClientError,
    },
    #[error("cannot list {path}: {source}")]
    List {
        path: String,
        #[source]
        source: ClientError,
    },
    #[error("cannot remove {path}: {source}")]
    Remove {
        path: String,
        #[source]
        source: ClientError,
    },
}

/// Failure parsing an UNC path into an [`SmbPath`].
///
/// [`SmbPath`]: crate::SmbPath
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathParseError {
    #[error("UNC path is empty")]
    Empty,
    #[error("UNC path {0:?} has no share name")]
    MissingShare(String),
}
