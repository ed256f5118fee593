//! # client
//!
//! Trait boundary towards the low-level SMB transport.
//!
//! The pool never speaks the wire protocol itself; it drives a backend
//! through these traits. One [`SmbClient`] is built per connector and the
//! chain is always established in the same order: connect the transport,
//! authenticate the connection, bind the share.

use std::io::{Read, Write};
use std::sync::Arc;

use remotefs::File;

use crate::auth::AuthContext;
use crate::config::SmbConfig;
use crate::error::{ClientError, CloseError};

// -- unix backend

#[cfg(target_family = "unix")]
mod unix;
#[cfg(target_family = "unix")]
pub use unix::SmbcFactory;

/// Builds one low-level client per connector.
pub trait ClientFactory: Send + Sync {
    /// Build a fresh, unconnected client from the given configuration.
    fn build(&self, config: &SmbConfig) -> Result<Box<dyn SmbClient>, ClientError>;
}

/// A low-level SMB client; owns whatever process-level resources the
/// backend needs before a connection exists.
pub trait SmbClient: Send {
    /// Open a transport-level connection to `host` (`host` or `host:port`).
    fn connect(&mut self, host: &str) -> Result<Box<dyn SmbConnection>, ClientError>;

    /// Release the client's own resources.
    fn close(&mut self) -> Result<(), CloseError>;
}

/// A transport-level connection to a server.
pub trait SmbConnection: Send {
    /// Authenticate, producing a session.
    fn authenticate(&mut self, auth: &AuthContext) -> Result<Box<dyn SmbSession>, ClientError>;

    /// Whether the transport still reports an active connection.
    fn is_connected(&self) -> bool;

    /// Tear down the transport connection.
    fn close(&mut self) -> Result<(), CloseError>;
}

/// An authenticated session on a connection.
pub trait SmbSession: Send {
    /// Bind the named share, producing the handle file operations run on.
    fn connect_share(&mut self, share: &str) -> Result<Arc<dyn SmbShare>, ClientError>;

    /// Release the session.
    fn close(&mut self) -> Result<(), CloseError>;
}

/// How to open a remote file for writing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Create the file, failing if it already exists. The safest mode,
    /// since no intermediate staging file guarantees atomicity.
    #[default]
    Create,
    /// Open the (or create a new) file and overwrite it.
    Overwrite,
    /// Open the (or create a new) file and append to it.
    Append,
}

/// A share bound by an authenticated session.
///
/// Paths are relative to the share root, `/`-separated. Handles are shared
/// between all pool callers for the same share path, so every operation
/// takes `&self`.
pub trait SmbShare: Send + Sync {
    /// Copy the remote file at `path` into `out`; returns the bytes copied.
    fn read_to(&self, path: &str, out: &mut (dyn Write + Send)) -> Result<u64, ClientError>;

    /// Copy `input` into the remote file at `path`; returns the bytes copied.
    fn write_from(
        &self,
        path: &str,
        mode: WriteMode,
        input: &mut (dyn Read + Send),
    ) -> Result<u64, ClientError>;

    /// List the entries of the directory at `path`, files and directories
    /// alike. Filtering is up to the caller.
    fn list_dir(&self, path: &str) -> Result<Vec<File>, ClientError>;

    /// Remove the file at `path`.
    fn remove_file(&self, path: &str) -> Result<(), ClientError>;

    /// Release the share handle.
    fn close(&self) -> Result<(), CloseError>;
}
