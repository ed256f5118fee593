//! # connector
//!
//! One live chain of client → connection → session → share, bound to a
//! single share path.

use std::sync::{Arc, Mutex};

use crate::auth::AuthContext;
use crate::client::{SmbClient, SmbConnection, SmbSession, SmbShare};
use crate::error::{CloseError, ConnectError};
use crate::path::SmbPath;

/// A pooled worker owning one connected session to one share.
///
/// Built unconnected, connected once via [`Connector::connect`], then used
/// through [`Connector::share`] until it is closed by the pool. Consumers
/// borrow the share handle; they never close the connector themselves.
pub struct Connector {
    path: SmbPath,
    auth: AuthContext,
    state: Mutex<ConnState>,
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("path", &self.path)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct ConnState {
    client: Option<Box<dyn SmbClient>>,
    connection: Option<Box<dyn SmbConnection>>,
    session: Option<Box<dyn SmbSession>>,
    share: Option<Arc<dyn SmbShare>>,
}

impl Connector {
    /// Create an unconnected worker for `path`.
    pub fn new(path: SmbPath, auth: AuthContext) -> Self {
        Self {
            path,
            auth,
            state: Mutex::new(ConnState::default()),
        }
    }

    /// The share path this worker is bound to.
    pub fn path(&self) -> &SmbPath {
        &self.path
    }

    /// Establish the chain: connect the transport, authenticate, bind the
    /// share. Fails fast at the first failed step; handles opened before
    /// the failing step are released before the error propagates.
    pub fn connect(&self, mut client: Box<dyn SmbClient>) -> Result<(), ConnectError> {
        trace!("connecting to {}", self.path);
        let mut connection = match client.connect(self.path.server()) {
            Ok(connection) => connection,
            Err(e) => {
                error!("cannot reach {}: {}", self.path.server(), e);
                close_quietly("client", client.close());
                return Err(ConnectError::Transport {
                    host: self.path.server().to_string(),
                    source: e,
                });
            }
        };
        let mut session = match connection.authenticate(&self.auth) {
            Ok(session) => session,
            Err(e) => {
                error!("authentication rejected by {}: {}", self.path.server(), e);
                close_quietly("connection", connection.close());
                close_quietly("client", client.close());
                return Err(ConnectError::Authentication {
                    host: self.path.server().to_string(),
                    source: e,
                });
            }
        };
        let share = match session.connect_share(self.path.share()) {
            Ok(share) => share,
            Err(e) => {
                error!("cannot bind share {}: {}", self.path.share(), e);
                close_quietly("session", session.close());
                close_quietly("connection", connection.close());
                close_quietly("client", client.close());
                return Err(ConnectError::ShareBind {
                    host: self.path.server().to_string(),
                    share: self.path.share().to_string(),
                    source: e,
                });
            }
        };
        let mut state = self.state.lock().expect("connector state lock poisoned");
        state.client = Some(client);
        state.connection = Some(connection);
        state.session = Some(session);
        state.share = Some(share);
        debug!("connected to {}", self.path);
        Ok(())
    }

    /// Whether the transport still reports an active connection. False for
    /// a never-connected or closed worker; never errors.
    pub fn is_connected(&self) -> bool {
        let state = self
            .state
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        state
            .connection
            .as_ref()
            .map(|connection| connection.is_connected())
            .unwrap_or(false)
    }

    /// The bound share handle; `None` before a successful connect or after
    /// close.
    pub fn share(&self) -> Option<Arc<dyn SmbShare>> {
        self.state
            .lock()
            .expect("connector state lock poisoned")
            .share
            .clone()
    }

    /// Release share, session, connection and client in that order. Each
    /// release is attempted independently; failures are logged and
    /// skipped. Safe to call any number of times.
    pub fn close(&self) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        if let Some(share) = state.share.take() {
            close_quietly("share", share.close());
        }
        if let Some(mut session) = state.session.take() {
            close_quietly("session", session.close());
        }
        if let Some(mut connection) = state.connection.take() {
            close_quietly("connection", connection.close());
        }
        if let Some(mut client) = state.client.take() {
            close_quietly("client", client.close());
        }
    }
}

impl Drop for Connector {
    fn drop(&mut self) {
        self.close();
    }
}

fn close_quietly(what: &str, result: Result<(), CloseError>) {
    if let Err(e) = result {
        warn!("ignoring failure releasing {}: {}", what, e);
    }
}
