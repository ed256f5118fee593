//! # config
//!
//! Transport configuration for SMB clients

use std::time::Duration;

/// Configuration applied when building a low-level SMB client.
///
/// The default configuration leaves every field unset, which keeps the
/// backend defaults; probably acceptable in most cases. Unset fields are
/// never forwarded to the backend.
///
/// ```rust
/// use std::time::Duration;
/// use smb_pool::SmbConfig;
///
/// let config = SmbConfig::default()
///     .timeout(Duration::from_secs(30))
///     .signing_required(true);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmbConfig {
    workstation_name: Option<String>,
    signing_required: Option<bool>,
    dfs_enabled: Option<bool>,
    multi_protocol_negotiate: Option<bool>,
    buffer_size: Option<usize>,
    so_timeout: Option<Duration>,
    timeout: Option<Duration>,
}

impl SmbConfig {
    /// Set the workstation name presented to the server
    pub fn workstation_name<S: AsRef<str>>(mut self, name: S) -> Self {
        self.workstation_name = Some(name.as_ref().to_string());
        self
    }

    /// Require message signing on the connection
    pub fn signing_required(mut self, required: bool) -> Self {
        self.signing_required = Some(required);
        self
    }

    /// Enable DFS path resolution
    pub fn dfs_enabled(mut self, enabled: bool) -> Self {
        self.dfs_enabled = Some(enabled);
        self
    }

    /// Enable multi-protocol negotiation
    pub fn multi_protocol_negotiate(mut self, enabled: bool) -> Self {
        self.multi_protocol_negotiate = Some(enabled);
        self
    }

    /// Read/write/transact buffer size in bytes
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = Some(size);
        self
    }

    /// Socket-level timeout
    pub fn so_timeout(mut self, timeout: Duration) -> Self {
        self.so_timeout = Some(timeout);
        self
    }

    /// Read/write/transact timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    // -- getters

    pub fn get_workstation_name(&self) -> Option<&str> {
        self.workstation_name.as_deref()
    }

    pub fn get_signing_required(&self) -> Option<bool> {
        self.signing_required
    }

    pub fn get_dfs_enabled(&self) -> Option<bool> {
        self.dfs_enabled
    }

    pub fn get_multi_protocol_negotiate(&self) -> Option<bool> {
        self.multi_protocol_negotiate
    }

    pub fn get_buffer_size(&self) -> Option<usize> {
        self.buffer_size
    }

    pub fn get_so_timeout(&self) -> Option<Duration> {
        self.so_timeout
    }

    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
