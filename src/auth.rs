//! # auth
//!
//! Authentication strategies for SMB shares

/// How to authenticate against a share.
///
/// The default is [`SmbAuthentication::Anonymous`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SmbAuthentication {
    /// Anonymous access; empty identity.
    #[default]
    Anonymous,
    /// "Guest" access.
    Guest,
    /// Domain/user/password access.
    User(UserCredentials),
}

impl SmbAuthentication {
    /// Resolve the strategy into the context consumed by the transport
    /// client when authenticating a connection.
    pub fn auth_context(&self) -> AuthContext {
        match self {
            Self::Anonymous => AuthContext::default(),
            Self::Guest => AuthContext {
                username: "guest".to_string(),
                ..Default::default()
            },
            Self::User(credentials) => AuthContext {
                username: credentials.username.clone(),
                password: credentials.password.clone(),
                domain: credentials.domain.clone().unwrap_or_default(),
            },
        }
    }
}

/// User/password/domain credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserCredentials {
    username: String,
    password: String,
    domain: Option<String>,
}

impl UserCredentials {
    /// Set the username
    pub fn username<S: AsRef<str>>(mut self, username: S) -> Self {
        self.username = username.as_ref().to_string();
        self
    }

    /// Set the password
    pub fn password<S: AsRef<str>>(mut self, password: S) -> Self {
        self.password = password.as_ref().to_string();
        self
    }

    /// Set the domain (workgroup)
    pub fn domain<S: AsRef<str>>(mut self, domain: S) -> Self {
        self.domain = Some(domain.as_ref().to_string());
        self
    }
}

/// Opaque identity handed to the transport client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    username: String,
    password: String,
    domain: String,
}

impl AuthContext {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}
