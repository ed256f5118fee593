//! # path
//!
//! SMB share path; used as the lookup key for pooled connections

use std::fmt;

use crate::error::PathParseError;

/// Identifies a `{server, share, path-within-share}` triple.
///
/// Parsed from an UNC path (`\\server\share\path\to\dir`); forward slashes
/// are accepted as well (`//server/share/path/to/dir`). The server and
/// share name are normalized to lowercase, so two paths spelled with
/// different casing or separators compare equal.
///
/// ```rust
/// use smb_pool::SmbPath;
///
/// let p = SmbPath::parse(r"\\fileserver\public\reports\2020").unwrap();
/// assert_eq!(p.server(), "fileserver");
/// assert_eq!(p.share(), "public");
/// assert_eq!(p.path(), "reports/2020");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SmbPath {
    server: String,
    share: String,
    path: String,
}

impl SmbPath {
    /// Parse an UNC path.
    ///
    /// Fails if the input is empty or carries no share name.
    pub fn parse<S: AsRef<str>>(s: S) -> Result<Self, PathParseError> {
        let trimmed = s
            .as_ref()
            .trim()
            .trim_start_matches(['\\', '/'])
            .trim_end_matches(['\\', '/']);
        if trimmed.is_empty() {
            return Err(PathParseError::Empty);
        }
        let mut components = trimmed
            .split(['\\', '/'])
            .filter(|c| !c.is_empty())
            .map(ToString::to_string);
        let server = match components.next() {
            Some(server) => server.to_lowercase(),
            None => return Err(PathParseError::Empty),
        };
        let share = match components.next() {
            Some(share) => share.to_lowercase(),
            None => return Err(PathParseError::MissingShare(s.as_ref().to_string())),
        };
        let path = components.collect::<Vec<String>>().join("/");
        Ok(Self {
            server,
            share,
            path,
        })
    }

    /// Server name, possibly with a port (`host` or `host:port`).
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Share name on the server.
    pub fn share(&self) -> &str {
        &self.share
    }

    /// Path within the share, `/`-separated, without a leading separator.
    /// Empty for the share root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Return a new path with `name` appended as a trailing component.
    pub fn join<S: AsRef<str>>(&self, name: S) -> Self {
        let name = name.as_ref().trim_matches(['\\', '/']);
        let path = if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.path, name)
        };
        Self {
            server: self.server.clone(),
            share: self.share.clone(),
            path,
        }
    }

    /// Last component of the path within the share; `None` for the share root.
    pub fn file_name(&self) -> Option<&str> {
        self.path.rsplit('/').next().filter(|s| !s.is_empty())
    }
}

impl fmt::Display for SmbPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, r"\\{}\{}", self.server, self.share)?;
        if !self.path.is_empty() {
            write!(f, r"\{}", self.path.replace('/', r"\"))?;
        }
        Ok(())
    }
}
