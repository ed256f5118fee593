//! # unix backend
//!
//! libsmbclient-backed transport, via `pavao`.
//!
//! libsmbclient has no separate connect/authenticate steps: a context is
//! configured up front and the server is actually contacted when the share
//! is first touched. The chain is mapped accordingly: `connect` and
//! `authenticate` accumulate host and identity, `connect_share` builds the
//! context and probes it, and failures of any of the three concerns
//! surface at the probe.

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use libc::mode_t;
use pavao::{SmbCredentials, SmbDirentType, SmbOpenOptions, SmbOptions, SmbStat};
use remotefs::fs::{FileType, Metadata, UnixPex};
use remotefs::File;

use crate::auth::AuthContext;
use crate::client::{ClientFactory, SmbClient, SmbConnection, SmbSession, SmbShare, WriteMode};
use crate::config::SmbConfig;
use crate::error::{ClientError, CloseError};

/// Builds libsmbclient-backed clients.
///
/// Extended configuration fields are forwarded where libsmbclient exposes
/// a matching knob; the rest keep the library defaults.
pub struct SmbcFactory;

impl ClientFactory for SmbcFactory {
    fn build(&self, config: &SmbConfig) -> Result<Box<dyn SmbClient>, ClientError> {
        Ok(Box::new(SmbcClient {
            config: config.clone(),
        }))
    }
}

/// libsmbclient contexts may be used from any thread as long as access is
/// serialized; the surrounding mutex does exactly that.
struct Context(pavao::SmbClient);

unsafe impl Send for Context {}

type SharedContext = Arc<Mutex<Option<Context>>>;

struct SmbcClient {
    config: SmbConfig,
}

impl SmbClient for SmbcClient {
    fn connect(&mut self, host: &str) -> Result<Box<dyn SmbConnection>, ClientError> {
        trace!("preparing smbc connection to {}", host);
        Ok(Box::new(SmbcConnection {
            host: host.to_string(),
            config: self.config.clone(),
            context: Arc::new(Mutex::new(None)),
        }))
    }

    fn close(&mut self) -> Result<(), CloseError> {
        Ok(())
    }
}

struct SmbcConnection {
    host: String,
    config: SmbConfig,
    context: SharedContext,
}

impl SmbConnection for SmbcConnection {
    fn authenticate(&mut self, auth: &AuthContext) -> Result<Box<dyn SmbSession>, ClientError> {
        Ok(Box::new(SmbcSession {
            host: self.host.clone(),
            config: self.config.clone(),
            auth: auth.clone(),
            context: Arc::clone(&self.context),
        }))
    }

    fn is_connected(&self) -> bool {
        let context = self
            .context
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        match context.as_ref() {
            Some(context) => context.0.get_user().is_ok(),
            None => false,
        }
    }

    fn close(&mut self) -> Result<(), CloseError> {
        self.context
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .take();
        Ok(())
    }
}

struct SmbcSession {
    host: String,
    config: SmbConfig,
    auth: AuthContext,
    context: SharedContext,
}

impl SmbSession for SmbcSession {
    fn connect_share(&mut self, share: &str) -> Result<Arc<dyn SmbShare>, ClientError> {
        trace!("binding share {} on {}", share, self.host);
        let credentials = SmbCredentials::default()
            .server(format!("smb://{}", self.host))
            .share(format!("/{}", share))
            .username(self.auth.username())
            .password(self.auth.password())
            .workgroup(self.auth.domain());
        let options = smb_options(&self.config);
        let client = pavao::SmbClient::new(credentials, options).map_err(boxed)?;
        // smbc contacts the server lazily; probe so a bad host, identity or
        // share name fails here instead of on the first file operation
        client.get_user().map_err(boxed)?;
        *self
            .context
            .lock()
            .expect("smb context lock poisoned") = Some(Context(client));
        Ok(Arc::new(SmbcShare {
            context: Arc::clone(&self.context),
        }))
    }

    fn close(&mut self) -> Result<(), CloseError> {
        Ok(())
    }
}

fn smb_options(_config: &SmbConfig) -> SmbOptions {
    // pavao exposes no timeout/buffer knobs; those fields only reach
    // backends that support them
    SmbOptions::default().one_share_per_server(true)
}

struct SmbcShare {
    context: SharedContext,
}

impl SmbcShare {
    fn with_context<T>(
        &self,
        f: impl FnOnce(&pavao::SmbClient) -> Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        let context = self.context.lock().expect("smb context lock poisoned");
        match context.as_ref() {
            Some(context) => f(&context.0),
            None => Err("share is closed".into()),
        }
    }
}

impl SmbShare for SmbcShare {
    fn read_to(&self, path: &str, out: &mut (dyn io::Write + Send)) -> Result<u64, ClientError> {
        self.with_context(|client| {
            let mut file = client
                .open_with(uri(path), SmbOpenOptions::default().read(true))
                .map_err(boxed)?;
            io::copy(&mut file, out).map_err(boxed)
        })
    }

    fn write_from(
        &self,
        path: &str,
        mode: WriteMode,
        input: &mut (dyn io::Read + Send),
    ) -> Result<u64, ClientError> {
        self.with_context(|client| {
            let target = uri(path);
            match mode {
                WriteMode::Create => {
                    if client.stat(target.as_str()).is_ok() {
                        return Err(format!("file {target} already exists").into());
                    }
                }
                WriteMode::Overwrite => {
                    // unlink first so the rewrite starts from an empty file
                    let _ = client.unlink(target.as_str());
                }
                WriteMode::Append => {}
            }
            let mut file = client
                .open_with(target, open_options(mode))
                .map_err(boxed)?;
            io::copy(input, &mut file).map_err(boxed)
        })
    }

    fn list_dir(&self, path: &str) -> Result<Vec<File>, ClientError> {
        self.with_context(|client| {
            let dir = uri(path);
            let dirents = client.list_dir(dir.as_str()).map_err(boxed)?;
            let mut files = Vec::new();
            for dirent in dirents {
                if dirent.get_type() != SmbDirentType::File
                    && dirent.get_type() != SmbDirentType::Dir
                {
                    continue;
                }
                let entry = if dir.ends_with('/') {
                    format!("{}{}", dir, dirent.name())
                } else {
                    format!("{}/{}", dir, dirent.name())
                };
                match client.stat(entry.as_str()) {
                    Ok(stat) => files.push(smbstat_to_file(entry, stat)),
                    Err(e) => warn!("cannot stat {}: {}", entry, e),
                }
            }
            Ok(files)
        })
    }

    fn remove_file(&self, path: &str) -> Result<(), ClientError> {
        self.with_context(|client| client.unlink(uri(path)).map_err(boxed))
    }

    fn close(&self) -> Result<(), CloseError> {
        self.context
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .take();
        Ok(())
    }
}

/// Share-relative path to a smbc uri.
fn uri(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        format!("/{path}")
    }
}

fn open_options(mode: WriteMode) -> SmbOpenOptions {
    match mode {
        WriteMode::Create | WriteMode::Overwrite => SmbOpenOptions::default()
            .create(true)
            .write(true)
            .mode(0o644 as mode_t),
        WriteMode::Append => SmbOpenOptions::default()
            .create(true)
            .append(true)
            .write(true)
            .mode(0o644 as mode_t),
    }
}

/// Convert `SmbStat` to `File`
fn smbstat_to_file(uri: String, stat: SmbStat) -> File {
    let mode = mode_t::from(stat.mode);
    File {
        path: PathBuf::from(uri),
        metadata: Metadata::default()
            .accessed(stat.accessed)
            .created(stat.created)
            .file_type(file_type_of(&stat))
            .gid(stat.gid)
            .mode(UnixPex::from(mode as u32))
            .modified(stat.modified)
            .size(stat.size)
            .uid(stat.uid),
    }
}

fn file_type_of(stat: &SmbStat) -> FileType {
    match stat.mode {
        mode if mode.is_dir() => FileType::Directory,
        mode if mode.is_symlink() => FileType::Symlink,
        _ => FileType::File,
    }
}

fn boxed<E: std::error::Error + Send + Sync + 'static>(e: E) -> ClientError {
    Box::new(e)
}
