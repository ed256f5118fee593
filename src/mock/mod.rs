//! ## Mock
//!
//! Contains mock for test units: an env_logger bootstrap and an in-memory
//! transport backend with failure switches and call counters.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use remotefs::fs::{FileType, Metadata};
use remotefs::File;

use crate::auth::AuthContext;
use crate::client::{ClientFactory, SmbClient, SmbConnection, SmbSession, SmbShare, WriteMode};
use crate::config::SmbConfig;
use crate::error::{ClientError, CloseError};

// -- logger

#[allow(dead_code)]
pub fn logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// -- mock transport

/// Switchboard shared by every mock client built from it. Tests flip the
/// failure switches, kill live connections and read the call counters.
/// Cloning yields another handle to the same switchboard.
#[derive(Default, Clone)]
pub struct MockNet {
    inner: Arc<MockInner>,
}

#[derive(Default)]
struct MockInner {
    connects: AtomicUsize,
    client_closes: AtomicUsize,
    connection_closes: AtomicUsize,
    session_closes: AtomicUsize,
    share_closes: AtomicUsize,
    fail_connect: AtomicBool,
    fail_auth: AtomicBool,
    fail_bind: AtomicBool,
    /// Connected flags of every connection handed out, creation order.
    links: Mutex<Vec<Arc<AtomicBool>>>,
    /// In-memory share content, keyed by share-relative path.
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MockNet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory(&self) -> Box<dyn ClientFactory> {
        Box::new(MockFactory { net: self.clone() })
    }

    pub fn client(&self) -> Box<dyn SmbClient> {
        Box::new(MockClient { net: self.clone() })
    }

    /// A share handle detached from any connection chain; for exercising
    /// file operations directly.
    pub fn share(&self) -> Arc<dyn SmbShare> {
        Arc::new(MockShare { net: self.clone() })
    }

    pub fn seed_file(&self, path: &str, data: &[u8]) {
        self.inner
            .files
            .lock()
            .unwrap()
            .insert(path.to_string(), data.to_vec());
    }

    pub fn fail_connect(&self, fail: bool) {
        self.inner.fail_connect.store(fail, Ordering::SeqCst);
    }

    pub fn fail_auth(&self, fail: bool) {
        self.inner.fail_auth.store(fail, Ordering::SeqCst);
    }

    pub fn fail_bind(&self, fail: bool) {
        self.inner.fail_bind.store(fail, Ordering::SeqCst);
    }

    /// Flip every connection handed out so far to disconnected.
    pub fn kill_connections(&self) {
        for link in self.inner.links.lock().unwrap().iter() {
            link.store(false, Ordering::SeqCst);
        }
    }

    pub fn connects(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    pub fn client_closes(&self) -> usize {
        self.inner.client_closes.load(Ordering::SeqCst)
    }

    pub fn connection_closes(&self) -> usize {
        self.inner.connection_closes.load(Ordering::SeqCst)
    }

    pub fn session_closes(&self) -> usize {
        self.inner.session_closes.load(Ordering::SeqCst)
    }

    pub fn share_closes(&self) -> usize {
        self.inner.share_closes.load(Ordering::SeqCst)
    }
}

fn mock_error(message: &str) -> ClientError {
    Box::new(std::io::Error::new(
        std::io::ErrorKind::Other,
        message.to_string(),
    ))
}

struct MockFactory {
    net: MockNet,
}

impl ClientFactory for MockFactory {
    fn build(&self, _config: &SmbConfig) -> Result<Box<dyn SmbClient>, ClientError> {
        Ok(self.net.client())
    }
}

struct MockClient {
    net: MockNet,
}

impl SmbClient for MockClient {
    fn connect(&mut self, _host: &str) -> Result<Box<dyn SmbConnection>, ClientError> {
        if self.net.inner.fail_connect.load(Ordering::SeqCst) {
            return Err(mock_error("connection refused"));
        }
        self.net.inner.connects.fetch_add(1, Ordering::SeqCst);
        let link = Arc::new(AtomicBool::new(true));
        self.net.inner.links.lock().unwrap().push(Arc::clone(&link));
        Ok(Box::new(MockConnection {
            net: self.net.clone(),
            link,
        }))
    }

    fn close(&mut self) -> Result<(), CloseError> {
        self.net.inner.client_closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MockConnection {
    net: MockNet,
    link: Arc<AtomicBool>,
}

impl SmbConnection for MockConnection {
    fn authenticate(&mut self, _auth: &AuthContext) -> Result<Box<dyn SmbSession>, ClientError> {
        if self.net.inner.fail_auth.load(Ordering::SeqCst) {
            return Err(mock_error("access denied"));
        }
        Ok(Box::new(MockSession {
            net: self.net.clone(),
        }))
    }

    fn is_connected(&self) -> bool {
        self.link.load(Ordering::SeqCst)
    }

    fn close(&mut self) -> Result<(), CloseError> {
        self.net
            .inner
            .connection_closes
            .fetch_add(1, Ordering::SeqCst);
        self.link.store(false, Ordering::SeqCst);
        Ok(())
    }
}

struct MockSession {
    net: MockNet,
}

impl SmbSession for MockSession {
    fn connect_share(&mut self, _share: &str) -> Result<Arc<dyn SmbShare>, ClientError> {
        if self.net.inner.fail_bind.load(Ordering::SeqCst) {
            return Err(mock_error("share not found"));
        }
        Ok(self.net.share())
    }

    fn close(&mut self) -> Result<(), CloseError> {
        self.net.inner.session_closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MockShare {
    net: MockNet,
}

impl SmbShare for MockShare {
    fn read_to(&self, path: &str, out: &mut (dyn Write + Send)) -> Result<u64, ClientError> {
        let files = self.net.inner.files.lock().unwrap();
        let data = files.get(path).ok_or_else(|| mock_error("no such file"))?;
        out.write_all(data).map_err(|e| Box::new(e) as ClientError)?;
        Ok(data.len() as u64)
    }

    fn write_from(
        &self,
        path: &str,
        mode: WriteMode,
        input: &mut (dyn Read + Send),
    ) -> Result<u64, ClientError> {
        let mut buffer = Vec::new();
        input
            .read_to_end(&mut buffer)
            .map_err(|e| Box::new(e) as ClientError)?;
        let copied = buffer.len() as u64;
        let mut files = self.net.inner.files.lock().unwrap();
        match mode {
            WriteMode::Create => {
                if files.contains_key(path) {
                    return Err(mock_error("file already exists"));
                }
                files.insert(path.to_string(), buffer);
            }
            WriteMode::Overwrite => {
                files.insert(path.to_string(), buffer);
            }
            WriteMode::Append => {
                files.entry(path.to_string()).or_default().extend(buffer);
            }
        }
        Ok(copied)
    }

    fn list_dir(&self, path: &str) -> Result<Vec<File>, ClientError> {
        let files = self.net.inner.files.lock().unwrap();
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };
        let mut entries = Vec::new();
        let mut subdirs: Vec<String> = Vec::new();
        for (key, data) in files.iter() {
            let (parent, _) = key.rsplit_once('/').unwrap_or(("", key.as_str()));
            if parent == path {
                entries.push(File {
                    path: key.into(),
                    metadata: Metadata::default()
                        .file_type(FileType::File)
                        .size(data.len() as u64),
                });
                continue;
            }
            // deeper descendants imply an intermediate directory entry
            if let Some(rest) = key.strip_prefix(&prefix) {
                if let Some((subdir, _)) = rest.split_once('/') {
                    let subdir_path = format!("{prefix}{subdir}");
                    if !subdirs.contains(&subdir_path) {
                        subdirs.push(subdir_path);
                    }
                }
            }
        }
        for subdir in subdirs {
            entries.push(File {
                path: subdir.into(),
                metadata: Metadata::default().file_type(FileType::Directory),
            });
        }
        Ok(entries)
    }

    fn remove_file(&self, path: &str) -> Result<(), ClientError> {
        self.net
            .inner
            .files
            .lock()
            .unwrap()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| mock_error("no such file"))
    }

    fn close(&self) -> Result<(), CloseError> {
        self.net.inner.share_closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
