#![crate_name = "smb_pool"]
#![crate_type = "lib"]

//! # smb-pool
//!
//! smb-pool keeps a bounded, self-expiring pool of connections to remote
//! SMB shares, so concurrent file operations can reuse an established
//! session instead of paying the connect/authenticate/bind cost on every
//! call.
//!
//! ## Get started
//!
//! First of all you need to add **smb-pool** to your project dependencies:
//!
//! ```toml
//! smb-pool = "^0.1"
//! ```
//!
//! these features are supported:
//!
//! - `no-log`: disable logging. By default, this library will log via the `log` crate.
//!
//! ## Pool usage
//!
//! Build an [`SmbPool`] with an authentication strategy and a transport
//! configuration, start it, then ask it for connectors. Connectors stay
//! owned by the pool: up to 50 of them are cached with a 15-minute sliding
//! expiry, dead ones are replaced transparently, and evicted ones are
//! closed in the background.
//!
//! ```rust,no_run
//! use smb_pool::{ops, SmbAuthentication, SmbPath, SmbPool, SmbcFactory, UserCredentials};
//!
//! let pool = SmbPool::new(Box::new(SmbcFactory))
//!     .with_authentication(SmbAuthentication::User(
//!         UserCredentials::default()
//!             .username("test")
//!             .password("test")
//!             .domain("WORKGROUP"),
//!     ));
//! pool.start();
//!
//! // one pooled connection per share path
//! let dir = SmbPath::parse(r"\\fileserver\public\inbox").unwrap();
//! let connector = pool.get_or_create(&dir).unwrap();
//! let share = connector.share().unwrap();
//!
//! // move bytes through the borrowed share handle
//! for file in ops::list_dir(share.as_ref(), &dir, None).unwrap() {
//!     println!("{}", file.name());
//! }
//!
//! pool.stop();
//! ```

#![doc(html_playground_url = "https://play.rust-lang.org")]

// -- crates
#[macro_use]
extern crate log;

mod auth;
mod cache;
mod client;
mod config;
mod connector;
mod error;
pub mod ops;
mod path;
mod pool;

pub use auth::{AuthContext, SmbAuthentication, UserCredentials};
pub use cache::{EvictionListener, ExpiringCache};
#[cfg(target_family = "unix")]
pub use client::SmbcFactory;
pub use client::{ClientFactory, SmbClient, SmbConnection, SmbSession, SmbShare, WriteMode};
pub use config::SmbConfig;
pub use connector::Connector;
pub use error::{ClientError, CloseError, ConnectError, PathParseError, SmbIoError};
pub use path::SmbPath;
pub use pool::SmbPool;

// -- mock
#[cfg(test)]
pub(crate) mod mock;
