//! zotero-client - A client library for the Zotero Web API
//!
//! Resolves a named, locally stored profile to credentials, then issues
//! one request per call against the library endpoints (collections, items,
//! tags, searches, trash, publications, groups, key privileges) and returns
//! the unparsed response.
//!
//! ```no_run
//! use zotero_client::{Query, Session};
//!
//! # async fn run() -> zotero_client::Result<()> {
//! let session = Session::connect("work")?;
//! let response = session.items(None, true, &Query::new()).await?;
//! println!("{}", response.text());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod logging;

pub use api::{Endpoint, Query, Response, Session, Transport, Verb};
pub use config::{ClientConfig, CredentialRecord, CredentialStore, LibraryType, Privacy};
pub use error::{Result, ZoteroError};
