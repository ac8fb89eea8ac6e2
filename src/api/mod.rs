//! Zotero Web API client.
//!
//! This module builds requests against the library-scoped REST surface,
//! sends them through a [`Transport`] and hands back the raw [`Response`].

mod endpoint;
mod history;
mod request;
mod session;
mod transport;

pub use endpoint::{Endpoint, Target};
pub use history::{LogEntry, RequestLog};
pub use request::{
    validate_query, Query, RequestBuilder, RequestDescriptor, Verb, API_KEY_HEADER, MAX_LIMIT,
    VERSION_HEADER,
};
pub use session::Session;
pub use transport::{ReqwestTransport, Response, Transport, LAST_MODIFIED_VERSION};
