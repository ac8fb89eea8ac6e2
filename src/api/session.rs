//! Zotero session handle.
//!
//! A [`Session`] owns one resolved credential and issues every API call
//! through a single [`Session::request`] operation. Each call is one round
//! trip: no retries, no pagination, no caching.

use tokio::time;
use tracing::{debug, info, instrument, warn};

use super::endpoint::{Endpoint, Target};
use super::history::{LogEntry, RequestLog};
use super::request::{Query, RequestBuilder, RequestDescriptor, Verb};
use super::transport::{ReqwestTransport, Response, Transport};
use crate::config::{ClientConfig, CredentialRecord, CredentialStore, Prompter, TerminalPrompter};
use crate::error::{Result, ZoteroError};

/// A stateful handle bound to one credential.
#[derive(Debug)]
pub struct Session<T = ReqwestTransport> {
    credential: CredentialRecord,
    config: ClientConfig,
    builder: RequestBuilder,
    transport: T,
    history: Option<RequestLog>,
}

impl Session<ReqwestTransport> {
    /// Open a session for a stored profile, prompting on the terminal if it
    /// does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The profile name is empty
    /// - The profile is missing and stdin is not a terminal
    /// - The HTTP client cannot be built
    pub fn connect(profile_name: &str) -> Result<Self> {
        let store = CredentialStore::new()?;
        Self::open(
            profile_name,
            &store,
            &mut TerminalPrompter::new(),
            ClientConfig::default(),
        )
    }

    /// Open a session resolving the profile through an explicit store and
    /// prompter.
    #[instrument(skip(store, prompter, config))]
    pub fn open(
        profile_name: &str,
        store: &CredentialStore,
        prompter: &mut dyn Prompter,
        config: ClientConfig,
    ) -> Result<Self> {
        config.validate()?;
        let credential = store.resolve(profile_name, prompter)?;
        let transport = ReqwestTransport::new(&config.user_agent)?;
        Self::with_transport(credential, config, transport)
    }
}

impl<T: Transport> Session<T> {
    /// Bind a credential to an explicit transport.
    pub fn with_transport(
        credential: CredentialRecord,
        config: ClientConfig,
        transport: T,
    ) -> Result<Self> {
        config.validate()?;
        credential.validate()?;

        let builder = RequestBuilder::new(&config, &credential);
        let history = config.record_history.then(RequestLog::new);

        info!(
            profile_name = %credential.name(),
            library = %credential.library_path(),
            "Session opened"
        );

        Ok(Self {
            credential,
            config,
            builder,
            transport,
            history,
        })
    }

    /// The bound credential.
    pub fn credential(&self) -> &CredentialRecord {
        &self.credential
    }

    /// Settings the session was opened with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The request log, if history recording is enabled.
    pub fn history(&self) -> Option<&RequestLog> {
        self.history.as_ref()
    }

    /// Issue a request below the bound library.
    ///
    /// # Arguments
    ///
    /// * `verb` - GET or POST
    /// * `path` - Segments after `<libraryType>/<id>/`
    /// * `query` - Parameters forwarded verbatim
    /// * `timeout_secs` - Positive timeout in seconds
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a zero timeout, an empty segment or a bad query
    /// - `Timeout` if the service does not answer in time
    /// - `RequestFailed` for a 4xx/5xx status
    pub async fn request(
        &self,
        verb: Verb,
        path: &[&str],
        query: &Query,
        timeout_secs: u64,
    ) -> Result<Response> {
        let segments: Vec<String> = path.iter().map(|s| s.to_string()).collect();
        let descriptor = self.builder.library(verb, &segments, query, timeout_secs)?;
        self.execute(descriptor).await
    }

    /// Issue a GET for a documented endpoint with the configured timeout.
    pub async fn request_endpoint(
        &self,
        endpoint: Endpoint<'_>,
        query: &Query,
    ) -> Result<Response> {
        endpoint.check_credential(&self.credential)?;
        let timeout_secs = self.config.timeout_secs;

        let descriptor = match endpoint.target()? {
            Target::Library(segments) => {
                self.builder.library(Verb::Get, &segments, query, timeout_secs)?
            }
            Target::Key => self.builder.key_introspection(Verb::Get, query, timeout_secs)?,
        };
        self.execute(descriptor).await
    }

    #[instrument(
        skip(self, descriptor),
        fields(verb = %descriptor.verb(), segments = ?descriptor.segments())
    )]
    async fn execute(&self, descriptor: RequestDescriptor) -> Result<Response> {
        debug!("Sending request");

        let sending = self.transport.send(&descriptor);
        let response = match time::timeout(descriptor.timeout(), sending).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(timeout_secs = descriptor.timeout_secs(), "Request timed out");
                return Err(ZoteroError::Timeout(descriptor.timeout_secs()));
            }
        };

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            warn!(status = %status, "Request failed");
            return Err(ZoteroError::RequestFailed {
                status: status.as_u16(),
                body: response.into_body(),
            });
        }

        if let Some(history) = &self.history {
            record(history, &descriptor, &response);
        }

        debug!(status = %status, version = ?response.version(), "Request succeeded");
        Ok(response)
    }

    /// All collections, or only top-level ones.
    pub async fn collections(&self, top: bool, query: &Query) -> Result<Response> {
        self.request_endpoint(Endpoint::Collections { top }, query).await
    }

    /// One collection, or its sub-collections.
    pub async fn collection(&self, key: &str, sub: bool, query: &Query) -> Result<Response> {
        self.request_endpoint(Endpoint::Collection { key, sub }, query).await
    }

    /// Items in the library, or in one collection.
    pub async fn items(
        &self,
        collection: Option<&str>,
        top: bool,
        query: &Query,
    ) -> Result<Response> {
        self.request_endpoint(Endpoint::Items { collection, top }, query).await
    }

    /// One item, or its children.
    pub async fn item(&self, key: &str, child: bool, query: &Query) -> Result<Response> {
        self.request_endpoint(Endpoint::Item { key, child }, query).await
    }

    /// Items in the trash.
    pub async fn trash_items(&self, query: &Query) -> Result<Response> {
        self.request_endpoint(Endpoint::TrashItems, query).await
    }

    /// Items in "My Publications".
    pub async fn publications_items(&self, query: &Query) -> Result<Response> {
        self.request_endpoint(Endpoint::PublicationsItems, query).await
    }

    /// All tags, or the tags matching `filter`.
    pub async fn tags(&self, filter: Option<&str>, query: &Query) -> Result<Response> {
        self.request_endpoint(Endpoint::Tags { filter }, query).await
    }

    /// Tags used in one collection.
    pub async fn collection_tags(&self, key: &str, query: &Query) -> Result<Response> {
        self.request_endpoint(Endpoint::CollectionTags { key }, query).await
    }

    /// Tags of the items in the library, or in one collection.
    pub async fn items_tags(
        &self,
        collection: Option<&str>,
        top: bool,
        query: &Query,
    ) -> Result<Response> {
        self.request_endpoint(Endpoint::ItemsTags { collection, top }, query).await
    }

    /// Tags of one item.
    pub async fn item_tags(&self, key: &str, query: &Query) -> Result<Response> {
        self.request_endpoint(Endpoint::ItemTags { key }, query).await
    }

    /// Tags of the items in the trash.
    pub async fn trash_tags(&self, query: &Query) -> Result<Response> {
        self.request_endpoint(Endpoint::TrashTags, query).await
    }

    /// Tags of the items in "My Publications".
    pub async fn publications_tags(&self, query: &Query) -> Result<Response> {
        self.request_endpoint(Endpoint::PublicationsTags, query).await
    }

    /// All saved searches.
    pub async fn searches(&self, query: &Query) -> Result<Response> {
        self.request_endpoint(Endpoint::Searches, query).await
    }

    /// One saved search.
    pub async fn search(&self, key: &str, query: &Query) -> Result<Response> {
        self.request_endpoint(Endpoint::Search { key }, query).await
    }

    /// Privileges of the bound API key. Requires a private credential.
    pub async fn privileges(&self, query: &Query) -> Result<Response> {
        self.request_endpoint(Endpoint::Privileges, query).await
    }

    /// Groups of the bound user. Requires a user library.
    pub async fn groups(&self, query: &Query) -> Result<Response> {
        self.request_endpoint(Endpoint::Groups, query).await
    }
}

/// Append a log entry. Failures here never reach the caller.
fn record(history: &RequestLog, descriptor: &RequestDescriptor, response: &Response) {
    let url = match descriptor.resolved_url() {
        Ok(url) => url.to_string(),
        Err(e) => {
            warn!("Skipping request log entry: {}", e);
            return;
        }
    };

    history.record(LogEntry {
        timestamp: response.received_at(),
        url,
        status: response.status().as_u16(),
        version: response.version().map(str::to_string),
        content_type: response.content_type().map(str::to_string),
    });
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tempfile::tempdir;
    use tokio_test::{assert_err, assert_ok};

    use super::super::request::API_KEY_HEADER;
    use super::super::transport::testing::StubTransport;
    use super::*;
    use crate::config::testing::ScriptedPrompter;
    use crate::config::LibraryType;

    fn user_credential() -> CredentialRecord {
        CredentialRecord::private("work", "12345", LibraryType::Users, "secret").unwrap()
    }

    fn session(transport: StubTransport) -> Session<StubTransport> {
        Session::with_transport(user_credential(), ClientConfig::default(), transport).unwrap()
    }

    fn query(pairs: &[(&str, &str)]) -> Query {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_items_request() {
        let session = session(StubTransport::ok());
        let response = assert_ok!(session.items(None, true, &query(&[("limit", "10")])).await);
        assert_eq!(response.status().as_u16(), 200);

        let sent = session.transport.last_request().unwrap();
        assert_eq!(sent.url(), "https://api.zotero.org/users/12345/items/top");
        assert_eq!(sent.query().get("limit").map(String::as_str), Some("10"));
        assert_eq!(sent.header(API_KEY_HEADER), Some("secret"));
        assert_eq!(sent.timeout_secs(), 20);
        assert_eq!(sent.verb(), Verb::Get);
    }

    #[tokio::test]
    async fn test_collection_scoped_items() {
        let session = session(StubTransport::ok());
        assert_ok!(session.items(Some("C1"), false, &Query::new()).await);
        let sent = session.transport.last_request().unwrap();
        assert_eq!(sent.segments(), ["collections", "C1", "items"]);
    }

    #[tokio::test]
    async fn test_item_children() {
        let session = session(StubTransport::ok());
        assert_ok!(session.item("I1", true, &Query::new()).await);
        let sent = session.transport.last_request().unwrap();
        assert_eq!(sent.segments(), ["items", "I1", "children"]);
    }

    #[tokio::test]
    async fn test_search_includes_key() {
        let session = session(StubTransport::ok());
        assert_ok!(session.search("S1", &Query::new()).await);
        let sent = session.transport.last_request().unwrap();
        assert_eq!(sent.url(), "https://api.zotero.org/users/12345/searches/S1");
    }

    #[tokio::test]
    async fn test_privileges_targets_key() {
        let session = session(StubTransport::ok());
        assert_ok!(session.privileges(&Query::new()).await);
        let sent = session.transport.last_request().unwrap();
        assert_eq!(sent.url(), "https://api.zotero.org/keys/secret");
    }

    #[tokio::test]
    async fn test_privileges_requires_private() {
        let credential = CredentialRecord::public("open", "777").unwrap();
        let session =
            Session::with_transport(credential, ClientConfig::default(), StubTransport::ok())
                .unwrap();
        let err = assert_err!(session.privileges(&Query::new()).await);
        assert!(matches!(err, ZoteroError::InvalidArgument(_)));
        assert_eq!(session.transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_groups_requires_user_library() {
        let credential =
            CredentialRecord::private("lab", "42", LibraryType::Groups, "secret").unwrap();
        let session =
            Session::with_transport(credential, ClientConfig::default(), StubTransport::ok())
                .unwrap();
        let err = assert_err!(session.groups(&Query::new()).await);
        assert!(matches!(err, ZoteroError::InvalidArgument(_)));
        assert_eq!(session.transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_groups_for_user() {
        let session = session(StubTransport::ok());
        assert_ok!(session.groups(&Query::new()).await);
        let sent = session.transport.last_request().unwrap();
        assert_eq!(sent.url(), "https://api.zotero.org/users/12345/groups");
    }

    #[tokio::test]
    async fn test_empty_key_makes_no_call() {
        let session = session(StubTransport::ok());
        let err = assert_err!(session.collection("", false, &Query::new()).await);
        assert!(matches!(err, ZoteroError::InvalidArgument(_)));
        assert_eq!(session.transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_query_makes_no_call() {
        let session = session(StubTransport::ok());
        let err = assert_err!(session.tags(None, &query(&[("limit", "500")])).await);
        assert!(matches!(err, ZoteroError::InvalidArgument(_)));
        assert_eq!(session.transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_not_found_is_request_failed() {
        let config = ClientConfig::default().with_history(true);
        let session = Session::with_transport(
            user_credential(),
            config,
            StubTransport::new(404, "Collection not found"),
        )
        .unwrap();

        let err = assert_err!(session.collection("MISSING1", false, &Query::new()).await);
        match err {
            ZoteroError::RequestFailed { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "Collection not found");
            }
            other => panic!("Expected RequestFailed, got {:?}", other),
        }
        assert!(session.history().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_request_failed() {
        let session = session(StubTransport::new(503, "down"));
        let err = assert_err!(session.searches(&Query::new()).await);
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_transport_times_out() {
        let config = ClientConfig::default().with_timeout(1);
        let session = Session::with_transport(
            user_credential(),
            config,
            StubTransport::ok().with_delay(Duration::from_millis(2500)),
        )
        .unwrap();

        let err = assert_err!(session.trash_items(&Query::new()).await);
        assert!(matches!(err, ZoteroError::Timeout(1)));
    }

    #[tokio::test]
    async fn test_history_records_success() {
        let config = ClientConfig::default().with_history(true);
        let session =
            Session::with_transport(user_credential(), config, StubTransport::ok()).unwrap();

        assert_ok!(session.collections(true, &query(&[("limit", "5")])).await);
        assert_ok!(session.trash_tags(&Query::new()).await);

        let entries = session.history().unwrap().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].url,
            "https://api.zotero.org/users/12345/collections/top?limit=5"
        );
        assert_eq!(entries[0].status, 200);
        assert_eq!(entries[0].version.as_deref(), Some("1234"));
        assert_eq!(entries[0].content_type.as_deref(), Some("application/json"));
        assert_eq!(
            entries[1].url,
            "https://api.zotero.org/users/12345/items/trash/tags"
        );
    }

    #[tokio::test]
    async fn test_history_disabled_by_default() {
        let session = session(StubTransport::ok());
        assert_ok!(session.searches(&Query::new()).await);
        assert!(session.history().is_none());
    }

    #[tokio::test]
    async fn test_raw_request() {
        let session = session(StubTransport::ok());
        assert_ok!(
            session
                .request(Verb::Post, &["items"], &Query::new(), 5)
                .await
        );
        let sent = session.transport.last_request().unwrap();
        assert_eq!(sent.verb(), Verb::Post);
        assert_eq!(sent.timeout_secs(), 5);
    }

    #[tokio::test]
    async fn test_raw_request_zero_timeout() {
        let session = session(StubTransport::ok());
        let err = assert_err!(session.request(Verb::Get, &["items"], &Query::new(), 0).await);
        assert!(matches!(err, ZoteroError::InvalidArgument(_)));
        assert_eq!(session.transport.calls(), 0);
    }

    #[test]
    fn test_open_loads_stored_profile() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::at(dir.path());
        store
            .save(&user_credential(), &mut ScriptedPrompter::new(&[]))
            .unwrap();

        let mut prompter = ScriptedPrompter::detached();
        let session = Session::open("work", &store, &mut prompter, ClientConfig::default())
            .unwrap();
        assert_eq!(session.credential(), &user_credential());
        assert!(prompter.questions.is_empty());
    }

    #[test]
    fn test_open_missing_profile_without_terminal() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::at(dir.path());
        let result = Session::open(
            "work",
            &store,
            &mut ScriptedPrompter::detached(),
            ClientConfig::default(),
        );
        assert!(matches!(result, Err(ZoteroError::Environment(_))));
    }
}
