//! Request construction.
//!
//! A [`RequestBuilder`] turns a verb, a list of path segments and query
//! parameters into a fully resolved [`RequestDescriptor`]. Nothing here
//! performs I/O.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::{Method, Url};

use crate::config::{ClientConfig, CredentialRecord, API_VERSION};
use crate::error::{Result, ZoteroError};

/// Header carrying the API version.
pub const VERSION_HEADER: &str = "Zotero-API-Version";

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "Zotero-API-Key";

/// Largest page size the API accepts.
pub const MAX_LIMIT: u32 = 100;

/// Query parameters, forwarded verbatim.
pub type Query = BTreeMap<String, String>;

/// HTTP verbs the client issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
}

impl Verb {
    /// Upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
        }
    }

    /// The matching `reqwest` method.
    pub fn method(&self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = ZoteroError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Verb::Get),
            "POST" => Ok(Verb::Post),
            _ => Err(ZoteroError::invalid_argument(format!(
                "verb must be GET or POST, got '{}'",
                s
            ))),
        }
    }
}

/// A single, fully assembled API call.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    verb: Verb,
    url: String,
    segments: Vec<String>,
    query: Query,
    headers: Vec<(String, String)>,
    timeout_secs: u64,
    /// The last URL segment is the API key.
    key_in_path: bool,
}

impl RequestDescriptor {
    pub fn verb(&self) -> Verb {
        self.verb
    }

    /// Target URL without the query string.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Path segments below the library (or key) prefix.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Look up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Target URL including the query string.
    pub fn resolved_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.url).map_err(|e| {
            ZoteroError::invalid_argument(format!("invalid URL {}: {}", self.url, e))
        })?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url)
    }
}

impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(k, v)| {
                if k.eq_ignore_ascii_case(API_KEY_HEADER) {
                    (k.as_str(), "<redacted>")
                } else {
                    (k.as_str(), v.as_str())
                }
            })
            .collect();
        let url = match (self.key_in_path, self.url.rsplit_once('/')) {
            (true, Some((prefix, _))) => format!("{}/<redacted>", prefix),
            _ => self.url.clone(),
        };

        f.debug_struct("RequestDescriptor")
            .field("verb", &self.verb)
            .field("url", &url)
            .field("query", &self.query)
            .field("headers", &headers)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Assembles requests for one credential.
#[derive(Clone)]
pub struct RequestBuilder {
    host: String,
    library_path: String,
    api_key: Option<String>,
}

impl fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("host", &self.host)
            .field("library_path", &self.library_path)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl RequestBuilder {
    pub fn new(config: &ClientConfig, credential: &CredentialRecord) -> Self {
        Self {
            host: config.host.trim_end_matches('/').to_string(),
            library_path: credential.library_path(),
            api_key: credential.api_key().map(str::to_string),
        }
    }

    /// Build a request below `<host>/<libraryType>/<id>/`.
    pub fn library(
        &self,
        verb: Verb,
        segments: &[String],
        query: &Query,
        timeout_secs: u64,
    ) -> Result<RequestDescriptor> {
        let prefix = format!("{}/{}", self.host, self.library_path);
        self.build(verb, prefix, segments, query, timeout_secs, false)
    }

    /// Build a request against `<host>/keys/<apiKey>`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the credential has no API key.
    pub fn key_introspection(
        &self,
        verb: Verb,
        query: &Query,
        timeout_secs: u64,
    ) -> Result<RequestDescriptor> {
        let key = self.api_key.as_deref().ok_or_else(|| {
            ZoteroError::invalid_argument("key lookup requires a private credential")
        })?;
        let prefix = format!("{}/keys/{}", self.host, urlencoding::encode(key));
        self.build(verb, prefix, &[], query, timeout_secs, true)
    }

    fn build(
        &self,
        verb: Verb,
        prefix: String,
        segments: &[String],
        query: &Query,
        timeout_secs: u64,
        key_in_path: bool,
    ) -> Result<RequestDescriptor> {
        if timeout_secs == 0 {
            return Err(ZoteroError::invalid_argument(
                "timeout must be a positive number of seconds",
            ));
        }
        validate_query(query)?;

        let mut url = prefix;
        for segment in segments {
            if segment.is_empty() {
                return Err(ZoteroError::invalid_argument("path segments cannot be empty"));
            }
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }

        let mut headers = vec![(VERSION_HEADER.to_string(), API_VERSION.to_string())];
        if let Some(key) = &self.api_key {
            headers.push((API_KEY_HEADER.to_string(), key.clone()));
        }

        Ok(RequestDescriptor {
            verb,
            url,
            segments: segments.to_vec(),
            query: query.clone(),
            headers,
            timeout_secs,
            key_in_path,
        })
    }
}

/// Check the query parameters the API constrains.
///
/// - `limit` must be an integer between 1 and 100
/// - `start` must be a non-negative integer
/// - `direction` must be `asc` or `desc`
///
/// Any other parameter passes through untouched.
pub fn validate_query(query: &Query) -> Result<()> {
    if let Some(limit) = query.get("limit") {
        match limit.parse::<u32>() {
            Ok(n) if (1..=MAX_LIMIT).contains(&n) => {}
            _ => {
                return Err(ZoteroError::invalid_argument(format!(
                    "limit must be between 1 and {}, got '{}'",
                    MAX_LIMIT, limit
                )))
            }
        }
    }

    if let Some(start) = query.get("start") {
        if start.parse::<u64>().is_err() {
            return Err(ZoteroError::invalid_argument(format!(
                "start must be a non-negative integer, got '{}'",
                start
            )));
        }
    }

    if let Some(direction) = query.get("direction") {
        if direction != "asc" && direction != "desc" {
            return Err(ZoteroError::invalid_argument(format!(
                "direction must be 'asc' or 'desc', got '{}'",
                direction
            )));
        }
    }

    Ok(())
}
