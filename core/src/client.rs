//! Connection-reusing HTTP client with retry and redirect following.
//!
//! # Design
//! A `Client` belongs to one execution context and is never shared, so it
//! holds plain maps of connection handles keyed by network location, one
//! map per scheme. `send` runs one logical call:
//!
//! 1. Split the target URI into scheme, network location and path.
//! 2. Encode the body as JSON once.
//! 3. Attempt the exchange up to `RetryPolicy::max_attempts` times,
//!    replacing the connection handle after each transport failure. The
//!    last failure surfaces as `RestError::Transport`. A failure while
//!    reading the body of a response is never retried, since the request
//!    already reached the server.
//! 4. On a redirect status, resolve `Location` and repeat with the same
//!    method and body, up to `max_redirects` hops.
//! 5. Otherwise decode the body; invalid JSON becomes `None`.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, RetryPolicy};
use crate::connection::{Connection, Connector, Scheme, UreqConnector};
use crate::error::RestError;
use crate::http::{RawResponse, Request, Response};
use crate::status::is_redirect;

/// Headers sent with every request.
pub const DEFAULT_HEADERS: [(&str, &str); 3] = [
    ("Accept", "application/json"),
    ("Content-Type", "application/json"),
    ("X-Stream", "true"),
];

/// HTTP client owning the connection handles of one execution context.
pub struct Client<C: Connector = UreqConnector> {
    connector: C,
    http: HashMap<String, C::Connection>,
    https: HashMap<String, C::Connection>,
    headers: Vec<(String, String)>,
    retry: RetryPolicy,
    max_redirects: usize,
}

impl Client<UreqConnector> {
    pub fn new() -> Self {
        Self::with_connector(UreqConnector, &ClientConfig::default())
    }

    pub fn with_config(config: &ClientConfig) -> Self {
        Self::with_connector(UreqConnector, config)
    }
}

impl Default for Client<UreqConnector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector> fmt::Debug for Client<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("http", &self.http.keys().collect::<Vec<_>>())
            .field("https", &self.https.keys().collect::<Vec<_>>())
            .field("retry", &self.retry)
            .field("max_redirects", &self.max_redirects)
            .finish()
    }
}

impl<C: Connector> Client<C> {
    pub fn with_connector(connector: C, config: &ClientConfig) -> Self {
        Self {
            connector,
            http: HashMap::new(),
            https: HashMap::new(),
            headers: DEFAULT_HEADERS
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            retry: config.retry_policy(),
            max_redirects: config.max_redirects,
        }
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Look up or create the handle for `scheme://netloc`.
    /// `force_reconnect` always replaces an existing handle.
    pub fn connection_for(
        &mut self,
        scheme: &str,
        netloc: &str,
        force_reconnect: bool,
    ) -> Result<&mut C::Connection, RestError> {
        let scheme: Scheme = scheme.parse()?;
        let connector = &self.connector;
        let pool = match scheme {
            Scheme::Http => &mut self.http,
            Scheme::Https => &mut self.https,
        };
        let connection = match pool.entry(netloc.to_string()) {
            Entry::Occupied(mut entry) => {
                if force_reconnect {
                    debug!(%scheme, netloc, "reconnecting");
                    entry.insert(connector.connect(scheme, netloc));
                }
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(connector.connect(scheme, netloc)),
        };
        Ok(connection)
    }

    pub fn send(&mut self, mut request: Request) -> Result<Response, RestError> {
        let mut hops = 0;
        loop {
            let raw = self.exchange(&request)?;
            if !is_redirect(raw.status) {
                return Ok(Response {
                    status: raw.status,
                    uri: request.uri,
                    location: raw.location,
                    body: decode_body(&raw.body),
                });
            }

            let location = raw.location.ok_or_else(|| RestError::MissingLocation {
                status: raw.status,
                uri: request.uri.clone(),
            })?;
            hops += 1;
            if hops > self.max_redirects {
                warn!(uri = %request.uri, max = self.max_redirects, "too many redirects");
                return Err(RestError::TooManyRedirects {
                    uri: request.uri,
                    max: self.max_redirects,
                });
            }
            let next = resolve_location(&request.uri, &location)?;
            debug!(status = raw.status, from = %request.uri, to = %next, "following redirect");
            request.uri = next;
        }
    }

    fn exchange(&mut self, request: &Request) -> Result<RawResponse, RestError> {
        let target = Target::parse(&request.uri)?;
        let payload = request.body.as_ref().map(serde_json::to_vec).transpose()?;
        let headers = self.headers.clone();
        let policy = self.retry;

        let mut reconnect = false;
        let mut attempt = 0;
        loop {
            attempt += 1;
            let connection = self.connection_for(&target.scheme, &target.netloc, reconnect)?;
            info!(method = %request.method, path = %target.path, attempt, "sending request");
            match connection.request(request.method, &target.path, payload.as_deref(), &headers) {
                Ok(raw) => return Ok(raw),
                Err(failure) if failure.is_retryable() && attempt < policy.max_attempts => {
                    warn!(uri = %request.uri, attempt, error = %failure, "transport failure, retrying");
                    reconnect = policy.reconnect;
                    let delay = policy.delay_after(attempt);
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                }
                Err(failure) => {
                    return Err(RestError::Transport {
                        uri: request.uri.clone(),
                        source: failure,
                    })
                }
            }
        }
    }
}

/// Scheme, network location and path-with-query of a request URI.
#[derive(Debug, PartialEq, Eq)]
struct Target {
    scheme: String,
    netloc: String,
    path: String,
}

impl Target {
    fn parse(uri: &str) -> Result<Self, RestError> {
        let invalid = |reason: &str| RestError::InvalidUri {
            uri: uri.to_string(),
            reason: reason.to_string(),
        };
        let parsed: ::http::Uri = uri.parse().map_err(|e: ::http::uri::InvalidUri| invalid(&e.to_string()))?;
        let scheme = parsed.scheme_str().ok_or_else(|| invalid("missing scheme"))?;
        let netloc = parsed.authority().ok_or_else(|| invalid("missing host"))?;
        let path = parsed
            .path_and_query()
            .map(|pq| pq.as_str())
            .filter(|pq| !pq.is_empty())
            .unwrap_or("/");
        Ok(Self {
            scheme: scheme.to_string(),
            netloc: netloc.as_str().to_string(),
            path: path.to_string(),
        })
    }
}

/// Resolve a `Location` header against the URI that produced it.
fn resolve_location(current: &str, location: &str) -> Result<String, RestError> {
    if let Ok(uri) = location.parse::<::http::Uri>() {
        if uri.scheme().is_some() && uri.authority().is_some() {
            return Ok(location.to_string());
        }
    }

    let base = Target::parse(current)?;
    if location.starts_with("//") {
        return Ok(format!("{}:{}", base.scheme, location));
    }
    if location.starts_with('/') {
        return Ok(format!("{}://{}{}", base.scheme, base.netloc, location));
    }
    let path = base.path.split(|c: char| c == '?' || c == '#').next().unwrap_or("/");
    if location.is_empty() || location.starts_with('?') {
        return Ok(format!("{}://{}{}{}", base.scheme, base.netloc, path, location));
    }
    if location.starts_with('#') {
        let query = base.path.split('#').next().unwrap_or(path);
        return Ok(format!("{}://{}{}{}", base.scheme, base.netloc, query, location));
    }
    let dir = path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    Ok(format!("{}://{}{}/{}", base.scheme, base.netloc, dir, location))
}

fn decode_body(body: &[u8]) -> Option<Value> {
    if body.is_empty() {
        return None;
    }
    serde_json::from_slice::<Value>(body)
        .ok()
        .filter(|value| !value.is_null())
}
