//! Persistent connection handles, one per scheme and network location.
//!
//! # Design
//! `Connector` creates handles and `Connection` performs a single exchange
//! on one. The client owns the handles and decides when to replace them;
//! neither trait retries or follows redirects. `UreqConnector` backs each
//! handle with its own `ureq::Agent`, whose pool keeps the socket alive
//! between calls. Replacing the agent drops the pooled connections.

use std::fmt;
use std::str::FromStr;

use ::http::header::LOCATION;

use crate::error::{RestError, TransportFailure};
use crate::http::{HttpMethod, RawResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = RestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            other => Err(RestError::UnsupportedScheme(other.to_string())),
        }
    }
}

/// A live handle to one `scheme://netloc`.
pub trait Connection {
    /// Perform one exchange. `path` includes the query string. Any status
    /// code is a successful exchange; only connection-level problems fail.
    /// The whole body is read. A failure after the status line arrived is
    /// reported with `TransportFailure::reading_body`.
    fn request(
        &mut self,
        method: HttpMethod,
        path: &str,
        body: Option<&[u8]>,
        headers: &[(String, String)],
    ) -> Result<RawResponse, TransportFailure>;
}

/// Factory for connection handles.
pub trait Connector {
    type Connection: Connection;

    fn connect(&self, scheme: Scheme, netloc: &str) -> Self::Connection;
}

/// Blocking HTTP transport built on `ureq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqConnector;

impl Connector for UreqConnector {
    type Connection = UreqConnection;

    fn connect(&self, scheme: Scheme, netloc: &str) -> UreqConnection {
        UreqConnection::new(scheme, netloc)
    }
}

/// One `ureq::Agent` bound to a single origin.
pub struct UreqConnection {
    origin: String,
    agent: ureq::Agent,
}

impl UreqConnection {
    pub fn new(scheme: Scheme, netloc: &str) -> Self {
        // Status codes and redirects are handled by the client, so ureq must
        // hand every response back untouched.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(0)
            .max_redirects_will_error(false)
            .build()
            .new_agent();
        Self {
            origin: format!("{scheme}://{netloc}"),
            agent,
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }
}

impl fmt::Debug for UreqConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqConnection")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl Connection for UreqConnection {
    fn request(
        &mut self,
        method: HttpMethod,
        path: &str,
        body: Option<&[u8]>,
        headers: &[(String, String)],
    ) -> Result<RawResponse, TransportFailure> {
        let mut builder = ::http::Request::builder()
            .method(method.as_str())
            .uri(format!("{}{}", self.origin, path));
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let result = match body {
            Some(bytes) => self
                .agent
                .run(builder.body(bytes).map_err(TransportFailure::from_source)?),
            None => self
                .agent
                .run(builder.body(()).map_err(TransportFailure::from_source)?),
        };
        let mut response = result.map_err(TransportFailure::from_source)?;

        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        // No size cap: bodies are decoded whole.
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(TransportFailure::reading_body)?;

        Ok(RawResponse {
            status,
            location,
            body,
        })
    }
}
