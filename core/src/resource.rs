//! Addressable REST resources with lazily loaded metadata.
//!
//! # Design
//! A `Resource` owns no connection. Each call borrows the `Client` of the
//! calling context, so one client serves every resource used from that
//! context and no client state is hidden in globals. The response status
//! is mapped through `status::into_outcome`.

use std::fmt;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::cache::{Properties, PropertyCache};
use crate::client::Client;
use crate::connection::Connector;
use crate::error::RestError;
use crate::http::{Request, Response};
use crate::status::into_outcome;
use crate::uri::Uri;

/// A remote entity: its URI plus a lazily loaded metadata cache.
#[derive(Debug, Clone)]
pub struct Resource {
    uri: Uri,
    metadata: PropertyCache,
}

impl Resource {
    /// `marker` chooses where the URI is split into base and reference.
    pub fn new(uri: &str, marker: &str) -> Self {
        Self::with_metadata(uri, marker, None)
    }

    /// Start from previously obtained metadata.
    pub fn with_metadata(uri: &str, marker: &str, metadata: Option<Properties>) -> Self {
        Self {
            uri: Uri::split(uri, marker),
            metadata: PropertyCache::new(metadata, None),
        }
    }

    /// Reload metadata once it is older than `max_age`.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.metadata.set_max_age(Some(max_age));
        self
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn metadata(&self) -> &PropertyCache {
        &self.metadata
    }

    /// Send `request` and map the status code.
    ///
    /// Returns the response for 2xx codes other than 204, `None` for 204.
    pub fn send<C: Connector>(
        &self,
        client: &mut Client<C>,
        request: Request,
    ) -> Result<Option<Response>, RestError> {
        let request_uri = request.uri.clone();
        let response = client.send(request)?;
        into_outcome(response, &request_uri)
    }

    /// GET this resource and replace the metadata with the response body.
    pub fn refresh<C: Connector>(&mut self, client: &mut Client<C>) -> Result<(), RestError> {
        debug!(uri = %self.uri, "refreshing metadata");
        let response = self.send(client, Request::get(self.uri.to_string()))?;
        self.metadata.update_from_value(response.and_then(|r| r.body));
        Ok(())
    }

    /// Read a metadata value, loading the metadata first if it is empty or
    /// stale.
    pub fn lookup<C: Connector>(
        &mut self,
        client: &mut Client<C>,
        key: &str,
    ) -> Result<Value, RestError> {
        if self.metadata.needs_update() {
            self.refresh(client)?;
        }
        self.metadata.try_get(key).cloned()
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::http::HttpMethod;
    use crate::testing::Script;
    use serde_json::json;

    const NODE: &str = "http://localhost:7474/db/data/node/1";

    #[test]
    fn lookup_loads_metadata_once() {
        let script = Script::default();
        script.respond(200, None, r#"{"name": "Alice"}"#);
        let mut client = script.client();
        let mut node = Resource::new(NODE, "/node/");

        assert_eq!(node.lookup(&mut client, "name").unwrap(), json!("Alice"));
        assert_eq!(node.lookup(&mut client, "name").unwrap(), json!("Alice"));

        let calls = script.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, HttpMethod::Get);
        assert_eq!(calls[0].path, "/db/data/node/1");
    }

    #[test]
    fn lookup_missing_key_after_refresh() {
        let script = Script::default();
        script.respond(200, None, r#"{"name": "Alice"}"#);
        let mut client = script.client();
        let mut node = Resource::new(NODE, "/node/");

        let err = node.lookup(&mut client, "age").unwrap_err();
        assert!(matches!(err, RestError::KeyNotFound(ref k) if k == "age"));
        assert_eq!(script.calls().len(), 1);
    }

    #[test]
    fn lookup_uses_initial_metadata_without_request() {
        let script = Script::default();
        let mut client = script.client();
        let metadata = [("self".to_string(), json!(NODE))].into_iter().collect();
        let mut node = Resource::with_metadata(NODE, "/node/", Some(metadata));

        assert_eq!(node.lookup(&mut client, "self").unwrap(), json!(NODE));
        assert!(script.calls().is_empty());
    }

    #[test]
    fn stale_metadata_is_reloaded() {
        let script = Script::default();
        script
            .respond(200, None, r#"{"v": 1}"#)
            .respond(200, None, r#"{"v": 2}"#);
        let mut client = script.client();
        let mut node = Resource::new(NODE, "/node/").with_max_age(Duration::from_millis(1));

        assert_eq!(node.lookup(&mut client, "v").unwrap(), json!(1));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(node.lookup(&mut client, "v").unwrap(), json!(2));
        assert_eq!(script.calls().len(), 2);
    }

    #[test]
    fn send_maps_status_codes() {
        let script = Script::default();
        script
            .respond(204, None, "")
            .respond(404, None, "")
            .respond(400, None, r#"{"message": "invalid"}"#)
            .respond(409, None, "")
            .respond(500, None, r#"{"exception": "NullPointer"}"#);
        let mut client = script.client();
        let node = Resource::new(NODE, "/node/");

        assert!(node.send(&mut client, Request::delete(NODE)).unwrap().is_none());

        let err = node.send(&mut client, Request::get(NODE)).unwrap_err();
        assert!(matches!(err, RestError::ResourceNotFound { ref uri } if uri == NODE));

        let err = node.send(&mut client, Request::put(NODE, json!(1))).unwrap_err();
        assert!(matches!(err, RestError::BadRequest { body: Some(ref b) } if b["message"] == "invalid"));

        let err = node.send(&mut client, Request::delete(NODE)).unwrap_err();
        assert!(matches!(err, RestError::ResourceConflict { ref uri } if uri == NODE));

        let err = node.send(&mut client, Request::get(NODE)).unwrap_err();
        assert!(matches!(err, RestError::ServerError { status: 500, .. }));
    }

    #[test]
    fn not_found_after_redirect_reports_original_uri() {
        let script = Script::default();
        script
            .respond(301, Some("/db/data/node/2"), "")
            .respond(404, None, "");
        let mut client = script.client();
        let node = Resource::new(NODE, "/node/");

        let err = node.send(&mut client, Request::get(NODE)).unwrap_err();
        assert!(matches!(err, RestError::ResourceNotFound { ref uri } if uri == NODE));
    }

    #[test]
    fn transport_failure_propagates() {
        let script = Script::default();
        script.fail("refused").fail("refused");
        let config = ClientConfig {
            max_attempts: 2,
            ..ClientConfig::default()
        };
        let mut client = script.client_with(config);
        let mut node = Resource::new(NODE, "/node/");

        let err = node.lookup(&mut client, "name").unwrap_err();
        assert!(matches!(err, RestError::Transport { ref uri, .. } if uri == NODE));
    }

    #[test]
    fn equality_is_by_uri_only() {
        let metadata = [("a".to_string(), json!(1))].into_iter().collect();
        let a = Resource::with_metadata(NODE, "/node/", Some(metadata));
        let b = Resource::new(NODE, "/data/");
        assert_eq!(a, b);
        assert_ne!(a, Resource::new("http://localhost:7474/db/data/node/2", "/node/"));
        assert_eq!(a.to_string(), NODE);
        assert_eq!(a.uri().reference(), "/node/1");
    }
}
