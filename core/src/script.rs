//! Server-side script execution over a plugin endpoint.
//!
//! The host decides how requests are sent; this module only checks that the
//! endpoint exists and shapes the POST.

use serde_json::{json, Value};

use crate::client::Client;
use crate::connection::{Connector, UreqConnector};
use crate::error::RestError;
use crate::http::{Request, Response};
use crate::resource::Resource;

/// An object that can send requests and may expose a script endpoint.
pub trait ScriptHost {
    fn script_endpoint(&self) -> Option<&str>;

    fn send(&mut self, request: Request) -> Result<Option<Response>, RestError>;
}

/// Run `script` on the host and return the decoded result unchanged.
///
/// Fails with `NotSupported` without sending anything when the host has no
/// script endpoint.
pub fn execute<H: ScriptHost + ?Sized>(script: &str, host: &mut H) -> Result<Option<Value>, RestError> {
    let endpoint = host
        .script_endpoint()
        .ok_or_else(|| RestError::NotSupported("script execution not available".to_string()))?
        .to_string();
    let response = host.send(Request::post(endpoint, json!({ "script": script })))?;
    Ok(response.and_then(|r| r.body))
}

/// A service root together with the client used to reach it.
#[derive(Debug)]
pub struct Service<C: Connector = UreqConnector> {
    root: Resource,
    client: Client<C>,
    script_endpoint: Option<String>,
}

impl<C: Connector> Service<C> {
    pub fn new(root: Resource, client: Client<C>) -> Self {
        Self {
            root,
            client,
            script_endpoint: None,
        }
    }

    pub fn with_script_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.script_endpoint = Some(endpoint.into());
        self
    }

    pub fn root(&self) -> &Resource {
        &self.root
    }

    pub fn client_mut(&mut self) -> &mut Client<C> {
        &mut self.client
    }

    /// Metadata lookup on the service root.
    pub fn lookup(&mut self, key: &str) -> Result<Value, RestError> {
        self.root.lookup(&mut self.client, key)
    }
}

impl<C: Connector> ScriptHost for Service<C> {
    fn script_endpoint(&self) -> Option<&str> {
        self.script_endpoint.as_deref()
    }

    fn send(&mut self, request: Request) -> Result<Option<Response>, RestError> {
        self.root.send(&mut self.client, request)
    }
}
