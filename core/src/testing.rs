//! In-memory connector that replays canned exchanges and records calls.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::config::ClientConfig;
use crate::connection::{Connection, Connector, Scheme};
use crate::error::TransportFailure;
use crate::http::{HttpMethod, RawResponse};
use crate::Client;

#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub origin: String,
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Vec<u8>>,
    pub headers: Vec<(String, String)>,
}

/// Shared log and queue of canned outcomes, one per exchange.
#[derive(Clone, Default)]
pub(crate) struct Script {
    outcomes: Rc<RefCell<VecDeque<Result<RawResponse, TransportFailure>>>>,
    calls: Rc<RefCell<Vec<Call>>>,
    connects: Rc<RefCell<Vec<String>>>,
}

impl Script {
    pub fn respond(&self, status: u16, location: Option<&str>, body: &str) -> &Self {
        self.outcomes.borrow_mut().push_back(Ok(RawResponse {
            status,
            location: location.map(str::to_string),
            body: body.as_bytes().to_vec(),
        }));
        self
    }

    pub fn fail(&self, message: &str) -> &Self {
        self.outcomes
            .borrow_mut()
            .push_back(Err(TransportFailure::new(message)));
        self
    }

    /// The response arrives but its body cannot be read.
    pub fn fail_body(&self, message: &str) -> &Self {
        self.outcomes
            .borrow_mut()
            .push_back(Err(TransportFailure::reading_body(message)));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn connects(&self) -> Vec<String> {
        self.connects.borrow().clone()
    }

    pub fn client(&self) -> Client<ScriptedConnector> {
        self.client_with(ClientConfig::default())
    }

    pub fn client_with(&self, config: ClientConfig) -> Client<ScriptedConnector> {
        Client::with_connector(ScriptedConnector(self.clone()), &config)
    }
}

pub(crate) struct ScriptedConnector(pub Script);

pub(crate) struct ScriptedConnection {
    origin: String,
    script: Script,
}

impl Connector for ScriptedConnector {
    type Connection = ScriptedConnection;

    fn connect(&self, scheme: Scheme, netloc: &str) -> ScriptedConnection {
        let origin = format!("{scheme}://{netloc}");
        self.0.connects.borrow_mut().push(origin.clone());
        ScriptedConnection {
            origin,
            script: self.0.clone(),
        }
    }
}

impl Connection for ScriptedConnection {
    fn request(
        &mut self,
        method: HttpMethod,
        path: &str,
        body: Option<&[u8]>,
        headers: &[(String, String)],
    ) -> Result<RawResponse, TransportFailure> {
        self.script.calls.borrow_mut().push(Call {
            origin: self.origin.clone(),
            method,
            path: path.to_string(),
            body: body.map(<[u8]>::to_vec),
            headers: headers.to_vec(),
        });
        self.script
            .outcomes
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(TransportFailure::new("script exhausted")))
    }
}
