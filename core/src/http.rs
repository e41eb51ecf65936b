//! Request and response value objects.
//!
//! # Design
//! `Request` describes one logical call: method, target URI and an optional
//! JSON body. Redirect handling produces a copy with a new `uri` and the
//! same method and body. `Response` is what the client hands back after the
//! exchange, with the body already decoded. `RawResponse` is the undecoded
//! result of a single exchange on one connection.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{json, Value};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            other => Err(format!("unknown HTTP method: {other}")),
        }
    }
}

/// An outbound call described as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: HttpMethod,
    pub uri: String,
    pub body: Option<Value>,
}

impl Request {
    pub fn new(method: HttpMethod, uri: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method,
            uri: uri.into(),
            body,
        }
    }

    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, uri, None)
    }

    pub fn delete(uri: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, uri, None)
    }

    pub fn post(uri: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Post, uri, Some(body))
    }

    pub fn put(uri: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Put, uri, Some(body))
    }

    /// Build a request whose body is any serializable value.
    pub fn with_json<T: Serialize>(
        method: HttpMethod,
        uri: impl Into<String>,
        body: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(method, uri, Some(serde_json::to_value(body)?)))
    }

    /// The same call aimed at a different URI.
    pub fn redirected(&self, uri: impl Into<String>) -> Self {
        Self {
            method: self.method,
            uri: uri.into(),
            body: self.body.clone(),
        }
    }

    /// Render as one job of a batch submission.
    pub fn description(&self, id: u64) -> Value {
        json!({
            "id": id,
            "method": self.method.as_str(),
            "to": self.uri,
            "body": self.body,
        })
    }
}

/// The outcome of a completed exchange, after redirects.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    /// Final URI, after any redirects were followed.
    pub uri: String,
    pub location: Option<String>,
    /// Decoded JSON body; `None` when absent or not valid JSON.
    pub body: Option<Value>,
}

/// One undecoded exchange as returned by a `Connection`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub location: Option<String>,
    pub body: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("DELETE".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
        assert!("BREW".parse::<HttpMethod>().is_err());
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
    }

    #[test]
    fn redirected_keeps_method_and_body() {
        let req = Request::post("http://a/db/data/node", json!({"name": "Alice"}));
        let moved = req.redirected("http://b/db/data/node");
        assert_eq!(moved.method, HttpMethod::Post);
        assert_eq!(moved.body, req.body);
        assert_eq!(moved.uri, "http://b/db/data/node");
    }

    #[test]
    fn description_renders_batch_job() {
        let req = Request::put("http://a/db/data/node/1/properties", json!({"age": 3}));
        assert_eq!(
            req.description(7),
            json!({
                "id": 7,
                "method": "PUT",
                "to": "http://a/db/data/node/1/properties",
                "body": {"age": 3},
            })
        );
    }

    #[test]
    fn with_json_serializes_structs() {
        #[derive(Serialize)]
        struct Script<'a> {
            script: &'a str,
        }
        let req = Request::with_json(HttpMethod::Post, "http://a/x", &Script { script: "g.V" }).unwrap();
        assert_eq!(req.body, Some(json!({"script": "g.V"})));
    }
}
