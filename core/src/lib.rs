//! Blocking REST client layer for JSON web services.
//!
//! # Overview
//! Sends JSON requests over reused per-host connections, follows redirects,
//! retries transport failures and maps status codes to typed errors.
//! Resources cache their own metadata and reload it lazily.
//!
//! # Design
//! - A `Client` is owned by one execution context and passed explicitly to
//!   every `Resource` call; nothing is shared behind a global.
//! - The network sits behind the `Connector` / `Connection` traits.
//!   `UreqConnector` is the real transport; tests substitute their own.
//! - Status handling is a closed table (`status::StatusClass`) and every
//!   failure is a `RestError` variant carrying the URI or body involved.

pub mod cache;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod http;
pub mod resource;
pub mod script;
pub mod status;
pub mod uri;

#[cfg(test)]
mod testing;

pub use cache::{Properties, PropertyCache};
pub use client::Client;
pub use config::{Backoff, ClientConfig, RetryPolicy};
pub use connection::{Connection, Connector, Scheme, UreqConnection, UreqConnector};
pub use error::{FailureStage, RestError, TransportFailure};
pub use http::{HttpMethod, RawResponse, Request, Response};
pub use resource::Resource;
pub use script::{execute, ScriptHost, Service};
pub use status::StatusClass;
pub use uri::Uri;
