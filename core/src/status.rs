//! Status-code table mapping a response to its outcome.

use crate::error::RestError;
use crate::http::Response;

/// Codes the client follows transparently.
pub const REDIRECT_CODES: [u16; 5] = [301, 302, 303, 307, 308];

pub fn is_redirect(status: u16) -> bool {
    REDIRECT_CODES.contains(&status)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 200, 201 and the other 2xx codes apart from 204.
    Success,
    /// 204; any body is discarded.
    NoContent,
    Redirect,
    BadRequest,
    NotFound,
    Conflict,
    ServerError,
    /// 1xx, unfollowed 3xx and 4xx codes without a dedicated variant.
    Unmapped,
}

impl StatusClass {
    pub fn of(status: u16) -> Self {
        match status {
            204 => StatusClass::NoContent,
            200..=299 => StatusClass::Success,
            code if is_redirect(code) => StatusClass::Redirect,
            400 => StatusClass::BadRequest,
            404 => StatusClass::NotFound,
            409 => StatusClass::Conflict,
            500..=599 => StatusClass::ServerError,
            _ => StatusClass::Unmapped,
        }
    }
}

/// Turn a response into the value a resource call returns.
/// `request_uri` is the URI as originally requested, before redirects.
pub fn into_outcome(response: Response, request_uri: &str) -> Result<Option<Response>, RestError> {
    match StatusClass::of(response.status) {
        StatusClass::Success => Ok(Some(response)),
        StatusClass::NoContent => Ok(None),
        StatusClass::BadRequest => Err(RestError::BadRequest {
            body: response.body,
        }),
        StatusClass::NotFound => Err(RestError::ResourceNotFound {
            uri: request_uri.to_string(),
        }),
        StatusClass::Conflict => Err(RestError::ResourceConflict {
            uri: request_uri.to_string(),
        }),
        StatusClass::ServerError => Err(RestError::ServerError {
            status: response.status,
            body: response.body,
        }),
        StatusClass::Redirect | StatusClass::Unmapped => Err(RestError::UnexpectedStatus {
            status: response.status,
            uri: request_uri.to_string(),
            body: response.body,
        }),
    }
}
