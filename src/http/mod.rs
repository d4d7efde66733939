//! Backend API primitives seen from the client side.
//!
//! The storefront never serves HTTP itself; it consumes a REST-like backend.
//! This module provides the two pieces of that contract the cache layer
//! depends on: [`StatusCode`] for classifying failures, and [`ApiResponse`]
//! for unwrapping the backend's `{data, message, success, meta?}` envelope.

use std::fmt;

pub mod envelope;

pub use envelope::{ApiResponse, PageMeta};

/// An HTTP response status code as reported by the backend.
///
/// Only the codes the backend is known to emit get their own variant; any
/// other value is kept verbatim in [`StatusCode::Other`] so classification
/// still works on the numeric range.
///
/// # Examples
///
/// ```
/// use aircare::http::StatusCode;
///
/// let status = StatusCode::from_u16(404);
/// assert_eq!(status, StatusCode::NotFound);
/// assert!(status.is_client_error());
/// assert_eq!(status.canonical_reason(), "Not Found");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    // 2xx Success
    Ok,
    Created,
    NoContent,

    // 4xx Client Error
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    Gone,
    UnprocessableEntity,
    TooManyRequests,

    // 5xx Server Error
    InternalServerError,
    BadGateway,
    ServiceUnavailable,
    GatewayTimeout,

    /// Any status without a dedicated variant.
    Other(u16),
}

impl StatusCode {
    /// Maps a numeric status onto a variant.
    pub fn from_u16(code: u16) -> Self {
        match code {
            200 => Self::Ok,
            201 => Self::Created,
            204 => Self::NoContent,
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            409 => Self::Conflict,
            410 => Self::Gone,
            422 => Self::UnprocessableEntity,
            429 => Self::TooManyRequests,
            500 => Self::InternalServerError,
            502 => Self::BadGateway,
            503 => Self::ServiceUnavailable,
            504 => Self::GatewayTimeout,
            other => Self::Other(other),
        }
    }

    /// Returns the numeric status code as a `u16`.
    pub fn as_u16(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::Created => 201,
            Self::NoContent => 204,
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Gone => 410,
            Self::UnprocessableEntity => 422,
            Self::TooManyRequests => 429,
            Self::InternalServerError => 500,
            Self::BadGateway => 502,
            Self::ServiceUnavailable => 503,
            Self::GatewayTimeout => 504,
            Self::Other(code) => code,
        }
    }

    /// Returns the canonical reason phrase for this status code.
    pub fn canonical_reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Created => "Created",
            Self::NoContent => "No Content",
            Self::BadRequest => "Bad Request",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not Found",
            Self::Conflict => "Conflict",
            Self::Gone => "Gone",
            Self::UnprocessableEntity => "Unprocessable Entity",
            Self::TooManyRequests => "Too Many Requests",
            Self::InternalServerError => "Internal Server Error",
            Self::BadGateway => "Bad Gateway",
            Self::ServiceUnavailable => "Service Unavailable",
            Self::GatewayTimeout => "Gateway Timeout",
            Self::Other(_) => "Unknown",
        }
    }

    pub fn is_success(self) -> bool {
        (200..300).contains(&self.as_u16())
    }

    pub fn is_client_error(self) -> bool {
        (400..500).contains(&self.as_u16())
    }

    pub fn is_server_error(self) -> bool {
        (500..600).contains(&self.as_u16())
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.canonical_reason())
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        Self::from_u16(code)
    }
}

impl From<StatusCode> for u16 {
    fn from(code: StatusCode) -> u16 {
        code.as_u16()
    }
}
