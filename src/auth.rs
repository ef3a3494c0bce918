//! Session-cookie authentication for the Replit API.
//!
//! Replit authenticates both HTTP requests and the realtime socket upgrade
//! with the `connect.sid` session cookie. Obtaining the token (login,
//! captcha) is out of scope; callers supply it directly.

use crate::error::{ReplitLinkError, Result};

/// Name of the session cookie Replit expects.
pub const TOKEN_COOKIE: &str = "connect.sid";

/// A `connect.sid` session token used to authenticate every request.
///
/// # Examples
///
/// ```rust
/// use replit_link::SessionToken;
///
/// let token = SessionToken::new("s%3A...");
/// assert!(token.cookie_header().starts_with("connect.sid="));
/// ```
#[derive(Debug, Clone)]
pub struct SessionToken {
    token: String,
}

impl SessionToken {
    /// Wrap a raw `connect.sid` cookie value.
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    /// The `Cookie` header value carrying this token.
    pub fn cookie_header(&self) -> String {
        format!("{}={}", TOKEN_COOKIE, self.token)
    }

    /// Attach the session cookie to an HTTP request builder.
    pub fn apply_to_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.header(reqwest::header::COOKIE, self.cookie_header())
    }

    /// The `Cookie` header as a typed value for the WebSocket upgrade request.
    pub(crate) fn ws_cookie_value(&self) -> Result<tokio_tungstenite::tungstenite::http::HeaderValue> {
        tokio_tungstenite::tungstenite::http::HeaderValue::from_str(&self.cookie_header()).map_err(
            |e| ReplitLinkError::Configuration(format!("Invalid session token for Cookie header: {}", e)),
        )
    }
}
