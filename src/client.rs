//! One-shot GraphQL query execution over HTTPS.
//!
//! This is the simple request/response side of the crate: each call is a
//! single authenticated POST to `https://replit.com/graphql`. The realtime
//! engine lives in [`Subscriber`]; use [`ReplitClient::subscriber`] to get
//! one sharing this client's session.

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::auth::SessionToken;
use crate::error::{ReplitLinkError, Result};
use crate::models::QueryRequest;
use crate::subscriber::Subscriber;
use crate::REPLIT_DOMAIN;

/// Client for regular (non-realtime) Replit GraphQL requests.
///
/// # Examples
///
/// ```rust,no_run
/// use replit_link::ReplitClient;
///
/// # async fn example() -> replit_link::Result<()> {
/// let client = ReplitClient::new("s%3A...")?;
///
/// let data = client
///     .query("query { currentUser { username } }", None)
///     .await?;
/// println!("{}", data["currentUser"]["username"]);
/// # Ok(())
/// # }
/// ```
pub struct ReplitClient {
    http_client: reqwest::Client,
    token: SessionToken,
}

impl ReplitClient {
    /// Create a client authenticated with the given `connect.sid` token.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| ReplitLinkError::Configuration(e.to_string()))?;
        Ok(Self {
            http_client,
            token: SessionToken::new(token),
        })
    }

    /// Execute a GraphQL query or mutation and return its `data` value.
    ///
    /// GraphQL errors reported by the server become
    /// [`ReplitLinkError::GraphQl`]; a response without `data` becomes
    /// [`ReplitLinkError::EmptyResponse`].
    pub async fn query(&self, query: &str, variables: Option<JsonValue>) -> Result<JsonValue> {
        let url = format!("https://{}/graphql", REPLIT_DOMAIN);
        log::debug!("[replit-link] POST {} query_len={}", url, query.len());

        let request = self
            .token
            .apply_to_request(self.http_client.post(&url))
            .json(&QueryRequest::new(query, variables));

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            log::warn!("[replit-link] Query failed with status {}", status);
            return Err(ReplitLinkError::ResponseStatus(status.as_u16()));
        }

        let mut body: JsonValue = response.json().await?;
        if let Some(message) = graphql_error_message(&body) {
            return Err(ReplitLinkError::GraphQl(message));
        }

        match body.as_object_mut().and_then(|obj| obj.remove("data")) {
            Some(data) if !data.is_null() => Ok(data),
            _ => Err(ReplitLinkError::EmptyResponse),
        }
    }

    /// Execute a query and deserialize its `data` value into `T`.
    pub async fn query_as<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Option<JsonValue>,
    ) -> Result<T> {
        let data = self.query(query, variables).await?;
        Ok(serde_json::from_value(data)?)
    }

    /// Create a [`Subscriber`] sharing this client's session.
    ///
    /// Must be called within a tokio runtime; the subscriber starts
    /// connecting immediately.
    pub fn subscriber(&self) -> Subscriber {
        Subscriber::with_session(self.token.clone())
    }
}

/// Extract a printable message from a GraphQL error response, if any.
///
/// Replit reports errors either as a top-level `errors` array or wrapped in
/// an `error` member; both shapes are handled.
fn graphql_error_message(body: &JsonValue) -> Option<String> {
    let errors = body
        .get("errors")
        .or_else(|| body.get("error").and_then(|e| e.get("errors")))
        .and_then(|e| e.as_array());

    if let Some(errors) = errors {
        if !errors.is_empty() {
            let joined: Vec<&str> = errors
                .iter()
                .filter_map(|e| e.get("message").and_then(|m| m.as_str()))
                .collect();
            return Some(if joined.is_empty() {
                "Server returned error in JSON response".to_string()
            } else {
                joined.join(", ")
            });
        }
        return None;
    }

    match body.get("error") {
        Some(JsonValue::String(message)) => Some(message.clone()),
        Some(_) => Some("Server returned error in JSON response".to_string()),
        None => None,
    }
}
