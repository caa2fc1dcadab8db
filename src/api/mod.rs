//! Remote operation set.
//!
//! One routine per Citybox action. Every routine issues its request(s)
//! through the `Transport`, collapses the response into a
//! `RemoteOutcome`, and only then reads payload fields or touches account
//! state. Failures are logged and turned into a "no effect" return value;
//! nothing here returns an error to the orchestrator.

pub mod coupon;
pub mod lenient;
pub mod lottery;
pub mod roulette;
pub mod sign;
pub mod status;

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::Endpoints;
use crate::transport::{HttpRequest, HttpResponse, Transport};
use crate::types::RemoteOutcome;

/// Client for the Citybox endpoints, borrowing the run's transport.
pub struct CityboxApi<'a> {
    transport: &'a dyn Transport,
    endpoints: &'a Endpoints,
}

impl<'a> CityboxApi<'a> {
    pub fn new(transport: &'a dyn Transport, endpoints: &'a Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    /// Send and classify, keeping the 200 body as text.
    async fn execute_raw(&self, request: HttpRequest) -> RemoteOutcome<String> {
        classify(self.transport.send(request).await)
    }

    /// Send, classify and decode a 200 body into `T`.
    async fn execute<T: DeserializeOwned>(&self, request: HttpRequest) -> RemoteOutcome<T> {
        decode(self.execute_raw(request).await)
    }
}

// ---------------------------------------------------------------------------
// Response classification
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Map a transport result onto the outcome taxonomy by status code.
pub(crate) fn classify(result: Result<HttpResponse>) -> RemoteOutcome<String> {
    match result {
        Err(e) => RemoteOutcome::TransportException(format!("{e:#}")),
        Ok(resp) => match resp.status {
            200 => RemoteOutcome::Success(resp.body),
            401 => RemoteOutcome::AuthExpired,
            400 => RemoteOutcome::Rejected(rejection_message(&resp.body)),
            code => RemoteOutcome::HttpError(code),
        },
    }
}

/// The server's `message` field, or the trimmed body if there is none.
fn rejection_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

pub(crate) fn decode<T: DeserializeOwned>(outcome: RemoteOutcome<String>) -> RemoteOutcome<T> {
    match outcome {
        RemoteOutcome::Success(body) => match serde_json::from_str(&body) {
            Ok(value) => RemoteOutcome::Success(value),
            Err(e) => RemoteOutcome::Malformed(e.to_string()),
        },
        RemoteOutcome::AuthExpired => RemoteOutcome::AuthExpired,
        RemoteOutcome::Rejected(msg) => RemoteOutcome::Rejected(msg),
        RemoteOutcome::HttpError(code) => RemoteOutcome::HttpError(code),
        RemoteOutcome::TransportException(msg) => RemoteOutcome::TransportException(msg),
        RemoteOutcome::Malformed(msg) => RemoteOutcome::Malformed(msg),
    }
}

/// Render a body for logs: JSON strings unescaped, other JSON compact,
/// anything else as trimmed text.
pub(crate) fn readable_body(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(_) => body.trim().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------
