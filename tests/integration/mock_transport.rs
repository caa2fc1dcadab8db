//! Scripted transport for integration testing.
//!
//! Responses are queued per URL and replayed in order; the last queued
//! response for a URL repeats once the queue is down to one entry. Every
//! request is recorded so tests can assert on what was (not) sent.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use citybox::transport::{HttpRequest, HttpResponse, Transport};

#[derive(Clone)]
enum Scripted {
    Respond(HttpResponse),
    Fail(String),
}

/// A deterministic in-memory Citybox server.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    routes: Arc<Mutex<HashMap<String, VecDeque<Scripted>>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `url`.
    pub fn respond(&self, url: &str, status: u16, body: &str) -> &Self {
        self.push(url, Scripted::Respond(HttpResponse::new(status, body)))
    }

    /// Queue a transport failure for `url`.
    pub fn fail(&self, url: &str, message: &str) -> &Self {
        self.push(url, Scripted::Fail(message.to_string()))
    }

    fn push(&self, url: &str, item: Scripted) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(item);
        self
    }

    /// All requests sent so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests sent with `token`'s credentials.
    pub fn requests_for(&self, token: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.headers.get("token").map(String::as_str) == Some(token))
            .collect()
    }

    /// Number of requests to `url` made with `token`'s credentials.
    pub fn count(&self, token: &str, url: &str) -> usize {
        self.requests_for(token).iter().filter(|r| r.url == url).count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);

        let mut routes = self.routes.lock().unwrap();
        let queue = routes
            .get_mut(&url)
            .ok_or_else(|| anyhow!("No scripted response for {url}"))?;

        let next = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };

        match next {
            Some(Scripted::Respond(resp)) => Ok(resp),
            Some(Scripted::Fail(msg)) => Err(anyhow!("{msg}")),
            None => Err(anyhow!("No scripted response for {url}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_scripted_queue_replays_last() {
    let transport = ScriptedTransport::new();
    transport
        .respond("https://x.test/a", 200, "first")
        .respond("https://x.test/a", 200, "second");

    let mut bodies = Vec::new();
    for _ in 0..3 {
        let resp = transport.send(HttpRequest::get("https://x.test/a")).await.unwrap();
        bodies.push(resp.body);
    }
    assert_eq!(bodies, vec!["first", "second", "second"]);
    assert_eq!(transport.requests().len(), 3);
}

#[tokio::test]
async fn test_scripted_unknown_route_fails() {
    let transport = ScriptedTransport::new();
    let result = transport.send(HttpRequest::get("https://x.test/missing")).await;
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("No scripted response"));
}

#[tokio::test]
async fn test_scripted_forced_failure() {
    let transport = ScriptedTransport::new();
    transport.fail("https://x.test/a", "simulated timeout");
    let result = transport.send(HttpRequest::get("https://x.test/a")).await;
    assert!(result.unwrap_err().to_string().contains("simulated timeout"));
}
