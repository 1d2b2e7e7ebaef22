//! Scripted HTTP client for tests and offline hosts

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{HttpClient, HttpError, HttpRequest, HttpResponse};

/// Replays queued responses and records every request
///
/// With an empty queue it answers `200 {}`.
#[derive(Debug, Default)]
pub struct MockHttpClient {
    responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response
    pub fn with_response(self, status: u16, body: impl Into<String>) -> Self {
        self.responses
            .lock()
            .push_back(Ok(HttpResponse::new(status, body)));
        self
    }

    /// Queue a transport error
    pub fn with_error(self, error: HttpError) -> Self {
        self.responses.lock().push_back(Err(error));
        self
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.requests.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse::new(200, "{}")))
    }
}
