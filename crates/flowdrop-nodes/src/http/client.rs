//! reqwest-backed HTTP client

use async_trait::async_trait;

use super::{HttpBody, HttpClient, HttpError, HttpRequest, HttpResponse};

/// [`HttpClient`] over `reqwest`
///
/// A client is built per request so per-node connect timeouts apply.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    user_agent: String,
}

impl ReqwestHttpClient {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }
}

impl From<reqwest::Error> for HttpError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_builder() {
            Self::InvalidRequest(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let method = reqwest::Method::from_bytes(request.method.to_ascii_uppercase().as_bytes())
            .map_err(|_| HttpError::InvalidMethod(request.method.clone()))?;

        let client = reqwest::Client::builder()
            .user_agent(self.user_agent.as_str())
            .timeout(request.timeout)
            .connect_timeout(request.connect_timeout)
            .build()?;

        let mut builder = client.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            Some(HttpBody::Json(value)) => builder.json(&value),
            Some(HttpBody::Text(text)) => builder.body(text),
            None => builder,
        };

        log::debug!("HTTP {} {}", request.method, request.url);
        let response = builder.send().await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            headers,
            json: serde_json::from_str(&body).ok(),
            body,
        })
    }
}
