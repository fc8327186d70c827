// Outbound HTTP seam. The pipeline only needs "send a request, get status and
// body back", so both the reqwest client and the test mock fit behind it.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::PriceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
    pub bearer_token: Option<String>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            query: vec![],
            form: vec![],
            bearer_token: None,
            timeout,
        }
    }

    pub fn post_form(url: impl Into<String>, form: Vec<(String, String)>, timeout: Duration) -> Self {
        Self {
            method: Method::Post,
            form,
            ..Self::get(url, timeout)
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turns a non-2xx response into an upstream error carrying status and body.
    pub fn error_for_status(self) -> Result<Self, PriceError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(PriceError::Upstream {
                status_code: self.status,
                body: self.body,
            })
        }
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync + 'static {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, PriceError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn map_reqwest_error(err: reqwest::Error, timeout: Duration) -> PriceError {
    if err.is_timeout() {
        PriceError::Timeout(timeout.as_millis() as u64)
    } else {
        PriceError::Network(err.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, PriceError> {
        let timeout = request.timeout;
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url).form(&request.form),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer_token {
            builder = builder.bearer_auth(token);
        }

        debug!(method = ?request.method, url = %request.url, "sending upstream request");

        let response = builder
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        Ok(HttpResponse { status, body })
    }
}

// In-process upstream for tests and local experiments.
pub mod mock_transport {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone)]
    enum Reply {
        Respond(HttpResponse),
        Fail(PriceError),
    }

    /// Serves canned replies keyed by exact URL and records every request.
    #[derive(Default)]
    pub struct MockTransport {
        replies: Mutex<HashMap<String, Reply>>,
        requests: Mutex<Vec<HttpRequest>>,
        request_count: AtomicUsize,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(&self, url: &str, status: u16, body: impl Into<String>) {
            self.replies.lock().insert(
                url.to_string(),
                Reply::Respond(HttpResponse {
                    status,
                    body: body.into(),
                }),
            );
        }

        pub fn respond_json(&self, url: &str, body: serde_json::Value) {
            self.respond(url, 200, body.to_string());
        }

        pub fn fail(&self, url: &str, error: PriceError) {
            self.replies
                .lock()
                .insert(url.to_string(), Reply::Fail(error));
        }

        pub fn request_count(&self) -> usize {
            self.request_count.load(Ordering::SeqCst)
        }

        pub fn calls_to(&self, url: &str) -> usize {
            self.requests.lock().iter().filter(|r| r.url == url).count()
        }

        pub fn requests_to(&self, url: &str) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .iter()
                .filter(|r| r.url == url)
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, PriceError> {
            self.request_count.fetch_add(1, Ordering::SeqCst);
            let reply = self.replies.lock().get(&request.url).cloned();
            let url = request.url.clone();
            self.requests.lock().push(request);

            match reply {
                Some(Reply::Respond(response)) => Ok(response),
                Some(Reply::Fail(err)) => Err(err),
                None => Ok(HttpResponse {
                    status: 404,
                    body: format!("no mock reply for {url}"),
                }),
            }
        }
    }
}
