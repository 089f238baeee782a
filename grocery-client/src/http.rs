//! HTTP calling convention
//!
//! Every call to the ordering service goes through [`Transport::send`], which
//! never fails: an unreachable or timed-out service comes back as a response
//! with status `0` and an `{"error": ...}` body. Callers branch on the
//! returned [`HttpResponse`] the same way whatever went wrong.

use async_trait::async_trait;
use http::{Method, StatusCode};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::{ClientConfig, ClientError, ClientResult};

/// Status code reported when the service could not be reached.
pub const CONNECTION_FAILED: u16 = 0;

/// One request to the ordering service
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Absolute path, e.g. `/api/client/login`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Attach a JSON body
    pub fn json<B: Serialize>(mut self, body: &B) -> ClientResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Append a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set the `Authorization: Bearer` token
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }
}

/// Parsed response: status code plus JSON body (`{}` when the body was empty)
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Value,
}

impl HttpResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Sentinel for "service unreachable"
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self {
            status: CONNECTION_FAILED,
            body: json!({ "error": message.into() }),
        }
    }

    /// Build from a raw body. Non-JSON text is kept as the error message.
    pub fn from_text(status: u16, text: &str) -> Self {
        let trimmed = text.trim();
        let body = if trimmed.is_empty() {
            json!({})
        } else {
            serde_json::from_str(trimmed).unwrap_or_else(|_| json!({ "error": trimmed }))
        };
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_connection_failure(&self) -> bool {
        self.status == CONNECTION_FAILED
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED.as_u16()
    }

    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND.as_u16()
    }

    /// Error text carried by the body, if any
    pub fn error_text(&self) -> Option<String> {
        match &self.body {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Object(map) => ["error", "message"]
                .iter()
                .filter_map(|key| map.get(*key).and_then(Value::as_str))
                .find(|s| !s.is_empty())
                .map(str::to_string),
            _ => None,
        }
    }

    /// Map a failed response onto the client error taxonomy
    pub fn into_error(self) -> ClientError {
        let text = self.error_text();
        match self.status {
            CONNECTION_FAILED => ClientError::Transport(
                text.unwrap_or_else(|| "Connection to ordering service failed".into()),
            ),
            401 => ClientError::Auth(text.unwrap_or_else(|| "Unauthorized".into())),
            status => ClientError::Service {
                status,
                message: text.unwrap_or_default(),
            },
        }
    }

    /// Pass 2xx responses through, turn everything else into an error
    pub fn ensure_success(self) -> ClientResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }

    /// Deserialize a 2xx body
    pub fn json<T: DeserializeOwned>(self) -> ClientResult<T> {
        let response = self.ensure_success()?;
        serde_json::from_value(response.body)
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}

/// HTTP transport trait
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue one request. Never fails; see module docs.
    async fn send(&self, request: ApiRequest) -> HttpResponse;

    fn base_url(&self) -> &str;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct NetworkTransport {
    client: Client,
    base_url: String,
}

impl NetworkTransport {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn unreachable_message(&self, error: &reqwest::Error) -> String {
        let reason = if error.is_timeout() {
            "request timed out"
        } else {
            "connection failed"
        };
        format!(
            "Cannot connect to ordering service at {} ({reason}). Make sure it is running.",
            self.base_url
        )
    }
}

#[async_trait]
impl Transport for NetworkTransport {
    async fn send(&self, request: ApiRequest) -> HttpResponse {
        let url = format!("{}{}", self.base_url, request.path);
        tracing::debug!(method = %request.method, path = %request.path, "Sending request");

        let mut req = self.client.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }
        if let Some(token) = &request.bearer {
            req = req.bearer_auth(token);
        }

        let response = match req.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(path = %request.path, error = %e, "Ordering service unreachable");
                return HttpResponse::connection_failed(self.unreachable_message(&e));
            }
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(text) => {
                tracing::debug!(path = %request.path, status, "Response received");
                HttpResponse::from_text(status, &text)
            }
            Err(e) => {
                tracing::warn!(path = %request.path, error = %e, "Response body lost");
                HttpResponse::connection_failed(self.unreachable_message(&e))
            }
        }
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
