//! Data sources for the cached fetch orchestrator
//!
//! A source is anything that can produce a fresh value asynchronously. The
//! HTTP source talks to a thin proxy endpoint that answers with a JSON
//! envelope of the shape `{ <resultField>: [...], error?: string, message?: string }`.

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while fetching from a source
///
/// The `Display` text is what consumers show as their error banner.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Upstream answered with an application-level error field
    #[error("{0}")]
    Upstream(String),

    /// Non-success HTTP status without an error body
    #[error("HTTP error! status: {0}")]
    Status(u16),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The source did not answer in time
    #[error("Request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),
}

/// Something that can produce a fresh `T`
#[async_trait]
pub trait Source<T>: Send + Sync {
    async fn fetch(&self) -> Result<T, FetchError>;

    /// Short label for logs
    fn describe(&self) -> String {
        "source".to_string()
    }
}

/// JavaScript-style truthiness, which is how proxy endpoints flag errors
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Extracts the display message of an envelope that carries an `error` field
///
/// `message` is preferred over `error` when both are present.
pub fn envelope_error(body: &Value) -> Option<String> {
    let error = body.get("error").filter(|e| is_truthy(e))?;
    let message = body
        .get("message")
        .filter(|m| is_truthy(m))
        .map(value_text);
    Some(message.unwrap_or_else(|| value_text(error)))
}

/// Applies the envelope contract to a raw HTTP response
///
/// HTTP success and no `error` field means the body is data. Anything else is
/// a failure, described by the body's `message`/`error` when it has one and
/// by the status code otherwise.
pub fn interpret_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, FetchError> {
    let parsed: Result<Value, serde_json::Error> = serde_json::from_str(body);

    if let Ok(value) = &parsed {
        if let Some(message) = envelope_error(value) {
            return Err(FetchError::Upstream(message));
        }
    }

    if !(200..300).contains(&status) {
        return Err(FetchError::Status(status));
    }

    Ok(serde_json::from_value(parsed?)?)
}

/// GETs a JSON envelope from a URL
#[derive(Debug, Clone)]
pub struct HttpSource<T> {
    client: Client,
    url: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> HttpSource<T> {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), url)
    }

    /// Create a new HttpSource with a custom HTTP client
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            _marker: PhantomData,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl<T: DeserializeOwned + Send + 'static> Source<T> for HttpSource<T> {
    async fn fetch(&self) -> Result<T, FetchError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        interpret_envelope(status, &text)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
