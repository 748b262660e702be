//! The request client.

use std::sync::Arc;

use horizon_facet_core::logging::{span_names, targets};
use horizon_facet_core::{DataKey, WeakBindingContext};
use http::header::{CONTENT_TYPE, HeaderValue};
use serde_json::Value;
use tracing::Instrument;

use crate::error::{RequestError, Result};
use crate::policy::RequestPolicy;

const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";

/// HTTP request methods.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RequestMethod {
    /// HTTP GET method.
    #[default]
    Get,
    /// HTTP POST method.
    Post,
    /// HTTP PUT method.
    Put,
    /// HTTP DELETE method.
    Delete,
    /// HTTP PATCH method.
    Patch,
}

impl RequestMethod {
    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
            Self::Patch => reqwest::Method::PATCH,
        }
    }
}

impl std::fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Delete => write!(f, "DELETE"),
            Self::Patch => write!(f, "PATCH"),
        }
    }
}

struct ClientInner {
    client: reqwest::Client,
    policy: RequestPolicy,
}

/// Issues JSON requests under a [`RequestPolicy`].
///
/// Cloning is cheap; clones share the connection pool.
///
/// # Example
///
/// ```ignore
/// use horizon_facet_net::{RequestClient, RequestMethod, RequestPolicy};
///
/// let policy = RequestPolicy::new().with_base_url("https://api.example.com/v1")?;
/// let client = RequestClient::new(&policy)?;
///
/// let users = client.request("/users", RequestMethod::Get, None, None).await?;
/// ```
#[derive(Clone)]
pub struct RequestClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for RequestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestClient")
            .field("policy", &self.inner.policy)
            .finish_non_exhaustive()
    }
}

impl RequestClient {
    /// Create a client for the given policy.
    pub fn new(policy: &RequestPolicy) -> Result<Self> {
        let mut builder = reqwest::Client::builder().default_headers(policy.default_headers().clone());

        if let Some(timeout) = policy.timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = policy.user_agent() {
            builder = builder.user_agent(user_agent);
        }

        let client = builder.build()?;
        Ok(Self {
            inner: Arc::new(ClientInner {
                client,
                policy: policy.clone(),
            }),
        })
    }

    /// The policy this client was built with.
    pub fn policy(&self) -> &RequestPolicy {
        &self.inner.policy
    }

    /// Send a request and decode the response.
    ///
    /// The body is encoded according to `content_type`: JSON by default,
    /// form fields for `application/x-www-form-urlencoded` (the body must be
    /// an object), raw text for `text/*`. A successful response decodes to
    /// JSON; an empty body yields `Value::Null` and a non-JSON body yields
    /// the text as a string. Non-success statuses become
    /// [`RequestError::Status`] with the server's message.
    pub async fn request(
        &self,
        path: &str,
        method: RequestMethod,
        body: Option<Value>,
        content_type: Option<&str>,
    ) -> Result<Value> {
        let url = self.inner.policy.resolve(path)?;
        let span = tracing::debug_span!(
            target: targets::NET,
            "request",
            operation = span_names::REQUEST,
            %method,
            %url,
        );

        async move {
            let mut request = self.inner.client.request(method.to_reqwest(), url);
            if let Some(body) = body {
                request = encode_body(request, body, content_type)?;
            }

            tracing::trace!(target: targets::NET, "sending request");
            let response = request.send().await?;
            let status = response.status();
            let text = response.text().await?;

            if status.is_success() {
                tracing::debug!(target: targets::NET, status = status.as_u16(), "request settled");
                Ok(decode_payload(&text))
            } else {
                let err = status_failure(status, &text);
                tracing::debug!(target: targets::NET, status = status.as_u16(), error = %err, "request failed");
                Err(err)
            }
        }
        .instrument(span)
        .await
    }

    /// Send a GET request.
    pub async fn get(&self, path: &str) -> Result<Value> {
        self.request(path, RequestMethod::Get, None, None).await
    }

    /// Send a POST request with a JSON body.
    pub async fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.request(path, RequestMethod::Post, Some(body), None).await
    }

    /// Send a PUT request with a JSON body.
    pub async fn put(&self, path: &str, body: Value) -> Result<Value> {
        self.request(path, RequestMethod::Put, Some(body), None).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> Result<Value> {
        self.request(path, RequestMethod::Delete, None, None).await
    }

    /// Fetch `path` and store the payload under `key` in `target`.
    ///
    /// Returns `Ok(false)` when the context has been released in the
    /// meantime, or when the write is rejected; rejected writes are logged.
    pub async fn load_into(&self, path: &str, target: &WeakBindingContext, key: &DataKey) -> Result<bool> {
        let payload = self.get(path).await?;
        Ok(settle_into(target, key, payload))
    }

    /// Run a request on the current Tokio runtime and hand the result to
    /// `on_settled` exactly once.
    ///
    /// Fails when called outside a runtime. The request is never cancelled
    /// by the caller's teardown; `on_settled` must tolerate released state.
    ///
    /// `on_settled` runs on a Tokio worker thread, not on the surface's
    /// control thread. It must not drive controls, tables or popovers
    /// directly; hand the result back to the control thread instead, for
    /// example through a `tokio::sync::mpsc` channel the control loop
    /// drains. [`settle_into`] is safe to call from the worker, since a
    /// binding context is guarded by its own lock.
    pub fn spawn_request<F>(
        &self,
        path: impl Into<String>,
        method: RequestMethod,
        body: Option<Value>,
        content_type: Option<String>,
        on_settled: F,
    ) -> Result<tokio::task::JoinHandle<()>>
    where
        F: FnOnce(Result<Value>) + Send + 'static,
    {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| RequestError::Transport(format!("no async runtime: {e}")))?;
        let client = self.clone();
        let path = path.into();

        Ok(handle.spawn(async move {
            let result = client.request(&path, method, body, content_type.as_deref()).await;
            on_settled(result);
        }))
    }
}

/// Write a settled payload into a possibly released context.
///
/// Returns whether the value was stored.
pub fn settle_into(target: &WeakBindingContext, key: &DataKey, payload: Value) -> bool {
    match target.write_if_alive(key, payload) {
        Some(Ok(())) => true,
        Some(Err(err)) => {
            tracing::warn!(target: targets::NET, %key, error = %err, "dropping response write");
            false
        }
        None => false,
    }
}

fn encode_body(
    request: reqwest::RequestBuilder,
    body: Value,
    content_type: Option<&str>,
) -> Result<reqwest::RequestBuilder> {
    let content_type = content_type.unwrap_or(JSON);
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase();

    if mime == FORM {
        let Value::Object(fields) = body else {
            return Err(RequestError::InvalidBody(format!("{FORM} needs an object body")));
        };
        let pairs: Vec<(String, String)> = fields
            .into_iter()
            .map(|(k, v)| {
                let v = match v {
                    Value::String(s) => s,
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (k, v)
            })
            .collect();
        return Ok(request.form(&pairs));
    }

    let header = HeaderValue::from_str(content_type)?;
    let bytes = if mime.starts_with("text/") {
        match body {
            Value::String(s) => s.into_bytes(),
            other => other.to_string().into_bytes(),
        }
    } else {
        serde_json::to_vec(&body).map_err(|e| RequestError::InvalidBody(e.to_string()))?
    };

    Ok(request.header(CONTENT_TYPE, header).body(bytes))
}

fn decode_payload(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn status_failure(status: http::StatusCode, text: &str) -> RequestError {
    let reason = || status.canonical_reason().unwrap_or("Request failed").to_string();

    let message = match serde_json::from_str::<Value>(text) {
        Ok(json) => message_from_json(&json).unwrap_or_else(reason),
        Err(_) if !text.trim().is_empty() => text.trim().to_string(),
        Err(_) => reason(),
    };

    RequestError::status(status.as_u16(), message)
}

fn message_from_json(json: &Value) -> Option<String> {
    ["message", "error", "detail"].iter().find_map(|field| match json.get(field)? {
        Value::String(s) => Some(s.clone()),
        nested @ Value::Object(_) => message_from_json(nested),
        _ => None,
    })
}
