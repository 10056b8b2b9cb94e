//! REST gateway
//!
//! Executes requests against the HTTP API over a single shared transport. The
//! transport sits behind an async mutex, so at most one call is on the wire at
//! any time, whether it came from [`RestGateway::send`] or from a worker started
//! by [`RestGateway::send_async`].

use super::RestError;
use crate::protocol::GatewayUrlPayload;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use wakebot_common::BotToken;
use wakebot_core::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};

/// Outcome of a REST call: the parsed body, or `None` for an empty one
pub type RestResult = Result<Option<Value>, RestError>;

/// A request relative to the API base URL
#[derive(Debug, Clone, PartialEq)]
pub struct RestRequest {
    pub method: HttpMethod,
    /// Path below the API base (e.g. `/gateway`), or an absolute URL
    pub path: String,
    pub body: Option<Value>,
}

impl RestRequest {
    /// Create a GET request
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            body: None,
        }
    }

    /// Create a POST request with a JSON body
    #[must_use]
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            body: Some(body),
        }
    }

    /// Create a DELETE request
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Delete,
            path: path.into(),
            body: None,
        }
    }
}

struct Shared {
    transport: Mutex<Box<dyn HttpTransport>>,
    api_base_url: String,
    token: BotToken,
    in_flight: AtomicUsize,
}

/// Decrements the worker count when a reply worker ends, however it ends
struct InFlightGuard(Arc<Shared>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Handle to the shared REST channel
///
/// Cheap to clone; all clones share the same transport and worker count.
#[derive(Clone)]
pub struct RestGateway {
    shared: Arc<Shared>,
}

impl RestGateway {
    /// Create a gateway over `transport`
    pub fn new(
        transport: impl HttpTransport + 'static,
        api_base_url: impl Into<String>,
        token: BotToken,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                transport: Mutex::new(Box::new(transport)),
                api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
                token,
                in_flight: AtomicUsize::new(0),
            }),
        }
    }

    /// API base URL, without a trailing slash
    pub fn api_base_url(&self) -> &str {
        &self.shared.api_base_url
    }

    /// Number of async workers that have not finished yet
    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.load(Ordering::SeqCst)
    }

    /// Build the wire request: JSON headers and credentials are only attached to writes
    pub fn build(&self, request: &RestRequest) -> Result<HttpRequest, RestError> {
        let url = if request.path.starts_with("http://") || request.path.starts_with("https://") {
            request.path.clone()
        } else {
            format!("{}{}", self.shared.api_base_url, request.path)
        };

        let mut headers = Vec::new();
        if !request.method.is_read() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
            if !self.shared.token.is_empty() {
                headers.push((
                    "Authorization".to_string(),
                    self.shared.token.authorization_header(),
                ));
            }
        }

        let body = request
            .body
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| RestError::Encode(e.to_string()))?;

        Ok(HttpRequest {
            method: request.method,
            url,
            headers,
            body,
        })
    }

    /// Execute a request and wait for its result
    ///
    /// Holds the transport lock only for the duration of the HTTP exchange.
    pub async fn send(&self, request: RestRequest) -> RestResult {
        let http = self.build(&request)?;

        let response = {
            let mut transport = self.shared.transport.lock().await;
            transport.execute(http).await
        };

        Self::interpret(&request, response)
    }

    /// Execute a request on its own worker and hand the result to `on_complete`
    ///
    /// The worker owns the request until it finishes, releases the transport lock,
    /// then invokes the callback exactly once. Without a tokio runtime the callback
    /// receives [`RestError::NoRuntime`] immediately.
    pub fn send_async<F>(&self, request: RestRequest, on_complete: F) -> Option<JoinHandle<()>>
    where
        F: FnOnce(RestResult) + Send + 'static,
    {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::error!(
                method = %request.method,
                "No runtime available, async request dropped"
            );
            on_complete(Err(RestError::NoRuntime));
            return None;
        };

        self.shared.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlightGuard(Arc::clone(&self.shared));
        let gateway = self.clone();

        Some(runtime.spawn(async move {
            let _guard = guard;
            let result = gateway.send(request).await;
            on_complete(result);
        }))
    }

    /// Resolve the gateway endpoint (`GET /gateway`)
    pub async fn gateway_url(&self) -> Result<String, RestError> {
        let body = self
            .send(RestRequest::get("/gateway"))
            .await?
            .ok_or_else(|| RestError::Decode("empty gateway response".to_string()))?;

        let payload: GatewayUrlPayload =
            serde_json::from_value(body).map_err(|e| RestError::Decode(e.to_string()))?;
        Ok(payload.url)
    }

    /// Lightweight call that keeps the underlying HTTP connection warm
    pub async fn keepalive(&self) -> bool {
        self.send(RestRequest::get("/gateway")).await.is_ok()
    }

    fn interpret(
        request: &RestRequest,
        response: Result<HttpResponse, TransportError>,
    ) -> RestResult {
        let response = match response {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    method = %request.method,
                    path = %request.path,
                    error = %e,
                    "REST request failed"
                );
                return Err(e.into());
            }
        };

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status = response.status,
            "REST response"
        );

        match response.status {
            204 => Ok(None),
            401 => {
                tracing::warn!(
                    method = %request.method,
                    path = %request.path,
                    "REST request not authorized (401)"
                );
                Err(RestError::Unauthorized)
            }
            status => {
                if status >= 400 {
                    tracing::warn!(
                        method = %request.method,
                        path = %request.path,
                        status,
                        body = %response.body,
                        "REST request returned an error status"
                    );
                }
                if response.body.trim().is_empty() {
                    return Ok(None);
                }
                serde_json::from_str(&response.body)
                    .map(Some)
                    .map_err(|e| RestError::Decode(e.to_string()))
            }
        }
    }
}

impl fmt::Debug for RestGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestGateway")
            .field("api_base_url", &self.shared.api_base_url)
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}
