//! Request-scoped tracing utilities.
//!
//! Every request carries a request id (generated or taken from the
//! `x-request-id` header). The id is stored in a task-local so error
//! responses and log lines emitted anywhere below the middleware can
//! attach it without threading it through call signatures.

use std::future::Future;

use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub use tracing::{debug, error, info, trace, warn};

/// Request ID tracking information
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

impl Default for RequestId {
    fn default() -> Self {
        RequestId(Uuid::new_v4().to_string())
    }
}

impl RequestId {
    pub fn new(value: impl Into<String>) -> Self {
        RequestId(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

tokio::task_local! {
    static CURRENT_REQUEST_ID: RequestId;
}

/// Runs `future` with `request_id` visible to [`current_request_id`].
pub async fn scope_request_id<Fut, R>(request_id: RequestId, future: Fut) -> R
where
    Fut: Future<Output = R>,
{
    CURRENT_REQUEST_ID.scope(request_id, future).await
}

/// The request id of the currently executing request, if any.
pub fn current_request_id() -> Option<RequestId> {
    CURRENT_REQUEST_ID.try_with(|rid| rid.clone()).ok()
}

/// HTTP tracing layer applied to the whole router for consistent
/// request/response telemetry.
pub fn configure_http_tracing() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
}
