//! # Response Dispatcher
//!
//! Serializes a finalized [`Outcome`] into the canonical wire payload and
//! delivers it through a [`ResponseTransport`].
//!
//! Delivery is best-effort by design: once an outcome is finalized there
//! is no outer recovery path, so a non-2xx status is logged at debug and
//! a transport error is logged and swallowed. The process must never
//! crash after finalization — the control plane is already waiting on a
//! timeout otherwise.

use crate::context::InvocationContext;
use crate::outcome::{Outcome, Status};
use crate::transport::ResponseTransport;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error};

/// Correlation fields echoed back to the control plane, extracted
/// leniently so a malformed request can still be answered.
#[derive(Debug, Clone, Default)]
pub struct ResponseTarget {
    pub response_url: Option<String>,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
}

impl ResponseTarget {
    /// Pulls the callback address and correlation strings out of a raw
    /// event without failing; absent fields are echoed as empty.
    pub fn from_event(event: &Value) -> Self {
        let field = |key: &str| {
            event
                .get(key)
                .and_then(Value::as_str)
                .map(String::from)
        };
        Self {
            response_url: field("ResponseURL"),
            stack_id: field("StackId").unwrap_or_default(),
            request_id: field("RequestId").unwrap_or_default(),
            logical_resource_id: field("LogicalResourceId").unwrap_or_default(),
        }
    }
}

/// The canonical outbound payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CfnResponse {
    #[serde(rename = "Status")]
    pub status: Status,
    #[serde(rename = "Reason")]
    pub reason: String,
    #[serde(rename = "PhysicalResourceId")]
    pub physical_resource_id: String,
    #[serde(rename = "StackId")]
    pub stack_id: String,
    #[serde(rename = "RequestId")]
    pub request_id: String,
    #[serde(rename = "LogicalResourceId")]
    pub logical_resource_id: String,
    #[serde(rename = "Data")]
    pub data: Map<String, Value>,
}

/// Whether the response left the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryResult {
    /// The transport answered with this status code (2xx or not).
    Delivered(u16),
    /// Nothing was sent: no callback address, or the transport failed.
    Suppressed,
}

/// Builds and delivers the response for one invocation.
pub struct ResponseDispatcher {
    transport: Arc<dyn ResponseTransport>,
}

impl ResponseDispatcher {
    pub fn new(transport: Arc<dyn ResponseTransport>) -> Self {
        Self { transport }
    }

    /// Builds the wire payload. Pure and deterministic: the same outcome
    /// yields a byte-identical body on every call.
    pub fn response_body(
        &self,
        outcome: &Outcome,
        target: &ResponseTarget,
        ctx: &dyn InvocationContext,
    ) -> CfnResponse {
        let mut data = Map::new();
        for (key, value) in outcome.outputs() {
            // Non-string outputs are JSON-encoded so every Data value is
            // a string on the wire.
            let encoded = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            data.insert(key.clone(), Value::String(encoded));
        }

        CfnResponse {
            status: outcome.status().unwrap_or(Status::Failed),
            reason: outcome.failure_reason().map(String::from).unwrap_or_else(|| {
                format!(
                    "See the details in CloudWatch Log Stream: {}",
                    ctx.log_stream_name()
                )
            }),
            physical_resource_id: outcome
                .resolved_physical_id()
                .unwrap_or_else(|| ctx.log_stream_name())
                .to_string(),
            stack_id: target.stack_id.clone(),
            request_id: target.request_id.clone(),
            logical_resource_id: target.logical_resource_id.clone(),
            data,
        }
    }

    /// Delivers the outcome. Never returns an error and never panics;
    /// every failure mode is logged and reported as [`DeliveryResult`].
    pub async fn send(
        &self,
        outcome: &Outcome,
        target: &ResponseTarget,
        ctx: &dyn InvocationContext,
    ) -> DeliveryResult {
        let response = self.response_body(outcome, target, ctx);

        let Some(url) = target.response_url.as_deref() else {
            error!("request carried no callback address; response suppressed");
            return DeliveryResult::Suppressed;
        };

        let body = match serde_json::to_string(&response) {
            Ok(body) => body,
            Err(err) => {
                error!(error = %err, "failed to serialize response body");
                return DeliveryResult::Suppressed;
            }
        };
        debug!(body = %body, "sending response");

        match self.transport.put(url, body).await {
            Ok(status) => {
                if !(200..300).contains(&status) {
                    debug!(status, "callback endpoint answered non-2xx");
                } else {
                    debug!(status, "response delivered");
                }
                DeliveryResult::Delivered(status)
            }
            Err(err) => {
                error!(error = %err, "send response failed");
                DeliveryResult::Suppressed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockInvocationContext;
    use crate::mock::RecordingTransport;
    use serde_json::json;

    fn target() -> ResponseTarget {
        ResponseTarget {
            response_url: Some("https://callback.example/presigned".to_string()),
            stack_id: "stack-arn".to_string(),
            request_id: "req-1".to_string(),
            logical_resource_id: "MyWidget".to_string(),
        }
    }

    #[test]
    fn non_string_outputs_are_json_encoded() {
        let dispatcher = ResponseDispatcher::new(Arc::new(RecordingTransport::new()));
        let ctx = MockInvocationContext::default();
        let mut outcome = Outcome::new();
        outcome.set_status(Status::Success);
        outcome.insert_output("Name", json!("plain"));
        outcome.insert_output("List", json!(["1", "2"]));

        let body = dispatcher.response_body(&outcome, &target(), &ctx);
        assert_eq!(body.data["Name"], json!("plain"));
        assert_eq!(body.data["List"], json!("[\"1\",\"2\"]"));
    }

    #[test]
    fn reason_defaults_to_log_stream_pointer() {
        let dispatcher = ResponseDispatcher::new(Arc::new(RecordingTransport::new()));
        let ctx = MockInvocationContext::default();
        let mut outcome = Outcome::new();
        outcome.set_status(Status::Success);

        let body = dispatcher.response_body(&outcome, &target(), &ctx);
        assert!(body.reason.contains(ctx.log_stream_name()), "got {}", body.reason);
    }

    #[test]
    fn physical_id_falls_back_to_log_stream_name() {
        let dispatcher = ResponseDispatcher::new(Arc::new(RecordingTransport::new()));
        let ctx = MockInvocationContext::default();
        let mut outcome = Outcome::new();
        outcome.set_status(Status::Success);

        let body = dispatcher.response_body(&outcome, &target(), &ctx);
        assert_eq!(body.physical_resource_id, ctx.log_stream_name());
    }

    #[tokio::test]
    async fn send_is_idempotent_at_the_byte_level() {
        let transport = RecordingTransport::new();
        let dispatcher = ResponseDispatcher::new(Arc::new(transport.clone()));
        let ctx = MockInvocationContext::default();
        let mut outcome = Outcome::new();
        outcome.set_status(Status::Success);
        outcome.set_resolved_physical_id("widget-1");
        outcome.insert_output("Arn", json!("arn:x"));

        dispatcher.send(&outcome, &target(), &ctx).await;
        dispatcher.send(&outcome, &target(), &ctx).await;

        let deliveries = transport.deliveries();
        assert_eq!(deliveries.len(), 2);
        assert_eq!(deliveries[0].body, deliveries[1].body);
    }

    #[tokio::test]
    async fn transport_failure_is_swallowed() {
        let transport = RecordingTransport::failing("connection reset");
        let dispatcher = ResponseDispatcher::new(Arc::new(transport));
        let ctx = MockInvocationContext::default();
        let mut outcome = Outcome::new();
        outcome.set_status(Status::Failed);

        let result = dispatcher.send(&outcome, &target(), &ctx).await;
        assert_eq!(result, DeliveryResult::Suppressed);
    }

    #[tokio::test]
    async fn non_2xx_is_reported_but_not_retried() {
        let transport = RecordingTransport::with_status(403);
        let dispatcher = ResponseDispatcher::new(Arc::new(transport.clone()));
        let ctx = MockInvocationContext::default();
        let mut outcome = Outcome::new();
        outcome.set_status(Status::Success);

        let result = dispatcher.send(&outcome, &target(), &ctx).await;
        assert_eq!(result, DeliveryResult::Delivered(403));
        assert_eq!(transport.deliveries().len(), 1);
    }

    #[tokio::test]
    async fn missing_callback_address_suppresses_delivery() {
        let transport = RecordingTransport::new();
        let dispatcher = ResponseDispatcher::new(Arc::new(transport.clone()));
        let ctx = MockInvocationContext::default();
        let mut outcome = Outcome::new();
        outcome.set_status(Status::Failed);

        let mut no_url = target();
        no_url.response_url = None;
        let result = dispatcher.send(&outcome, &no_url, &ctx).await;
        assert_eq!(result, DeliveryResult::Suppressed);
        assert!(transport.deliveries().is_empty());
    }
}
