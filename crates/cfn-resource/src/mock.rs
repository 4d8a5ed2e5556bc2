//! # Test-Event Builder & Mocks
//!
//! Everything needed to exercise the engine without a control plane:
//! a builder for well-formed synthetic lifecycle events, a mock
//! invocation context, and a recording transport that captures delivered
//! response bodies for assertions.
//!
//! # Testing Strategy
//! Tests never hit the network. The engine is wired with a
//! [`RecordingTransport`] and driven with [`TestEvent`] events; the
//! recorded bodies are asserted against the expected wire payload. Error
//! paths are simulated with [`RecordingTransport::failing`] rather than a
//! broken endpoint.

use crate::context::InvocationContext;
use crate::request::Operation;
use crate::transport::{ResponseTransport, TransportError};
use async_trait::async_trait;
use rand::Rng;
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Configuration errors raised while building a synthetic event, before
/// any request exists.
#[derive(Debug, thiserror::Error)]
pub enum EventBuilderError {
    #[error("properties must be a JSON object")]
    PropertiesNotObject,
    #[error("physical resource id not set for {0}")]
    MissingPhysicalId(Operation),
    #[error("old properties not set for Update")]
    MissingOldProperties,
}

const EXAMPLE_STACK_ID: &str = "arn:aws:cloudformation:us-west-2:EXAMPLE/stack-name/guid";

fn random_request_id() -> String {
    format!("{:032x}", rand::thread_rng().gen::<u128>())
}

/// Builds a well-formed inbound lifecycle event for tests.
///
/// Correlation fields default to stable example values (with a random
/// request id); the resource type gets the `Custom::` prefix when not
/// already namespaced. Update and Delete require an explicit physical
/// id, and Update requires the prior properties.
#[derive(Debug, Clone)]
pub struct TestEvent {
    operation: Operation,
    resource_type: String,
    properties: Value,
    response_url: String,
    stack_id: Option<String>,
    request_id: Option<String>,
    logical_resource_id: Option<String>,
    physical_resource_id: Option<String>,
    old_properties: Option<Value>,
}

impl TestEvent {
    pub fn new(
        operation: Operation,
        resource_type_base: &str,
        properties: Value,
        response_url: &str,
    ) -> Self {
        let resource_type = if resource_type_base.starts_with("Custom::") {
            resource_type_base.to_string()
        } else {
            format!("Custom::{resource_type_base}")
        };
        Self {
            operation,
            resource_type,
            properties,
            response_url: response_url.to_string(),
            stack_id: None,
            request_id: None,
            logical_resource_id: None,
            physical_resource_id: None,
            old_properties: None,
        }
    }

    pub fn stack_id(mut self, stack_id: impl Into<String>) -> Self {
        self.stack_id = Some(stack_id.into());
        self
    }

    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn logical_resource_id(mut self, id: impl Into<String>) -> Self {
        self.logical_resource_id = Some(id.into());
        self
    }

    pub fn physical_resource_id(mut self, id: impl Into<String>) -> Self {
        self.physical_resource_id = Some(id.into());
        self
    }

    pub fn old_properties(mut self, properties: Value) -> Self {
        self.old_properties = Some(properties);
        self
    }

    /// Produces the raw event, or a configuration error if the pieces
    /// required for this operation are missing.
    pub fn build(self) -> Result<Value, EventBuilderError> {
        if !self.properties.is_object() {
            return Err(EventBuilderError::PropertiesNotObject);
        }

        let mut event = Map::new();
        event.insert("RequestType".into(), json!(self.operation.as_str()));
        event.insert("ResponseURL".into(), json!(self.response_url));
        event.insert(
            "StackId".into(),
            json!(self.stack_id.unwrap_or_else(|| EXAMPLE_STACK_ID.to_string())),
        );
        event.insert(
            "RequestId".into(),
            json!(self.request_id.unwrap_or_else(random_request_id)),
        );
        event.insert("ResourceType".into(), json!(self.resource_type));
        event.insert(
            "LogicalResourceId".into(),
            json!(self
                .logical_resource_id
                .unwrap_or_else(|| "MyLogicalResourceId".to_string())),
        );
        event.insert("ResourceProperties".into(), self.properties);

        if self.operation != Operation::Create {
            let physical = self
                .physical_resource_id
                .ok_or(EventBuilderError::MissingPhysicalId(self.operation))?;
            event.insert("PhysicalResourceId".into(), json!(physical));
        }

        if self.operation == Operation::Update {
            let old = self
                .old_properties
                .ok_or(EventBuilderError::MissingOldProperties)?;
            if !old.is_object() {
                return Err(EventBuilderError::PropertiesNotObject);
            }
            event.insert("OldResourceProperties".into(), old);
        }

        Ok(Value::Object(event))
    }
}

/// Invocation metadata shaped like the serverless runtime's, for driving
/// the engine in tests and local runs.
#[derive(Debug, Clone)]
pub struct MockInvocationContext {
    pub function_name: String,
    pub function_version: String,
    pub invoked_function_arn: String,
    pub memory_limit_in_mb: u32,
    pub log_group_name: String,
    pub log_stream_name: String,
    deadline: Instant,
}

impl MockInvocationContext {
    pub fn new(function_name: &str, timeout: Duration) -> Self {
        let function_version = "$LATEST".to_string();
        Self {
            function_name: function_name.to_string(),
            invoked_function_arn: format!(
                "arn:aws:lambda:us-east-1:123456789012:function:{function_name}:{function_version}"
            ),
            memory_limit_in_mb: 128,
            log_group_name: format!("/aws/lambda/{function_name}"),
            // Obviously synthetic date prefix; only the shape matters.
            log_stream_name: format!("1970/01/01/[{function_version}]{}", random_request_id()),
            function_version,
            deadline: Instant::now() + timeout,
        }
    }
}

impl Default for MockInvocationContext {
    fn default() -> Self {
        Self::new("FunctionName", Duration::from_secs(3))
    }
}

impl InvocationContext for MockInvocationContext {
    fn function_name(&self) -> &str {
        &self.function_name
    }

    fn log_group_name(&self) -> &str {
        &self.log_group_name
    }

    fn log_stream_name(&self) -> &str {
        &self.log_stream_name
    }

    fn remaining_time_millis(&self) -> u64 {
        self.deadline
            .saturating_duration_since(Instant::now())
            .as_millis() as u64
    }
}

/// One captured delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedDelivery {
    pub url: String,
    pub body: String,
}

/// A transport that records every delivery instead of sending it.
#[derive(Clone)]
pub struct RecordingTransport {
    deliveries: Arc<Mutex<Vec<RecordedDelivery>>>,
    status: u16,
    failure: Option<String>,
}

impl RecordingTransport {
    /// Records deliveries and answers 200.
    pub fn new() -> Self {
        Self {
            deliveries: Arc::new(Mutex::new(Vec::new())),
            status: 200,
            failure: None,
        }
    }

    /// Records deliveries and answers the given status code.
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            ..Self::new()
        }
    }

    /// Fails every delivery with the given message, recording nothing.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new()
        }
    }

    /// Everything delivered so far.
    pub fn deliveries(&self) -> Vec<RecordedDelivery> {
        self.deliveries.lock().unwrap().clone()
    }
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseTransport for RecordingTransport {
    async fn put(&self, url: &str, body: String) -> Result<u16, TransportError> {
        if let Some(message) = &self.failure {
            return Err(TransportError::RequestFailed(message.clone()));
        }
        self.deliveries.lock().unwrap().push(RecordedDelivery {
            url: url.to_string(),
            body,
        });
        Ok(self.status)
    }
}
