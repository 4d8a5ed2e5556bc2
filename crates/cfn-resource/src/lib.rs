//! # cfn-resource
//!
//! A lifecycle framework for functions backing custom CloudFormation
//! resources. You implement the [`CustomResource`] trait — one method per
//! lifecycle operation — and the [`LifecycleEngine`] takes care of
//! everything around it: parsing and validating the inbound event,
//! deriving a physical id, dispatching the operation, normalizing
//! success/failure into a canonical [`Outcome`], applying the deletion
//! override policies, and reliably delivering exactly one response to the
//! control plane's callback address, even when the operation fails.
//!
//! ## Architecture Overview
//!
//! The framework separates concerns into three layers:
//!
//! 1. **Resource Layer** ([`CustomResource`]) - your provisioning logic
//! 2. **Engine Layer** ([`LifecycleEngine`]) - the request state machine
//! 3. **Delivery Layer** ([`ResponseDispatcher`] + [`ResponseTransport`]) -
//!    the callback wire format and its best-effort delivery
//!
//! Collaborators are constructor-injected strategies, each with a
//! reference default: the id generator ([`UniqueIdGenerator`]), the
//! finish hook (the dispatcher over [`HttpTransport`]) and the optional
//! log cleanup. A [`ClientCache`] memoizes external service clients for
//! the life of the process.
//!
//! ```rust
//! use cfn_resource::{
//!     CustomResource, LifecycleEngine, Operation, OperationResult, Outcome,
//!     Request, ResourceTypeSpec,
//! };
//! use cfn_resource::mock::{MockInvocationContext, RecordingTransport, TestEvent};
//! use async_trait::async_trait;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! struct Widget;
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("widget error")]
//! struct WidgetError;
//!
//! #[async_trait]
//! impl CustomResource for Widget {
//!     type Error = WidgetError;
//!
//!     async fn create(&mut self, _request: &Request, _outcome: &mut Outcome)
//!         -> Result<OperationResult, WidgetError>
//!     {
//!         let mut outputs = serde_json::Map::new();
//!         outputs.insert("Arn".into(), json!("arn:example:widget"));
//!         Ok(OperationResult::KeyedOutputs(outputs))
//!     }
//!
//!     async fn update(&mut self, _: &Request, _: &mut Outcome)
//!         -> Result<OperationResult, WidgetError>
//!     {
//!         Ok(OperationResult::Empty)
//!     }
//!
//!     async fn delete(&mut self, _: &Request, _: &mut Outcome)
//!         -> Result<OperationResult, WidgetError>
//!     {
//!         Ok(OperationResult::Empty)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let transport = RecordingTransport::new();
//!     let mut engine = LifecycleEngine::new(Widget, ResourceTypeSpec::single("Widget"))
//!         .with_transport(Arc::new(transport.clone()));
//!
//!     let event = TestEvent::new(
//!         Operation::Create,
//!         "Widget",
//!         json!({"Key": "Value"}),
//!         "https://callback.example/presigned",
//!     )
//!     .build()
//!     .unwrap();
//!
//!     engine.handle(event, &MockInvocationContext::default()).await;
//!     assert_eq!(transport.deliveries().len(), 1);
//! }
//! ```

pub mod client_cache;
pub mod context;
pub mod engine;
pub mod error;
pub mod mock;
pub mod outcome;
pub mod physical_id;
pub mod request;
pub mod resource;
pub mod response;
pub mod tracing;
pub mod transport;

// Re-export core types for convenience
pub use client_cache::{CacheError, ClientCache, ClientFactory, ClientHandle};
pub use context::InvocationContext;
pub use engine::{EngineConfig, FinishHook, LifecycleEngine, LogCleanup, ResourceTypeSpec};
pub use error::EngineError;
pub use outcome::{OperationResult, Outcome, Status, RESULT_KEY};
pub use physical_id::{generate_unique_id, IdGenerator, UniqueIdGenerator, RANDOM_SUFFIX_LEN};
pub use request::{Operation, Request};
pub use resource::CustomResource;
pub use response::{CfnResponse, DeliveryResult, ResponseDispatcher, ResponseTarget};
pub use transport::{HttpTransport, ResponseTransport, TransportError};
