//! # Framework Errors
//!
//! Error types for the lifecycle engine. Note that none of these ever
//! propagate out of [`handle`](crate::engine::LifecycleEngine::handle):
//! the engine's top-level guard converts them into a FAILED outcome whose
//! `Reason` field is the only failure channel back to the control plane.

use crate::request::Operation;

/// Errors raised while parsing and validating an inbound event or while
/// running a user-supplied operation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("event is not a JSON object")]
    MalformedEvent,
    #[error("missing required field {0}")]
    MissingField(&'static str),
    #[error("unknown request type \"{0}\"")]
    UnknownOperation(String),
    #[error("invalid resource type {0}")]
    InvalidResourceType(String),
    #[error("physical resource id not set for {0}")]
    MissingPhysicalId(Operation),
    #[error("{0}")]
    Operation(Box<dyn std::error::Error + Send + Sync>),
}
