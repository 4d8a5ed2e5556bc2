//! # CustomResource Trait
//!
//! The contract a resource implementation must satisfy to be driven by the
//! [`LifecycleEngine`](crate::engine::LifecycleEngine).
//!
//! # Architecture Note
//! Each of the three lifecycle operations is a required method, so the
//! engine dispatches on the [`Operation`](crate::request::Operation) enum
//! instead of looking methods up by name. The compiler guarantees every
//! resource can handle every operation.
//!
//! # Signaling success and failure
//! An operation can signal its result in two ways:
//! * Return `Ok(OperationResult)` or `Err(_)`.
//! * Set the status on the [`Outcome`] it is handed.
//!
//! An explicitly set status always wins: a clean return with the status
//! already set keeps that status, and an `Err` does not overwrite one
//! either. On a clean return with the status unset, the engine records
//! Success.

use crate::outcome::{OperationResult, Outcome};
use crate::request::Request;
use async_trait::async_trait;

/// A user-supplied resource implementation.
#[async_trait]
pub trait CustomResource: Send + Sync {
    /// The error type for this resource.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns whether the request's properties are valid.
    ///
    /// # Quirk, preserved deliberately
    /// A `false` return is currently a no-op: the engine logs it and
    /// continues. This matches the long-standing behavior of existing
    /// deployments, which implementations have come to rely on. Raise an
    /// error from [`populate`](CustomResource::populate) or the operation
    /// itself to actually reject a request.
    fn validate(&mut self, _request: &Request) -> bool {
        true
    }

    /// Extracts fields from `resource_properties` /
    /// `old_resource_properties` into the implementation's own state, if
    /// this is not done in [`validate`](CustomResource::validate).
    fn populate(&mut self, _request: &Request) {}

    async fn create(
        &mut self,
        request: &Request,
        outcome: &mut Outcome,
    ) -> Result<OperationResult, Self::Error>;

    async fn update(
        &mut self,
        request: &Request,
        outcome: &mut Outcome,
    ) -> Result<OperationResult, Self::Error>;

    async fn delete(
        &mut self,
        request: &Request,
        outcome: &mut Outcome,
    ) -> Result<OperationResult, Self::Error>;
}
