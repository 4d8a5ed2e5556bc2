//! # Lifecycle Engine
//!
//! The orchestrator for one custom resource invocation: parse the inbound
//! event, validate the declared resource type, resolve the physical id,
//! dispatch to the resource's create/update/delete operation, normalize
//! the result into an [`Outcome`], apply the deletion override policies,
//! and hand the outcome to the finish hook — exactly once, no matter
//! which step failed.
//!
//! # Architecture Note
//! All collaborators are constructor-injected strategies defaulted to the
//! reference implementations: the id generator, the finish hook (the
//! response dispatcher over an HTTP transport) and the optional log
//! cleanup. Nothing is ambient or global; in particular the
//! [`ClientCache`](crate::client_cache::ClientCache) is an explicitly
//! constructed object the caller owns and wires into the strategies that
//! need it.

use crate::context::InvocationContext;
use crate::error::EngineError;
use crate::outcome::{Outcome, Status};
use crate::physical_id::{IdGenerator, UniqueIdGenerator};
use crate::request::{Operation, Request};
use crate::resource::CustomResource;
use crate::response::{DeliveryResult, ResponseDispatcher, ResponseTarget};
use crate::transport::{HttpTransport, ResponseTransport};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// The resource type names an engine accepts, fixed for the life of the
/// process. Names that are not already namespaced get the `Custom::`
/// prefix.
#[derive(Debug, Clone)]
pub struct ResourceTypeSpec {
    types: BTreeSet<String>,
}

impl ResourceTypeSpec {
    fn qualify(name: &str) -> String {
        if name.starts_with("Custom::") || name == "AWS::CloudFormation::CustomResource" {
            name.to_string()
        } else {
            format!("Custom::{name}")
        }
    }

    /// A spec accepting exactly one resource type.
    pub fn single(name: &str) -> Self {
        Self {
            types: BTreeSet::from([Self::qualify(name)]),
        }
    }

    /// A spec accepting any of the given resource types.
    pub fn any_of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            types: names.into_iter().map(|n| Self::qualify(n.as_ref())).collect(),
        }
    }

    /// Exact-match check against the declared type.
    pub fn matches(&self, declared: &str) -> bool {
        self.types.contains(declared)
    }
}

/// Per-engine policy switches, mirroring the configuration of existing
/// deployments.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Report Success for a failed Delete. Prevents the owning stack from
    /// getting stuck in a non-deletable state, at the cost of silently
    /// leaking whatever the operation failed to clean up; the masking is
    /// logged loudly so operators can reconcile out-of-band.
    pub hide_delete_failure: bool,
    /// After a successful Delete, best-effort delete this invocation's
    /// log group. Not intended for functions shared by multiple stacks.
    pub delete_logs_on_stack_deletion: bool,
    /// Skip automatic physical id generation when the resource supplies
    /// its own identifier from the operation.
    pub disable_physical_id_generation: bool,
    /// Upper bound passed to the id generator.
    pub physical_id_max_len: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hide_delete_failure: true,
            delete_logs_on_stack_deletion: false,
            disable_physical_id_generation: false,
            physical_id_max_len: Some(128),
        }
    }
}

/// Receives the completed outcome. Defaults to the response dispatcher;
/// override to suppress or redirect delivery.
#[async_trait]
pub trait FinishHook: Send + Sync {
    async fn finish(
        &self,
        outcome: &Outcome,
        target: &ResponseTarget,
        ctx: &dyn InvocationContext,
    ) -> DeliveryResult;
}

#[async_trait]
impl FinishHook for ResponseDispatcher {
    async fn finish(
        &self,
        outcome: &Outcome,
        target: &ResponseTarget,
        ctx: &dyn InvocationContext,
    ) -> DeliveryResult {
        self.send(outcome, target, ctx).await
    }
}

/// Deletes the invocation's log resource after a successful stack
/// deletion. Implementations typically fetch a logs client from the
/// [`ClientCache`](crate::client_cache::ClientCache).
#[async_trait]
pub trait LogCleanup: Send + Sync {
    async fn delete_log_group(
        &self,
        group: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Drives one resource implementation through the request lifecycle.
pub struct LifecycleEngine<R: CustomResource> {
    resource: R,
    resource_type: ResourceTypeSpec,
    config: EngineConfig,
    id_generator: Arc<dyn IdGenerator>,
    finish: Arc<dyn FinishHook>,
    log_cleanup: Option<Arc<dyn LogCleanup>>,
}

impl<R: CustomResource> LifecycleEngine<R> {
    /// An engine with the reference strategies: random-suffix id
    /// generation and response delivery over HTTP PUT.
    pub fn new(resource: R, resource_type: ResourceTypeSpec) -> Self {
        Self {
            resource,
            resource_type,
            config: EngineConfig::default(),
            id_generator: Arc::new(UniqueIdGenerator::new()),
            finish: Arc::new(ResponseDispatcher::new(Arc::new(HttpTransport::new()))),
            log_cleanup: None,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Swaps the transport under the default finish hook. Overridden
    /// again by a later [`with_finish_hook`](Self::with_finish_hook).
    pub fn with_transport(mut self, transport: Arc<dyn ResponseTransport>) -> Self {
        self.finish = Arc::new(ResponseDispatcher::new(transport));
        self
    }

    pub fn with_id_generator(mut self, generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = generator;
        self
    }

    pub fn with_finish_hook(mut self, hook: Arc<dyn FinishHook>) -> Self {
        self.finish = hook;
        self
    }

    pub fn with_log_cleanup(mut self, cleanup: Arc<dyn LogCleanup>) -> Self {
        self.log_cleanup = Some(cleanup);
        self
    }

    /// Short resource name used in failure reasons and logs.
    fn resource_name() -> &'static str {
        std::any::type_name::<R>()
            .rsplit("::")
            .next()
            .unwrap_or("CustomResource")
    }

    /// Handles one inbound event end to end.
    ///
    /// Side-effect-only: every path, including malformed events and
    /// panicking-adjacent operation failures surfaced as errors, ends in
    /// exactly one call to the finish hook. Nothing propagates out.
    pub async fn handle(&mut self, event: Value, ctx: &dyn InvocationContext) {
        let resource_name = Self::resource_name();
        info!(
            resource = resource_name,
            function = ctx.function_name(),
            log_stream = ctx.log_stream_name(),
            "request received"
        );
        debug!(event = %event, "raw event");

        // Correlation fields are extracted leniently up front so that a
        // FAILED outcome can still be delivered for a malformed event.
        let target = ResponseTarget::from_event(&event);
        let operation = event
            .get("RequestType")
            .and_then(Value::as_str)
            .and_then(Operation::from_wire);

        let mut outcome = Outcome::new();

        match self.run_operation(&event, &mut outcome).await {
            Ok(()) => {
                if outcome.status().is_none() {
                    outcome.set_status(Status::Success);
                }
            }
            Err(err) => {
                if outcome.status().is_none() {
                    outcome.set_failure(format!(
                        "Custom resource {resource_name} failed due to exception \"{err}\"."
                    ));
                }
                if let Some(reason) = outcome.failure_reason() {
                    error!(reason, "operation failed");
                }
                debug!(error = ?err, "failure detail");
            }
        }

        if operation == Some(Operation::Delete) {
            if outcome.status() == Some(Status::Failed) && self.config.hide_delete_failure {
                error!(
                    "resources created by this handler may remain despite the \
                     delete being reported as successful"
                );
                if let Some(reason) = outcome.failure_reason() {
                    error!(reason, "reason for masked delete failure");
                }
                outcome.set_status(Status::Success);
            }

            if outcome.status() == Some(Status::Success)
                && self.config.delete_logs_on_stack_deletion
            {
                // Best-effort only; the outcome is already final.
                if let Some(cleanup) = &self.log_cleanup {
                    if let Err(err) = cleanup.delete_log_group(ctx.log_group_name()).await {
                        warn!(error = %err, "log group cleanup failed");
                    }
                } else {
                    warn!("delete_logs_on_stack_deletion set but no log cleanup configured");
                }
            }
        }

        self.finish.finish(&outcome, &target, ctx).await;
    }

    /// The guarded section: any error returned here is converted into a
    /// FAILED outcome by [`handle`](Self::handle).
    async fn run_operation(
        &mut self,
        event: &Value,
        outcome: &mut Outcome,
    ) -> Result<(), EngineError> {
        let request = Request::from_event(event)?;

        if !self.resource_type.matches(&request.resource_type) {
            return Err(EngineError::InvalidResourceType(request.resource_type));
        }

        if !self.resource.validate(&request) {
            // Deliberately non-enforcing; see CustomResource::validate.
            debug!("validate() returned false; continuing");
        }

        match &request.physical_resource_id {
            Some(id) => outcome.set_resolved_physical_id(id.clone()),
            None if !self.config.disable_physical_id_generation => {
                let id = self
                    .id_generator
                    .generate(&request, self.config.physical_id_max_len);
                debug!(physical_id = %id, "generated physical id");
                outcome.set_resolved_physical_id(id);
            }
            None => {}
        }

        self.resource.populate(&request);

        let result = match request.operation {
            Operation::Create => self.resource.create(&request, outcome).await,
            Operation::Update => self.resource.update(&request, outcome).await,
            Operation::Delete => self.resource.delete(&request, outcome).await,
        }
        .map_err(|e| EngineError::Operation(Box::new(e)))?;

        outcome.absorb(result);
        info!(operation = %request.operation, "operation completed");
        Ok(())
    }
}
