//! # Widget Resource
//!
//! A sample resource backing `Custom::Widget`. The "provisioning" is an
//! in-memory registry standing in for whatever external system a real
//! implementation would call; the interesting part is how the trait is
//! implemented, not what it provisions.

use async_trait::async_trait;
use cfn_resource::{CustomResource, OperationResult, Outcome, Request};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    #[error("missing required property {0}")]
    MissingProperty(&'static str),
    #[error("no widget registered under {0}")]
    NotFound(String),
}

/// The external system the widgets live in, shared across invocations in
/// tests the way a real SDK client would be.
pub type WidgetRegistry = Arc<Mutex<HashMap<String, String>>>;

pub struct WidgetResource {
    registry: WidgetRegistry,
    // Filled in by populate() from the request properties.
    name: Option<String>,
}

impl WidgetResource {
    pub fn new(registry: WidgetRegistry) -> Self {
        Self {
            registry,
            name: None,
        }
    }

    fn name(&self) -> Result<&str, WidgetError> {
        self.name.as_deref().ok_or(WidgetError::MissingProperty("Name"))
    }

    fn arn(name: &str) -> String {
        format!("arn:example:widget:::{name}")
    }

    fn outputs(name: &str) -> OperationResult {
        let mut outputs = Map::new();
        outputs.insert("Arn".to_string(), json!(Self::arn(name)));
        OperationResult::KeyedOutputs(outputs)
    }
}

#[async_trait]
impl CustomResource for WidgetResource {
    type Error = WidgetError;

    fn validate(&mut self, request: &Request) -> bool {
        request.resource_properties.contains_key("Name")
    }

    fn populate(&mut self, request: &Request) {
        self.name = request
            .resource_properties
            .get("Name")
            .and_then(Value::as_str)
            .map(String::from);
    }

    async fn create(
        &mut self,
        _request: &Request,
        outcome: &mut Outcome,
    ) -> Result<OperationResult, WidgetError> {
        let name = self.name()?.to_string();
        let physical_id = outcome
            .resolved_physical_id()
            .unwrap_or(&name)
            .to_string();
        self.registry
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(physical_id, name.clone());
        info!(name, "widget created");
        Ok(Self::outputs(&name))
    }

    async fn update(
        &mut self,
        request: &Request,
        _outcome: &mut Outcome,
    ) -> Result<OperationResult, WidgetError> {
        let name = self.name()?.to_string();
        let physical_id = request
            .physical_resource_id
            .clone()
            .unwrap_or_default();
        let mut registry = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        match registry.get_mut(&physical_id) {
            Some(entry) => {
                *entry = name.clone();
                info!(name, "widget updated");
                Ok(Self::outputs(&name))
            }
            None => Err(WidgetError::NotFound(physical_id)),
        }
    }

    async fn delete(
        &mut self,
        request: &Request,
        _outcome: &mut Outcome,
    ) -> Result<OperationResult, WidgetError> {
        let physical_id = request
            .physical_resource_id
            .clone()
            .unwrap_or_default();
        let removed = self
            .registry
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&physical_id);
        match removed {
            Some(name) => {
                info!(name, "widget deleted");
                Ok(OperationResult::Empty)
            }
            None => Err(WidgetError::NotFound(physical_id)),
        }
    }
}
