//! # Lifecycle Requests
//!
//! This module defines the parsed form of an inbound custom resource event.
//!
//! CloudFormation delivers the event as a JSON object. Parsing is split in
//! two: [`Request::from_event`] performs the strict extraction with
//! required-field checks, while the engine separately keeps a lenient copy
//! of the correlation fields so that a malformed event can still be
//! answered with a FAILED response.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The three state-changing actions a managed resource can undergo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    /// The wire name used in the `RequestType` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "Create",
            Operation::Update => "Update",
            Operation::Delete => "Delete",
        }
    }

    /// Parses the wire name. Returns `None` for anything that is not
    /// exactly `Create`, `Update` or `Delete`.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "Create" => Some(Operation::Create),
            "Update" => Some(Operation::Update),
            "Delete" => Some(Operation::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable input to one lifecycle invocation.
///
/// # Invariant
/// `physical_resource_id` is `None` only for Create (before the engine has
/// generated one); it is required and non-empty for Update and Delete.
#[derive(Debug, Clone)]
pub struct Request {
    pub operation: Operation,
    /// Pre-signed callback destination for the response.
    pub response_url: String,
    pub stack_id: String,
    pub request_id: String,
    /// The resource type declared on the event, validated against the
    /// engine's configured [`ResourceTypeSpec`](crate::engine::ResourceTypeSpec).
    pub resource_type: String,
    /// Caller-assigned name, stable across updates.
    pub logical_resource_id: String,
    pub physical_resource_id: Option<String>,
    /// Desired state of the resource.
    pub resource_properties: Map<String, Value>,
    /// Prior desired state; present only on Update.
    pub old_resource_properties: Option<Map<String, Value>>,
}

fn required_str<'a>(obj: &'a Map<String, Value>, key: &'static str) -> Result<&'a str, EngineError> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(EngineError::MissingField(key))
}

impl Request {
    /// Strictly parses a raw inbound event.
    ///
    /// Any missing or empty required field is an error; the engine's
    /// top-level guard converts it into a FAILED outcome.
    pub fn from_event(event: &Value) -> Result<Self, EngineError> {
        let obj = event.as_object().ok_or(EngineError::MalformedEvent)?;

        let op_str = required_str(obj, "RequestType")?;
        let operation = Operation::from_wire(op_str)
            .ok_or_else(|| EngineError::UnknownOperation(op_str.to_string()))?;

        let physical_resource_id = obj
            .get("PhysicalResourceId")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(String::from);
        if physical_resource_id.is_none() && operation != Operation::Create {
            return Err(EngineError::MissingPhysicalId(operation));
        }

        Ok(Self {
            operation,
            response_url: required_str(obj, "ResponseURL")?.to_string(),
            stack_id: required_str(obj, "StackId")?.to_string(),
            request_id: required_str(obj, "RequestId")?.to_string(),
            resource_type: required_str(obj, "ResourceType")?.to_string(),
            logical_resource_id: required_str(obj, "LogicalResourceId")?.to_string(),
            physical_resource_id,
            resource_properties: obj
                .get("ResourceProperties")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
            old_resource_properties: obj
                .get("OldResourceProperties")
                .and_then(Value::as_object)
                .cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_event() -> Value {
        json!({
            "RequestType": "Create",
            "ResponseURL": "https://callback.example/presigned",
            "StackId": "arn:aws:cloudformation:us-west-2:123:stack/my-stack/guid",
            "RequestId": "7bfe2d54710d48dcbc6f0b26fb68c9d1",
            "ResourceType": "Custom::Widget",
            "LogicalResourceId": "MyWidget",
            "ResourceProperties": {"Key": "Value"}
        })
    }

    #[test]
    fn parses_create_event() {
        let request = Request::from_event(&base_event()).unwrap();
        assert_eq!(request.operation, Operation::Create);
        assert_eq!(request.logical_resource_id, "MyWidget");
        assert!(request.physical_resource_id.is_none());
        assert_eq!(request.resource_properties["Key"], json!("Value"));
        assert!(request.old_resource_properties.is_none());
    }

    #[test]
    fn missing_response_url_is_an_error() {
        let mut event = base_event();
        event.as_object_mut().unwrap().remove("ResponseURL");
        let err = Request::from_event(&event).unwrap_err();
        assert!(matches!(err, EngineError::MissingField("ResponseURL")));
    }

    #[test]
    fn update_without_physical_id_is_an_error() {
        let mut event = base_event();
        event["RequestType"] = json!("Update");
        let err = Request::from_event(&event).unwrap_err();
        assert!(matches!(err, EngineError::MissingPhysicalId(Operation::Update)));
    }

    #[test]
    fn delete_requires_non_empty_physical_id() {
        let mut event = base_event();
        event["RequestType"] = json!("Delete");
        event["PhysicalResourceId"] = json!("");
        let err = Request::from_event(&event).unwrap_err();
        assert!(matches!(err, EngineError::MissingPhysicalId(Operation::Delete)));
    }

    #[test]
    fn unknown_request_type_is_an_error() {
        let mut event = base_event();
        event["RequestType"] = json!("Upsert");
        let err = Request::from_event(&event).unwrap_err();
        assert!(matches!(err, EngineError::UnknownOperation(_)));
    }

    #[test]
    fn properties_default_to_empty() {
        let mut event = base_event();
        event.as_object_mut().unwrap().remove("ResourceProperties");
        let request = Request::from_event(&event).unwrap();
        assert!(request.resource_properties.is_empty());
    }
}
