//! # Outcome Model
//!
//! The canonical success/failure/output record produced by one lifecycle
//! invocation. An [`Outcome`] is created fresh at the start of every
//! `handle` call, mutated during validation and dispatch, consumed exactly
//! once by the response dispatcher, and then discarded.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Key under which a scalar operation result is stored in the outputs.
pub const RESULT_KEY: &str = "result";

/// Terminal status reported back to the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAILED")]
    Failed,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Success => "SUCCESS",
            Status::Failed => "FAILED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an operation handler produced, made explicit instead of inspecting
/// the shape of a loosely typed return value.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationResult {
    /// Nothing to report beyond success/failure.
    Empty,
    /// Named outputs, merged into the outcome's output map.
    KeyedOutputs(Map<String, Value>),
    /// A single unnamed value, stored under [`RESULT_KEY`].
    Scalar(Value),
}

/// Mutable accumulator built during one invocation.
///
/// # Status precedence
/// Operations signal success/failure in one of two ways: by returning a
/// `Result`, or by setting the status here directly. An explicitly set
/// status always wins — a clean return does not overwrite it, and neither
/// does a raised error.
#[derive(Debug, Default)]
pub struct Outcome {
    status: Option<Status>,
    failure_reason: Option<String>,
    outputs: Map<String, Value>,
    resolved_physical_id: Option<String>,
}

impl Outcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Option<Status> {
        self.status
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = Some(status);
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Marks the outcome failed with an explanation for the `Reason` field.
    pub fn set_failure(&mut self, reason: impl Into<String>) {
        self.status = Some(Status::Failed);
        self.failure_reason = Some(reason.into());
    }

    pub fn outputs(&self) -> &Map<String, Value> {
        &self.outputs
    }

    pub fn insert_output(&mut self, key: impl Into<String>, value: Value) {
        self.outputs.insert(key.into(), value);
    }

    /// The identifier ultimately reported back; the dispatcher falls back
    /// to the invocation's log stream name when this was never resolved.
    pub fn resolved_physical_id(&self) -> Option<&str> {
        self.resolved_physical_id.as_deref()
    }

    pub fn set_resolved_physical_id(&mut self, id: impl Into<String>) {
        self.resolved_physical_id = Some(id.into());
    }

    /// Merges an operation's return value into the outputs.
    pub fn absorb(&mut self, result: OperationResult) {
        match result {
            OperationResult::Empty => {}
            OperationResult::KeyedOutputs(map) => self.outputs.extend(map),
            OperationResult::Scalar(value) => {
                self.outputs.insert(RESULT_KEY.to_string(), value);
            }
        }
    }
}
