//! # Invocation Context
//!
//! The runtime that triggers the engine (a serverless function runtime in
//! the reference deployment) supplies per-invocation metadata. The engine
//! only reads from it: the log stream name doubles as the fallback
//! physical id, the log group name is the target of the optional cleanup
//! on stack deletion, and the remaining-time query lets implementations
//! fail fast before the runtime kills the process.

/// Read-only view of the external runtime's invocation metadata.
pub trait InvocationContext: Send + Sync {
    fn function_name(&self) -> &str;

    /// Log group owned by this function, deleted on stack deletion when
    /// the engine is configured to do so.
    fn log_group_name(&self) -> &str;

    /// Log stream of this invocation; used as the fallback physical id
    /// and in the default `Reason` diagnostic pointer.
    fn log_stream_name(&self) -> &str;

    /// Milliseconds until the runtime terminates this invocation.
    ///
    /// The engine does not enforce this itself; operations may use it to
    /// pre-emptively fail instead of being killed mid-flight.
    fn remaining_time_millis(&self) -> u64;
}
