//! # Cache-Backed Log Cleanup
//!
//! Shows the [`ClientCache`] wiring: a factory that builds a logs client
//! by name, and a [`LogCleanup`] strategy that fetches the memoized
//! client from the cache when the engine asks for the invocation's log
//! group to be deleted after a successful stack deletion.

use async_trait::async_trait;
use cfn_resource::{CacheError, ClientCache, ClientFactory, ClientHandle, LogCleanup};
use std::sync::{Arc, Mutex};
use tracing::info;

/// Stand-in for a cloud SDK logs client; a real deployment would wrap the
/// SDK call instead of recording the group name.
#[derive(Default)]
pub struct LogsClient {
    deleted_groups: Mutex<Vec<String>>,
}

impl LogsClient {
    pub fn delete_log_group(&self, group: &str) {
        info!(group, "deleting log group");
        self.deleted_groups
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(group.to_string());
    }

    pub fn deleted_groups(&self) -> Vec<String> {
        self.deleted_groups
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Builds the sample's service clients. Only `"logs"` is known.
pub struct SampleClientFactory;

impl ClientFactory for SampleClientFactory {
    fn session(&self) -> Result<ClientHandle, CacheError> {
        // No credentials in the sample; a real factory bootstraps the SDK
        // session here.
        Ok(Arc::new(()))
    }

    fn client(&self, _session: &ClientHandle, name: &str) -> Result<ClientHandle, CacheError> {
        match name {
            "logs" => Ok(Arc::new(LogsClient::default())),
            other => Err(CacheError::Client(
                other.to_string(),
                format!("unknown service {other}").into(),
            )),
        }
    }
}

/// Deletes log groups through the process-wide client cache.
pub struct CachedLogCleanup {
    cache: Arc<ClientCache>,
}

impl CachedLogCleanup {
    pub fn new(cache: Arc<ClientCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl LogCleanup for CachedLogCleanup {
    async fn delete_log_group(
        &self,
        group: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let client = self.cache.get_as::<LogsClient>("logs")?;
        client.delete_log_group(group);
        Ok(())
    }
}
