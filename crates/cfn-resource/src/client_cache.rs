//! # Client Cache
//!
//! Process-wide memoization of named external service clients, built
//! through a pluggable factory. Entries are created lazily on first
//! request and never evicted or refreshed within the process lifetime.
//!
//! # Architecture Note
//! The reference deployment runs one invocation at a time per process, so
//! the cache is read-mostly. Runtimes that reuse a process across
//! concurrent invocations are still safe: both maps are guarded, and the
//! factory is called while the guard is held so a client is never
//! constructed twice for the same name.
//!
//! Handles are type-erased because the framework cannot know concrete SDK
//! client types; [`ClientCache::get_as`] recovers the concrete type.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// A memoized, type-erased client handle.
pub type ClientHandle = Arc<dyn Any + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to build session: {0}")]
    Session(Box<dyn std::error::Error + Send + Sync>),
    #[error("failed to build client {0}: {1}")]
    Client(String, Box<dyn std::error::Error + Send + Sync>),
    #[error("client {0} is not a {1}")]
    WrongType(String, &'static str),
}

/// Builds the session and the named clients the cache hands out.
///
/// Override this to supply mock sessions and clients in tests, the same
/// way the default implementation bootstraps the real SDK.
pub trait ClientFactory: Send + Sync {
    fn session(&self) -> Result<ClientHandle, CacheError>;

    fn client(&self, session: &ClientHandle, name: &str) -> Result<ClientHandle, CacheError>;
}

/// Memoizes one session and any number of named clients for the lifetime
/// of the process. Construct it once and inject it wherever clients are
/// needed; its lifetime spans invocations by design.
pub struct ClientCache {
    factory: Arc<dyn ClientFactory>,
    session: Mutex<Option<ClientHandle>>,
    clients: Mutex<HashMap<String, ClientHandle>>,
}

impl ClientCache {
    pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            factory,
            session: Mutex::new(None),
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// The memoized session, built on first use.
    pub fn session(&self) -> Result<ClientHandle, CacheError> {
        let mut guard = self.session.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(session) = guard.as_ref() {
            return Ok(session.clone());
        }
        debug!("building session");
        let session = self.factory.session()?;
        *guard = Some(session.clone());
        Ok(session)
    }

    /// The memoized client for `name`, built on first use.
    pub fn get(&self, name: &str) -> Result<ClientHandle, CacheError> {
        let mut guard = self.clients.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(client) = guard.get(name) {
            return Ok(client.clone());
        }
        debug!(name, "building client");
        let session = self.session()?;
        let client = self.factory.client(&session, name)?;
        guard.insert(name.to_string(), client.clone());
        Ok(client)
    }

    /// Like [`get`](ClientCache::get), downcast to the concrete type the
    /// factory produced.
    pub fn get_as<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, CacheError> {
        self.get(name)?
            .downcast::<T>()
            .map_err(|_| CacheError::WrongType(name.to_string(), std::any::type_name::<T>()))
    }
}
