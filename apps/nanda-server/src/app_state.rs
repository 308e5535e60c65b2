use std::sync::Arc;

use nanda_core::{FixedWindowLimiter, MemoryStore, SessionState};
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};

use crate::config::{Identity, ServiceConfig};

/// Per-server context handed to every handler. Cloning shares the same
/// session lock and memory store.
#[derive(Clone)]
pub(crate) struct AppState {
    session: Arc<Mutex<SessionState>>, // the one global lock
    memory: Arc<MemoryStore>,
    identity: Arc<Identity>,
    tools_enabled: bool,
}

impl AppState {
    pub fn new(config: &ServiceConfig) -> Self {
        let limiter = FixedWindowLimiter::new(config.rate_limit_per_min);
        Self {
            session: Arc::new(Mutex::new(SessionState::new(limiter))),
            memory: Arc::new(MemoryStore::new(config.memory_path.clone())),
            identity: Arc::new(config.identity.clone()),
            tools_enabled: config.tools_enabled,
        }
    }

    pub async fn session(&self) -> MutexGuard<'_, SessionState> {
        self.session.lock().await
    }

    /// Guard that can outlive the handler, used to finish persistence after
    /// the response has been handed back.
    pub async fn session_owned(&self) -> OwnedMutexGuard<SessionState> {
        self.session.clone().lock_owned().await
    }

    pub fn memory(&self) -> Arc<MemoryStore> {
        self.memory.clone()
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn tools_enabled(&self) -> bool {
        self.tools_enabled
    }
}
