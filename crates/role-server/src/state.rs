//! Application State

use std::sync::Arc;

use role_core::{ProviderInfo, RoleEngine, Toolset};
use tokio::sync::Mutex;

use crate::config::ServerConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The single role engine; calls are serialized through the lock
    pub engine: Arc<Mutex<RoleEngine>>,

    /// Captured at startup so `/health` never waits on the engine lock
    pub provider: ProviderInfo,

    /// Tool families exposed to clients
    pub tools: Toolset,

    pub server: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(engine: RoleEngine, server: ServerConfig) -> Self {
        let provider = engine.provider_info();
        Self {
            engine: Arc::new(Mutex::new(engine)),
            provider,
            tools: server.toolset(),
            server: Arc::new(server),
        }
    }
}
