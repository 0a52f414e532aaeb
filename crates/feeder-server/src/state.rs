//! Shared application state.

use crate::config::Config;
use feeder_core::{DeviceStore, Router, SessionRegistry};
use tokio::sync::Mutex;

/// Shared application state.
pub struct AppState {
    /// Every dispatch holds this lock for the duration of its handler call,
    /// which is what keeps handler invocations strictly sequential.
    pub store: Mutex<DeviceStore>,
    pub sessions: SessionRegistry,
    pub router: Router,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            store: Mutex::new(DeviceStore::new(config.history_limit)),
            sessions: SessionRegistry::new(),
            router: Router::default(),
            config,
        }
    }
}
