use std::sync::Arc;

use crate::completion::CompletionGateway;
use crate::config::Config;
use crate::store::ProfileStore;

/// Shared application state injected into all route handlers via Axum
/// extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: ProfileStore,
    /// The completion gateway behind its trait so tests and alternative
    /// backends can be injected. Holds its own response cache.
    pub gateway: Arc<dyn CompletionGateway>,
    pub config: Config,
}
