use std::sync::Arc;

use axum::Router;
use axum::routing::{any, get};
use gembridge_provider_core::Provider;

use crate::handler::{health_handler, proxy_handler};
use crate::models::ModelCatalog;

pub struct CoreState {
    pub provider: Arc<dyn Provider>,
    pub models: ModelCatalog,
    pub proxy: Option<String>,
}

pub struct Core {
    state: Arc<CoreState>,
}

impl Core {
    pub fn new(provider: Arc<dyn Provider>, models: ModelCatalog, proxy: Option<String>) -> Self {
        Self {
            state: Arc::new(CoreState {
                provider,
                models,
                proxy,
            }),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/{version}/{*path}", any(proxy_handler))
            .with_state(self.state.clone())
    }

    pub fn state(&self) -> Arc<CoreState> {
        self.state.clone()
    }
}
