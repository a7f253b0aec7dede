use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::improve::TextImprover;
use crate::layout::LayoutScheduler;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Pluggable text improver. `LlmTextImprover` when an API key is configured,
    /// `DisabledImprover` otherwise.
    pub improver: Arc<dyn TextImprover>,
    /// Debounced background layout of saved CVs. Also owns the effective `LayoutConfig`.
    pub scheduler: LayoutScheduler,
}
