use std::sync::Arc;

use sqlx::MySqlPool;

use crate::ai::matching::{MatchScorer, OverlapScorer, ProficiencyScorer};
use crate::config::Config;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: MySqlPool,
    /// `None` when no API key is configured; proposals then use templates only.
    pub llm: Option<LlmClient>,
    pub config: Config,
    /// Scores stored on applications at submission time.
    pub application_scorer: Arc<dyn MatchScorer>,
    /// Scores shown by the match lookup and recommendations.
    pub lookup_scorer: Arc<dyn MatchScorer>,
}

impl AppState {
    pub fn new(db: MySqlPool, llm: Option<LlmClient>, config: Config) -> Self {
        Self {
            db,
            llm,
            config,
            application_scorer: Arc::new(ProficiencyScorer),
            lookup_scorer: Arc::new(OverlapScorer),
        }
    }
}
