pub mod health;
pub mod picks;
pub mod standings;
pub mod tournaments;

use crate::config::Config;
use crate::db::Repository;
use crate::orchestration::{PickSubmitter, ResultsReconciler, TournamentLocks};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Config,
    pub reconciler: ResultsReconciler,
    pub submitter: PickSubmitter,
}

impl AppState {
    /// Build the state with one lock table shared by the reconciler and the
    /// pick submitter.
    pub fn new(repo: Arc<Repository>, config: Config, locks: TournamentLocks) -> Self {
        let reconciler = ResultsReconciler::new(repo.clone(), locks.clone());
        let submitter = PickSubmitter::new(repo.clone(), locks, config.league_tz);
        Self {
            repo,
            config,
            reconciler,
            submitter,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route(
            "/v1/tournaments/:id/results",
            get(tournaments::get_results),
        )
        .route(
            "/v1/tournaments/:id/reconcile",
            post(tournaments::post_reconcile),
        )
        .route("/v1/tournaments/:id/picks", post(picks::post_pick))
        .route("/v1/tournaments/:id/available", get(picks::get_available))
        .route("/v1/standings", get(standings::get_standings))
        .route("/v1/users/:id/usage", get(standings::get_user_usage))
        .layer(cors)
        .with_state(state)
}
