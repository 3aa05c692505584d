use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;

use crate::adaptive::orchestrator::{
    AdjustRequest, AnalyzeRequest, FullAnalysisRequest, MatchmakingRequest, RecommendRequest,
};
use crate::adaptive::types::{DifficultyTier, StruggleStatus};
use crate::extractors::JsonBody;
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/analyze", post(analyze))
        .route("/adjust-difficulty", post(adjust_difficulty))
        .route("/full-analysis", post(full_analysis))
        .route("/matchmaking", post(matchmaking))
        .route("/recommended-difficulty", post(recommended_difficulty))
        .route("/status", get(status))
}

async fn analyze(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<AnalyzeRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let report = state.orchestrator().analyze(&req)?;
    Ok(ok(report))
}

async fn adjust_difficulty(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<AdjustRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let report = state.orchestrator().adjust_difficulty(&req)?;
    Ok(ok(report))
}

async fn full_analysis(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<FullAnalysisRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let result = state.orchestrator().full_analysis(&req).await?;
    Ok(ok(result))
}

async fn matchmaking(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<MatchmakingRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let outcome = state.orchestrator().matchmaking(&req).await?;
    Ok(ok(outcome))
}

async fn recommended_difficulty(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RecommendRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let recommendation = state.orchestrator().recommend(&req)?;
    Ok(ok(recommendation))
}

async fn status(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    ok(serde_json::json!({
        "status": "operational",
        "algorithms": {
            "irt": "Item Response Theory - struggle estimation",
            "dda": "Dynamic Difficulty Adjustment - tier control",
            "kmeans": "K-Means clustering - skill-based matchmaking",
        },
        "difficultyTiers": DifficultyTier::ALL,
        "struggleStatuses": StruggleStatus::ALL,
        "config": state.orchestrator().config(),
        "storeTimeoutMs": state.config().store_timeout_ms,
    }))
}
