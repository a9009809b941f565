//! The question-answering endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;
use crate::guard;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

/// Guards, retrieves, and composes. Suspicious questions are refused
/// before any provider call happens.
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let question = request.question.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest("question must not be empty".into()));
    }
    if guard::is_suspicious(question) {
        tracing::warn!("refusing suspicious question");
        return Err(ApiError::UnsafeQuery);
    }

    let chunks = state.retriever.retrieve(question).await?;
    let answer = state.composer.compose(question, &chunks).await?;

    Ok(Json(AskResponse { answer }))
}
