//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;
use crate::pipeline::governance::UnknownTypePolicy;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub model: String,
    pub unknown_type_policy: UnknownTypePolicy,
    pub available_slots: usize,
}

/// `GET /api/health`
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        model: ctx.pipeline.model_name().to_string(),
        unknown_type_policy: ctx.pipeline.validator().policy(),
        available_slots: ctx.limiter.available_permits(),
    })
}
