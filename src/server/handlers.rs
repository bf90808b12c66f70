//! Route handlers.

use super::{AppContext, ArtifactState, PredictError};
use crate::features::synthetic_record;
use crate::risk::Verdict;
use crate::FraudError;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, info_span, warn};
use uuid::Uuid;

/// Reduced transaction submitted by clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    #[serde(rename = "type")]
    pub tx_type: String,
    pub amount: f64,
    /// Accepted and validated; no feature is derived from it.
    pub account_age: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    /// Percent, 0–100, two decimals
    pub probability: f64,
    pub label: u8,
    pub message: String,
}

impl From<Verdict> for PredictResponse {
    fn from(v: Verdict) -> Self {
        Self {
            probability: v.percent(),
            label: v.label.into(),
            message: v.message().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
    pub model: Option<String>,
    pub layout_hash: Option<String>,
    pub artifacts_loaded: bool,
    pub started_at: String,
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn root(State(ctx): State<AppContext>) -> Json<RootResponse> {
    let (model, layout_hash) = match ctx.artifacts() {
        ArtifactState::Ready(a) => (
            Some(a.model_name().to_string()),
            Some(format!("{:08x}", a.layout_hash())),
        ),
        ArtifactState::Unavailable(_) => (None, None),
    };
    Json(RootResponse {
        status: "running",
        message: "Transaction fraud scoring service",
        version: env!("CARGO_PKG_VERSION"),
        artifacts_loaded: model.is_some(),
        model,
        layout_hash,
        started_at: ctx.started_at().to_rfc3339(),
    })
}

pub async fn predict(
    State(ctx): State<AppContext>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("predict", %request_id);
    let _guard = span.enter();

    let strict = ctx.strict_status();
    let request = match payload {
        Ok(Json(r)) => r,
        Err(rejection) => {
            let err = FraudError::MalformedInput(rejection.body_text());
            warn!(error = %err, "rejected request body");
            return PredictError::from_fraud(&err, strict).into_response();
        }
    };

    let artifacts = match ctx.artifacts() {
        ArtifactState::Ready(a) => a,
        ArtifactState::Unavailable(reason) => {
            warn!(reason = %reason, "prediction refused; artifacts unavailable");
            return PredictError::unavailable(reason, strict).into_response();
        }
    };

    let verdict = synthetic_record(&request.tx_type, request.amount, ctx.serving())
        .and_then(|record| artifacts.predict_record(&record));
    match verdict {
        Ok(v) => {
            info!(
                tx_type = %request.tx_type,
                account_age = request.account_age,
                probability = v.probability,
                label = u8::from(v.label),
                "scored"
            );
            Json(PredictResponse::from(v)).into_response()
        }
        Err(e) => {
            warn!(kind = e.kind(), error = %e, "prediction failed");
            PredictError::from_fraud(&e, strict).into_response()
        }
    }
}
