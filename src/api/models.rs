//! API data models

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::captions::data_api::VideoDetails;
use crate::captions::{CaptionSegment, StrategyFailure, StrategyKind};

/// Request body for the process operation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    /// Raw video URL or a bare identifier.
    #[serde(alias = "videoUrlOrId", alias = "url")]
    pub video_url: String,

    /// Requested caption language; server default when absent.
    pub language: Option<String>,
}

/// Successful process response: metadata plus the normalized transcript.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub video_details: VideoDetails,
    pub language: String,
    /// Which strategy in the chain produced the captions.
    pub source: StrategyKind,
    pub captions: Vec<CaptionSegment>,
}

/// Request body for the streaming translation operation.
#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub captions: Vec<CaptionSegment>,
    pub language: String,
}

/// Request-level failures, mapped to status codes at the edge.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed input URL: a client error.
    InvalidReference(String),

    /// Every strategy failed; carries the per-strategy failure list so the
    /// caller can diagnose which layer blocked.
    ChainExhausted(Vec<StrategyFailure>),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidReference(detail) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": detail })),
            )
                .into_response(),
            ApiError::ChainExhausted(failures) => (
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "error": "all caption strategies exhausted",
                    "failures": failures,
                })),
            )
                .into_response(),
        }
    }
}
