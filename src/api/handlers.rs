//! Transport-free request orchestration
//!
//! The route layer in `server.rs` deserializes and frames; the flows here do
//! the work: resolver, strategy chain, normalizer, and the streaming relay.

use axum::body::{Body, Bytes};
use futures::StreamExt;
use std::convert::Infallible;
use tracing::warn;

use super::models::{ApiError, ProcessRequest, ProcessResponse, TranslateRequest};
use super::server::AppState;
use crate::captions::data_api::VideoDetails;
use crate::resolve;
use crate::translate::translate_stream;

/// Resolve the reference, run the strategy chain, and assemble the response.
pub async fn process(state: &AppState, request: ProcessRequest) -> Result<ProcessResponse, ApiError> {
    let video = resolve::resolve(&request.video_url)
        .map_err(|e| ApiError::InvalidReference(e.to_string()))?;
    let language = request
        .language
        .unwrap_or_else(|| state.config.chain.default_language.clone());

    // Metadata is best-effort: an outage there must not mask a working
    // caption strategy.
    let video_details = match state.data_api.video_details(&video).await {
        Ok(details) => details,
        Err(e) => {
            warn!("video details unavailable for {}: {}", video, e);
            VideoDetails::minimal(&video)
        }
    };

    let set = state
        .chain
        .fetch(&video, &language)
        .await
        .map_err(|exhausted| ApiError::ChainExhausted(exhausted.failures))?;

    Ok(ProcessResponse {
        video_details,
        language: set.language,
        source: set.source,
        captions: set.segments,
    })
}

/// Build the chunked NDJSON body for a translation job. Each result line is
/// framed and flushed as the relay computes it.
pub fn translate(state: &AppState, request: TranslateRequest) -> Body {
    let stream = translate_stream(
        state.translator.clone(),
        request.captions,
        request.language,
    )
    .map(|item| {
        let mut line = serde_json::to_string(&item).unwrap_or_else(|_| "{}".to_string());
        line.push('\n');
        Ok::<_, Infallible>(Bytes::from(line))
    });

    Body::from_stream(stream)
}
