//! Strategy 3: direct timed-text protocol fetch through the transport profile
//!
//! Constructs the platform's internal timed-text URL and GETs it with the
//! browser-emulating headers and forward proxy, for when the public delivery
//! endpoint is blocked at the network layer.

use anyhow::Result;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{
    normalize, FailureKind, RawCaptions, StrategyKind, StrategyOutcome, TIMEDTEXT_ENDPOINT,
};
use crate::captions::chain::CaptionStrategy;
use crate::resolve::VideoId;
use crate::transport::TransportProfile;

pub struct TimedtextProxyStrategy {
    client: Client,
}

impl TimedtextProxyStrategy {
    /// The client is built from the injected transport profile, so every
    /// request carries the emulated headers and the forward proxy.
    pub fn new(transport: &TransportProfile, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: transport.client(timeout)?,
        })
    }

    fn map_request_err(e: &reqwest::Error) -> FailureKind {
        if e.is_timeout() {
            FailureKind::Timeout
        } else if e.is_connect() {
            FailureKind::ProxyUnreachable
        } else {
            FailureKind::CaptionUnavailable
        }
    }
}

#[async_trait::async_trait]
impl CaptionStrategy for TimedtextProxyStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TimedtextProxy
    }

    async fn attempt(&self, video: &VideoId, language: &str) -> StrategyOutcome {
        let url = match Url::parse_with_params(
            TIMEDTEXT_ENDPOINT,
            &[("v", video.as_str()), ("lang", language), ("fmt", "json3")],
        ) {
            Ok(url) => url,
            Err(e) => {
                return StrategyOutcome::failure(FailureKind::CaptionUnavailable, e.to_string())
            }
        };

        debug!("Direct timed-text fetch: {}", url);
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return StrategyOutcome::failure(Self::map_request_err(&e), e.to_string()),
        };

        if !response.status().is_success() {
            return StrategyOutcome::failure(
                FailureKind::CaptionUnavailable,
                format!("timed-text endpoint returned {}", response.status()),
            );
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return StrategyOutcome::failure(Self::map_request_err(&e), e.to_string()),
        };

        // The endpoint answers 200 with an empty body when no track exists.
        if body.trim().is_empty() {
            return StrategyOutcome::Empty;
        }

        match normalize(RawCaptions::Json3(body), language, self.kind()) {
            Ok(set) => StrategyOutcome::Success(set),
            Err(e) => StrategyOutcome::failure(FailureKind::MalformedCaptionData, e.to_string()),
        }
    }
}
