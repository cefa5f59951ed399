//! Caption acquisition: data model, normalizer, and the strategy fallback chain

pub mod browser;
pub mod chain;
pub mod data_api;
pub mod normalize;
pub mod scraper;
pub mod timedtext;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use chain::{CaptionStrategy, ChainExhausted, StrategyChain};
pub use normalize::{normalize, DomCaptionRow, MalformedCaptionData, RawCaptions};

/// The platform's internal timed-text endpoint, shared by the structured
/// API's track download and the direct proxy strategy.
pub(crate) const TIMEDTEXT_ENDPOINT: &str = "https://www.youtube.com/api/timedtext";

/// One transcript cue. `start` is in seconds; `duration` stays absent when
/// the source did not carry one (consumers apply their own display fallback).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionSegment {
    pub text: String,
    pub start: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// Normalized, ordered transcript tagged with the language and the strategy
/// that produced it. Owned by the request that created it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionSet {
    pub language: String,
    pub source: StrategyKind,
    pub segments: Vec<CaptionSegment>,
}

/// The acquisition strategies, in default chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    DataApi,
    CaptionScraper,
    TimedtextProxy,
    BrowserDom,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::DataApi => "data-api",
            StrategyKind::CaptionScraper => "caption-scraper",
            StrategyKind::TimedtextProxy => "timedtext-proxy",
            StrategyKind::BrowserDom => "browser-dom",
        };
        f.write_str(name)
    }
}

/// Why a single strategy attempt did not produce captions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    UpstreamApi,
    CaptionUnavailable,
    Timeout,
    ProxyUnreachable,
    AutomationFailure,
    MalformedCaptionData,
}

/// Result of one strategy attempt, consumed by the chain to decide whether
/// to continue.
#[derive(Debug)]
pub enum StrategyOutcome {
    Success(CaptionSet),
    Empty,
    Failure { kind: FailureKind, detail: String },
}

impl StrategyOutcome {
    pub fn failure(kind: FailureKind, detail: impl Into<String>) -> Self {
        StrategyOutcome::Failure {
            kind,
            detail: detail.into(),
        }
    }
}

/// One recorded failure, kept per attempted strategy so an exhausted chain
/// can report which layer blocked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyFailure {
    pub strategy: StrategyKind,
    pub kind: FailureKind,
    pub detail: String,
}
