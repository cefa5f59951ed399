//! Ordered strategy fallback chain
//!
//! Strategies are tried strictly one at a time, cheapest first; success on an
//! early strategy avoids paying for the later, more expensive ones.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{info, warn};

use super::{CaptionSet, FailureKind, StrategyFailure, StrategyKind, StrategyOutcome};
use crate::resolve::VideoId;

/// One self-contained method of acquiring captions, with its own failure
/// mode. Every network collaborator sits behind this seam, which keeps the
/// chain testable per strategy.
#[async_trait]
pub trait CaptionStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    async fn attempt(&self, video: &VideoId, language: &str) -> StrategyOutcome;
}

/// Terminal failure: every configured strategy failed or came back empty.
/// Carries exactly one record per strategy attempted, in order.
#[derive(Debug, Error)]
#[error("all {} caption strategies exhausted", failures.len())]
pub struct ChainExhausted {
    pub failures: Vec<StrategyFailure>,
}

pub struct StrategyChain {
    strategies: Vec<Box<dyn CaptionStrategy>>,
    attempt_timeout: Duration,
}

impl StrategyChain {
    pub fn new(strategies: Vec<Box<dyn CaptionStrategy>>, attempt_timeout: Duration) -> Self {
        Self {
            strategies,
            attempt_timeout,
        }
    }

    /// Walk the strategy list in declared order until one yields a non-empty
    /// caption set. `Empty` and `Failure` outcomes each record one failure
    /// and advance; a hung attempt is cut off by the per-attempt timeout and
    /// recorded like any other failure.
    pub async fn fetch(
        &self,
        video: &VideoId,
        language: &str,
    ) -> Result<CaptionSet, ChainExhausted> {
        let mut failures = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            let kind = strategy.kind();
            info!("🎯 Attempting {} strategy for {}", kind, video);

            let outcome = match timeout(self.attempt_timeout, strategy.attempt(video, language))
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => StrategyOutcome::failure(
                    FailureKind::Timeout,
                    format!("no result within {}s", self.attempt_timeout.as_secs()),
                ),
            };

            match outcome {
                // A zero-length caption list is not a transcript; keep going.
                StrategyOutcome::Success(set) if set.segments.is_empty() => {
                    warn!("{} returned an empty caption set", kind);
                    failures.push(StrategyFailure {
                        strategy: kind,
                        kind: FailureKind::CaptionUnavailable,
                        detail: "empty caption set".to_string(),
                    });
                }
                StrategyOutcome::Success(set) => {
                    info!("✅ {} produced {} segments", kind, set.segments.len());
                    return Ok(set);
                }
                StrategyOutcome::Empty => {
                    warn!("{} found no captions", kind);
                    failures.push(StrategyFailure {
                        strategy: kind,
                        kind: FailureKind::CaptionUnavailable,
                        detail: "no captions returned".to_string(),
                    });
                }
                StrategyOutcome::Failure { kind: why, detail } => {
                    warn!("{} failed ({:?}): {}", kind, why, detail);
                    failures.push(StrategyFailure {
                        strategy: kind,
                        kind: why,
                        detail,
                    });
                }
            }
        }

        Err(ChainExhausted { failures })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::CaptionSegment;
    use crate::resolve::resolve;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    enum Script {
        Success(Vec<CaptionSegment>),
        Empty,
        Failure(FailureKind),
        Hang,
    }

    struct ScriptedStrategy {
        kind: StrategyKind,
        script: Script,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CaptionStrategy for ScriptedStrategy {
        fn kind(&self) -> StrategyKind {
            self.kind
        }

        async fn attempt(&self, _video: &VideoId, language: &str) -> StrategyOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.script {
                Script::Success(segments) => StrategyOutcome::Success(CaptionSet {
                    language: language.to_string(),
                    source: self.kind,
                    segments: segments.clone(),
                }),
                Script::Empty => StrategyOutcome::Empty,
                Script::Failure(kind) => StrategyOutcome::failure(*kind, "scripted"),
                Script::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    StrategyOutcome::Empty
                }
            }
        }
    }

    fn scripted(kind: StrategyKind, script: Script) -> (Box<dyn CaptionStrategy>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let strategy = ScriptedStrategy {
            kind,
            script,
            calls: calls.clone(),
        };
        (Box::new(strategy), calls)
    }

    fn segment(text: &str, start: f64) -> CaptionSegment {
        CaptionSegment {
            text: text.to_string(),
            start,
            duration: None,
        }
    }

    #[tokio::test]
    async fn test_success_halts_chain() {
        let (first, first_calls) = scripted(
            StrategyKind::DataApi,
            Script::Success(vec![segment("hi", 0.0)]),
        );
        let (second, second_calls) = scripted(StrategyKind::CaptionScraper, Script::Empty);

        let chain = StrategyChain::new(vec![first, second], Duration::from_secs(5));
        let video = resolve("ABC123").unwrap();
        let set = chain.fetch(&video, "en").await.unwrap();

        assert_eq!(set.source, StrategyKind::DataApi);
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_advances_to_next() {
        let (first, _) = scripted(StrategyKind::DataApi, Script::Empty);
        let (second, _) = scripted(
            StrategyKind::CaptionScraper,
            Script::Success(vec![segment("hi", 0.0)]),
        );

        let chain = StrategyChain::new(vec![first, second], Duration::from_secs(5));
        let video = resolve("ABC123").unwrap();
        let set = chain.fetch(&video, "en").await.unwrap();

        assert_eq!(set.source, StrategyKind::CaptionScraper);
        assert_eq!(set.segments.len(), 1);
        assert_eq!(set.segments[0].text, "hi");
    }

    #[tokio::test]
    async fn test_empty_success_is_treated_as_empty() {
        let (first, _) = scripted(StrategyKind::DataApi, Script::Success(vec![]));
        let (second, _) = scripted(
            StrategyKind::CaptionScraper,
            Script::Success(vec![segment("hi", 0.0)]),
        );

        let chain = StrategyChain::new(vec![first, second], Duration::from_secs(5));
        let video = resolve("ABC123").unwrap();
        let set = chain.fetch(&video, "en").await.unwrap();

        assert_eq!(set.source, StrategyKind::CaptionScraper);
    }

    #[tokio::test]
    async fn test_exhaustion_records_every_attempt_in_order() {
        let (first, _) = scripted(
            StrategyKind::DataApi,
            Script::Failure(FailureKind::UpstreamApi),
        );
        let (second, _) = scripted(StrategyKind::CaptionScraper, Script::Empty);
        let (third, _) = scripted(
            StrategyKind::TimedtextProxy,
            Script::Failure(FailureKind::ProxyUnreachable),
        );
        let (fourth, _) = scripted(
            StrategyKind::BrowserDom,
            Script::Failure(FailureKind::AutomationFailure),
        );

        let chain = StrategyChain::new(vec![first, second, third, fourth], Duration::from_secs(5));
        let video = resolve("ABC123").unwrap();
        let exhausted = chain.fetch(&video, "en").await.unwrap_err();

        assert_eq!(exhausted.failures.len(), 4);
        assert_eq!(exhausted.failures[0].strategy, StrategyKind::DataApi);
        assert_eq!(exhausted.failures[0].kind, FailureKind::UpstreamApi);
        assert_eq!(exhausted.failures[1].kind, FailureKind::CaptionUnavailable);
        assert_eq!(exhausted.failures[2].kind, FailureKind::ProxyUnreachable);
        assert_eq!(exhausted.failures[3].strategy, StrategyKind::BrowserDom);
    }

    #[tokio::test]
    async fn test_hung_strategy_times_out_and_advances() {
        let (first, _) = scripted(StrategyKind::DataApi, Script::Hang);
        let (second, _) = scripted(
            StrategyKind::CaptionScraper,
            Script::Success(vec![segment("hi", 0.0)]),
        );

        let chain = StrategyChain::new(vec![first, second], Duration::from_millis(50));
        let video = resolve("ABC123").unwrap();
        let set = chain.fetch(&video, "en").await.unwrap();

        assert_eq!(set.source, StrategyKind::CaptionScraper);
    }

    #[tokio::test]
    async fn test_timeout_recorded_as_timeout_failure() {
        let (only, _) = scripted(StrategyKind::DataApi, Script::Hang);

        let chain = StrategyChain::new(vec![only], Duration::from_millis(50));
        let video = resolve("ABC123").unwrap();
        let exhausted = chain.fetch(&video, "en").await.unwrap_err();

        assert_eq!(exhausted.failures.len(), 1);
        assert_eq!(exhausted.failures[0].kind, FailureKind::Timeout);
    }
}
