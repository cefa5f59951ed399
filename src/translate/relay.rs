//! Incremental per-segment delivery with failure isolation

use futures::channel::mpsc;
use futures::{SinkExt, Stream};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::Translator;
use crate::captions::CaptionSegment;

/// One streamed translation result. A failed segment carries `ok: false` and
/// a placeholder text; it never suppresses the segments around it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentTranslation {
    pub index: usize,
    pub translated_text: String,
    pub ok: bool,
}

pub const FAILED_PLACEHOLDER: &str = "(translation failed)";

/// Relay each segment to the translator in index order, emitting every result
/// as soon as it is computed.
///
/// The returned stream is finite and non-restartable. Dropping it signals the
/// producer through the channel, which abandons the remaining segments; no
/// partial state survives.
pub fn translate_stream(
    translator: Arc<dyn Translator>,
    segments: Vec<CaptionSegment>,
    target_language: String,
) -> impl Stream<Item = SegmentTranslation> {
    let (mut tx, rx) = mpsc::channel(1);

    tokio::spawn(async move {
        for (index, segment) in segments.into_iter().enumerate() {
            let item = match translator.translate(&segment.text, &target_language).await {
                Ok(translated_text) => SegmentTranslation {
                    index,
                    translated_text,
                    ok: true,
                },
                Err(e) => {
                    warn!("segment {} translation failed: {}", index, e);
                    SegmentTranslation {
                        index,
                        translated_text: FAILED_PLACEHOLDER.to_string(),
                        ok: false,
                    }
                }
            };

            if tx.send(item).await.is_err() {
                debug!("client went away, abandoning translation job at segment {}", index);
                break;
            }
        }
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyTranslator {
        fail_on: Vec<usize>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Translator for FlakyTranslator {
        async fn translate(&self, text: &str, target_language: &str) -> anyhow::Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on.contains(&call) {
                Err(anyhow!("scripted failure"))
            } else {
                Ok(format!("{}:{}", target_language, text))
            }
        }
    }

    fn segments(texts: &[&str]) -> Vec<CaptionSegment> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| CaptionSegment {
                text: text.to_string(),
                start: i as f64,
                duration: None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_failure_is_isolated_per_segment() {
        let translator = Arc::new(FlakyTranslator {
            fail_on: vec![1],
            calls: AtomicUsize::new(0),
        });

        let stream = translate_stream(translator, segments(&["a", "b", "c"]), "de".to_string());
        let results: Vec<SegmentTranslation> = stream.collect().await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].index, 0);
        assert!(results[0].ok);
        assert_eq!(results[0].translated_text, "de:a");
        assert!(!results[1].ok);
        assert_eq!(results[1].translated_text, FAILED_PLACEHOLDER);
        assert!(results[2].ok);
        assert_eq!(results[2].translated_text, "de:c");
    }

    #[tokio::test]
    async fn test_results_arrive_in_index_order() {
        let translator = Arc::new(FlakyTranslator {
            fail_on: vec![],
            calls: AtomicUsize::new(0),
        });

        let stream = translate_stream(
            translator,
            segments(&["one", "two", "three", "four"]),
            "fr".to_string(),
        );
        let results: Vec<SegmentTranslation> = stream.collect().await;

        let indices: Vec<usize> = results.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_dropped_receiver_abandons_job() {
        let translator = Arc::new(FlakyTranslator {
            fail_on: vec![],
            calls: AtomicUsize::new(0),
        });
        let counter = translator.clone();

        let mut stream = Box::pin(translate_stream(
            translator,
            segments(&["a", "b", "c", "d", "e"]),
            "de".to_string(),
        ));

        let first = stream.next().await.unwrap();
        assert_eq!(first.index, 0);
        drop(stream);

        // Give the producer a moment to observe the closed channel.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(counter.calls.load(Ordering::SeqCst) < 5);
    }

    #[test]
    fn test_empty_job_yields_empty_stream() {
        let translator = Arc::new(FlakyTranslator {
            fail_on: vec![],
            calls: AtomicUsize::new(0),
        });
        tokio_test::block_on(async {
            let stream = translate_stream(translator, vec![], "de".to_string());
            let results: Vec<SegmentTranslation> = stream.collect().await;
            assert!(results.is_empty());
        });
    }
}
