//! Streaming translation relay: per-segment forwarding to a chat-completion
//! service with incremental delivery of results

pub mod chat;
pub mod relay;

use anyhow::Result;
use async_trait::async_trait;

pub use chat::ChatCompletionTranslator;
pub use relay::{translate_stream, SegmentTranslation};

/// Seam to the external completion service. The relay holds no retry policy;
/// one attempt is made per segment.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String>;
}
