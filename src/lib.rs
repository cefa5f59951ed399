/// Caption Relay
///
/// Fetches video transcripts through an ordered chain of increasingly
/// expensive acquisition strategies and relays them to a chat-completion
/// service, streaming per-segment translations back incrementally.

pub mod api;
pub mod captions;
pub mod config;
pub mod resolve;
pub mod translate;
pub mod transport;

// Re-export main types for easy access
pub use crate::captions::chain::{CaptionStrategy, ChainExhausted, StrategyChain};
pub use crate::captions::data_api::{DataApiClient, DataApiStrategy, VideoDetails};
pub use crate::captions::{
    normalize, CaptionSegment, CaptionSet, FailureKind, RawCaptions, StrategyFailure,
    StrategyKind, StrategyOutcome,
};
pub use crate::config::Config;
pub use crate::resolve::{resolve, InvalidReference, VideoId};
pub use crate::translate::{translate_stream, ChatCompletionTranslator, SegmentTranslation, Translator};
pub use crate::transport::TransportProfile;
