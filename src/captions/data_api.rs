//! Strategy 1: the platform's structured metadata API
//!
//! Cheapest layer of the chain: well-formed API access for video metadata and
//! caption-track availability, with the track body itself pulled from the
//! public timed-text endpoint.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{
    normalize, FailureKind, RawCaptions, StrategyKind, StrategyOutcome, TIMEDTEXT_ENDPOINT,
};
use crate::captions::chain::CaptionStrategy;
use crate::resolve::VideoId;

const VIDEOS_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/videos";
const CAPTIONS_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/captions";

/// Video metadata returned alongside captions by the process operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub caption_status: bool,
    pub embed_html: String,
}

impl VideoDetails {
    /// Placeholder details for when the metadata API is unavailable but the
    /// caption chain can still run.
    pub fn minimal(video: &VideoId) -> Self {
        Self {
            video_id: video.to_string(),
            title: String::new(),
            description: String::new(),
            caption_status: false,
            embed_html: String::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    snippet: VideoSnippet,
    #[serde(rename = "contentDetails")]
    content_details: VideoContentDetails,
    player: VideoPlayer,
}

#[derive(Debug, Deserialize)]
struct VideoSnippet {
    title: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct VideoContentDetails {
    /// The API reports this as the string "true" or "false".
    #[serde(default)]
    caption: String,
}

#[derive(Debug, Deserialize)]
struct VideoPlayer {
    #[serde(rename = "embedHtml", default)]
    embed_html: String,
}

#[derive(Debug, Deserialize)]
struct CaptionListResponse {
    #[serde(default)]
    items: Vec<CaptionItem>,
}

#[derive(Debug, Deserialize)]
struct CaptionItem {
    snippet: CaptionSnippet,
}

#[derive(Debug, Deserialize)]
struct CaptionSnippet {
    language: String,
}

/// Client for the platform's metadata and caption-listing endpoints.
pub struct DataApiClient {
    client: Client,
    api_key: String,
}

impl DataApiClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, api_key })
    }

    /// Fetch title, description, caption availability, and embeddable markup.
    pub async fn video_details(&self, video: &VideoId) -> Result<VideoDetails> {
        let url = Url::parse_with_params(
            VIDEOS_ENDPOINT,
            &[
                ("part", "snippet,contentDetails,player"),
                ("id", video.as_str()),
                ("key", self.api_key.as_str()),
            ],
        )?;

        debug!("Fetching video details for {}", video);
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("metadata API error {}: {}", status, body));
        }

        let parsed: VideoListResponse = response.json().await?;
        let item = parsed
            .items
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no video found with id {}", video))?;

        Ok(VideoDetails {
            video_id: video.to_string(),
            title: item.snippet.title,
            description: item.snippet.description,
            caption_status: item.content_details.caption == "true",
            embed_html: item.player.embed_html,
        })
    }

    /// Languages of the caption tracks the API lists for this video.
    async fn caption_languages(&self, video: &VideoId) -> Result<Vec<String>> {
        let url = Url::parse_with_params(
            CAPTIONS_ENDPOINT,
            &[
                ("part", "snippet"),
                ("videoId", video.as_str()),
                ("key", self.api_key.as_str()),
            ],
        )?;

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("caption listing error {}: {}", status, body));
        }

        let parsed: CaptionListResponse = response.json().await?;
        Ok(parsed
            .items
            .into_iter()
            .map(|item| item.snippet.language)
            .collect())
    }

    /// Download a caption track body from the public timed-text path.
    async fn download_track(&self, video: &VideoId, language: &str) -> Result<String> {
        let url = Url::parse_with_params(
            TIMEDTEXT_ENDPOINT,
            &[("v", video.as_str()), ("lang", language)],
        )?;

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("caption download error {}", response.status()));
        }
        Ok(response.text().await?)
    }
}

/// Chain strategy backed by [`DataApiClient`].
pub struct DataApiStrategy {
    client: std::sync::Arc<DataApiClient>,
}

impl DataApiStrategy {
    pub fn new(client: std::sync::Arc<DataApiClient>) -> Self {
        Self { client }
    }

    fn map_err(err: &anyhow::Error) -> FailureKind {
        match err.downcast_ref::<reqwest::Error>() {
            Some(e) if e.is_timeout() => FailureKind::Timeout,
            _ => FailureKind::UpstreamApi,
        }
    }
}

#[async_trait]
impl CaptionStrategy for DataApiStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::DataApi
    }

    async fn attempt(&self, video: &VideoId, language: &str) -> StrategyOutcome {
        let languages = match self.client.caption_languages(video).await {
            Ok(languages) => languages,
            Err(e) => return StrategyOutcome::failure(Self::map_err(&e), e.to_string()),
        };

        if !languages.iter().any(|l| l == language) {
            debug!(
                "API lists {} caption tracks, none for '{}'",
                languages.len(),
                language
            );
            return StrategyOutcome::Empty;
        }

        let body = match self.client.download_track(video, language).await {
            Ok(body) => body,
            Err(e) => return StrategyOutcome::failure(Self::map_err(&e), e.to_string()),
        };

        if body.trim().is_empty() {
            return StrategyOutcome::Empty;
        }

        match normalize(RawCaptions::TimedtextXml(body), language, self.kind()) {
            Ok(set) => StrategyOutcome::Success(set),
            Err(e) => StrategyOutcome::failure(FailureKind::MalformedCaptionData, e.to_string()),
        }
    }
}
