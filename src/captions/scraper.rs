//! Strategy 2: caption scraping against the public delivery endpoint
//!
//! Reimplements the contract of the third-party caption-scraper libraries:
//! pull the watch page, lift the caption track list out of the embedded
//! player JSON, and fetch the matching track. The whole thing is wrapped so
//! internal errors surface as `CaptionUnavailable` rather than propagating.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{normalize, CaptionSet, FailureKind, RawCaptions, StrategyKind, StrategyOutcome};
use crate::captions::chain::CaptionStrategy;
use crate::resolve::VideoId;

const WATCH_URL: &str = "https://www.youtube.com/watch";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    #[serde(default)]
    kind: Option<String>,
}

pub struct CaptionScraperStrategy {
    client: Client,
    track_re: Regex,
}

impl CaptionScraperStrategy {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .build()?;
        let track_re = Regex::new(r#""captionTracks":(\[.*?\])"#)
            .context("caption track pattern")?;
        Ok(Self { client, track_re })
    }

    /// Pick the track for the requested language: exact code match first,
    /// then a prefix match (`en` vs `en-US`), then an auto-generated track.
    fn pick_track<'a>(tracks: &'a [CaptionTrack], language: &str) -> Option<&'a CaptionTrack> {
        tracks
            .iter()
            .find(|t| t.language_code == language)
            .or_else(|| tracks.iter().find(|t| t.language_code.starts_with(language)))
            .or_else(|| tracks.iter().find(|t| t.kind.as_deref() == Some("asr")))
    }

    async fn scrape(&self, video: &VideoId, language: &str) -> Result<Option<CaptionSet>> {
        let page = self
            .client
            .get(WATCH_URL)
            .query(&[("v", video.as_str())])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let Some(captures) = self.track_re.captures(&page) else {
            debug!("watch page for {} carries no caption tracks", video);
            return Ok(None);
        };

        let tracks: Vec<CaptionTrack> =
            serde_json::from_str(&captures[1]).context("caption track list")?;
        let Some(track) = Self::pick_track(&tracks, language) else {
            debug!(
                "{} caption tracks on page, none for '{}'",
                tracks.len(),
                language
            );
            return Ok(None);
        };

        // baseUrl arrives with its ampersands escaped inside the player JSON.
        let track_url = track.base_url.replace("\\u0026", "&");
        let body = self
            .client
            .get(&track_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        if body.trim().is_empty() {
            return Ok(None);
        }

        let set = normalize(RawCaptions::TimedtextXml(body), language, self.kind())
            .map_err(|e| anyhow!(e))?;
        Ok(Some(set))
    }
}

#[async_trait]
impl CaptionStrategy for CaptionScraperStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CaptionScraper
    }

    async fn attempt(&self, video: &VideoId, language: &str) -> StrategyOutcome {
        match self.scrape(video, language).await {
            Ok(Some(set)) => StrategyOutcome::Success(set),
            Ok(None) => StrategyOutcome::Empty,
            Err(e) => StrategyOutcome::failure(FailureKind::CaptionUnavailable, e.to_string()),
        }
    }
}
