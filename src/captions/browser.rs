//! Strategy 4: headless-browser DOM extraction, the last resort
//!
//! Drives a WebDriver session through the same forward proxy, opens the watch
//! page's transcript panel, and reads the rendered caption rows. The row
//! timestamps are formatted clock strings; converting them to seconds is the
//! normalizer's job.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use fantoccini::{ClientBuilder, Locator};
use scraper::{Html, Selector};
use serde_json::json;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use super::{normalize, DomCaptionRow, FailureKind, RawCaptions, StrategyKind, StrategyOutcome};
use crate::captions::chain::CaptionStrategy;
use crate::resolve::VideoId;
use crate::transport::TransportProfile;

const EXPAND_DESCRIPTION: &str = "tp-yt-paper-button#expand";
const SHOW_TRANSCRIPT: &str = "ytd-video-description-transcript-section-renderer button";
const SEGMENT_LIST: &str = "ytd-transcript-segment-list-renderer";
const SEGMENT_ROW: &str = "ytd-transcript-segment-renderer";
const ROW_TIMESTAMP: &str = ".segment-timestamp";
const ROW_TEXT: &str = ".segment-text";

pub struct BrowserDomStrategy {
    webdriver_url: String,
    proxy_arg: Option<String>,
    ui_timeout: Duration,
}

impl BrowserDomStrategy {
    pub fn new(webdriver_url: String, transport: &TransportProfile, ui_timeout: Duration) -> Self {
        let proxy_arg = transport
            .proxy_endpoint()
            .map(|proxy| format!("--proxy-server={}", proxy));
        Self {
            webdriver_url,
            proxy_arg,
            ui_timeout,
        }
    }

    fn capabilities(&self) -> serde_json::map::Map<String, serde_json::Value> {
        let mut args = vec![
            "--headless=new".to_string(),
            "--disable-gpu".to_string(),
            "--no-sandbox".to_string(),
            "--mute-audio".to_string(),
        ];
        if let Some(proxy) = &self.proxy_arg {
            args.push(proxy.clone());
        }

        let mut caps = serde_json::map::Map::new();
        caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
        caps
    }

    async fn extract_rows(&self, video: &VideoId) -> Result<Vec<DomCaptionRow>> {
        let client = ClientBuilder::native()
            .capabilities(self.capabilities())
            .connect(&self.webdriver_url)
            .await
            .with_context(|| format!("webdriver session at {}", self.webdriver_url))?;

        let watch_url = format!("https://www.youtube.com/watch?v={}", video);
        let ui_timeout = self.ui_timeout;

        // The session must not outlive the attempt, success or not. The
        // chain's per-attempt timeout can cancel this attempt mid-flight, so
        // the session work runs on its own task that always reaches close().
        run_detached(async move {
            let result = drive_transcript_panel(&client, &watch_url, ui_timeout).await;
            if let Err(e) = client.close().await {
                debug!("webdriver session close failed: {}", e);
            }
            result
        })
        .await?
    }
}

/// Await session work on its own task. A cancelled attempt only detaches
/// from the task; the task itself keeps running to the session close instead
/// of orphaning the headless browser.
async fn run_detached<T>(work: impl Future<Output = T> + Send + 'static) -> Result<T>
where
    T: Send + 'static,
{
    tokio::spawn(work).await.context("webdriver session task")
}

async fn drive_transcript_panel(
    client: &fantoccini::Client,
    watch_url: &str,
    ui_timeout: Duration,
) -> Result<Vec<DomCaptionRow>> {
    client.goto(watch_url).await.context("watch page load")?;

    // The transcript control hides behind the collapsed description.
    if let Ok(expand) = client
        .wait()
        .at_most(ui_timeout)
        .for_element(Locator::Css(EXPAND_DESCRIPTION))
        .await
    {
        let _ = expand.click().await;
    }

    let show = client
        .wait()
        .at_most(ui_timeout)
        .for_element(Locator::Css(SHOW_TRANSCRIPT))
        .await
        .context("transcript control not present")?;
    show.click().await.context("transcript control click")?;

    let panel = client
        .wait()
        .at_most(ui_timeout)
        .for_element(Locator::Css(SEGMENT_LIST))
        .await
        .context("transcript panel did not render")?;

    // One snapshot of the panel markup; rows are parsed offline instead
    // of one round trip per element.
    let html = panel.html(true).await.context("transcript panel markup")?;
    parse_panel_rows(&html)
}

fn parse_panel_rows(html: &str) -> Result<Vec<DomCaptionRow>> {
    let row_selector = Selector::parse(SEGMENT_ROW).map_err(|e| anyhow!("{}", e))?;
    let timestamp_selector = Selector::parse(ROW_TIMESTAMP).map_err(|e| anyhow!("{}", e))?;
    let text_selector = Selector::parse(ROW_TEXT).map_err(|e| anyhow!("{}", e))?;

    let document = Html::parse_fragment(html);
    let mut rows = Vec::new();
    for row in document.select(&row_selector) {
        let timestamp = row
            .select(&timestamp_selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string());
        let text = row
            .select(&text_selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string());

        if let (Some(timestamp), Some(text)) = (timestamp, text) {
            rows.push(DomCaptionRow { timestamp, text });
        }
    }
    Ok(rows)
}

#[async_trait]
impl CaptionStrategy for BrowserDomStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BrowserDom
    }

    async fn attempt(&self, video: &VideoId, language: &str) -> StrategyOutcome {
        let rows = match self.extract_rows(video).await {
            Ok(rows) => rows,
            Err(e) => {
                return StrategyOutcome::failure(FailureKind::AutomationFailure, format!("{:#}", e))
            }
        };

        if rows.is_empty() {
            return StrategyOutcome::Empty;
        }

        match normalize(RawCaptions::DomRows(rows), language, self.kind()) {
            Ok(set) => StrategyOutcome::Success(set),
            Err(e) => StrategyOutcome::failure(FailureKind::MalformedCaptionData, e.to_string()),
        }
    }
}
