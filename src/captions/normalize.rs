//! Single conversion point from strategy-specific raw shapes to `CaptionSet`
//!
//! Each strategy hands its raw payload here untouched: the timed-text JSON
//! body (millisecond integers), the legacy XML cue body, or rendered DOM rows
//! whose timestamps are formatted clock strings rather than numeric seconds.

use regex::Regex;
use serde::Deserialize;
use std::cmp::Ordering;
use thiserror::Error;

use super::{CaptionSegment, CaptionSet, StrategyKind};

/// Raised when required fields of a raw payload cannot be parsed.
#[derive(Debug, Error)]
#[error("malformed caption data: {0}")]
pub struct MalformedCaptionData(pub String);

/// One rendered transcript-panel row as read from the DOM.
#[derive(Debug, Clone)]
pub struct DomCaptionRow {
    /// Formatted clock string, e.g. `"1:05"` or `"1:02:03"`.
    pub timestamp: String,
    pub text: String,
}

/// Raw output shapes, one per family of strategies.
#[derive(Debug)]
pub enum RawCaptions {
    /// Timed-text `fmt=json3` response body.
    Json3(String),
    /// Legacy timed-text XML body (`<text start dur>` cues).
    TimedtextXml(String),
    /// Rows scraped from the rendered transcript panel.
    DomRows(Vec<DomCaptionRow>),
}

#[derive(Debug, Deserialize)]
struct Json3Body {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs")]
    start_ms: Option<u64>,
    #[serde(rename = "dDurationMs")]
    duration_ms: Option<u64>,
    segs: Option<Vec<Json3Seg>>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    utf8: String,
}

/// Convert a strategy's raw output into the canonical caption form.
///
/// Output segments are ordered by non-decreasing start time; blank cues are
/// dropped; a missing duration stays absent.
pub fn normalize(
    raw: RawCaptions,
    language: &str,
    source: StrategyKind,
) -> Result<CaptionSet, MalformedCaptionData> {
    let mut segments = match raw {
        RawCaptions::Json3(body) => parse_json3(&body)?,
        RawCaptions::TimedtextXml(body) => parse_timedtext_xml(&body)?,
        RawCaptions::DomRows(rows) => parse_dom_rows(rows)?,
    };

    segments.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(Ordering::Equal));

    Ok(CaptionSet {
        language: language.to_string(),
        source,
        segments,
    })
}

fn parse_json3(body: &str) -> Result<Vec<CaptionSegment>, MalformedCaptionData> {
    let parsed: Json3Body = serde_json::from_str(body)
        .map_err(|e| MalformedCaptionData(format!("timed-text json: {}", e)))?;

    let mut segments = Vec::new();
    for event in parsed.events {
        let Some(segs) = event.segs else {
            // Metadata-only events carry no text.
            continue;
        };
        let text = segs
            .iter()
            .map(|s| s.utf8.as_str())
            .collect::<String>()
            .trim()
            .to_string();
        if text.is_empty() {
            continue;
        }
        let start_ms = event.start_ms.ok_or_else(|| {
            MalformedCaptionData("timed-text event with text but no start".to_string())
        })?;
        segments.push(CaptionSegment {
            text,
            start: start_ms as f64 / 1000.0,
            duration: event.duration_ms.map(|ms| ms as f64 / 1000.0),
        });
    }
    Ok(segments)
}

fn parse_timedtext_xml(body: &str) -> Result<Vec<CaptionSegment>, MalformedCaptionData> {
    let cue_re = Regex::new(r#"<text start="([^"]+)"(?:\s+dur="([^"]+)")?[^>]*>(.*?)</text>"#)
        .map_err(|e| MalformedCaptionData(e.to_string()))?;

    let mut segments = Vec::new();
    for caps in cue_re.captures_iter(body) {
        let start: f64 = caps[1]
            .parse()
            .map_err(|_| MalformedCaptionData(format!("bad cue start: {}", &caps[1])))?;
        let duration = match caps.get(2) {
            Some(dur) => Some(dur.as_str().parse::<f64>().map_err(|_| {
                MalformedCaptionData(format!("bad cue duration: {}", dur.as_str()))
            })?),
            None => None,
        };
        let text = unescape_xml(&caps[3]).trim().to_string();
        if text.is_empty() {
            continue;
        }
        segments.push(CaptionSegment {
            text,
            start,
            duration,
        });
    }
    Ok(segments)
}

fn parse_dom_rows(rows: Vec<DomCaptionRow>) -> Result<Vec<CaptionSegment>, MalformedCaptionData> {
    let mut segments = Vec::new();
    for row in rows {
        let text = row.text.trim().to_string();
        if text.is_empty() {
            continue;
        }
        segments.push(CaptionSegment {
            text,
            start: parse_clock(&row.timestamp)?,
            // The transcript panel renders no end times.
            duration: None,
        });
    }
    Ok(segments)
}

/// Parse a formatted clock string (`M:SS` or `H:MM:SS`) to seconds.
fn parse_clock(raw: &str) -> Result<f64, MalformedCaptionData> {
    let parts: Vec<&str> = raw.trim().split(':').collect();
    let numbers: Result<Vec<u64>, _> = parts.iter().map(|p| p.parse::<u64>()).collect();
    let numbers =
        numbers.map_err(|_| MalformedCaptionData(format!("bad timestamp: {}", raw)))?;

    match numbers.as_slice() {
        [minutes, seconds] => Ok((minutes * 60 + seconds) as f64),
        [hours, minutes, seconds] => Ok((hours * 3600 + minutes * 60 + seconds) as f64),
        _ => Err(MalformedCaptionData(format!("bad timestamp: {}", raw))),
    }
}

fn unescape_xml(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json3_events() {
        let body = r#"{"events":[
            {"tStartMs":0,"dDurationMs":1500,"segs":[{"utf8":"hello "},{"utf8":"there"}]},
            {"tStartMs":1500,"segs":[{"utf8":"\n"}]},
            {"tStartMs":2000,"dDurationMs":900,"segs":[{"utf8":"world"}]}
        ]}"#;
        let set = normalize(
            RawCaptions::Json3(body.to_string()),
            "en",
            StrategyKind::TimedtextProxy,
        )
        .unwrap();

        assert_eq!(set.segments.len(), 2);
        assert_eq!(set.segments[0].text, "hello there");
        assert_eq!(set.segments[0].start, 0.0);
        assert_eq!(set.segments[0].duration, Some(1.5));
        assert_eq!(set.segments[1].start, 2.0);
    }

    #[test]
    fn test_json3_garbage_is_malformed() {
        let result = normalize(
            RawCaptions::Json3("<html>blocked</html>".to_string()),
            "en",
            StrategyKind::TimedtextProxy,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_timedtext_xml_cues() {
        let body = concat!(
            r#"<?xml version="1.0" encoding="utf-8"?><transcript>"#,
            r#"<text start="0.5" dur="2.1">it&#39;s a &amp; test</text>"#,
            r#"<text start="2.6">no duration</text>"#,
            r#"<text start="4.0" dur="1.0">   </text>"#,
            "</transcript>"
        );
        let set = normalize(
            RawCaptions::TimedtextXml(body.to_string()),
            "en",
            StrategyKind::CaptionScraper,
        )
        .unwrap();

        assert_eq!(set.segments.len(), 2);
        assert_eq!(set.segments[0].text, "it's a & test");
        assert_eq!(set.segments[0].duration, Some(2.1));
        assert_eq!(set.segments[1].duration, None);
    }

    #[test]
    fn test_dom_clock_strings() {
        let rows = vec![
            DomCaptionRow {
                timestamp: "0:00".to_string(),
                text: "first".to_string(),
            },
            DomCaptionRow {
                timestamp: "1:05".to_string(),
                text: "second".to_string(),
            },
            DomCaptionRow {
                timestamp: "1:02:03".to_string(),
                text: "third".to_string(),
            },
        ];
        let set = normalize(RawCaptions::DomRows(rows), "en", StrategyKind::BrowserDom).unwrap();

        assert_eq!(set.segments[0].start, 0.0);
        assert_eq!(set.segments[1].start, 65.0);
        assert_eq!(set.segments[2].start, 3723.0);
        assert!(set.segments.iter().all(|s| s.duration.is_none()));
    }

    #[test]
    fn test_dom_bad_timestamp() {
        let rows = vec![DomCaptionRow {
            timestamp: "soon".to_string(),
            text: "never".to_string(),
        }];
        assert!(normalize(RawCaptions::DomRows(rows), "en", StrategyKind::BrowserDom).is_err());
    }

    #[test]
    fn test_output_ordered_by_start() {
        let body = r#"{"events":[
            {"tStartMs":5000,"segs":[{"utf8":"later"}]},
            {"tStartMs":1000,"segs":[{"utf8":"earlier"}]}
        ]}"#;
        let set = normalize(
            RawCaptions::Json3(body.to_string()),
            "en",
            StrategyKind::TimedtextProxy,
        )
        .unwrap();
        assert_eq!(set.segments[0].text, "earlier");
        assert!(set.segments.windows(2).all(|w| w[0].start <= w[1].start));
    }
}
