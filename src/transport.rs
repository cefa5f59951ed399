//! Outbound transport configuration shared by the network-layer strategies
//!
//! Builds a browser-emulating header set and optionally attaches a forward
//! proxy, so direct timed-text fetches and the automation session look like
//! ordinary browser traffic to the upstream.

use anyhow::{anyhow, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;
use url::Url;

use crate::config::ProxyConfig;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
const REFERER: &str = "https://www.youtube.com/";

/// Immutable per-process outbound configuration. Built once at startup and
/// read by every network-performing strategy; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct TransportProfile {
    headers: HeaderMap,
    proxy: Option<Url>,
}

impl TransportProfile {
    /// Build the profile from configuration.
    ///
    /// A proxy declared required but absent, or declared but unparsable, is
    /// an unrecoverable configuration error and fails here rather than per
    /// request.
    pub fn build(config: &ProxyConfig) -> Result<Self> {
        let proxy = match &config.endpoint {
            Some(endpoint) => Some(
                Url::parse(endpoint)
                    .with_context(|| format!("malformed proxy endpoint: {}", endpoint))?,
            ),
            None if config.required => {
                return Err(anyhow!("forward proxy is required but not configured"));
            }
            None => None,
        };

        let mut headers = HeaderMap::new();
        headers.insert("User-Agent", HeaderValue::from_static(USER_AGENT));
        headers.insert("Accept-Language", HeaderValue::from_static(ACCEPT_LANGUAGE));
        headers.insert("Referer", HeaderValue::from_static(REFERER));
        headers.insert("Connection", HeaderValue::from_static("keep-alive"));
        headers.insert("DNT", HeaderValue::from_static("1"));
        headers.insert("Cache-Control", HeaderValue::from_static("max-age=0"));

        Ok(Self { headers, proxy })
    }

    /// Build an HTTP client carrying the emulated headers and, when
    /// configured, the forward proxy.
    pub fn client(&self, timeout: Duration) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .default_headers(self.headers.clone())
            .timeout(timeout);

        if let Some(proxy) = &self.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
        }

        builder.build().context("failed to build transport client")
    }

    /// Forward-proxy endpoint, if one is configured.
    pub fn proxy_endpoint(&self) -> Option<&Url> {
        self.proxy.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_without_proxy() {
        let profile = TransportProfile::build(&ProxyConfig {
            endpoint: None,
            required: false,
        })
        .unwrap();
        assert!(profile.proxy_endpoint().is_none());
    }

    #[test]
    fn test_required_proxy_missing_is_fatal() {
        let result = TransportProfile::build(&ProxyConfig {
            endpoint: None,
            required: true,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_proxy_is_fatal() {
        let result = TransportProfile::build(&ProxyConfig {
            endpoint: Some("not a url".to_string()),
            required: false,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_valid_proxy_kept() {
        let profile = TransportProfile::build(&ProxyConfig {
            endpoint: Some("socks5://127.0.0.1:9050".to_string()),
            required: true,
        })
        .unwrap();
        assert_eq!(
            profile.proxy_endpoint().unwrap().as_str(),
            "socks5://127.0.0.1:9050"
        );
    }
}
