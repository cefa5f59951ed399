use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration for the caption relay service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Platform metadata API settings
    pub youtube: YoutubeConfig,

    /// Forward-proxy settings for the anti-blocking transport
    pub proxy: ProxyConfig,

    /// Strategy chain settings
    pub chain: ChainConfig,

    /// Completion-service settings for the translation relay
    pub translation: TranslationConfig,

    /// Browser-automation settings for the last-resort strategy
    pub browser: BrowserConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen port
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubeConfig {
    /// Data API credential (required)
    pub api_key: Option<String>,

    /// Request timeout for metadata calls (seconds)
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Forward-proxy URI applied to strategies 3 and 4
    pub endpoint: Option<String>,

    /// Treat a missing proxy as a fatal startup error
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Per-strategy attempt timeout (seconds)
    pub attempt_timeout_seconds: u64,

    /// Caption language requested when the client names none
    pub default_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Chat-completion endpoint
    pub endpoint: String,

    /// Auth token for the completion service (required)
    pub api_key: Option<String>,

    /// Model to request
    pub model: String,

    /// Maximum tokens per segment translation
    pub max_tokens: u32,

    /// Sampling temperature (low keeps translations stable)
    pub temperature: f32,

    /// Per-segment request timeout (seconds)
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Include the browser-automation strategy in the chain
    pub enabled: bool,

    /// WebDriver endpoint driving the headless browser
    pub webdriver_url: String,

    /// Timeout for each UI wait while driving the transcript panel (seconds)
    pub ui_timeout_seconds: u64,
}

impl Config {
    /// Load configuration from file, then apply environment overrides
    pub fn load() -> Result<Self> {
        let config_paths = [
            "caption-relay.toml",
            "config/caption-relay.toml",
            "/etc/caption-relay/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return Ok(config.with_env_overrides());
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Ok(Self::default().with_env_overrides())
    }

    /// Apply environment-variable overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }

        if let Ok(api_key) = std::env::var("YOUTUBE_API_KEY") {
            self.youtube.api_key = Some(api_key);
        }

        if let Ok(api_key) = std::env::var("LLM_API_KEY") {
            self.translation.api_key = Some(api_key);
        }

        if let Ok(endpoint) = std::env::var("LLM_ENDPOINT") {
            self.translation.endpoint = endpoint;
        }

        if let Ok(endpoint) = std::env::var("PROXY_URL") {
            self.proxy.endpoint = Some(endpoint);
        }

        if let Ok(url) = std::env::var("WEBDRIVER_URL") {
            self.browser.webdriver_url = url;
        }

        self
    }

    /// Validate configuration. A missing required credential or a malformed
    /// proxy URI is fatal at startup, never a per-request error.
    pub fn validate(&self) -> Result<()> {
        if self.youtube.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(anyhow!(
                "youtube.api_key is required (set YOUTUBE_API_KEY or the config file)"
            ));
        }

        if self.translation.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(anyhow!(
                "translation.api_key is required (set LLM_API_KEY or the config file)"
            ));
        }

        if let Some(endpoint) = &self.proxy.endpoint {
            Url::parse(endpoint)
                .map_err(|e| anyhow!("malformed proxy endpoint '{}': {}", endpoint, e))?;
        } else if self.proxy.required {
            return Err(anyhow!(
                "proxy.required is set but no proxy endpoint is configured"
            ));
        }

        if self.chain.attempt_timeout_seconds == 0 {
            return Err(anyhow!("chain.attempt_timeout_seconds must be greater than 0"));
        }

        if self.browser.enabled && self.browser.webdriver_url.is_empty() {
            return Err(anyhow!(
                "browser.webdriver_url is required when the browser strategy is enabled"
            ));
        }

        tracing::info!("✅ Configuration validation passed");
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig { port: 3000 },
            youtube: YoutubeConfig {
                api_key: None,
                request_timeout_seconds: 15,
            },
            proxy: ProxyConfig {
                endpoint: None,
                required: false,
            },
            chain: ChainConfig {
                attempt_timeout_seconds: 30,
                default_language: "en".to_string(),
            },
            translation: TranslationConfig {
                endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
                api_key: None,
                model: "gpt-4o-mini".to_string(),
                max_tokens: 1024,
                temperature: 0.2,
                timeout_seconds: 60,
            },
            browser: BrowserConfig {
                enabled: true,
                webdriver_url: "http://localhost:9515".to_string(),
                ui_timeout_seconds: 10,
            },
        }
    }
}
