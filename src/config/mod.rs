use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Caption search preferences
    pub acquisition: AcquisitionConfig,

    /// Upstream endpoints
    pub endpoints: EndpointConfig,

    /// Internal transcript endpoint request envelope
    pub innertube: InnertubeConfig,

    /// HTTP client settings
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Track language codes preferred when picking an embedded caption track
    pub preferred_track_languages: Vec<String>,

    /// Language codes tried against the timed-text endpoint, in order
    pub preferred_languages: Vec<String>,

    /// Timed-text response formats tried for every language, in order.
    /// `json3` is parsed as JSON, `default` omits the format parameter,
    /// anything else is parsed as XML.
    pub format_priority: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub watch_page_url: String,
    pub timed_text_url: String,
    pub transcript_api_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InnertubeConfig {
    pub client_name: String,
    pub client_version: String,
    pub params_layout: TranscriptParamsLayout,
}

/// Byte layout of the `params` field sent to the transcript endpoint.
///
/// The field is undocumented upstream, so the bytes around the video id are
/// data rather than code: `prefix ++ varint(len) ++ video_id ++ suffix`,
/// base64 encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptParamsLayout {
    pub version: u32,
    pub prefix: Vec<u8>,
    pub suffix: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub accept_language: String,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            preferred_track_languages: vec!["ja".to_string(), "ja-JP".to_string()],
            preferred_languages: ["ja", "en", "ko", "zh-Hans", "zh-Hant", "es", "fr", "de", "pt", "ru"]
                .iter()
                .map(|code| code.to_string())
                .collect(),
            format_priority: vec![
                "json3".to_string(),
                "srv3".to_string(),
                "default".to_string(),
            ],
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            watch_page_url: "https://www.youtube.com/watch".to_string(),
            timed_text_url: "https://www.youtube.com/api/timedtext".to_string(),
            transcript_api_url: "https://www.youtube.com/youtubei/v1/get_transcript?prettyPrint=false"
                .to_string(),
        }
    }
}

impl Default for InnertubeConfig {
    fn default() -> Self {
        Self {
            client_name: "WEB".to_string(),
            client_version: "2.20240304.00.00".to_string(),
            params_layout: TranscriptParamsLayout::default(),
        }
    }
}

impl Default for TranscriptParamsLayout {
    fn default() -> Self {
        Self {
            version: 1,
            prefix: vec![0x0a],
            suffix: Vec::new(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36".to_string(),
            accept_language: "ja,en-US;q=0.8,en;q=0.6".to_string(),
        }
    }
}

impl TranscriptParamsLayout {
    /// Encode the request parameter for a video id
    pub fn encode(&self, video_id: &str) -> String {
        let id = video_id.as_bytes();
        let mut bytes = Vec::with_capacity(self.prefix.len() + id.len() + self.suffix.len() + 2);

        bytes.extend_from_slice(&self.prefix);
        let mut len = id.len();
        loop {
            let byte = (len & 0x7f) as u8;
            len >>= 7;
            if len == 0 {
                bytes.push(byte);
                break;
            }
            bytes.push(byte | 0x80);
        }
        bytes.extend_from_slice(id);
        bytes.extend_from_slice(&self.suffix);

        STANDARD.encode(bytes)
    }
}

impl Config {
    /// Load configuration from file or fall back to defaults
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("No config file at {}, using defaults", config_path.display());
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        let config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub async fn save(&self) -> Result<PathBuf> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("transcript-fetch").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.acquisition.preferred_languages.is_empty() {
            anyhow::bail!("At least one preferred language must be configured");
        }

        if self.acquisition.format_priority.is_empty() {
            anyhow::bail!("At least one timed-text format must be configured");
        }

        for (name, url) in [
            ("watch_page_url", &self.endpoints.watch_page_url),
            ("timed_text_url", &self.endpoints.timed_text_url),
            ("transcript_api_url", &self.endpoints.transcript_api_url),
        ] {
            Url::parse(url).with_context(|| format!("Invalid endpoint {}: {}", name, url))?;
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!(
            "  Track languages: {}",
            self.acquisition.preferred_track_languages.join(", ")
        );
        println!(
            "  Timed-text languages: {}",
            self.acquisition.preferred_languages.join(", ")
        );
        println!(
            "  Format priority: {}",
            self.acquisition.format_priority.join(", ")
        );
        println!(
            "  Client: {} {}",
            self.innertube.client_name, self.innertube.client_version
        );
        println!(
            "  Params layout: v{}",
            self.innertube.params_layout.version
        );
    }
}
