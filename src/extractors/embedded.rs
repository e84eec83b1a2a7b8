use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::{Arc, OnceLock};

use super::page::PageMetadataProvider;
use super::TranscriptStrategy;
use crate::fetch::HttpFetcher;
use crate::transcribe::parser::{parse_timed_text_xml, TextPolicy};
use crate::transcribe::Transcript;
use crate::{AcquireResult, TranscriptError};

const PLAYER_RESPONSE_GLOBAL: &str = "ytInitialPlayerResponse";
const PLAYER_CONFIG_GLOBAL: &str = "ytplayer";

/// Ways the player response assignment shows up in inline scripts
const ASSIGNMENT_PATTERNS: &[&str] = &[
    r"(?:var\s+|let\s+|const\s+|window\.)?ytInitialPlayerResponse\s*=\s*",
    r#"window\[\s*["']ytInitialPlayerResponse["']\s*\]\s*=\s*"#,
    r#"["']ytInitialPlayerResponse["']\s*:\s*"#,
];

fn assignment_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        ASSIGNMENT_PATTERNS
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect()
    })
}

/// One caption track listed in the player response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CaptionTrackDescriptor {
    #[serde(rename = "languageCode")]
    pub language_code: String,
    #[serde(rename = "baseUrl")]
    pub base_url: String,
}

/// Pick the first track in a preferred language, else the first track
pub fn select_track<'a>(
    tracks: &'a [CaptionTrackDescriptor],
    preferred_languages: &[String],
) -> Option<&'a CaptionTrackDescriptor> {
    tracks
        .iter()
        .find(|track| {
            preferred_languages
                .iter()
                .any(|code| code.eq_ignore_ascii_case(&track.language_code))
        })
        .or_else(|| tracks.first())
}

/// Reads caption tracks from the player metadata embedded in the page
pub struct EmbeddedMetadataStrategy {
    page: Arc<dyn PageMetadataProvider>,
    fetcher: Arc<dyn HttpFetcher>,
    preferred_languages: Vec<String>,
}

impl EmbeddedMetadataStrategy {
    pub fn new(
        page: Arc<dyn PageMetadataProvider>,
        fetcher: Arc<dyn HttpFetcher>,
        preferred_languages: Vec<String>,
    ) -> Self {
        Self {
            page,
            fetcher,
            preferred_languages,
        }
    }

    /// Locate the player response: global binding, inline scripts, then the
    /// player config global
    fn player_response(&self) -> AcquireResult<Value> {
        if let Some(value @ Value::Object(_)) = self.page.global(PLAYER_RESPONSE_GLOBAL) {
            tracing::debug!("Player response found in global binding");
            return Ok(value);
        }

        if let Some(value) = self.scan_scripts() {
            return Ok(value);
        }

        if let Some(value) = self.from_player_config() {
            tracing::debug!("Player response found in {} config", PLAYER_CONFIG_GLOBAL);
            return Ok(value);
        }

        Err(TranscriptError::SourceUnavailable)
    }

    fn scan_scripts(&self) -> Option<Value> {
        for script in self.page.inline_scripts() {
            if !script.contains(PLAYER_RESPONSE_GLOBAL) {
                continue;
            }

            for pattern in assignment_patterns() {
                for found in pattern.find_iter(&script) {
                    match read_json_object(&script[found.end()..]) {
                        Some(value) => {
                            tracing::debug!("Player response found with pattern {}", pattern.as_str());
                            return Some(value);
                        }
                        None => tracing::debug!(
                            "Pattern {} matched but no JSON object followed",
                            pattern.as_str()
                        ),
                    }
                }
            }
        }

        None
    }

    fn from_player_config(&self) -> Option<Value> {
        let config = self.page.global(PLAYER_CONFIG_GLOBAL)?;

        if let Some(value @ Value::Object(_)) = config.pointer("/config/args/raw_player_response") {
            return Some(value.clone());
        }

        match config.pointer("/config/args/player_response")? {
            Value::String(raw) => read_json_object(raw),
            value @ Value::Object(_) => Some(value.clone()),
            _ => None,
        }
    }
}

/// Read the JSON object at the start of `text`, ignoring whatever follows it
fn read_json_object(text: &str) -> Option<Value> {
    let text = text.trim_start();
    if !text.starts_with('{') {
        return None;
    }

    match serde_json::Deserializer::from_str(text).into_iter::<Value>().next() {
        Some(Ok(value @ Value::Object(_))) => Some(value),
        _ => None,
    }
}

/// Caption tracks of a player response, non-empty
fn caption_tracks(player_response: &Value) -> AcquireResult<Vec<CaptionTrackDescriptor>> {
    let tracks = player_response
        .pointer("/captions/playerCaptionsTracklistRenderer/captionTracks")
        .cloned()
        .ok_or(TranscriptError::TracksNotFound)?;

    let tracks: Vec<CaptionTrackDescriptor> =
        serde_json::from_value(tracks).map_err(|_| TranscriptError::TracksNotFound)?;

    if tracks.is_empty() {
        return Err(TranscriptError::TracksNotFound);
    }

    Ok(tracks)
}

#[async_trait]
impl TranscriptStrategy for EmbeddedMetadataStrategy {
    fn name(&self) -> &'static str {
        "embedded-metadata"
    }

    async fn acquire(&self, _video_id: &str) -> AcquireResult<Transcript> {
        let player_response = self.player_response()?;
        let tracks = caption_tracks(&player_response)?;
        let track = select_track(&tracks, &self.preferred_languages)
            .ok_or(TranscriptError::TracksNotFound)?;

        tracing::debug!(
            "Using caption track {} of {} available",
            track.language_code,
            tracks.len()
        );

        let response = self.fetcher.get(&track.base_url).await?;
        if !response.is_success() {
            return Err(TranscriptError::ApiError {
                status: response.status,
                url: track.base_url.clone(),
            });
        }
        if response.is_blank() {
            return Err(TranscriptError::EmptyResponse(track.base_url.clone()));
        }

        let segments = parse_timed_text_xml(&response.body, TextPolicy::KeepEmpty)?;
        Ok(Transcript::new(segments))
    }
}
