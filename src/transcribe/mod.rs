use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Config;
use crate::extractors::embedded::EmbeddedMetadataStrategy;
use crate::extractors::innertube::InnertubeStrategy;
use crate::extractors::page::{HtmlPage, PageMetadataProvider};
use crate::extractors::timedtext::TimedTextStrategy;
use crate::extractors::StrategyChain;
use crate::fetch::{HttpFetcher, ReqwestFetcher};
use crate::{AcquireResult, TranscriptError};

pub mod parser;

/// Individual transcript segment with timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,

    /// Decoded segment text
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, duration: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            duration,
            text: text.into(),
        }
    }

    /// End time in seconds
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Ordered, immutable list of segments produced by one acquisition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    segments: Vec<TranscriptSegment>,
}

impl Transcript {
    pub fn new(segments: Vec<TranscriptSegment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[TranscriptSegment] {
        &self.segments
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TranscriptSegment> {
        self.segments.iter()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn into_segments(self) -> Vec<TranscriptSegment> {
        self.segments
    }
}

impl From<Vec<TranscriptSegment>> for Transcript {
    fn from(segments: Vec<TranscriptSegment>) -> Self {
        Self::new(segments)
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a TranscriptSegment;
    type IntoIter = std::slice::Iter<'a, TranscriptSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Main acquisition pipeline
pub struct TranscriptPipeline {
    chain: StrategyChain,
}

impl TranscriptPipeline {
    /// Create a pipeline for one video, loading its watch page as the page state
    pub async fn for_video(config: &Config, video_id: &str, load_page: bool) -> crate::Result<Self> {
        let fetcher: Arc<dyn HttpFetcher> = Arc::new(ReqwestFetcher::new(&config.http)?);

        let page = if load_page {
            match HtmlPage::fetch(fetcher.as_ref(), &config.endpoints.watch_page_url, video_id).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!("Could not load watch page, continuing without it: {}", e);
                    HtmlPage::default()
                }
            }
        } else {
            HtmlPage::default()
        };

        Ok(Self::with_sources(config, fetcher, Arc::new(page)))
    }

    /// Create the default embedded → internal endpoint → timed-text chain
    pub fn with_sources(
        config: &Config,
        fetcher: Arc<dyn HttpFetcher>,
        page: Arc<dyn PageMetadataProvider>,
    ) -> Self {
        let mut chain = StrategyChain::new();

        chain.register(Box::new(EmbeddedMetadataStrategy::new(
            page,
            fetcher.clone(),
            config.acquisition.preferred_track_languages.clone(),
        )));
        chain.register(Box::new(InnertubeStrategy::new(
            fetcher.clone(),
            config.endpoints.transcript_api_url.clone(),
            config.innertube.clone(),
        )));
        chain.register(Box::new(TimedTextStrategy::new(
            fetcher,
            config.endpoints.timed_text_url.clone(),
            config.acquisition.preferred_languages.clone(),
            config.acquisition.format_priority.clone(),
        )));

        Self { chain }
    }

    /// Acquire the transcript of a video, trying every strategy in order
    pub async fn acquire_transcript(&self, video_id: &str) -> AcquireResult<Transcript> {
        let video_id = video_id.trim();
        if video_id.is_empty() {
            return Err(TranscriptError::InvalidVideoId(video_id.to_string()));
        }

        tracing::info!("Acquiring transcript for video: {}", video_id);
        self.chain.run(video_id).await
    }

    /// Names of the strategies in priority order
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.chain.names()
    }
}
