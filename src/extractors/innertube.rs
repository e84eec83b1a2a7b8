use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::TranscriptStrategy;
use crate::config::InnertubeConfig;
use crate::fetch::HttpFetcher;
use crate::transcribe::parser::parse_cue_groups;
use crate::transcribe::Transcript;
use crate::{AcquireResult, TranscriptError};

const CUE_GROUPS_PATH: &str = "/actions/0/updateEngagementPanelAction/content/transcriptRenderer/body/transcriptBodyRenderer/cueGroups";

/// Asks the player's internal transcript endpoint for cue groups
pub struct InnertubeStrategy {
    fetcher: Arc<dyn HttpFetcher>,
    endpoint: String,
    config: InnertubeConfig,
}

impl InnertubeStrategy {
    pub fn new(fetcher: Arc<dyn HttpFetcher>, endpoint: String, config: InnertubeConfig) -> Self {
        Self {
            fetcher,
            endpoint,
            config,
        }
    }

    /// Request envelope for a video
    pub fn request_body(&self, video_id: &str) -> Value {
        json!({
            "context": {
                "client": {
                    "clientName": self.config.client_name,
                    "clientVersion": self.config.client_version,
                }
            },
            "params": self.config.params_layout.encode(video_id),
        })
    }
}

#[async_trait]
impl TranscriptStrategy for InnertubeStrategy {
    fn name(&self) -> &'static str {
        "internal-endpoint"
    }

    async fn acquire(&self, video_id: &str) -> AcquireResult<Transcript> {
        let body = self.request_body(video_id);
        tracing::debug!(
            "Requesting transcript panel with params layout v{}",
            self.config.params_layout.version
        );

        let response = self.fetcher.post_json(&self.endpoint, &body).await?;
        if !response.is_success() {
            return Err(TranscriptError::ApiError {
                status: response.status,
                url: self.endpoint.clone(),
            });
        }

        let document: Value = serde_json::from_str(&response.body)
            .map_err(|e| TranscriptError::ParseError(format!("transcript panel: {}", e)))?;

        let groups = document
            .pointer(CUE_GROUPS_PATH)
            .and_then(Value::as_array)
            .filter(|groups| !groups.is_empty())
            .ok_or(TranscriptError::NoCueData)?;

        Ok(Transcript::new(parse_cue_groups(groups)))
    }
}
