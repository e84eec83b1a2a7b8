use async_trait::async_trait;

pub mod embedded;
pub mod innertube;
pub mod page;
pub mod timedtext;

use crate::transcribe::Transcript;
use crate::{AcquireResult, TranscriptError};

/// Trait for acquiring a transcript from one upstream source
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptStrategy: Send + Sync {
    /// Short name used in logs and failure reports
    fn name(&self) -> &'static str;

    /// Try to acquire the transcript of a video
    async fn acquire(&self, video_id: &str) -> AcquireResult<Transcript>;
}

/// Outcome of running one strategy
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Success(Transcript),
    Failure(String),
}

impl From<AcquireResult<Transcript>> for AttemptOutcome {
    fn from(result: AcquireResult<Transcript>) -> Self {
        match result {
            Ok(transcript) if !transcript.is_empty() => AttemptOutcome::Success(transcript),
            Ok(_) => AttemptOutcome::Failure("empty transcript".to_string()),
            Err(e) => AttemptOutcome::Failure(e.to_string()),
        }
    }
}

/// Why a strategy in the chain did not produce a transcript
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyFailure {
    pub strategy: &'static str,
    pub reason: String,
}

/// Ordered list of strategies; the first non-empty transcript wins
pub struct StrategyChain {
    strategies: Vec<Box<dyn TranscriptStrategy>>,
}

impl StrategyChain {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Append a strategy with the lowest priority so far
    pub fn register(&mut self, strategy: Box<dyn TranscriptStrategy>) {
        self.strategies.push(strategy);
    }

    /// List strategy names in priority order
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies
            .iter()
            .map(|strategy| strategy.name())
            .collect()
    }

    /// Run strategies in order until one yields a non-empty transcript
    pub async fn run(&self, video_id: &str) -> AcquireResult<Transcript> {
        let mut failures = Vec::new();

        for strategy in &self.strategies {
            tracing::debug!("Trying strategy {} for {}", strategy.name(), video_id);

            match AttemptOutcome::from(strategy.acquire(video_id).await) {
                AttemptOutcome::Success(transcript) => {
                    tracing::info!(
                        "Strategy {} produced {} segments",
                        strategy.name(),
                        transcript.len()
                    );
                    return Ok(transcript);
                }
                AttemptOutcome::Failure(reason) => {
                    tracing::warn!("Strategy {} failed: {}", strategy.name(), reason);
                    failures.push(StrategyFailure {
                        strategy: strategy.name(),
                        reason,
                    });
                }
            }
        }

        Err(TranscriptError::NoCaptionsAvailable {
            video_id: video_id.to_string(),
            failures,
        })
    }
}

impl Default for StrategyChain {
    fn default() -> Self {
        Self::new()
    }
}
