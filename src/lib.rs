//! Transcript Fetch - acquire timed YouTube captions as a uniform transcript
//!
//! The library tries several independent caption sources in a fixed priority order
//! (embedded player metadata, the internal transcript endpoint and the public
//! timed-text endpoint) and returns the first non-empty transcript.

pub mod cli;
pub mod config;
pub mod extractors;
pub mod fetch;
pub mod output;
pub mod transcribe;
pub mod utils;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use extractors::{AttemptOutcome, StrategyChain, StrategyFailure, TranscriptStrategy};
pub use transcribe::{Transcript, TranscriptPipeline, TranscriptSegment};

/// Result type used by the application layer
pub type Result<T> = anyhow::Result<T>;

/// Result type used by the acquisition pipeline
pub type AcquireResult<T> = std::result::Result<T, TranscriptError>;

/// Error types produced while acquiring a transcript
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TranscriptError {
    #[error("Invalid video id: {0:?}")]
    InvalidVideoId(String),

    #[error("Player metadata could not be located on the page")]
    SourceUnavailable,

    #[error("Caption tracks not found in player metadata")]
    TracksNotFound,

    #[error("Transcript endpoint returned no cue data")]
    NoCueData,

    #[error("HTTP {status} from {url}")]
    ApiError { status: u16, url: String },

    #[error("Empty response body from {0}")]
    EmptyResponse(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("No captions found after {attempts} language/format attempts")]
    AllLanguagesExhausted { attempts: usize },

    #[error("Captions could not be found or retrieved for video {video_id}")]
    NoCaptionsAvailable {
        video_id: String,
        failures: Vec<StrategyFailure>,
    },
}
