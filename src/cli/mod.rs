use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "transcript",
    about = "Transcript Fetch - Extract timed captions from YouTube videos",
    version,
    long_about = "Fetches the timed captions of a YouTube video as a transcript. Tries the player metadata embedded in the watch page, the internal transcript endpoint and the public timed-text endpoint in turn, and prints the first transcript found."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the transcript of a video
    Fetch {
        /// Video id or watch URL (youtube.com/watch, youtu.be, embed and shorts links)
        #[arg(value_name = "VIDEO_OR_URL")]
        video: String,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Preferred language code; repeat to set an ordered list (overrides config)
        #[arg(short, long = "language", value_name = "LANG")]
        languages: Vec<String>,

        /// Timed-text format tag to try; repeat to set an ordered list (overrides config)
        #[arg(long = "format-priority", value_name = "TAG")]
        format_priority: Vec<String>,

        /// Do not load the watch page (skips the embedded metadata source)
        #[arg(long)]
        no_page: bool,
    },

    /// Show or initialize the configuration file
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },

    /// List caption sources in the order they are tried
    Strategies,
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormat {
    /// `[MM:SS] text` lines
    Text,
    /// JSON array of segments
    Json,
    /// SRT subtitle format
    Srt,
    /// WebVTT format
    Vtt,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Srt => write!(f, "srt"),
            OutputFormat::Vtt => write!(f, "vtt"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fetch_with_overrides() {
        let cli = Cli::parse_from([
            "transcript",
            "fetch",
            "dQw4w9WgXcQ",
            "-f",
            "srt",
            "-l",
            "en",
            "-l",
            "ja",
            "--format-priority",
            "srv3",
            "--no-page",
        ]);

        match cli.command {
            Commands::Fetch {
                video,
                format,
                languages,
                format_priority,
                no_page,
                output,
            } => {
                assert_eq!(video, "dQw4w9WgXcQ");
                assert_eq!(format.to_string(), "srt");
                assert_eq!(languages, vec!["en", "ja"]);
                assert_eq!(format_priority, vec!["srv3"]);
                assert!(no_page);
                assert!(output.is_none());
            }
            _ => panic!("expected fetch command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["transcript", "--verbose", "strategies"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Strategies));
    }
}
