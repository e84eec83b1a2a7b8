use anyhow::Result;

use crate::transcribe::Transcript;
use crate::utils::format_time;

/// One `[MM:SS] text` line per segment
pub fn format_as_text(transcript: &Transcript) -> String {
    transcript
        .iter()
        .map(|segment| format!("[{}] {}", format_time(segment.start), segment.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pretty-printed JSON array of segments
pub fn format_as_json(transcript: &Transcript) -> Result<String> {
    Ok(serde_json::to_string_pretty(transcript)?)
}

/// SubRip document
pub fn format_as_srt(transcript: &Transcript) -> String {
    let mut srt = String::new();

    for (index, segment) in transcript.iter().enumerate() {
        srt.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            clock_time(segment.start, ','),
            clock_time(segment.end(), ','),
            segment.text
        ));
    }

    srt
}

/// WebVTT document
pub fn format_as_vtt(transcript: &Transcript) -> String {
    let mut vtt = String::from("WEBVTT\n\n");

    for segment in transcript {
        vtt.push_str(&format!(
            "{} --> {}\n{}\n\n",
            clock_time(segment.start, '.'),
            clock_time(segment.end(), '.'),
            segment.text
        ));
    }

    vtt
}

/// `HH:MM:SS<sep>mmm`
fn clock_time(seconds: f64, separator: char) -> String {
    let total_ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };

    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;

    format!("{:02}:{:02}:{:02}{}{:03}", hours, minutes, secs, separator, millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcribe::TranscriptSegment;

    fn sample() -> Transcript {
        Transcript::new(vec![
            TranscriptSegment::new(0.0, 1.5, "first"),
            TranscriptSegment::new(65.25, 2.0, "second"),
        ])
    }

    #[test]
    fn test_format_as_text() {
        assert_eq!(format_as_text(&sample()), "[00:00] first\n[01:05] second");
        assert_eq!(format_as_text(&Transcript::default()), "");
    }

    #[test]
    fn test_format_as_srt() {
        assert_eq!(
            format_as_srt(&sample()),
            "1\n00:00:00,000 --> 00:00:01,500\nfirst\n\n2\n00:01:05,250 --> 00:01:07,250\nsecond\n\n"
        );
    }

    #[test]
    fn test_format_as_vtt() {
        let vtt = format_as_vtt(&sample());
        assert!(vtt.starts_with("WEBVTT\n\n00:00:00.000 --> 00:00:01.500\nfirst\n"));
        assert!(vtt.contains("00:01:05.250 --> 00:01:07.250\nsecond"));
    }

    #[test]
    fn test_format_as_json() {
        let json = format_as_json(&sample()).unwrap();
        let parsed: Vec<TranscriptSegment> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, sample().into_segments());
    }

    #[test]
    fn test_clock_time_hours() {
        assert_eq!(clock_time(3723.004, ','), "01:02:03,004");
    }
}
