use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Deserialize;
use serde_json::Value;

use super::TranscriptSegment;
use crate::utils::{collapse_newlines, unescape_xml_entities};
use crate::{AcquireResult, TranscriptError};

/// How cue text is cleaned once it has been decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextPolicy {
    /// Collapse newlines only; cues with no text are kept
    KeepEmpty,
    /// Collapse newlines and trim; cues with no text are dropped
    TrimAndSkipEmpty,
}

impl TextPolicy {
    fn clean(self, raw: &str) -> Option<String> {
        let text = collapse_newlines(&unescape_xml_entities(raw));
        match self {
            TextPolicy::KeepEmpty => Some(text),
            TextPolicy::TrimAndSkipEmpty => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        }
    }
}

/// json3 timed-text document
#[derive(Debug, Deserialize)]
struct Json3Document {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs")]
    t_start_ms: Option<f64>,
    #[serde(rename = "dDurationMs")]
    d_duration_ms: Option<f64>,
    segs: Option<Vec<Json3Seg>>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

struct OpenCue {
    start: f64,
    duration: f64,
    text: String,
    depth: usize,
}

/// Parse an XML timed-text document.
///
/// `<text start dur>` cues under a `<transcript>` root carry seconds (`d`
/// is accepted for `dur`), `<p t d>` cues under a srv3 `<timedtext>` root
/// carry milliseconds. Missing or unreadable timings become 0. Any other
/// root, or an element left open at the end of input, is a parse error.
pub fn parse_timed_text_xml(xml: &str, policy: TextPolicy) -> AcquireResult<Vec<TranscriptSegment>> {
    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    let mut layout: Option<Layout> = None;
    let mut depth = 0usize;
    let mut open: Option<OpenCue> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let Some(layout) = layout else {
                    layout = Some(Layout::of_root(e)?);
                    depth = 1;
                    continue;
                };
                depth += 1;

                if let Some(cue) = open.as_mut() {
                    cue.depth += 1;
                } else {
                    open = layout.cue_timing(e).map(|(start, duration)| OpenCue {
                        start,
                        duration,
                        text: String::new(),
                        depth: 0,
                    });
                }
            }
            Ok(Event::Empty(ref e)) => {
                let Some(layout) = layout else {
                    layout = Some(Layout::of_root(e)?);
                    continue;
                };

                if let Some(cue) = open.as_mut() {
                    if e.name().as_ref() == b"br" {
                        cue.text.push('\n');
                    }
                } else if let Some((start, duration)) = layout.cue_timing(e) {
                    push_cue(&mut segments, policy, start, duration, "");
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(cue) = open.as_mut() {
                    let text = e
                        .unescape()
                        .map_err(|err| TranscriptError::ParseError(format!("caption XML: {}", err)))?;
                    cue.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(cue) = open.as_mut() {
                    cue.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
                match open.as_ref().map(|cue| cue.depth) {
                    Some(0) => {
                        if let Some(cue) = open.take() {
                            push_cue(&mut segments, policy, cue.start, cue.duration, &cue.text);
                        }
                    }
                    Some(_) => {
                        if let Some(cue) = open.as_mut() {
                            cue.depth -= 1;
                        }
                    }
                    None => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(TranscriptError::ParseError(format!(
                    "caption XML at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    if layout.is_none() {
        return Err(TranscriptError::ParseError("caption XML has no root element".to_string()));
    }
    if depth > 0 {
        return Err(TranscriptError::ParseError(format!(
            "caption XML ended with {} unclosed element(s)",
            depth
        )));
    }

    Ok(segments)
}

/// Caption document layout, decided by the root element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// `<transcript>` with `<text start dur>` cues in seconds
    Transcript,
    /// srv3 `<timedtext>` with `<p t d>` cues in milliseconds
    Srv3,
}

impl Layout {
    fn of_root(root: &BytesStart<'_>) -> AcquireResult<Self> {
        match root.name().as_ref() {
            b"transcript" => Ok(Layout::Transcript),
            b"timedtext" => Ok(Layout::Srv3),
            other => Err(TranscriptError::ParseError(format!(
                "unexpected caption XML root <{}>",
                String::from_utf8_lossy(other)
            ))),
        }
    }

    /// Start and duration in seconds for a cue element, `None` for other elements
    fn cue_timing(self, element: &BytesStart<'_>) -> Option<(f64, f64)> {
        match (self, element.name().as_ref()) {
            (Layout::Transcript, b"text") => {
                let start = numeric_attribute(element, b"start").unwrap_or(0.0);
                let duration = numeric_attribute(element, b"dur")
                    .or_else(|| numeric_attribute(element, b"d"))
                    .unwrap_or(0.0);
                Some((start, duration))
            }
            (Layout::Srv3, b"p") => {
                let start = numeric_attribute(element, b"t").unwrap_or(0.0);
                let duration = numeric_attribute(element, b"d").unwrap_or(0.0);
                Some((start / 1000.0, duration / 1000.0))
            }
            _ => None,
        }
    }
}

fn push_cue(
    segments: &mut Vec<TranscriptSegment>,
    policy: TextPolicy,
    start: f64,
    duration: f64,
    raw: &str,
) {
    if let Some(text) = policy.clean(raw) {
        segments.push(TranscriptSegment::new(start, duration, text));
    }
}

fn numeric_attribute(element: &BytesStart<'_>, name: &[u8]) -> Option<f64> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name)
        .and_then(|attr| String::from_utf8_lossy(&attr.value).trim().parse::<f64>().ok())
        .filter(|value| value.is_finite() && *value >= 0.0)
}

/// Parse a json3 timed-text document; events without `segs` or with blank
/// text are skipped.
pub fn parse_json3(body: &str) -> AcquireResult<Vec<TranscriptSegment>> {
    let document: Json3Document = serde_json::from_str(body)
        .map_err(|e| TranscriptError::ParseError(format!("json3 document: {}", e)))?;

    let segments = document
        .events
        .into_iter()
        .filter_map(|event| {
            let segs = event.segs?;
            let raw: String = segs.iter().map(|seg| seg.utf8.as_str()).collect();
            let text = collapse_newlines(&raw).trim().to_string();
            if text.is_empty() {
                return None;
            }

            Some(TranscriptSegment::new(
                millis_to_seconds(event.t_start_ms.unwrap_or(0.0)),
                millis_to_seconds(event.d_duration_ms.unwrap_or(0.0)),
                text,
            ))
        })
        .collect();

    Ok(segments)
}

/// Read the cue groups of a transcript endpoint response
pub fn parse_cue_groups(groups: &[Value]) -> Vec<TranscriptSegment> {
    groups
        .iter()
        .filter_map(|group| {
            let cue = group.pointer("/transcriptCueGroupRenderer/cues/0/transcriptCueRenderer")?;
            let text = cue.pointer("/cue/simpleText")?.as_str()?;

            Some(TranscriptSegment::new(
                millis_to_seconds(millis_field(cue.get("startOffsetMs"))),
                millis_to_seconds(millis_field(cue.get("durationMs"))),
                collapse_newlines(text),
            ))
        })
        .collect()
}

/// Millisecond fields arrive as numbers or numeric strings
fn millis_field(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn millis_to_seconds(ms: f64) -> f64 {
    if ms.is_finite() && ms > 0.0 {
        ms / 1000.0
    } else {
        0.0
    }
}
