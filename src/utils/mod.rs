use anyhow::Result;
use std::time::Duration;
use url::Url;

/// Resolve a video id from a raw id or any of the common watch URL shapes
pub fn extract_video_id(input: &str) -> Result<String> {
    let input = input.trim();

    if is_video_id(input) {
        return Ok(input.to_string());
    }

    let candidate = if input.starts_with("http://") || input.starts_with("https://") {
        input.to_string()
    } else {
        format!("https://{}", input)
    };

    let parsed = Url::parse(&candidate)
        .map_err(|_| anyhow::anyhow!("Not a video id or URL: {}", input))?;

    let host = parsed.host_str().unwrap_or_default().to_lowercase();
    if !(host.ends_with("youtube.com") || host == "youtu.be") {
        anyhow::bail!("Unsupported host: {}", host);
    }

    if let Some((_, id)) = parsed.query_pairs().find(|(key, _)| key == "v") {
        if is_video_id(&id) {
            return Ok(id.into_owned());
        }
    }

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    let id = match (host.as_str(), segments.as_slice()) {
        ("youtu.be", [id, ..]) => Some(*id),
        (_, ["embed" | "shorts" | "v" | "live", id, ..]) => Some(*id),
        _ => None,
    };

    match id {
        Some(id) if is_video_id(id) => Ok(id.to_string()),
        _ => anyhow::bail!("Could not find a video id in: {}", input),
    }
}

fn is_video_id(candidate: &str) -> bool {
    candidate.len() == 11
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Format seconds as `MM:SS`; minutes are not wrapped into hours
pub fn format_time(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let mins = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;

    format!("{:02}:{:02}", mins, secs)
}

/// Replace the five predefined XML entities with the characters they stand for.
///
/// `&amp;` is replaced first, so a double-escaped `&amp;lt;` comes out as `<`.
pub fn unescape_xml_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

/// Turn embedded line breaks into single spaces
pub fn collapse_newlines(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Call `probe` right away and then every `interval` until it yields a value
/// or `timeout` has elapsed.
pub async fn poll_until<T, F>(interval: Duration, timeout: Duration, mut probe: F) -> Option<T>
where
    F: FnMut() -> Option<T>,
{
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        if let Some(value) = probe() {
            return Some(value);
        }

        let now = tokio::time::Instant::now();
        if now >= deadline {
            tracing::debug!("Polling timed out after {:?}", timeout);
            return None;
        }

        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}
