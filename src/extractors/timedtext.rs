use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

use super::TranscriptStrategy;
use crate::fetch::{HttpFetcher, HttpResponse};
use crate::transcribe::parser::{parse_json3, parse_timed_text_xml, TextPolicy};
use crate::transcribe::{Transcript, TranscriptSegment};
use crate::{AcquireResult, TranscriptError};

/// Format tag parsed as a json3 document
pub const JSON_FORMAT: &str = "json3";

/// Format tag that leaves the endpoint's own default in place
pub const DEFAULT_FORMAT: &str = "default";

/// Walks languages × formats against the public timed-text endpoint
pub struct TimedTextStrategy {
    fetcher: Arc<dyn HttpFetcher>,
    endpoint: String,
    languages: Vec<String>,
    formats: Vec<String>,
}

impl TimedTextStrategy {
    pub fn new(
        fetcher: Arc<dyn HttpFetcher>,
        endpoint: String,
        languages: Vec<String>,
        formats: Vec<String>,
    ) -> Self {
        Self {
            fetcher,
            endpoint,
            languages,
            formats,
        }
    }

    /// Endpoint URL for one (language, format) pair
    pub fn track_url(
        &self,
        video_id: &str,
        language: &str,
        format: &str,
        auto_generated: bool,
    ) -> AcquireResult<String> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| TranscriptError::ParseError(format!("timed-text endpoint: {}", e)))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("v", video_id).append_pair("lang", language);
            if !format.is_empty() && format != DEFAULT_FORMAT {
                query.append_pair("fmt", format);
            }
            if auto_generated {
                query.append_pair("kind", "asr");
            }
        }

        Ok(url.into())
    }

    /// Fetch the authored track, falling back once to the auto-generated one
    async fn fetch_track(&self, video_id: &str, language: &str, format: &str) -> AcquireResult<HttpResponse> {
        let authored_url = self.track_url(video_id, language, format, false)?;

        match self.fetcher.get(&authored_url).await {
            Ok(response) if response.is_success() => return Ok(response),
            Ok(response) => tracing::debug!(
                "Authored {}/{} returned HTTP {}, trying auto-generated",
                language,
                format,
                response.status
            ),
            Err(e) => tracing::debug!(
                "Authored {}/{} failed ({}), trying auto-generated",
                language,
                format,
                e
            ),
        }

        let generated_url = self.track_url(video_id, language, format, true)?;
        let response = self.fetcher.get(&generated_url).await?;
        if !response.is_success() {
            return Err(TranscriptError::ApiError {
                status: response.status,
                url: generated_url,
            });
        }

        Ok(response)
    }

    async fn try_pair(&self, video_id: &str, language: &str, format: &str) -> AcquireResult<Vec<TranscriptSegment>> {
        let response = self.fetch_track(video_id, language, format).await?;
        if response.is_blank() {
            return Err(TranscriptError::EmptyResponse(format!("{}/{}", language, format)));
        }

        if format == JSON_FORMAT {
            parse_json3(&response.body)
        } else {
            parse_timed_text_xml(&response.body, TextPolicy::TrimAndSkipEmpty)
        }
    }
}

#[async_trait]
impl TranscriptStrategy for TimedTextStrategy {
    fn name(&self) -> &'static str {
        "timed-text"
    }

    async fn acquire(&self, video_id: &str) -> AcquireResult<Transcript> {
        let mut attempts = 0;

        for language in &self.languages {
            for format in &self.formats {
                attempts += 1;

                match self.try_pair(video_id, language, format).await {
                    Ok(segments) if !segments.is_empty() => {
                        tracing::info!("Timed-text captions found for {}/{}", language, format);
                        return Ok(Transcript::new(segments));
                    }
                    Ok(_) => tracing::debug!("No cues in {}/{}", language, format),
                    Err(e) => tracing::debug!("Skipping {}/{}: {}", language, format, e),
                }
            }
        }

        Err(TranscriptError::AllLanguagesExhausted { attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MockHttpFetcher;
    use mockall::Sequence;

    const ENDPOINT: &str = "https://www.youtube.com/api/timedtext";
    const VIDEO: &str = "abcdefghijk";
    const XML: &str = r#"<transcript><text start="1.5" d="2">hello &amp;amp; bye</text><text start="4" dur="1">  </text></transcript>"#;

    fn strategy(fetcher: MockHttpFetcher, languages: &[&str], formats: &[&str]) -> TimedTextStrategy {
        TimedTextStrategy::new(
            Arc::new(fetcher),
            ENDPOINT.to_string(),
            languages.iter().map(|s| s.to_string()).collect(),
            formats.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn is_request(url: &str, lang: &str, format: &str, auto_generated: bool) -> bool {
        url.contains(&format!("lang={}", lang))
            && url.contains(&format!("fmt={}", format))
            && url.contains("kind=asr") == auto_generated
    }

    #[test]
    fn test_track_url_shapes() {
        let strategy = strategy(MockHttpFetcher::new(), &["ja"], &["json3"]);

        assert_eq!(
            strategy.track_url(VIDEO, "ja", "json3", false).unwrap(),
            "https://www.youtube.com/api/timedtext?v=abcdefghijk&lang=ja&fmt=json3"
        );
        assert_eq!(
            strategy.track_url(VIDEO, "zh-Hans", "default", true).unwrap(),
            "https://www.youtube.com/api/timedtext?v=abcdefghijk&lang=zh-Hans&kind=asr"
        );
    }

    #[tokio::test]
    async fn test_not_found_retries_auto_generated_once_then_next_format() {
        let mut seq = Sequence::new();
        let mut fetcher = MockHttpFetcher::new();
        fetcher
            .expect_get()
            .withf(|url| is_request(url, "ja", "json3", false))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(HttpResponse::new(404, "")));
        fetcher
            .expect_get()
            .withf(|url| is_request(url, "ja", "json3", true))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(HttpResponse::new(404, "")));
        fetcher
            .expect_get()
            .withf(|url| is_request(url, "ja", "srv3", false))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(HttpResponse::new(200, XML)));

        let transcript = strategy(fetcher, &["ja", "en"], &["json3", "srv3"])
            .acquire(VIDEO)
            .await
            .unwrap();

        assert_eq!(transcript.segments(), &[TranscriptSegment::new(1.5, 2.0, "hello & bye")]);
    }

    #[tokio::test]
    async fn test_auto_generated_track_is_used() {
        let mut fetcher = MockHttpFetcher::new();
        fetcher
            .expect_get()
            .withf(|url| is_request(url, "ja", "json3", false))
            .times(1)
            .returning(|_| Ok(HttpResponse::new(404, "")));
        fetcher
            .expect_get()
            .withf(|url| is_request(url, "ja", "json3", true))
            .times(1)
            .returning(|_| {
                Ok(HttpResponse::new(
                    200,
                    r#"{"events":[{"tStartMs":1000,"dDurationMs":500,"segs":[{"utf8":"foo"},{"utf8":"bar"}]}]}"#,
                ))
            });

        let transcript = strategy(fetcher, &["ja"], &["json3", "srv3"])
            .acquire(VIDEO)
            .await
            .unwrap();

        assert_eq!(transcript.segments(), &[TranscriptSegment::new(1.0, 0.5, "foobar")]);
    }

    #[tokio::test]
    async fn test_transport_error_also_falls_back() {
        let mut fetcher = MockHttpFetcher::new();
        fetcher
            .expect_get()
            .withf(|url| !url.contains("kind=asr"))
            .times(1)
            .returning(|_| Err(TranscriptError::Network("connection reset".to_string())));
        fetcher
            .expect_get()
            .withf(|url| url.contains("kind=asr"))
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, XML)));

        let transcript = strategy(fetcher, &["en"], &["srv3"]).acquire(VIDEO).await.unwrap();
        assert_eq!(transcript.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_and_unparsable_bodies_move_on() {
        let mut fetcher = MockHttpFetcher::new();
        fetcher
            .expect_get()
            .withf(|url| is_request(url, "ja", "json3", false))
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, "  \n")));
        fetcher
            .expect_get()
            .withf(|url| is_request(url, "ja", "srv3", false))
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, "<transcript><text>broken</p>")));
        fetcher
            .expect_get()
            .withf(|url| url.contains("lang=ja") && !url.contains("fmt=") && !url.contains("kind=asr"))
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, XML)));
        fetcher.expect_get().withf(|url| url.contains("kind=asr")).times(0);

        let transcript = strategy(fetcher, &["ja", "en"], &["json3", "srv3", "default"])
            .acquire(VIDEO)
            .await
            .unwrap();

        assert_eq!(transcript.segments(), &[TranscriptSegment::new(1.5, 2.0, "hello & bye")]);
    }

    #[tokio::test]
    async fn test_html_page_is_not_accepted_as_captions() {
        let mut fetcher = MockHttpFetcher::new();
        fetcher
            .expect_get()
            .withf(|url| is_request(url, "ja", "srv3", false))
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, "<html><body><p>Sign in to confirm</p></body></html>")));
        fetcher
            .expect_get()
            .withf(|url| url.contains("lang=en") && !url.contains("kind=asr"))
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, XML)));

        let transcript = strategy(fetcher, &["ja", "en"], &["srv3"]).acquire(VIDEO).await.unwrap();
        assert_eq!(transcript.segments(), &[TranscriptSegment::new(1.5, 2.0, "hello & bye")]);
    }

    #[tokio::test]
    async fn test_exhaustion_after_every_pair() {
        let mut fetcher = MockHttpFetcher::new();
        fetcher
            .expect_get()
            .times(2 * 3 * 2)
            .returning(|_| Ok(HttpResponse::new(404, "")));

        let result = strategy(fetcher, &["ja", "en"], &["json3", "srv3", "default"])
            .acquire(VIDEO)
            .await;

        assert_eq!(result, Err(TranscriptError::AllLanguagesExhausted { attempts: 6 }));
    }

    #[tokio::test]
    async fn test_documents_without_cues_are_skipped() {
        let mut fetcher = MockHttpFetcher::new();
        fetcher
            .expect_get()
            .withf(|url| url.contains("lang=ja"))
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, r#"{"events":[{"tStartMs":0}]}"#)));
        fetcher
            .expect_get()
            .withf(|url| url.contains("lang=en"))
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, r#"{"events":[{"tStartMs":0,"segs":[{"utf8":"hi"}]}]}"#)));

        let transcript = strategy(fetcher, &["ja", "en"], &["json3"]).acquire(VIDEO).await.unwrap();
        assert_eq!(transcript.segments(), &[TranscriptSegment::new(0.0, 0.0, "hi")]);
    }
}
