use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::HashMap;
use url::Url;

use crate::fetch::HttpFetcher;
use crate::{AcquireResult, TranscriptError};

/// Read-only view of the hosting page's ambient state
pub trait PageMetadataProvider: Send + Sync {
    /// Value of a global binding, if the page defines it
    fn global(&self, name: &str) -> Option<Value>;

    /// Text bodies of the page's inline scripts, in document order
    fn inline_scripts(&self) -> Vec<String>;
}

/// Page state taken from a watch-page HTML document
#[derive(Debug, Clone, Default)]
pub struct HtmlPage {
    scripts: Vec<String>,
    globals: HashMap<String, Value>,
}

impl HtmlPage {
    /// Collect the inline scripts of an HTML document
    pub fn parse(html: &str) -> AcquireResult<Self> {
        let document = Html::parse_document(html);
        let selector = Selector::parse("script")
            .map_err(|e| TranscriptError::ParseError(format!("script selector: {:?}", e)))?;

        let scripts = document
            .select(&selector)
            .filter(|script| script.value().attr("src").is_none())
            .map(|script| script.text().collect::<String>())
            .filter(|body| !body.trim().is_empty())
            .collect();

        Ok(Self {
            scripts,
            globals: HashMap::new(),
        })
    }

    /// Download and parse the watch page of a video
    pub async fn fetch(fetcher: &dyn HttpFetcher, watch_url: &str, video_id: &str) -> AcquireResult<Self> {
        let url = Url::parse_with_params(watch_url, &[("v", video_id)])
            .map_err(|e| TranscriptError::ParseError(format!("watch page URL: {}", e)))?;

        let response = fetcher.get(url.as_str()).await?;
        if !response.is_success() {
            return Err(TranscriptError::ApiError {
                status: response.status,
                url: url.to_string(),
            });
        }

        let page = Self::parse(&response.body)?;
        tracing::debug!("Watch page has {} inline scripts", page.scripts.len());
        Ok(page)
    }

    /// Attach a global binding, as a script on the live page would have
    pub fn with_global(mut self, name: impl Into<String>, value: Value) -> Self {
        self.globals.insert(name.into(), value);
        self
    }

    /// Attach an inline script body
    pub fn with_script(mut self, body: impl Into<String>) -> Self {
        self.scripts.push(body.into());
        self
    }
}

impl PageMetadataProvider for HtmlPage {
    fn global(&self, name: &str) -> Option<Value> {
        self.globals.get(name).cloned()
    }

    fn inline_scripts(&self) -> Vec<String> {
        self.scripts.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{HttpResponse, MockHttpFetcher};
    use serde_json::json;

    #[test]
    fn test_parse_keeps_inline_scripts_only() {
        let html = r#"<html><head>
<script src="/s/player/base.js"></script>
<script>var ytInitialPlayerResponse = {"a": 1};</script>
<script>  </script>
</head><body><script>window.other = true;</script></body></html>"#;

        let page = HtmlPage::parse(html).unwrap();
        assert_eq!(
            page.inline_scripts(),
            vec![
                r#"var ytInitialPlayerResponse = {"a": 1};"#.to_string(),
                "window.other = true;".to_string(),
            ]
        );
        assert!(page.global("ytInitialPlayerResponse").is_none());
    }

    #[test]
    fn test_globals_are_injectable() {
        let page = HtmlPage::default().with_global("ytplayer", json!({ "config": {} }));
        assert_eq!(page.global("ytplayer"), Some(json!({ "config": {} })));
        assert!(page.inline_scripts().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_requests_watch_url() {
        let mut fetcher = MockHttpFetcher::new();
        fetcher
            .expect_get()
            .withf(|url| url.starts_with("https://www.youtube.com/watch?v=abcdefghijk"))
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, "<script>var x = 1;</script>")));

        let page = HtmlPage::fetch(&fetcher, "https://www.youtube.com/watch", "abcdefghijk")
            .await
            .unwrap();
        assert_eq!(page.inline_scripts(), vec!["var x = 1;".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_reports_http_errors() {
        let mut fetcher = MockHttpFetcher::new();
        fetcher
            .expect_get()
            .returning(|_| Ok(HttpResponse::new(429, "")));

        let result = HtmlPage::fetch(&fetcher, "https://www.youtube.com/watch", "abcdefghijk").await;
        assert!(matches!(result, Err(TranscriptError::ApiError { status: 429, .. })));
    }
}
