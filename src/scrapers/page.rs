//! Extract links, titles and descriptions from a front page.

use super::Fetcher;
use crate::error::PipelineError;
use crate::models::{Page, RawExtraction};
use crate::normalize::encoding::decode;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("anchor selector"));
static HEADING: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").expect("heading selector"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("paragraph selector"));

/// Fetch `page`, decode it with its declared charset and extract its fields.
///
/// Fetch failures are returned as-is; retrying is the caller's business.
/// Bytes that do not decode are a [`crate::error::NormalizeError`].
#[instrument(level = "info", skip_all, fields(url = %page.url))]
pub async fn extract<F: Fetcher>(fetcher: &F, page: &Page) -> Result<RawExtraction, PipelineError> {
    let body = fetcher.fetch(&page.url).await?;
    let html = decode(&body.bytes, body.charset.as_deref())?;
    let extraction = extract_fields(&html);
    info!(
        links = extraction.links.len(),
        titles = extraction.titles.len(),
        descriptions = extraction.descriptions.len(),
        "Extracted page fields"
    );
    Ok(extraction)
}

/// Parse `html` and collect, in document order:
///
/// - every `<a>`'s `href` (`None` if absent)
/// - every `<h2>`'s text
/// - every `<p>`'s text, trimmed
pub fn extract_fields(html: &str) -> RawExtraction {
    let document = Html::parse_document(html);

    let links = document
        .select(&ANCHOR)
        .map(|a| a.value().attr("href").map(str::to_string))
        .collect::<Vec<_>>();

    let titles = document
        .select(&HEADING)
        .map(|h| h.text().collect::<String>())
        .collect::<Vec<_>>();

    let descriptions = document
        .select(&PARAGRAPH)
        .map(|p| p.text().collect::<String>().trim().to_string())
        .collect::<Vec<_>>();

    debug!(?titles, "Parsed headings");
    RawExtraction {
        links,
        titles,
        descriptions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchError, NormalizeError};
    use crate::models::PageBody;

    const FRONT_PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Front</title></head>
<body>
  <a href="/news/1">One</a>
  <h2>First <em>headline</em></h2>
  <p>  Lead paragraph.  </p>
  <a name="anchor-without-target">Two</a>
  <h2>Second headline</h2>
  <div><p>Nested <b>bold</b> text</p></div>
  <a href="https://example.com/x">Three</a>
  <p></p>
</body></html>"#;

    struct StaticPage(&'static str);

    impl Fetcher for StaticPage {
        async fn fetch(&self, _url: &str) -> Result<PageBody, FetchError> {
            Ok(self.0.into())
        }
    }

    struct RawPage(&'static [u8], &'static str);

    impl Fetcher for RawPage {
        async fn fetch(&self, _url: &str) -> Result<PageBody, FetchError> {
            Ok(PageBody {
                bytes: self.0.to_vec(),
                charset: Some(self.1.to_string()),
            })
        }
    }

    struct FailingPage;

    impl Fetcher for FailingPage {
        async fn fetch(&self, url: &str) -> Result<PageBody, FetchError> {
            Err(FetchError::Status {
                url: url.to_string(),
                status: 500,
            })
        }
    }

    #[test]
    fn test_links_keep_missing_targets() {
        let raw = extract_fields(FRONT_PAGE);
        assert_eq!(
            raw.links,
            vec![
                Some("/news/1".to_string()),
                None,
                Some("https://example.com/x".to_string()),
            ]
        );
    }

    #[test]
    fn test_titles_in_document_order() {
        let raw = extract_fields(FRONT_PAGE);
        assert_eq!(raw.titles, vec!["First headline", "Second headline"]);
    }

    #[test]
    fn test_descriptions_are_trimmed_and_not_filtered() {
        let raw = extract_fields(FRONT_PAGE);
        assert_eq!(
            raw.descriptions,
            vec!["Lead paragraph.", "Nested bold text", ""]
        );
    }

    #[test]
    fn test_no_deduplication() {
        let raw = extract_fields("<p>same</p><p>same</p><a href='x'></a><a href='x'></a>");
        assert_eq!(raw.descriptions.len(), 2);
        assert_eq!(raw.links.len(), 2);
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(extract_fields(""), RawExtraction::default());
    }

    #[tokio::test]
    async fn test_extract_uses_fetcher() {
        let page = Page {
            url: "https://www.dawn.com/".to_string(),
        };
        let raw = extract(&StaticPage(FRONT_PAGE), &page).await.unwrap();
        assert_eq!(raw.titles.len(), 2);
    }

    #[tokio::test]
    async fn test_extract_propagates_fetch_error() {
        let page = Page {
            url: "https://www.bbc.com/".to_string(),
        };
        let err = extract(&FailingPage, &page).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Fetch(FetchError::Status { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_extract_decodes_declared_charset() {
        let page = Page {
            url: "https://www.dawn.com/".to_string(),
        };
        let raw = extract(&RawPage(b"<p>caf\xe9 \x93open\x94</p>", "windows-1252"), &page)
            .await
            .unwrap();
        assert_eq!(raw.descriptions, vec!["caf\u{e9} \u{201C}open\u{201D}"]);
    }

    #[tokio::test]
    async fn test_extract_rejects_malformed_utf8() {
        let page = Page {
            url: "https://www.dawn.com/".to_string(),
        };
        let err = extract(&RawPage(b"<p>caf\xff\xfe market</p>", "utf-8"), &page)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "normalize");
        assert!(matches!(
            err,
            PipelineError::Normalize(NormalizeError::InvalidUtf8 { offset: 6 })
        ));
    }
}
