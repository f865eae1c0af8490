//! Extract + transform: one page in, one artifact out.

use crate::error::PipelineError;
use crate::models::{Page, TransformOutput};
use crate::normalize::normalize;
use crate::scrapers::{Fetcher, extract};
use crate::utils::write_lines_atomic;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Fetch `url`, normalize every description and overwrite `artifact` with
/// one normalized description per line, in source order.
///
/// Nothing is written unless every step before the write succeeded, and the
/// write itself replaces the old artifact in one rename.
#[instrument(level = "info", skip_all, fields(%url, artifact = %artifact.display()))]
pub async fn transform<F: Fetcher>(
    fetcher: &F,
    url: &str,
    artifact: &Path,
) -> Result<TransformOutput, PipelineError> {
    let page = Page {
        url: url.to_string(),
    };
    let raw = extract(fetcher, &page).await?;

    let descriptions = raw
        .descriptions
        .iter()
        .map(|d| normalize(d))
        .collect::<Vec<_>>();
    debug!(
        empty = descriptions.iter().filter(|d| d.is_empty()).count(),
        "Normalized descriptions"
    );

    write_lines_atomic(artifact, &descriptions).await?;
    info!(
        links = raw.links.len(),
        titles = raw.titles.len(),
        lines = descriptions.len(),
        "Transform complete"
    );

    Ok(TransformOutput {
        links: raw.links,
        titles: raw.titles,
        descriptions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::models::PageBody;

    struct StaticPage(String);

    impl Fetcher for StaticPage {
        async fn fetch(&self, _url: &str) -> Result<PageBody, FetchError> {
            Ok(self.0.as_str().into())
        }
    }

    struct Utf8Bytes(&'static [u8]);

    impl Fetcher for Utf8Bytes {
        async fn fetch(&self, _url: &str) -> Result<PageBody, FetchError> {
            Ok(PageBody {
                bytes: self.0.to_vec(),
                charset: Some("utf-8".to_string()),
            })
        }
    }

    struct Unreachable;

    impl Fetcher for Unreachable {
        async fn fetch(&self, url: &str) -> Result<PageBody, FetchError> {
            Err(FetchError::Status {
                url: url.to_string(),
                status: 502,
            })
        }
    }

    fn lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_two_paragraphs_two_lines() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("dawn_data.txt");
        let fetcher = StaticPage(
            "<html><body><h2>Top</h2><a href='/a'>a</a>\
             <p>Hello World.</p><p>  Testing 123  </p></body></html>"
                .to_string(),
        );

        let out = transform(&fetcher, "https://www.dawn.com/", &artifact)
            .await
            .unwrap();

        let written = lines(&artifact);
        assert_eq!(written.len(), 2);
        assert_eq!(written[0], normalize("Hello World."));
        assert_eq!(written[1], normalize("Testing"));
        assert_eq!(out.descriptions, written);
        assert_eq!(out.titles, vec!["Top"]);
        assert_eq!(out.links, vec![Some("/a".to_string())]);
    }

    #[tokio::test]
    async fn test_line_count_matches_descriptions() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("bbc_data.txt");
        // the middle paragraph normalizes to nothing but still takes a line
        let fetcher = StaticPage("<p>Floods</p><p>2024!!</p><p>Election results</p>".to_string());

        transform(&fetcher, "https://www.bbc.com/", &artifact)
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&artifact).unwrap(),
            "flood\n\nelection result\n"
        );
    }

    #[tokio::test]
    async fn test_zero_descriptions_empty_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("bbc_data.txt");
        std::fs::write(&artifact, "stale\ncontent\n").unwrap();

        let fetcher = StaticPage("<h2>No paragraphs here</h2>".to_string());
        let out = transform(&fetcher, "https://www.bbc.com/", &artifact)
            .await
            .unwrap();

        assert!(out.descriptions.is_empty());
        assert_eq!(std::fs::read_to_string(&artifact).unwrap(), "");
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_artifact_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("dawn_data.txt");
        std::fs::write(&artifact, "previous run\n").unwrap();

        let err = transform(&Unreachable, "https://www.dawn.com/", &artifact)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "fetch");
        assert_eq!(std::fs::read_to_string(&artifact).unwrap(), "previous run\n");
    }

    #[tokio::test]
    async fn test_malformed_page_bytes_fail_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let fresh = dir.path().join("dawn_data.txt");
        let existing = dir.path().join("bbc_data.txt");
        std::fs::write(&existing, "previous run\n").unwrap();
        let fetcher = Utf8Bytes(b"<p>caf\xff\xfe market</p>");

        let err = transform(&fetcher, "https://www.dawn.com/", &fresh)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "normalize");
        assert!(!fresh.exists());

        let err = transform(&fetcher, "https://www.bbc.com/", &existing)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "normalize");
        assert_eq!(std::fs::read_to_string(&existing).unwrap(), "previous run\n");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_unwritable_artifact_is_artifact_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("no_such_dir").join("dawn_data.txt");
        let fetcher = StaticPage("<p>text</p>".to_string());

        let err = transform(&fetcher, "https://www.dawn.com/", &artifact)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "artifact_write");
    }
}
