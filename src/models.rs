//! Data models passed between the pipeline stages.
//!
//! - [`Source`]: one configured news site and the artifact it produces
//! - [`Page`]: a page to extract from
//! - [`PageBody`]: the undecoded bytes a fetch returned
//! - [`RawExtraction`]: fields scraped from one page
//! - [`TransformOutput`]: what the transform job hands back to its caller
//! - [`RemoteFile`]: the file created in remote storage by an upload

use serde::{Deserialize, Serialize};

/// A news site processed by one extract → upload chain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "SourceEntry")]
pub struct Source {
    /// Short identifier, used in task ids (e.g. `"dawn"`).
    pub name: String,
    /// Front page URL to scrape.
    pub url: String,
    /// File name of the local artifact (e.g. `"dawn_data.txt"`).
    pub artifact: String,
}

impl Source {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            artifact: format!("{name}_data.txt"),
        }
    }
}

/// A source as written in the config file; `artifact` defaults to
/// `<name>_data.txt`.
#[derive(Deserialize)]
struct SourceEntry {
    name: String,
    url: String,
    #[serde(default)]
    artifact: Option<String>,
}

impl From<SourceEntry> for Source {
    fn from(entry: SourceEntry) -> Self {
        let mut source = Source::new(&entry.name, &entry.url);
        if let Some(artifact) = entry.artifact {
            source.artifact = artifact;
        }
        source
    }
}

/// A page to fetch. Input only.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: String,
}

/// Body of a fetched page, still undecoded, and the charset its response
/// declared (`None` when the `Content-Type` carried no charset).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageBody {
    pub bytes: Vec<u8>,
    pub charset: Option<String>,
}

impl From<&str> for PageBody {
    fn from(html: &str) -> Self {
        Self {
            bytes: html.as_bytes().to_vec(),
            charset: None,
        }
    }
}

/// Fields collected from a page in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawExtraction {
    /// `href` of every anchor; `None` when the anchor has no target.
    pub links: Vec<Option<String>>,
    /// Text of every `<h2>`.
    pub titles: Vec<String>,
    /// Trimmed text of every `<p>`.
    pub descriptions: Vec<String>,
}

/// Result of a transform run. The artifact on disk is the durable output;
/// this is returned for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    pub links: Vec<Option<String>>,
    pub titles: Vec<String>,
    /// One normalized description per extracted paragraph, in order.
    pub descriptions: Vec<String>,
}

/// A file created in remote storage.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RemoteFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
}
