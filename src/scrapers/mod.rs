//! Page fetching and field extraction.
//!
//! Both news sites are scraped with the same extractor; only the URL differs.
//!
//! # Supported Sources
//!
//! | Source | URL | Artifact |
//! |--------|-----|----------|
//! | Dawn | `https://www.dawn.com/` | `dawn_data.txt` |
//! | BBC | `https://www.bbc.com/` | `bbc_data.txt` |
//!
//! Further sources can be added in the configuration file without code
//! changes.
//!
//! # Layout
//!
//! - [`http`]: the [`Fetcher`] seam and the reqwest-backed [`HttpFetcher`]
//! - [`page`]: [`extract`] and the pure [`page::extract_fields`] parser
//!
//! Only static markup is read. No JavaScript runs and no links are followed.

pub mod http;
pub mod page;

pub use http::{Fetcher, HttpFetcher};
pub use page::extract;
