//! The two per-source steps of the pipeline.
//!
//! - [`transform`]: fetch a page, normalize its paragraphs, write the artifact
//! - [`upload`]: push an artifact to a remote folder
//!
//! Both are plain async functions parameterized by URL, artifact path and
//! folder id. The CLI and the task graph call the same functions.

pub mod transform;
pub mod upload;

pub use transform::transform;
pub use upload::upload;
