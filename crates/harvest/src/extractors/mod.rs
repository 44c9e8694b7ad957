// ABOUTME: Extraction strategies that turn parsed documents into ExtractionResults.
// ABOUTME: Holds the shared selector cache and the site-agnostic generic extractor.

//! Content extraction.
//!
//! - `compiled`: parsed selector cache and select helpers.
//! - `generic`: the container-priority extractor used for every page without a site handler.

pub mod compiled;
pub mod generic;
