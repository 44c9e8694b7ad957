// ABOUTME: Main library entry point for the harvest web content extraction pipeline.
// ABOUTME: Re-exports the public API: Harvester, HarvesterBuilder, Options, ExtractionResult, HarvestError.

//! Harvest - robust article extraction with escalating fallback tiers.
//!
//! A URL goes through a site-specific handler when one is registered, then a static fetch
//! with generic DOM extraction, and finally a headless browser when the static page is
//! blocked, too thin, or unreachable. Every call returns an [`ExtractionResult`]; errors
//! are carried in the result instead of being returned.
//!
//! # Example
//!
//! ```no_run
//! use digests_harvest::{Harvester, HarvestError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), HarvestError> {
//!     let harvester = Harvester::builder().build()?;
//!     let result = harvester.extract("https://example.com/article").await;
//!     if result.success {
//!         println!("{}\n\n{}", result.title, result.content);
//!     }
//!     Ok(())
//! }
//! ```

pub mod antibot;
pub mod client;
pub mod dom;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod noise;
pub mod options;
pub mod quality;
pub mod render;
pub mod resource;
pub mod result;

pub use crate::antibot::{looks_blocked, AntiBotConfig, AntiBotDetector};
pub use crate::client::{is_valid_url, Harvester};
pub use crate::error::{ErrorCode, HarvestError};
pub use crate::extractors::generic::GenericExtractor;
pub use crate::handlers::{HandlerContext, HandlerRegistry, SiteHandler};
pub use crate::noise::{clean_lines, is_noise, NoiseFilter};
pub use crate::options::{HarvesterBuilder, Options};
pub use crate::quality::{is_good_quality, QualityConfig, QualityGate};
pub use crate::render::{BrowserPage, BrowserRuntime, BrowserSession, RenderOptions, Renderer};
pub use crate::result::{ExtractionResult, ImageRef};
