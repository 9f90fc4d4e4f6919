//! watershed-extract: structured data extraction from watershed plan PDFs.
//!
//! Pipeline: PDF text ([`pdf`]) → cleanup and page markers ([`normalize`])
//! → prompt and provider chain ([`llm`], [`extraction`]) → typed report,
//! renderable via [`export`] and served over HTTP by [`server`].

pub mod config;
pub mod export;
pub mod extraction;
pub mod llm;
pub mod normalize;
pub mod pdf;
pub mod server;

pub use config::ExtractorConfig;
pub use extraction::{CanonicalReport, ExtractError, ExtractionOptions, Extractor};
