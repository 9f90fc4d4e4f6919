//! HTTP request handlers for the web server.

mod api;
mod export_api;
mod extract_api;
mod helpers;

pub use api::health;
pub use export_api::export_report;
pub use extract_api::extract;
pub use helpers::ApiError;
