//! HTTP request handlers for the web server.

mod helpers;
mod preview;
mod status;

// Re-export handlers for use by the router
pub use preview::create_preview;
pub use status::service_info;
