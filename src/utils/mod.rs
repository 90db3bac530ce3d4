//! Shared utility functions.
//!
//! - `url`: URL normalization for duplicate detection

mod url;

pub use self::url::{is_tracking_param, normalize_url};
