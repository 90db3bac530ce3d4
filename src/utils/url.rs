//! URL normalization for duplicate detection.

use url::Url;

/// Query parameter prefix used by campaign tracking.
const TRACKING_PREFIX: &str = "utm_";

/// Normalize a URL into a canonical string used as a deduplication key.
///
/// Lower-cases the host, drops the fragment and any `utm_*` parameters,
/// and sorts the remaining query pairs. Path and query case are preserved.
/// Returns `None` if the input does not parse as a URL.
pub fn normalize_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw.trim()).ok()?;

    if let Some(lower) = url.host_str().map(str::to_lowercase) {
        if url.host_str() != Some(lower.as_str()) {
            url.set_host(Some(&lower)).ok()?;
        }
    }

    url.set_fragment(None);

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    pairs.sort();

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        let query = pairs
            .iter()
            .map(|(key, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(key),
                    urlencoding::encode(value)
                )
            })
            .collect::<Vec<_>>()
            .join("&");
        url.set_query(Some(&query));
    }

    Some(url.to_string())
}

/// Check if a query parameter key is a `utm_*` tracking parameter.
pub fn is_tracking_param(key: &str) -> bool {
    key.to_lowercase().starts_with(TRACKING_PREFIX)
}
