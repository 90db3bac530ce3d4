//! Shared helper functions for CLI commands.

use std::path::Path;
use std::sync::Arc;

use crate::config::Settings;
use crate::http_client::BoundedFetcher;
use crate::preview::{PreviewRequest, PreviewResult, PreviewService};
use crate::repository::{AsyncSqlitePool, DieselWishlistRepository};

/// Run one preview, reading the page from `html_file` when given.
pub async fn run_preview(
    settings: &Settings,
    url: &str,
    html_file: Option<&Path>,
) -> anyhow::Result<PreviewResult> {
    let fetcher =
        BoundedFetcher::with_user_agent(settings.fetch_limits(), Some(&settings.user_agent))?;
    let service = PreviewService::new(Arc::new(fetcher));

    let mut request = PreviewRequest::new(url);
    if let Some(path) = html_file {
        request = request.with_raw_html(tokio::fs::read_to_string(path).await?);
    }

    Ok(service.handle(&request).await?)
}

/// Open the wishlist database, creating it if needed.
pub async fn open_wishlist(settings: &Settings) -> anyhow::Result<DieselWishlistRepository> {
    settings.ensure_directories()?;
    let repo = DieselWishlistRepository::new(AsyncSqlitePool::from_path(&settings.database_path));
    repo.init_schema().await?;
    Ok(repo)
}

/// Truncate a string to at most `max` characters, marking the cut.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer title", 6), "a lon…");
        assert_eq!(truncate("₹₹₹₹", 3), "₹₹…");
    }
}
