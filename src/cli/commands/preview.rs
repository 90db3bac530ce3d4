//! One-shot preview command.

use std::path::Path;

use crate::config::Settings;

use super::helpers::run_preview;

/// Preview a URL and print the result as pretty JSON.
pub async fn cmd_preview(
    settings: &Settings,
    url: &str,
    html_file: Option<&Path>,
) -> anyhow::Result<()> {
    let preview = run_preview(settings, url, html_file).await?;
    println!("{}", serde_json::to_string_pretty(&preview)?);
    Ok(())
}
