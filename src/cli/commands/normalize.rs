//! URL normalization command.

use crate::utils::normalize_url;

pub fn cmd_normalize(url: &str) -> anyhow::Result<()> {
    match normalize_url(url) {
        Some(normalized) => {
            println!("{}", normalized);
            Ok(())
        }
        None => anyhow::bail!("Cannot normalize '{}': not an absolute URL", url),
    }
}
