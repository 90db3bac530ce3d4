//! Wishlist management commands.

use std::path::Path;

use console::style;

use crate::config::Settings;
use crate::models::NewWishlistItem;

use super::helpers::{open_wishlist, run_preview, truncate};

/// Preview a URL and add it to the wishlist.
pub async fn cmd_wishlist_add(
    settings: &Settings,
    url: &str,
    html_file: Option<&Path>,
) -> anyhow::Result<()> {
    let preview = run_preview(settings, url, html_file).await?;
    let repo = open_wishlist(settings).await?;

    let item = NewWishlistItem::from_preview(&preview);
    let outcome = repo.add(&item).await?;

    if outcome.created {
        println!(
            "{} Added '{}' as item {}",
            style("✓").green(),
            preview.title,
            outcome.id
        );
    } else {
        println!(
            "{} Already in wishlist as item {}",
            style("!").yellow(),
            outcome.id
        );
    }

    Ok(())
}

/// List wishlist items, newest first.
pub async fn cmd_wishlist_list(settings: &Settings, json: bool) -> anyhow::Result<()> {
    let repo = open_wishlist(settings).await?;
    let items = repo.list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!(
            "{} Wishlist is empty. Add items with 'centscape wishlist add <url>'.",
            style("!").yellow()
        );
        return Ok(());
    }

    println!("\n{}", style("Wishlist").bold());
    println!("{}", "-".repeat(78));
    println!("{:<6} {:<32} {:<12} {:<16} Added", "ID", "Title", "Price", "Site");
    println!("{}", "-".repeat(78));

    for item in items {
        println!(
            "{:<6} {:<32} {:<12} {:<16} {}",
            item.id,
            truncate(&item.title, 31),
            truncate(&item.price, 11),
            truncate(&item.site_name, 15),
            item.created_at.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}

/// Delete a wishlist item by ID.
pub async fn cmd_wishlist_delete(settings: &Settings, id: i32) -> anyhow::Result<()> {
    let repo = open_wishlist(settings).await?;

    if repo.delete(id).await? {
        println!("{} Deleted item {}", style("✓").green(), id);
        Ok(())
    } else {
        println!("{} Item {} not found", style("✗").red(), id);
        anyhow::bail!("Wishlist item {} not found", id)
    }
}
