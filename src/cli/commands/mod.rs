//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod helpers;
mod normalize;
mod preview;
mod serve;
mod wishlist;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::load_settings;

#[derive(Parser)]
#[command(name = "centscape")]
#[command(about = "Link previews and a deduplicated wishlist")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true, env = "CENTSCAPE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Start the preview HTTP server
    Serve {
        /// Bind address: port, host, or host:port (default from config)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Preview a URL and print the result as JSON
    Preview {
        /// Page URL
        url: String,
        /// Read the page HTML from this file instead of fetching it
        #[arg(long)]
        html_file: Option<PathBuf>,
    },

    /// Print the canonical form of a URL
    Normalize {
        /// URL to normalize
        url: String,
    },

    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        command: WishlistCommands,
    },
}

#[derive(Subcommand)]
enum WishlistCommands {
    /// Preview a URL and add it to the wishlist
    Add {
        /// Page URL
        url: String,
        /// Read the page HTML from this file instead of fetching it
        #[arg(long)]
        html_file: Option<PathBuf>,
    },
    /// List wishlist items, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a wishlist item
    Delete {
        /// Item ID
        id: i32,
    },
}

/// Parse arguments, load settings and run the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (settings, _config) = load_settings(cli.config.as_deref())
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    match cli.command {
        Commands::Serve { bind } => serve::cmd_serve(&settings, bind.as_deref()).await,
        Commands::Preview { url, html_file } => {
            preview::cmd_preview(&settings, &url, html_file.as_deref()).await
        }
        Commands::Normalize { url } => normalize::cmd_normalize(&url),
        Commands::Wishlist { command } => match command {
            WishlistCommands::Add { url, html_file } => {
                wishlist::cmd_wishlist_add(&settings, &url, html_file.as_deref()).await
            }
            WishlistCommands::List { json } => wishlist::cmd_wishlist_list(&settings, json).await,
            WishlistCommands::Delete { id } => wishlist::cmd_wishlist_delete(&settings, id).await,
        },
    }
}
