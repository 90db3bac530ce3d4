//! Web server command.

use console::style;

use crate::config::Settings;

const DEFAULT_PORT: u16 = 3000;

/// Start the web server.
pub async fn cmd_serve(settings: &Settings, bind: Option<&str>) -> anyhow::Result<()> {
    let (host, port) = parse_bind_address(bind.unwrap_or(&settings.bind))?;

    println!(
        "{} Starting Centscape server at http://{}:{}",
        style("→").cyan(),
        host,
        port
    );
    println!(
        "  {} requests per {}s per client",
        settings.rate_limit.max_requests,
        settings.rate_limit.window.as_secs()
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(settings, &format_bind(&host, port)).await
}

/// Parse a bind address that can be:
/// - Just a port: "3000" -> 127.0.0.1:3000
/// - Just a host: "0.0.0.0" -> 0.0.0.0:3000
/// - Host and port: "0.0.0.0:3000" -> 0.0.0.0:3000
fn parse_bind_address(bind: &str) -> anyhow::Result<(String, u16)> {
    let bind = bind.trim();
    if bind.is_empty() {
        anyhow::bail!("Empty bind address");
    }

    // Try parsing as just a port number
    if let Ok(port) = bind.parse::<u16>() {
        return Ok(("127.0.0.1".to_string(), port));
    }

    // Bare IPv6 address without a port
    if bind.parse::<std::net::Ipv6Addr>().is_ok() {
        return Ok((bind.to_string(), DEFAULT_PORT));
    }

    // Try parsing as host:port
    if let Some((host, port_str)) = bind.rsplit_once(':') {
        let port = port_str
            .parse::<u16>()
            .map_err(|_| anyhow::anyhow!("Invalid port in bind address: {}", bind))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        return Ok((host.to_string(), port));
    }

    // Must be just a host, use default port
    Ok((bind.to_string(), DEFAULT_PORT))
}

fn format_bind(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}
