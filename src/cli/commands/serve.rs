//! Web server command.

use std::path::Path;

use console::style;

use crate::config::Config;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;

/// Start the web server.
pub async fn cmd_serve(config_path: Option<&Path>, bind: Option<&str>) -> anyhow::Result<()> {
    let config = Config::load(config_path)?;
    let bind = bind.unwrap_or(config.server.bind.as_str()).to_string();
    let (host, port) = parse_bind_address(&bind);

    println!(
        "{} Starting Daraz scraper API at http://{}:{}",
        style("→").cyan(),
        host,
        port
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(config, &host, port).await
}

/// Parse a bind address that can be:
/// - Just a port: "8080" -> 0.0.0.0:8080
/// - Just a host: "127.0.0.1" -> 127.0.0.1:8000
/// - Host and port: "127.0.0.1:8080" -> 127.0.0.1:8080
fn parse_bind_address(bind: &str) -> (String, u16) {
    if let Ok(port) = bind.parse::<u16>() {
        return (DEFAULT_HOST.to_string(), port);
    }

    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return (host.to_string(), port);
        }
    }

    (bind.to_string(), DEFAULT_PORT)
}
