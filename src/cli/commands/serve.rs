//! Web server command.

use console::style;

use crate::analysis::SentimentService;
use crate::config::Config;
use crate::server::AppState;

/// Default port when only a host is given.
const DEFAULT_PORT: u16 = 3040;

/// Start the web server.
pub async fn cmd_serve(config: &Config, service: SentimentService) -> anyhow::Result<()> {
    let (host, port) = parse_bind_address(&config.server.bind)?;

    if !config.llm.enabled() {
        println!(
            "{} LLM backend is disabled in config; analysis requests will fail",
            style("!").yellow()
        );
    }

    println!(
        "{} Starting sentiscope server at http://{}:{}",
        style("→").cyan(),
        host,
        port
    );
    println!(
        "  Backend: {} ({}), pipeline: {}",
        config.llm.provider_name(),
        config.llm.model(),
        service.mode()
    );
    println!("  Press Ctrl+C to stop");

    let state = AppState::new(service, &config.llm);
    crate::server::serve(state, &format!("{}:{}", host, port)).await
}

/// Parse a bind address that can be:
/// - Just a port: "3040" -> 127.0.0.1:3040
/// - Just a host: "0.0.0.0" -> 0.0.0.0:3040
/// - Host and port: "0.0.0.0:3040" -> 0.0.0.0:3040
fn parse_bind_address(bind: &str) -> anyhow::Result<(String, u16)> {
    let bind = bind.trim();
    if bind.is_empty() {
        anyhow::bail!("Empty bind address");
    }

    if let Ok(port) = bind.parse::<u16>() {
        return Ok(("127.0.0.1".to_string(), port));
    }

    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return Ok((host.to_string(), port));
        }
    }

    Ok((bind.to_string(), DEFAULT_PORT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_port_only() {
        assert_eq!(
            parse_bind_address("8080").unwrap(),
            ("127.0.0.1".to_string(), 8080)
        );
    }

    #[test]
    fn test_parse_host_only() {
        assert_eq!(
            parse_bind_address("0.0.0.0").unwrap(),
            ("0.0.0.0".to_string(), 3040)
        );
    }

    #[test]
    fn test_parse_host_and_port() {
        assert_eq!(
            parse_bind_address("192.168.1.5:9000").unwrap(),
            ("192.168.1.5".to_string(), 9000)
        );
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_bind_address("  ").is_err());
    }
}
