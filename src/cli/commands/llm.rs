//! Backend inspection commands.

use console::style;

use crate::config::Config;
use crate::llm::LlmClient;

/// List models available from the configured provider.
pub async fn cmd_models(config: &Config) -> anyhow::Result<()> {
    let llm_client = LlmClient::new(config.llm.clone())?;

    println!("\n{}", style("Available Models").bold());
    println!("{}", "-".repeat(40));

    if !llm_client.is_available().await {
        println!(
            "{} {}",
            style("!").yellow(),
            config.llm.availability_hint()
        );
        return Ok(());
    }

    match llm_client.list_models().await {
        Ok(models) => {
            if models.is_empty() {
                println!("  No models installed");
                println!("  Install one with: ollama pull llama3.2:instruct");
            } else {
                for model in models {
                    let marker = if model == config.llm.model() {
                        style("*").green().to_string()
                    } else {
                        " ".to_string()
                    };
                    println!("{} {}", marker, model);
                }
            }
        }
        Err(e) => {
            println!("{} Failed to list models: {}", style("✗").red(), e);
        }
    }

    Ok(())
}

/// Print the effective configuration and check that the backend is reachable.
pub async fn cmd_check(config: &Config) -> anyhow::Result<()> {
    let llm = &config.llm;

    println!("\n{}", style("Configuration").bold());
    println!("{}", "-".repeat(40));
    match config.source_path {
        Some(ref path) => println!("{:<20} {}", "Config File:", path.display()),
        None => println!("{:<20} {}", "Config File:", style("(defaults)").dim()),
    }

    println!("\n{}", style("Backend").cyan());
    println!(
        "  {:<18} {}",
        "Enabled:",
        if llm.enabled() { "Yes" } else { "No" }
    );
    println!("  {:<18} {}", "Provider:", llm.provider_name());
    println!("  {:<18} {}", "Endpoint:", llm.endpoint());
    println!("  {:<18} {}", "Model:", llm.model());
    println!(
        "  {:<18} {}",
        "API Key:",
        if llm.api_key().is_some() {
            style("set").green()
        } else {
            style("not set").dim()
        }
    );
    println!("  {:<18} {}", "Max Tokens:", llm.app.max_tokens);
    println!("  {:<18} {:.2}", "Temperature:", llm.app.temperature);
    println!("  {:<18} {}", "Max Retries:", llm.app.max_retries);
    println!("  {:<18} {}s", "Timeout:", llm.app.timeout_secs);

    println!("\n{}", style("Analysis").cyan());
    println!(
        "  {:<18} {} ({} calls per text)",
        "Pipeline:",
        config.analysis.pipeline,
        config.analysis.pipeline.round_trips()
    );
    println!("  {:<18} {}", "Chunk Size:", config.analysis.chunk_size);
    println!(
        "  {:<18} {}",
        "Concurrent Chunks:", config.analysis.max_concurrent_chunks
    );
    println!("  {:<18} {}", "Server Bind:", config.server.bind);

    println!();
    let llm_client = LlmClient::new(llm.clone())?;
    if llm_client.is_available().await {
        println!(
            "{} {} is reachable",
            style("✓").green(),
            llm.provider_name()
        );
        Ok(())
    } else {
        println!("{} {}", style("✗").red(), llm.availability_hint());
        anyhow::bail!("{} backend is not available", llm.provider_name())
    }
}
