//! `concierge status` — Show the effective configuration.

use concierge_config::AppConfig;

pub async fn run(offline: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(offline)?;

    println!("Concierge Status");
    println!("================");
    println!("  Config dir:    {}", AppConfig::config_dir().display());
    println!("  Provider:      {}", config.default_provider);
    println!("  Model:         {}", config.default_model);
    println!("  API key:       {}", if config.has_api_key() { "configured" } else { "none" });
    match concierge_providers::build_from_config(&config).default_provider() {
        Some(provider) => match provider.health_check().await {
            Ok(true) => println!("  Reachable:     yes"),
            Ok(false) => println!("  Reachable:     responded with an error"),
            Err(e) => println!("  Reachable:     no ({e})"),
        },
        None => println!("  Reachable:     provider not configured"),
    }
    println!("  Backend:       {:?} ({})", config.backend.mode, config.backend.base_url);
    println!("  Gateway:       {}:{}", config.gateway.host, config.gateway.port);
    println!("  History limit: {} turns", config.chat.history_limit);
    match config.chat.pending_action_ttl() {
        Some(ttl) => println!("  Pending TTL:   {}s", ttl.as_secs()),
        None => println!("  Pending TTL:   never expires"),
    }

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  Config file found");
    } else {
        println!("\n  No config file — run `concierge onboard` first");
    }

    Ok(())
}
