pub mod chat;
pub mod fulfill;
pub mod gateway;
pub mod onboard;
pub mod status;
pub mod task;

use concierge_config::{AppConfig, BackendMode};

/// Load `~/.concierge/config.toml`; `--offline` swaps in the seeded in-memory backend.
pub fn load_config(offline: bool) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if offline {
        config.backend.mode = BackendMode::InMemory;
    }
    Ok(config)
}

/// Inline JSON, or `@path` to read it from a file.
pub fn read_input(input: &str) -> Result<String, Box<dyn std::error::Error>> {
    match input.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read input file '{path}': {e}").into()),
        None => Ok(input.to_string()),
    }
}
