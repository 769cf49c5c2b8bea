//! `concierge gateway` — Start the HTTP API server.

pub async fn run(offline: bool, port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(offline)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("Concierge Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Backend:   {:?}", config.backend.mode);

    concierge_gateway::start(config).await?;

    Ok(())
}
