//! `concierge chat` — Interactive or single-message customer chat.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(
    offline: bool,
    user: String,
    message: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(offline)?;
    let chat = concierge_gateway::assemble_chat(&config);

    if let Some(msg) = message {
        let response = chat.handle(&user, &msg).await;
        println!("{response}");
        return Ok(());
    }

    println!();
    println!("  Concierge — Interactive Mode");
    println!();
    println!("  Customer:  {user}");
    println!("  Backend:   {:?}", config.backend.mode);
    println!("  Model:     {} ({})", config.default_model, config.default_provider);
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        let response = chat.handle(&user, line).await;
        println!();
        for out in response.lines() {
            println!("  Concierge > {out}");
        }
        println!();
    }

    println!();
    println!("  Goodbye!");
    Ok(())
}
