use colored::Colorize;

pub fn handle_error(err: anyhow::Error) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), err);

    let msg = err.to_string().to_lowercase();

    if msg.contains("error calling generation service") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Make sure Ollama is running and the model is pulled:");
        eprintln!("  {} ollama pull smollm2", "$".dimmed());
    }

    if msg.contains("connection refused") || msg.contains("error sending request") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Check that the gateway is running:");
        eprintln!("  {} agrimate-server", "$".dimmed());
    }

    std::process::exit(1);
}
