use std::io::Write;

use agrimate_core::{ChatSession, GenerationRequest, Role};
use anyhow::Result;
use colored::Colorize;
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::{AskArgs, LocationArgs};
use crate::client::GatewayClient;
use crate::commands::{lookup, resolve_location};
use crate::output::OutputFormat;

/// Run one ask cycle, printing words as they complete.
///
/// The cycle always reaches completion: a broken stream flushes whatever
/// was received and the error is returned afterwards.
pub async fn stream_answer<W: Write>(
    session: &mut ChatSession,
    client: &GatewayClient,
    prompt: &str,
    location: Option<&str>,
    out: &mut W,
) -> Result<()> {
    let request = session.submit(prompt, location)?;
    let streamed = pump(session, client, &request, out).await;

    for piece in session.complete() {
        write!(out, "{piece}")?;
    }
    writeln!(out)?;
    out.flush()?;

    streamed
}

async fn pump<W: Write>(
    session: &mut ChatSession,
    client: &GatewayClient,
    request: &GenerationRequest,
    out: &mut W,
) -> Result<()> {
    let mut body = client.ask(request).await?;

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        for piece in session.receive(&chunk) {
            write!(out, "{piece}")?;
        }
        out.flush()?;
    }
    Ok(())
}

/// `agrimate ask`
pub async fn ask(client: &GatewayClient, args: AskArgs) -> Result<()> {
    let location = resolve_location(&args.location).await;
    let prompt = args.prompt.join(" ");
    let mut session = ChatSession::new();
    let mut out = std::io::stdout();

    stream_answer(&mut session, client, &prompt, location.as_deref(), &mut out).await
}

enum Input {
    Prompt(String),
    Weather(String),
    Price(String),
    Location(Option<String>),
    History,
    Help,
    Quit,
    Empty,
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Input::Prompt(line.to_string());
    };

    let (name, rest) = command
        .split_once(char::is_whitespace)
        .map(|(name, rest)| (name, rest.trim()))
        .unwrap_or((command, ""));

    match name {
        "quit" | "exit" => Input::Quit,
        "history" => Input::History,
        "weather" if !rest.is_empty() => Input::Weather(rest.to_string()),
        "price" if !rest.is_empty() => Input::Price(rest.to_string()),
        "location" => Input::Location((!rest.is_empty()).then(|| rest.to_string())),
        _ => Input::Help,
    }
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  /weather <city>    current weather");
    println!("  /price <crop>      mandi price");
    println!("  /location [name]   set or clear the weather location");
    println!("  /history           show this conversation");
    println!("  /quit              leave");
}

fn print_history(session: &ChatSession) {
    for message in session.transcript().messages() {
        let label = match message.role {
            Role::User => "you".green().bold(),
            Role::Assistant => "agrimate".cyan().bold(),
        };
        println!("{label}: {}", message.content);
    }
}

/// `agrimate chat`
pub async fn run(client: &GatewayClient, args: LocationArgs) -> Result<()> {
    let mut location = resolve_location(&args).await;
    let mut session = ChatSession::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    match &location {
        Some(name) => println!("{} {}", "Location:".dimmed(), name),
        None => println!("{}", "Location unknown; answers will not include weather.".dimmed()),
    }
    println!("{}", "Type a question, or /help for commands.".dimmed());

    loop {
        print!("{} ", "you>".green().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_input(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::Help => print_help(),
            Input::History => print_history(&session),
            Input::Location(name) => {
                location = name;
                println!(
                    "{} {}",
                    "Location:".dimmed(),
                    location.as_deref().unwrap_or("unknown")
                );
            }
            Input::Weather(city) => {
                if let Err(err) = lookup::weather(client, &city, OutputFormat::Text).await {
                    eprintln!("{} {}", "Error:".red().bold(), err);
                }
            }
            Input::Price(crop) => {
                if let Err(err) = lookup::price(client, &crop, OutputFormat::Text).await {
                    eprintln!("{} {}", "Error:".red().bold(), err);
                }
            }
            Input::Prompt(prompt) => {
                print!("{} ", "agrimate>".cyan().bold());
                let mut out = std::io::stdout();
                if let Err(err) =
                    stream_answer(&mut session, client, &prompt, location.as_deref(), &mut out)
                        .await
                {
                    tracing::warn!(error = %err, "Ask cycle ended with an error");
                    eprintln!("{} {}", "Error:".red().bold(), err);
                }
            }
        }
    }

    Ok(())
}
