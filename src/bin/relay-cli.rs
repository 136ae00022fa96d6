use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use json_relay::config::load_config;
use json_relay::destination::DestinationRegistry;
use json_relay::template::EventContext;

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Operator CLI for the JSON relay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a config file and list its destinations
    Check {
        #[arg(short, long, env = "RELAY_CONFIG", default_value = "/etc/json-relay/relay.toml")]
        config: PathBuf,
    },
    /// Run one destination's template chain against an event without sending it
    Render {
        #[arg(short, long, env = "RELAY_CONFIG", default_value = "/etc/json-relay/relay.toml")]
        config: PathBuf,

        #[arg(short, long)]
        destination: String,

        /// Event body as JSON
        #[arg(short, long)]
        body: String,

        #[arg(long, default_value = "/")]
        path: String,

        /// Raw query string, without the leading `?`
        #[arg(long, default_value = "")]
        query: String,

        /// Inbound header as `name:value`; repeatable
        #[arg(long = "header", value_parser = parse_header)]
        headers: Vec<(String, String)>,
    },
    /// POST an event to a running relay
    Send {
        #[arg(short, long, default_value = "http://localhost:8080/")]
        url: String,

        /// Event body as JSON
        #[arg(short, long)]
        body: String,
    },
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    raw.split_once(':')
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .ok_or_else(|| format!("expected name:value, got {raw:?}"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config } => {
            let config = load_config(&config)?;
            let registry = DestinationRegistry::from_config(&config.destinations)?;

            println!("OK: {} destination(s)", registry.len());
            for destination in registry.iter() {
                println!(
                    "  {:<20} {:<7} {} (templates: {}, auth: {})",
                    destination.name,
                    if destination.method.is_empty() { "GET" } else { &destination.method },
                    destination.url,
                    destination.chain.len(),
                    if destination.auth.is_some() { "basic" } else { "none" },
                );
            }
        }
        Commands::Render {
            config,
            destination,
            body,
            path,
            query,
            headers,
        } => {
            let config = load_config(&config)?;
            let registry = DestinationRegistry::from_config(&config.destinations)?;
            let target = registry
                .get(&destination)
                .ok_or_else(|| format!("unknown destination: {destination}"))?;

            let body: Value = serde_json::from_str(&body)?;
            let mut event = EventContext::new(body)
                .with_path(path)
                .with_query_string(&query);
            for (name, value) in &headers {
                event = event.with_header(name, value.as_str());
            }

            let rendered = registry.renderer().render(&target.chain, &event)?;
            if rendered.steps().is_empty() {
                println!("(no templates: request is sent without a body)");
            }
            for (index, output) in rendered.steps().iter().enumerate() {
                println!("--- step {index} ---");
                println!("{output}");
            }
        }
        Commands::Send { url, body } => {
            let body: Value = serde_json::from_str(&body)?;
            let res = reqwest::Client::new().post(&url).json(&body).send().await?;

            let status = res.status();
            let text = res.text().await?;
            if status.is_success() {
                println!("{status}");
            } else {
                eprintln!("Error: relay returned status {status}");
                if !text.is_empty() {
                    eprintln!("{text}");
                }
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
