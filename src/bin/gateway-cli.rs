use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for lb-gateway", long_about = None)]
struct Cli {
    /// Admin API base URL.
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    /// Admin API key; omit when the gateway runs without one.
    #[arg(short, long)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway status
    Status,
    /// List registered service ids
    Services,
    /// List the registered instances of a service
    Instances { service_id: String },
    /// Show circuit breaker state per route
    Breakers,
    /// Force a demo-service instance's health up or down
    Toggle {
        /// Base URL of the instance, e.g. http://localhost:8090
        #[arg(long)]
        target: String,
        #[arg(long, action = clap::ArgAction::Set)]
        up: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {key}"))?);
    }

    let admin_path = match &cli.command {
        Commands::Status => "/admin/status".to_string(),
        Commands::Services => "/service-instances".to_string(),
        Commands::Instances { service_id } => format!("/service-instances/{service_id}"),
        Commands::Breakers => "/admin/circuit-breakers".to_string(),
        Commands::Toggle { target, up } => {
            let url = format!("{}/status/{up}", target.trim_end_matches('/'));
            let res = client.put(url).send().await?;
            print_response(res).await?;
            return Ok(());
        }
    };

    let res = client
        .get(format!("{}{admin_path}", cli.url.trim_end_matches('/')))
        .headers(headers)
        .send()
        .await?;
    print_response(res).await?;

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: request returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
