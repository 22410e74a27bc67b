use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "registry-cli")]
#[command(about = "Command-line client for the device registry HTTP facade", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service status
    Status,
    /// List active groups
    Groups,
    /// List devices of a group
    Devices { group: String },
    /// Register a device, creating its group if needed
    Track { group: String, device: String },
    /// Record a reading on a device
    Record { group: String, device: String, value: f64 },
    /// Read the latest value of a device
    Read { group: String, device: String },
    /// Stop a device
    Passivate { group: String, device: String },
    /// Collect a reading from every device in a group
    Readings {
        group: String,
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Status => client.get(format!("{}/status", base)).send().await?,
        Commands::Groups => client.get(format!("{}/groups", base)).send().await?,
        Commands::Devices { group } => {
            client.get(format!("{}/groups/{}/devices", base, group)).send().await?
        }
        Commands::Track { group, device } => {
            client
                .post(format!("{}/groups/{}/devices/{}", base, group, device))
                .send()
                .await?
        }
        Commands::Record { group, device, value } => {
            client
                .put(format!("{}/groups/{}/devices/{}/reading", base, group, device))
                .json(&json!({ "value": value }))
                .send()
                .await?
        }
        Commands::Read { group, device } => {
            client
                .get(format!("{}/groups/{}/devices/{}/reading", base, group, device))
                .send()
                .await?
        }
        Commands::Passivate { group, device } => {
            client
                .delete(format!("{}/groups/{}/devices/{}", base, group, device))
                .send()
                .await?
        }
        Commands::Readings { group, timeout_ms } => {
            let mut req = client.get(format!("{}/groups/{}/readings", base, group));
            if let Some(ms) = timeout_ms {
                req = req.query(&[("timeout_ms", ms)]);
            }
            req.send().await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: registry returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let text = res.text().await?;
    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }
    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
