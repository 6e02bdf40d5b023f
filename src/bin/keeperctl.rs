use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};
use std::path::PathBuf;

use failover_keeper::lifecycle::RegistrationRecord;

#[derive(Parser)]
#[command(name = "keeperctl")]
#[command(about = "Administrative CLI for the failover keeper", long_about = None)]
struct Cli {
    /// Admin API base URL. Defaults to the address in the registration record.
    #[arg(short, long)]
    url: Option<String>,

    /// Directory holding keeperd.json.
    #[arg(short, long, default_value = ".")]
    state_dir: PathBuf,

    #[arg(short, long, default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show coordinator role and state
    Status,
    /// List registered nodes
    List,
    /// Register a node (the first one becomes the primary)
    Add { name: String, target: String },
    /// Unregister a node by name
    Remove { name: String },
    /// Unregister a node by sequence number
    RemoveSeq { seq: u64 },
    /// Probe an arbitrary target
    Probe { target: String },
    /// Send a notification to the coordinator
    Notify {
        #[arg(default_value = "reload_registry")]
        signal: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let base = match cli.url {
        Some(url) => url,
        None => discover_url(&cli.state_dir)?,
    };
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if !cli.key.is_empty() {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
        );
    }

    let request = match cli.command {
        Commands::Status => client.get(format!("{}/admin/status", base)),
        Commands::List => client.get(format!("{}/admin/nodes", base)),
        Commands::Add { name, target } => client
            .post(format!("{}/admin/nodes", base))
            .json(&json!({ "name": name, "target": target })),
        Commands::Remove { name } => client.delete(format!("{}/admin/nodes/{}", base, name)),
        Commands::RemoveSeq { seq } => client.delete(format!("{}/admin/nodes/seq/{}", base, seq)),
        Commands::Probe { target } => client
            .post(format!("{}/admin/probe", base))
            .json(&json!({ "target": target })),
        Commands::Notify { signal } => client
            .post(format!("{}/admin/notify", base))
            .json(&json!({ "signal": signal })),
    };

    let res = request.headers(headers).send().await?;
    if !print_response(res).await? {
        std::process::exit(1);
    }
    Ok(())
}

fn discover_url(state_dir: &std::path::Path) -> Result<String, Box<dyn std::error::Error>> {
    let record = RegistrationRecord::read(state_dir)
        .map_err(|e| format!("no running keeper found in {}: {}", state_dir.display(), e))?;
    let address = record
        .admin_address
        .ok_or_else(|| format!("keeper pid {} has the admin API disabled", record.pid))?;
    Ok(format!("http://{}", address))
}

/// Print the reply; returns false for a failed operation.
async fn print_response(res: reqwest::Response) -> Result<bool, Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let body: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));

    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        eprintln!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(false);
    }

    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(body.get("ok").and_then(Value::as_bool).unwrap_or(true))
}
