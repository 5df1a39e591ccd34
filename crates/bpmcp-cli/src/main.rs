//! Command-line client for the blueprint action server.
//!
//! Provides the `bpmcp` binary. Every subcommand builds one
//! `{"action", "params"}` envelope, posts it to the server's `/mcp` endpoint
//! and prints the reply as pretty JSON.
//!
//! Exit codes: 0 = success, 1 = the server answered with an error status,
//! 2 = bad command-line input, 3 = transport error.

use std::process;

use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};

const EXIT_OK: i32 = 0;
const EXIT_SERVER_ERROR: i32 = 1;
const EXIT_BAD_INPUT: i32 = 2;
const EXIT_TRANSPORT: i32 = 3;

/// Client for the blueprint action server.
#[derive(Parser)]
#[command(name = "bpmcp", about = "Client for the blueprint action server")]
struct Cli {
    /// Endpoint to post actions to.
    #[arg(long, default_value = "http://127.0.0.1:9000/mcp")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Call any action with a JSON params object.
    Call {
        /// Action name, e.g. `add_variable`.
        action: String,

        /// Params as a JSON object.
        #[arg(short, long, default_value = "{}")]
        params: String,
    },
    /// List blueprints, optionally under one or more roots.
    List {
        /// Root path to search under; repeatable.
        #[arg(long = "path")]
        paths: Vec<String>,
    },
    /// Print the structure of one blueprint.
    Structure {
        /// Asset path, e.g. `/Game/Blueprints/BP_Door`.
        asset_path: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let envelope = match build_envelope(cli.command) {
        Ok(envelope) => envelope,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            process::exit(EXIT_BAD_INPUT);
        }
    };

    process::exit(send(&cli.url, &envelope).await);
}

/// Turns a subcommand into the request envelope.
fn build_envelope(command: Commands) -> Result<Value, String> {
    let (action, params) = match command {
        Commands::Call { action, params } => (action, parse_params(&params)?),
        Commands::List { paths } => {
            let mut params = Map::new();
            if !paths.is_empty() {
                params.insert("paths".to_string(), json!(paths));
            }
            ("list_blueprints".to_string(), params)
        }
        Commands::Structure { asset_path } => {
            let mut params = Map::new();
            params.insert("asset_path".to_string(), json!(asset_path));
            ("get_blueprint_structure".to_string(), params)
        }
    };
    Ok(json!({ "action": action, "params": params }))
}

fn parse_params(raw: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("--params must be a JSON object".to_string()),
        Err(e) => Err(format!("--params is not valid JSON: {}", e)),
    }
}

/// Posts the envelope and prints the reply. Returns the exit code.
async fn send(url: &str, envelope: &Value) -> i32 {
    let client = reqwest::Client::new();
    let response = match client.post(url).json(envelope).send().await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: request to {} failed: {}", url, e);
            return EXIT_TRANSPORT;
        }
    };

    let status = response.status();
    let text = match response.text().await {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: failed to read response: {}", e);
            return EXIT_TRANSPORT;
        }
    };

    // Error replies for malformed envelopes are plain text.
    let rendered = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or(text);

    if status.is_success() {
        println!("{}", rendered);
        EXIT_OK
    } else {
        eprintln!("{} {}", status.as_u16(), rendered);
        EXIT_SERVER_ERROR
    }
}
