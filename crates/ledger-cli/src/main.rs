use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ledger_core::{
    constants::{BLOCKS_PATH, MINE_PATH, TIP_PATH},
    crypto_hash, Block, Chain,
};
use serde::Serialize;
use serde_json::Value;
use std::{fs, path::Path};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_NODE: &str = "http://127.0.0.1:8080";

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "CLI client for the minimal ledger node")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the node's full chain
    Blocks {
        /// Node base URL (e.g. http://127.0.0.1:8080)
        #[arg(long, default_value = DEFAULT_NODE)]
        node: String,
    },
    /// Print the node's chain length and tip
    Tip {
        #[arg(long, default_value = DEFAULT_NODE)]
        node: String,
    },
    /// Ask the node to mine a block carrying DATA
    Mine {
        #[arg(long, default_value = DEFAULT_NODE)]
        node: String,
        /// Block payload as JSON; anything that is not JSON is sent as a string
        #[arg(long)]
        data: String,
    },
    /// Validate a chain stored as a JSON array of blocks, without a node
    Validate {
        #[arg(long)]
        file: String,
    },
    /// Print the ledger digest of the given values (JSON, or plain strings)
    Hash {
        #[arg(required = true)]
        values: Vec<String>,
    },
}

#[derive(Serialize)]
struct MineRequest {
    data: Value,
}

/// Full URL of `path` on the node at `node`.
fn endpoint(node: &str, path: &str) -> String {
    format!("{}{path}", node.trim_end_matches('/'))
}

/// Parse `raw` as JSON, falling back to a JSON string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn validate_file(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let blocks: Vec<Block> =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    debug!("validating {} blocks", blocks.len());
    Ok(match Chain::validate_chain(&blocks) {
        Ok(()) => format!("valid chain of {} blocks", blocks.len()),
        Err(err) => format!("invalid chain: {err}"),
    })
}

fn hash_values(values: &[String]) -> String {
    let values: Vec<Value> = values.iter().map(|v| parse_value(v)).collect();
    crypto_hash(&values)
}

async fn print_response(res: reqwest::Response) -> Result<()> {
    let status = res.status();
    let body = res.text().await?;
    println!("status: {}", status);
    match serde_json::from_str::<Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{body}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let client = reqwest::Client::new();
    match cli.cmd {
        Command::Blocks { node } => {
            let res = client.get(endpoint(&node, BLOCKS_PATH)).send().await?;
            print_response(res).await?;
        }
        Command::Tip { node } => {
            let res = client.get(endpoint(&node, TIP_PATH)).send().await?;
            print_response(res).await?;
        }
        Command::Mine { node, data } => {
            let req = MineRequest {
                data: parse_value(&data),
            };
            let res = client.post(endpoint(&node, MINE_PATH)).json(&req).send().await?;
            print_response(res).await?;
        }
        Command::Validate { file } => println!("{}", validate_file(Path::new(&file))?),
        Command::Hash { values } => println!("{}", hash_values(&values)),
    }
    Ok(())
}
