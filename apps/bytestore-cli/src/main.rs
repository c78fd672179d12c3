//! bytestore - command-line access to one S3 bucket.
//!
//! # Usage
//!
//! ```text
//! S3_BUCKET=bytes-db bytestore put users/ABC/_.json --json '{"id":"ABC"}'
//! S3_BUCKET=bytes-db bytestore get users/ABC/_.json
//! S3_BUCKET=bytes-db bytestore keys users/ --after users/ABC/_.json --max 10
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `S3_BUCKET` | *(required)* | Target bucket |
//! | `S3_ENDPOINT_URL` | *(unset)* | Custom S3 endpoint |
//! | `S3_REGION` | *(SDK chain)* | Region override |
//! | `S3_FORCE_PATH_STYLE` | `false` | Path-style addressing |
//! | `S3_OPERATION_TIMEOUT_SECS` | *(unset)* | Per-operation deadline |
//! | `LOG_LEVEL` | `warn` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bytestore_core::{Body, ObjectStore, S3Store, StoreConfig, StoreExt};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Read and write objects in the configured S3 bucket.
#[derive(Debug, Parser)]
#[command(name = "bytestore", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print an object's body
    Get {
        /// Object key
        key: String,

        /// Write the body to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Write an object, replacing any existing one
    Put {
        /// Object key
        key: String,

        #[command(flatten)]
        source: PutSource,
    },

    /// Delete an object
    Delete {
        /// Object key
        key: String,
    },

    /// List keys under a prefix, one page at a time
    Keys {
        /// Key prefix
        #[arg(default_value = "")]
        prefix: String,

        /// Only list keys after this one
        #[arg(long, default_value = "")]
        after: String,

        /// Maximum number of keys to return
        #[arg(long, default_value_t = 1000)]
        max: i32,
    },

    /// Print a presigned GET URL
    Url {
        /// Object key
        key: String,

        /// Minutes until the URL expires
        #[arg(long, default_value_t = 15)]
        expires: u64,
    },

    /// Print an object decoded as JSON
    Find {
        /// Object key
        key: String,
    },
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct PutSource {
    /// Upload the raw contents of a file
    #[arg(long)]
    file: Option<PathBuf>,

    /// Upload a text value
    #[arg(long)]
    text: Option<String>,

    /// Upload a JSON document (stored in compact form)
    #[arg(long)]
    json: Option<String>,
}

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to `LOG_LEVEL`.
fn init_tracing() -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "warn".to_owned());
        EnvFilter::try_new(&level).with_context(|| format!("invalid log level filter: {level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    Ok(())
}

/// Execute one command against `store`, writing results to `out`.
async fn run(store: &dyn ObjectStore, command: Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Get { key, output } => {
            let body = store.get(&key).await?;
            match output {
                Some(path) => tokio::fs::write(&path, &body)
                    .await
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => out.write_all(&body)?,
            }
        }
        Command::Put { key, source } => {
            if let Some(path) = source.file {
                let data = tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?;
                store.put(&key, Body::from(data)).await?;
            } else if let Some(text) = source.text {
                store.put(&key, Body::from(text)).await?;
            } else if let Some(json) = source.json {
                let value: serde_json::Value =
                    serde_json::from_str(&json).context("--json is not valid JSON")?;
                store.put_json(&key, &value).await?;
            }
        }
        Command::Delete { key } => store.delete(&key).await?,
        Command::Keys { prefix, after, max } => {
            for key in store.keys(&prefix, &after, max).await? {
                writeln!(out, "{key}")?;
            }
        }
        Command::Url { key, expires } => {
            let url = store.url(&key, expires).await?;
            writeln!(out, "{url}")?;
        }
        Command::Find { key } => {
            let value: serde_json::Value = store.find(&key).await?;
            writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
        }
    }
    out.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing()?;

    let config = StoreConfig::from_env().context("cannot configure storage")?;
    debug!(bucket = %config.bucket, endpoint = ?config.endpoint_url, "connecting");

    let store = S3Store::connect(config)
        .await
        .context("cannot connect to storage")?;

    let mut stdout = std::io::stdout().lock();
    run(&store, cli.command, &mut stdout).await
}
