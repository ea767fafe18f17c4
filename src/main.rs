use std::time::Duration;

use clap::Parser;
use resp_codec::server::{self, Acknowledge};
use resp_codec::{Config, DecoderConfig};
use tracing_subscriber::{fmt, EnvFilter};

/// RESP server that acknowledges every well-formed request
#[derive(Parser, Debug)]
#[command(name = "resp-server")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    bind: String,

    /// Close connections that send nothing for this many seconds
    #[arg(long)]
    idle_timeout_secs: Option<u64>,

    /// Deepest array nesting accepted in a request
    #[arg(long, default_value_t = DecoderConfig::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Largest bulk string accepted, in bytes
    #[arg(long, default_value_t = DecoderConfig::DEFAULT_MAX_BULK_LEN)]
    max_bulk_len: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,resp_codec=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    let config = Config {
        bind_addr: args.bind,
        idle_timeout: args.idle_timeout_secs.map(Duration::from_secs),
        decoder: DecoderConfig {
            max_depth: args.max_depth,
            max_bulk_len: args.max_bulk_len,
            ..DecoderConfig::default()
        },
    };

    server::listen(config, Acknowledge).await
}
