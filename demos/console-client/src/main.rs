//! # Console Client Demo
//!
//! Interactive client for a game-reporting STOMP broker.
//!
//! ```text
//! login 127.0.0.1:7777 meni films
//! join germany_japan
//! report data/events1_partial.json
//! summary germany_japan meni summary.txt
//! exit germany_japan
//! logout
//! ```
//!
//! Pass a JSON config path as the first argument to override defaults.
//! Log verbosity follows `RUST_LOG` (default `matchday=info`).

use anyhow::Result;
use matchday_client::{Client, ClientConfig, Stdout, TcpConnector};
use tokio::io::{stdin, BufReader};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "matchday=info,matchday_client=info".into()),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    tracing::debug!(?config, "starting console client");

    let client = Client::with_config(
        TcpConnector::new(config.max_frame_bytes),
        Stdout,
        config,
    );
    client.run(BufReader::new(stdin())).await?;

    Ok(())
}
