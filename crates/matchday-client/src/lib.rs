//! # Matchday Client
//!
//! The driver around [`matchday::StompProtocol`]: it owns the connection,
//! the login loop, the reader task and console output. The protocol engine
//! itself never touches a socket.
//!
//! ```ignore
//! use matchday_client::{Client, ClientConfig, Stdout, TcpConnector};
//!
//! let config = ClientConfig::default();
//! let client = Client::with_config(
//!     TcpConnector::new(config.max_frame_bytes),
//!     Stdout,
//!     config,
//! );
//! client.run(tokio::io::BufReader::new(tokio::io::stdin())).await?;
//! ```

mod client;
mod config;
mod console;
mod transport;

pub use client::Client;
pub use config::ClientConfig;
pub use console::{describe, Console, Stdout};
pub use transport::{
    read_frame, Connector, FrameSink, FrameSource, TcpConnector, TcpFrameSink, TcpFrameSource,
};

// Re-export the engine so drivers need a single dependency
pub use matchday;
