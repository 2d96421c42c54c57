//! Frame transports.
//!
//! Frames travel as NUL-terminated text. A connection splits into a
//! [`FrameSource`] owned by the reader task and a [`FrameSink`] owned by the
//! command loop.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use matchday::Frame;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::debug;

/// Receives raw frames.
#[async_trait]
pub trait FrameSource: Send {
    /// Next raw frame without its terminator, or `None` once the peer closed.
    async fn recv_frame(&mut self) -> Result<Option<String>>;
}

/// Sends encoded frames.
#[async_trait]
pub trait FrameSink: Send {
    async fn send_frame(&mut self, frame: &Frame) -> Result<()>;
}

/// Opens connections to a `host:port` address.
#[async_trait]
pub trait Connector: Send + Sync {
    type Source: FrameSource + 'static;
    type Sink: FrameSink + 'static;

    async fn connect(&self, addr: &str) -> Result<(Self::Source, Self::Sink)>;
}

#[async_trait]
impl<T: Connector + ?Sized> Connector for std::sync::Arc<T> {
    type Source = T::Source;
    type Sink = T::Sink;

    async fn connect(&self, addr: &str) -> Result<(T::Source, T::Sink)> {
        (**self).connect(addr).await
    }
}

/// TCP connector.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    max_frame_bytes: usize,
}

impl TcpConnector {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self { max_frame_bytes }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    type Source = TcpFrameSource;
    type Sink = TcpFrameSink;

    async fn connect(&self, addr: &str) -> Result<(TcpFrameSource, TcpFrameSink)> {
        let stream = TcpStream::connect(addr)
            .await
            .with_context(|| format!("failed to connect to {addr}"))?;
        debug!(addr, "connected");
        let (read, write) = stream.into_split();
        Ok((
            TcpFrameSource {
                reader: BufReader::new(read),
                max_frame_bytes: self.max_frame_bytes,
            },
            TcpFrameSink { writer: write },
        ))
    }
}

pub struct TcpFrameSource {
    reader: BufReader<OwnedReadHalf>,
    max_frame_bytes: usize,
}

#[async_trait]
impl FrameSource for TcpFrameSource {
    async fn recv_frame(&mut self) -> Result<Option<String>> {
        read_frame(&mut self.reader, self.max_frame_bytes).await
    }
}

pub struct TcpFrameSink {
    writer: OwnedWriteHalf,
}

#[async_trait]
impl FrameSink for TcpFrameSink {
    async fn send_frame(&mut self, frame: &Frame) -> Result<()> {
        self.writer
            .write_all(frame.encode().as_bytes())
            .await
            .context("failed to send frame")?;
        Ok(())
    }
}

/// Read one NUL-terminated frame of at most `max_frame_bytes`.
///
/// Line breaks between frames (heart-beats) are skipped.
pub async fn read_frame<R>(reader: &mut R, max_frame_bytes: usize) -> Result<Option<String>>
where
    R: tokio::io::AsyncBufRead + Unpin + Send,
{
    let mut buf = Vec::new();
    let limit = u64::try_from(max_frame_bytes).unwrap_or(u64::MAX);
    let n = reader
        .take(limit)
        .read_until(b'\0', &mut buf)
        .await
        .context("failed to read frame")?;
    if n == 0 {
        return Ok(None);
    }
    if buf.last() != Some(&b'\0') {
        if buf.len() >= max_frame_bytes {
            bail!("frame exceeds {max_frame_bytes} bytes");
        }
        bail!("connection closed mid-frame");
    }
    buf.pop();

    let text = String::from_utf8(buf).context("frame is not valid UTF-8")?;
    Ok(Some(text.trim_start_matches(['\r', '\n']).to_string()))
}
