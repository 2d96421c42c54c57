//! The driver loops around the protocol engine.
//!
//! ```text
//! run()
//!   └─► login loop ── login ok ──► reader task ──► process_frame()
//!          ▲                   └─► command loop ──► process_input() ──► sink
//!          └──────── session over (ERROR / DISCONNECT receipt / EOF) ──┘
//! ```

use std::sync::Arc;

use anyhow::Result;
use matchday::{Reception, RunFlag, StompProtocol, UserCommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::console::{describe, Console};
use crate::transport::{Connector, FrameSink, FrameSource};

/// How a logged-in session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    /// Back to the login loop.
    LoggedOut,
    /// Input is exhausted.
    InputClosed,
}

struct Session<S> {
    protocol: Arc<StompProtocol>,
    sink: S,
    reader: tokio::task::JoinHandle<()>,
}

/// Console client: reads command lines, talks to the server through a
/// [`Connector`], and prints what the user should see.
pub struct Client<C, O> {
    connector: C,
    console: Arc<O>,
    config: ClientConfig,
}

impl<C, O> Client<C, O>
where
    C: Connector,
    O: Console,
{
    pub fn new(connector: C, console: O) -> Self {
        Self::with_config(connector, console, ClientConfig::default())
    }

    pub fn with_config(connector: C, console: O, config: ClientConfig) -> Self {
        Self {
            connector,
            console: Arc::new(console),
            config,
        }
    }

    /// Run until `input` is exhausted.
    pub async fn run<R>(&self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        loop {
            let Some(session) = self.login(&mut lines).await? else {
                return Ok(());
            };
            if self.drive(session, &mut lines).await? == SessionEnd::InputClosed {
                return Ok(());
            }
        }
    }

    /// Wait for a `login` command that connects. `None` means input ended.
    async fn login<R>(&self, lines: &mut Lines<R>) -> Result<Option<Session<C::Sink>>>
    where
        R: AsyncBufRead + Unpin,
    {
        while let Some(line) = lines.next_line().await? {
            let (host_port, username, password) = match UserCommand::parse(&line) {
                Ok(Some(UserCommand::Login {
                    host_port,
                    username,
                    password,
                })) => (host_port, username, password),
                Ok(_) => {
                    debug!(line, "not logged in; ignoring command");
                    continue;
                }
                Err(err) => {
                    self.console.print(&err.to_string());
                    continue;
                }
            };

            let (mut source, mut sink) = match self.connector.connect(&host_port).await {
                Ok(connection) => connection,
                Err(err) => {
                    warn!(addr = %host_port, error = %err, "connect failed");
                    self.console.print("Could not connect to server");
                    continue;
                }
            };

            let running = RunFlag::new(false);
            let protocol = Arc::new(StompProtocol::with_config(
                self.config.protocol.clone(),
                running.clone(),
            ));

            let handshake = protocol.connect_frame(&username, &password);
            if let Err(err) = sink.send_frame(&handshake).await {
                warn!(error = %err, "failed to send CONNECT");
                self.console.print("Could not connect to server");
                continue;
            }

            let reply = match source.recv_frame().await {
                Ok(Some(raw)) => protocol.process_frame(&raw),
                Ok(None) | Err(_) => {
                    self.console.print("Could not connect to server");
                    continue;
                }
            };
            if let Some(text) = describe(&reply) {
                self.console.print(&text);
            }
            if !matches!(reply, Reception::Connected { .. }) {
                continue;
            }

            running.start();
            protocol.set_username(username.as_str());
            info!(user = %username, addr = %host_port, "logged in");

            let reader = tokio::spawn(read_loop(
                source,
                Arc::clone(&protocol),
                Arc::clone(&self.console),
            ));
            return Ok(Some(Session {
                protocol,
                sink,
                reader,
            }));
        }
        Ok(None)
    }

    /// Feed command lines to the session until it stops.
    async fn drive<R>(
        &self,
        mut session: Session<C::Sink>,
        lines: &mut Lines<R>,
    ) -> Result<SessionEnd>
    where
        R: AsyncBufRead + Unpin,
    {
        let running = session.protocol.running().clone();
        let mut end = SessionEnd::LoggedOut;
        let mut reader_done = false;

        while running.is_running() {
            // the reader ends the session on ERROR, DISCONNECT receipt or EOF
            let line = tokio::select! {
                line = lines.next_line() => line?,
                joined = &mut session.reader => {
                    reader_done = true;
                    if let Err(err) = joined {
                        warn!(error = %err, "reader task failed");
                    }
                    break;
                }
            };
            let Some(line) = line else {
                running.stop();
                end = SessionEnd::InputClosed;
                break;
            };

            if matches!(UserCommand::parse(&line), Ok(Some(UserCommand::Login { .. }))) {
                self.console
                    .print("The client is already logged in, log out before trying again");
                continue;
            }

            let frames = match session.protocol.process_input(&line) {
                Ok(frames) => frames,
                Err(err) => {
                    self.console.print(&err.to_string());
                    continue;
                }
            };
            for frame in &frames {
                if let Err(err) = session.sink.send_frame(frame).await {
                    warn!(error = %err, "send failed, closing session");
                    running.stop();
                    break;
                }
            }
        }

        if !reader_done {
            // the reader may still be parked in recv_frame
            session.reader.abort();
            if let Err(err) = session.reader.await {
                if !err.is_cancelled() {
                    warn!(error = %err, "reader task failed");
                }
            }
        }
        Ok(end)
    }
}

/// Decode frames until the session stops or the connection ends.
async fn read_loop<S, O>(mut source: S, protocol: Arc<StompProtocol>, console: Arc<O>)
where
    S: FrameSource,
    O: Console,
{
    let running = protocol.running().clone();
    while running.is_running() {
        match source.recv_frame().await {
            Ok(Some(raw)) => {
                let reception = protocol.process_frame(&raw);
                if let Some(text) = describe(&reception) {
                    console.print(&text);
                }
            }
            Ok(None) => {
                debug!("server closed the connection");
                running.stop();
            }
            Err(err) => {
                warn!(error = %err, "read failed, closing session");
                running.stop();
            }
        }
    }
    console.print("Exiting...");
}
