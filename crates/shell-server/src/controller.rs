//! Shell session controller.
//!
//! One [`RemoteShell`] drives one transport connection through
//! `Uninitialized -> Active -> Terminated`. Before activation every inbound
//! message is a JSON control message; once the device shell is running,
//! inbound messages are keystrokes written verbatim to the pty. Terminal
//! output goes through an [`OutputCoalescer`] on its way back out.

use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use shell_core::config::ShellConfig;
use shell_core::error::{Result, ShellError};
use shell_core::message::{self, ShellRequest, StartParams};
use shell_core::{ConnectionQuery, FramingMode, OutputFrame};
use shell_pty::{
    resolve_adb, SpawnRequest, SpawnedTerminal, TerminalEvent, TerminalHandle, TerminalSpawner,
};
use tokio::sync::mpsc;
use tokio::time::Instant;
use uuid::Uuid;

use crate::buffer::OutputCoalescer;
use crate::tunnel::DeviceTunnel;

const TAG: &str = "RemoteShell";

/// WebSocket close code for a normal closure.
pub const NORMAL_CLOSURE: u16 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Active,
    Terminated,
}

/// A message received from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Text(String),
    Binary(Vec<u8>),
}

impl Inbound {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Inbound::Text(s) => s.as_bytes(),
            Inbound::Binary(b) => b,
        }
    }

    fn as_text(&self) -> Cow<'_, str> {
        match self {
            Inbound::Text(s) => Cow::Borrowed(s),
            Inbound::Binary(b) => String::from_utf8_lossy(b),
        }
    }
}

/// A message for the transport to deliver to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Frame(OutputFrame),
    Close { code: u16, reason: String },
}

/// Per-session settings, resolved once from configuration.
#[derive(Debug, Clone)]
pub struct ShellSettings {
    pub framing: FramingMode,
    pub debounce: Duration,
    pub remote_port: String,
    pub adb: PathBuf,
    pub term_name: String,
    pub default_cols: u16,
    pub default_rows: u16,
}

impl ShellSettings {
    pub fn from_config(config: &ShellConfig) -> Self {
        Self {
            framing: config.framing_mode(),
            debounce: config.debounce(),
            remote_port: config.remote_port.clone(),
            adb: resolve_adb(config.adb_path.as_deref()),
            term_name: config.term_name.clone(),
            default_cols: config.default_cols,
            default_rows: config.default_rows,
        }
    }
}

/// Collaborators shared by every session.
#[derive(Clone)]
pub struct ShellContext {
    pub settings: ShellSettings,
    pub tunnel: Arc<dyn DeviceTunnel>,
    pub spawner: Arc<dyn TerminalSpawner>,
}

/// What woke the session loop.
enum Step {
    Inbound(Option<Inbound>),
    Terminal(Option<TerminalEvent>),
    Flush,
}

pub struct RemoteShell {
    id: Uuid,
    state: SessionState,
    terminal: Option<Box<dyn TerminalHandle>>,
    events: Option<mpsc::UnboundedReceiver<TerminalEvent>>,
    target: Option<String>,
    coalescer: OutputCoalescer,
    context: Arc<ShellContext>,
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl RemoteShell {
    /// True when this controller should handle a connection with `query`.
    pub fn claims(query: &ConnectionQuery) -> bool {
        query.is_shell()
    }

    /// Create a controller for the connection, or `None` if it belongs elsewhere.
    pub fn process_request(
        query: &ConnectionQuery,
        context: Arc<ShellContext>,
        outbound: mpsc::UnboundedSender<Outbound>,
    ) -> Option<Self> {
        if !Self::claims(query) {
            return None;
        }
        Some(Self::new(context, outbound))
    }

    pub fn new(context: Arc<ShellContext>, outbound: mpsc::UnboundedSender<Outbound>) -> Self {
        let coalescer =
            OutputCoalescer::new(context.settings.framing, context.settings.debounce);
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Uninitialized,
            terminal: None,
            events: None,
            target: None,
            coalescer,
            context,
            outbound,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn has_terminal(&self) -> bool {
        self.terminal.is_some()
    }

    /// Drive the session until it terminates or the transport goes away.
    #[tracing::instrument(name = "shell_session", skip_all, fields(session = %self.id))]
    pub async fn run(mut self, mut inbound: mpsc::UnboundedReceiver<Inbound>) {
        tracing::debug!("Session started");
        while self.state != SessionState::Terminated {
            let deadline = self.coalescer.deadline();
            let step = tokio::select! {
                msg = inbound.recv() => Step::Inbound(msg),
                event = next_event(&mut self.events) => Step::Terminal(event),
                _ = flush_at(deadline) => Step::Flush,
            };

            match step {
                Step::Inbound(Some(msg)) => self.on_transport_message(msg).await,
                Step::Inbound(None) => {
                    tracing::debug!("Transport closed");
                    self.release();
                }
                Step::Terminal(Some(event)) => self.on_terminal_event(event),
                Step::Terminal(None) => self.events = None,
                Step::Flush => self.flush_output(),
            }
        }
        tracing::debug!("Session finished");
    }

    /// Handle one inbound transport message.
    pub async fn on_transport_message(&mut self, msg: Inbound) {
        match self.state {
            SessionState::Active => {
                let Some(terminal) = self.terminal.as_mut() else {
                    return;
                };
                if let Err(e) = terminal.write(msg.as_bytes()) {
                    tracing::warn!("[{TAG}] failed to write to terminal: {e}");
                }
            }
            SessionState::Terminated => {
                tracing::debug!("[{TAG}] ignoring input after termination");
            }
            SessionState::Uninitialized => {
                let request = match message::parse_control(&msg.as_text()) {
                    Ok(Some(request)) => request,
                    Ok(None) => return,
                    Err(e) => {
                        tracing::warn!("[{TAG}] {e}");
                        return;
                    }
                };
                if let Err(e) = self.handle_request(request).await {
                    tracing::error!("[{TAG}] {e}");
                    self.send(Outbound::Frame(OutputFrame::Text(message::error_notice(
                        &e.to_string(),
                    ))));
                }
            }
        }
    }

    async fn handle_request(&mut self, request: ShellRequest) -> Result<()> {
        match request {
            ShellRequest::Start(params) => {
                let remote = self.context.settings.remote_port.clone();
                let port = self.context.tunnel.forward(&params.udid, &remote).await?;
                tracing::info!(udid = %params.udid, port, "Tunnel ready");

                let spawned = self.create_terminal(&params)?;
                self.terminal = Some(spawned.handle);
                self.events = Some(spawned.events);
                self.target = Some(params.udid);
                self.state = SessionState::Active;
            }
            ShellRequest::Stop => self.release(),
        }
        Ok(())
    }

    /// Spawn the device shell for `params`.
    pub fn create_terminal(&self, params: &StartParams) -> Result<SpawnedTerminal> {
        let settings = &self.context.settings;
        let cols = params.cols.unwrap_or(settings.default_cols);
        let rows = params.rows.unwrap_or(settings.default_rows);
        let request = SpawnRequest::device_shell(
            settings.adb.clone(),
            &params.udid,
            settings.term_name.clone(),
            cols,
            rows,
        );

        let spawned = self
            .context
            .spawner
            .spawn(&request)
            .map_err(|e| ShellError::Spawn(e.to_string()))?;

        tracing::info!(udid = %params.udid, cols, rows, "Terminal started");
        Ok(spawned)
    }

    /// Handle one event from the terminal process.
    pub fn on_terminal_event(&mut self, event: TerminalEvent) {
        if self.state == SessionState::Terminated {
            return;
        }
        match event {
            TerminalEvent::Output(bytes) => {
                self.coalescer.push(&bytes);
            }
            TerminalEvent::Exit(code) => {
                tracing::info!(code, "Terminal process exited");
                if let Some(frame) = self.coalescer.drain() {
                    self.send(Outbound::Frame(frame));
                }
                self.send(Outbound::Close {
                    code: NORMAL_CLOSURE,
                    reason: format!("[{TAG}] terminal process exited with code: {code}"),
                });
                self.release();
            }
        }
    }

    /// Send everything the coalescer has gathered.
    pub fn flush_output(&mut self) {
        if let Some(frame) = self.coalescer.flush() {
            self.send(Outbound::Frame(frame));
        }
    }

    /// Tear the session down. Safe to call more than once.
    pub fn release(&mut self) {
        if self.state == SessionState::Terminated {
            return;
        }
        self.state = SessionState::Terminated;
        self.events = None;

        if let Some(mut terminal) = self.terminal.take() {
            if let Err(e) = terminal.kill() {
                tracing::debug!("[{TAG}] kill after exit: {e}");
            }
        }
        tracing::info!(target_device = ?self.target, "Session released");
    }

    fn send(&self, msg: Outbound) {
        // A closed transport drops late frames.
        let _ = self.outbound.send(msg);
    }
}

async fn next_event(
    events: &mut Option<mpsc::UnboundedReceiver<TerminalEvent>>,
) -> Option<TerminalEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn flush_at(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
