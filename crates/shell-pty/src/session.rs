//! PTY process management.
//!
//! Wraps `portable-pty`: the slave side runs the requested command, the
//! master's reader is drained on a dedicated thread that turns reads into
//! [`TerminalEvent`]s, and the writer and killer stay with the owning session.

use portable_pty::{native_pty_system, ChildKiller, CommandBuilder, MasterPty, PtySize};
use std::io::{Read, Write};
use std::thread;
use tokio::sync::mpsc;

use crate::events::TerminalEvent;
use crate::shell::SpawnRequest;
use crate::terminal::{SpawnedTerminal, TerminalHandle, TerminalSpawner};

/// Size of a single pty read.
const PTY_READ_CHUNK: usize = 4096;

/// Errors that can occur during PTY operations.
#[derive(Debug, thiserror::Error)]
pub enum PtyError {
    #[error("Failed to create PTY: {0}")]
    Creation(String),

    #[error("Failed to spawn {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PTY already closed")]
    Closed,
}

/// A process running inside a pty.
pub struct PtyProcess {
    // Held so the pty stays open while the reader thread drains it.
    _master: Box<dyn MasterPty + Send>,
    writer: Box<dyn Write + Send>,
    killer: Box<dyn ChildKiller + Send + Sync>,
    program: String,
    size: PtySize,
}

impl PtyProcess {
    /// Spawn `request` in a new pty and start the reader thread.
    pub fn spawn(request: &SpawnRequest) -> Result<SpawnedTerminal, PtyError> {
        let pty_system = native_pty_system();

        let size = PtySize {
            rows: request.rows,
            cols: request.cols,
            pixel_width: 0,
            pixel_height: 0,
        };

        let pair = pty_system
            .openpty(size)
            .map_err(|e| PtyError::Creation(e.to_string()))?;

        let program = request.display_command();
        let cmd = build_command(request);

        let mut child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| PtyError::Spawn {
                program: program.clone(),
                message: e.to_string(),
            })?;

        // Only the child keeps the slave open, so the reader sees EOF on exit.
        drop(pair.slave);

        let killer = child.clone_killer();

        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| PtyError::Creation(e.to_string()))?;

        let writer = pair
            .master
            .take_writer()
            .map_err(|e| PtyError::Creation(e.to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();

        thread::Builder::new()
            .name("pty-reader".to_string())
            .spawn(move || {
                let mut buf = [0u8; PTY_READ_CHUNK];
                loop {
                    match reader.read(&mut buf) {
                        Ok(0) => break,
                        Ok(n) => {
                            if tx.send(TerminalEvent::Output(buf[..n].to_vec())).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::debug!("PTY reader stopped: {e}");
                            break;
                        }
                    }
                }

                let code = match child.wait() {
                    Ok(status) => status.exit_code(),
                    Err(e) => {
                        tracing::warn!("Failed to wait for terminal process: {e}");
                        1
                    }
                };
                let _ = tx.send(TerminalEvent::Exit(code));
            })?;

        tracing::debug!(
            command = %program,
            cols = request.cols,
            rows = request.rows,
            "PTY process spawned"
        );

        let process = Self {
            _master: pair.master,
            writer,
            killer,
            program,
            size,
        };

        Ok(SpawnedTerminal {
            handle: Box::new(process),
            events: rx,
        })
    }
}

fn build_command(request: &SpawnRequest) -> CommandBuilder {
    let mut cmd = CommandBuilder::new(&request.program);
    cmd.args(&request.args);
    cmd.env_clear();
    for (key, value) in &request.env {
        cmd.env(key, value);
    }
    cmd.env("TERM", &request.term);
    cmd.cwd(&request.cwd);
    cmd
}

impl TerminalHandle for PtyProcess {
    fn write(&mut self, data: &[u8]) -> Result<(), PtyError> {
        self.writer.write_all(data)?;
        self.writer.flush()?;
        Ok(())
    }

    fn kill(&mut self) -> Result<(), PtyError> {
        self.killer.kill()?;
        Ok(())
    }

    fn size(&self) -> (u16, u16) {
        (self.size.cols, self.size.rows)
    }
}

impl std::fmt::Debug for PtyProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyProcess")
            .field("program", &self.program)
            .field("size", &format!("{}x{}", self.size.cols, self.size.rows))
            .finish()
    }
}

/// Spawns terminals with the platform's native pty system.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativePtySpawner;

impl TerminalSpawner for NativePtySpawner {
    fn spawn(&self, request: &SpawnRequest) -> Result<SpawnedTerminal, PtyError> {
        PtyProcess::spawn(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    #[test]
    fn test_pty_error_display() {
        let err = PtyError::Creation("test error".to_string());
        assert_eq!(err.to_string(), "Failed to create PTY: test error");

        let err = PtyError::Spawn {
            program: "adb -s X shell".into(),
            message: "not found".into(),
        };
        assert_eq!(err.to_string(), "Failed to spawn adb -s X shell: not found");

        let err = PtyError::Closed;
        assert_eq!(err.to_string(), "PTY already closed");
    }

    #[test]
    fn test_build_command_applies_request() {
        let request = SpawnRequest::device_shell_with_env(
            "adb",
            "ABC123",
            "xterm-256color",
            80,
            24,
            vec![("PWD".to_string(), "/tmp".to_string())],
        );
        let cmd = build_command(&request);
        let argv: Vec<String> = cmd
            .get_argv()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(argv, vec!["adb", "-s", "ABC123", "shell"]);
        assert_eq!(
            cmd.get_env("COLORTERM").map(|v| v.to_string_lossy().into_owned()),
            Some("truecolor".to_string())
        );
        assert_eq!(
            cmd.get_cwd().map(PathBuf::from),
            Some(PathBuf::from("/tmp"))
        );
    }

    #[tokio::test]
    async fn test_spawned_process_reports_output_then_exit() {
        // Stand in for adb with echo, which prints its arguments and exits.
        let echo = Path::new("/bin/echo");
        if !echo.exists() {
            return;
        }
        let request = SpawnRequest::device_shell(echo, "ABC123", "xterm-256color", 80, 24);
        let Ok(mut spawned) = PtyProcess::spawn(&request) else {
            // No pty support in this environment.
            return;
        };
        assert_eq!(spawned.handle.size(), (80, 24));

        let mut output = Vec::new();
        let mut exit = None;
        while let Some(event) = spawned.events.recv().await {
            match event {
                TerminalEvent::Output(bytes) => {
                    assert!(exit.is_none(), "output after exit");
                    output.extend_from_slice(&bytes);
                }
                TerminalEvent::Exit(code) => exit = Some(code),
            }
        }
        assert_eq!(exit, Some(0));
        assert!(String::from_utf8_lossy(&output).contains("ABC123 shell"));

        // The process is gone; a kill must not panic.
        let _ = spawned.handle.kill();
    }
}
