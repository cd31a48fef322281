//! Seams between the session controller and whatever actually runs the shell.

use tokio::sync::mpsc;

use crate::events::TerminalEvent;
use crate::session::PtyError;
use crate::shell::SpawnRequest;

/// A live terminal process owned by exactly one session.
pub trait TerminalHandle: Send {
    /// Write input (keystrokes, pasted text) to the process.
    fn write(&mut self, data: &[u8]) -> Result<(), PtyError>;

    /// Forcibly terminate the process.
    ///
    /// Killing a process that already exited returns an error, which callers
    /// are expected to tolerate.
    fn kill(&mut self) -> Result<(), PtyError>;

    /// Current geometry as (cols, rows).
    fn size(&self) -> (u16, u16);
}

/// A freshly spawned terminal: the handle plus its event stream.
pub struct SpawnedTerminal {
    pub handle: Box<dyn TerminalHandle>,
    pub events: mpsc::UnboundedReceiver<TerminalEvent>,
}

impl std::fmt::Debug for SpawnedTerminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (cols, rows) = self.handle.size();
        f.debug_struct("SpawnedTerminal")
            .field("size", &format!("{}x{}", cols, rows))
            .finish()
    }
}

/// Creates terminal processes.
pub trait TerminalSpawner: Send + Sync {
    fn spawn(&self, request: &SpawnRequest) -> Result<SpawnedTerminal, PtyError>;
}
