//! Events emitted by a running terminal process.
//!
//! A single reader thread produces these in the order the process wrote its
//! output, and `Exit` is always the last event for a process.

/// Event produced by a terminal process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    /// Raw bytes read from the pty master.
    Output(Vec<u8>),

    /// The process exited with the given code.
    Exit(u32),
}
