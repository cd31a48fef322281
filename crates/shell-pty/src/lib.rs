//! PTY-backed device shells for remote-shell.
//!
//! Builds the `adb shell` invocation, spawns it inside a pty, and exposes
//! its output and exit as typed events.

pub mod events;
pub mod session;
pub mod shell;
pub mod terminal;
pub mod utf8;

pub use events::TerminalEvent;
pub use session::{NativePtySpawner, PtyError, PtyProcess};
pub use shell::{adb_program, resolve_adb, SpawnRequest};
pub use terminal::{SpawnedTerminal, TerminalHandle, TerminalSpawner};
pub use utf8::Utf8Decoder;
