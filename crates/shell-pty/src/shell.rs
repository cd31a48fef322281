//! Device shell command construction.
//!
//! Builds the `adb -s <udid> shell` invocation together with the environment,
//! working directory, and geometry it runs with.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Executable name of adb on this platform.
pub fn adb_program() -> &'static str {
    if cfg!(windows) {
        "adb.exe"
    } else {
        "adb"
    }
}

/// Resolve the adb executable, preferring an explicit override.
pub fn resolve_adb(adb_path: Option<&Path>) -> PathBuf {
    adb_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(adb_program()))
}

/// Everything needed to spawn a process inside a pty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub cwd: PathBuf,
    /// Terminal name exported as `TERM`.
    pub term: String,
    pub cols: u16,
    pub rows: u16,
}

impl SpawnRequest {
    /// Request for an interactive shell on the device with serial `udid`.
    ///
    /// The process inherits this process's environment with
    /// `COLORTERM=truecolor` forced, and runs from `$PWD` (or `/`).
    pub fn device_shell(
        adb: impl Into<PathBuf>,
        udid: &str,
        term: impl Into<String>,
        cols: u16,
        rows: u16,
    ) -> Self {
        Self::device_shell_with_env(adb, udid, term, cols, rows, std::env::vars())
    }

    /// Like [`SpawnRequest::device_shell`], with an explicit base environment.
    pub fn device_shell_with_env(
        adb: impl Into<PathBuf>,
        udid: &str,
        term: impl Into<String>,
        cols: u16,
        rows: u16,
        base_env: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        let term = term.into();
        let mut env: BTreeMap<String, String> = base_env.into_iter().collect();
        env.insert("COLORTERM".into(), "truecolor".into());
        env.insert("TERM".into(), term.clone());

        let cwd = env
            .get("PWD")
            .filter(|pwd| !pwd.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/"));

        Self {
            program: adb.into(),
            args: vec!["-s".into(), udid.into(), "shell".into()],
            env,
            cwd,
            term,
            cols,
            rows,
        }
    }

    /// Human-readable command line, used in logs.
    pub fn display_command(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_adb_program_name() {
        #[cfg(windows)]
        assert_eq!(adb_program(), "adb.exe");
        #[cfg(not(windows))]
        assert_eq!(adb_program(), "adb");
    }

    #[test]
    fn test_resolve_adb_override() {
        assert_eq!(resolve_adb(None), PathBuf::from(adb_program()));
        assert_eq!(
            resolve_adb(Some(Path::new("/opt/sdk/adb"))),
            PathBuf::from("/opt/sdk/adb")
        );
    }

    #[test]
    fn test_device_shell_args() {
        let req = SpawnRequest::device_shell_with_env(
            "adb",
            "ABC123",
            "xterm-256color",
            100,
            30,
            env(&[]),
        );
        assert_eq!(req.args, vec!["-s", "ABC123", "shell"]);
        assert_eq!(req.cols, 100);
        assert_eq!(req.rows, 30);
        assert_eq!(req.display_command(), "adb -s ABC123 shell");
    }

    #[test]
    fn test_environment_is_inherited_with_truecolor() {
        let req = SpawnRequest::device_shell_with_env(
            "adb",
            "ABC123",
            "xterm-256color",
            80,
            24,
            env(&[("HOME", "/home/dev"), ("COLORTERM", "24bit")]),
        );
        assert_eq!(req.env.get("HOME").map(String::as_str), Some("/home/dev"));
        assert_eq!(
            req.env.get("COLORTERM").map(String::as_str),
            Some("truecolor")
        );
        assert_eq!(
            req.env.get("TERM").map(String::as_str),
            Some("xterm-256color")
        );
    }

    #[test]
    fn test_cwd_from_pwd() {
        let req = SpawnRequest::device_shell_with_env(
            "adb",
            "X",
            "xterm-256color",
            80,
            24,
            env(&[("PWD", "/srv/work")]),
        );
        assert_eq!(req.cwd, PathBuf::from("/srv/work"));
    }

    #[test]
    fn test_cwd_defaults_to_root() {
        let req =
            SpawnRequest::device_shell_with_env("adb", "X", "xterm-256color", 80, 24, env(&[]));
        assert_eq!(req.cwd, PathBuf::from("/"));
    }
}
