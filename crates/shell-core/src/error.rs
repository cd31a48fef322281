use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Malformed control message: {0}")]
    MalformedControlMessage(#[from] serde_json::Error),

    #[error("Tunnel to {udid} ({remote}) failed: {message}")]
    Tunnel {
        udid: String,
        remote: String,
        message: String,
    },

    #[error("Failed to spawn terminal: {0}")]
    Spawn(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ShellError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tunnel_error_display() {
        let err = ShellError::Tunnel {
            udid: "ABC123".into(),
            remote: "tcp:8886".into(),
            message: "device offline".into(),
        };
        assert_eq!(
            err.to_string(),
            "Tunnel to ABC123 (tcp:8886) failed: device offline"
        );
    }

    #[test]
    fn test_json_error_converts() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ShellError = json_err.into();
        assert!(matches!(err, ShellError::MalformedControlMessage(_)));
        assert!(err.to_string().starts_with("Malformed control message"));
    }
}
