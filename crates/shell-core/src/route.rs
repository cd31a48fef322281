//! Connection routing: decides whether a connection belongs to the shell controller.

use serde::Deserialize;

/// Value of the `action` query parameter claimed by the shell controller.
pub const SHELL_ACTION: &str = "shell";

/// Query parameters negotiated when a connection is established.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionQuery {
    #[serde(default)]
    pub action: Option<String>,
}

impl ConnectionQuery {
    pub fn with_action(action: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
        }
    }

    /// True when the connection asks for a device shell.
    pub fn is_shell(&self) -> bool {
        self.action.as_deref() == Some(SHELL_ACTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_action_claimed() {
        assert!(ConnectionQuery::with_action("shell").is_shell());
    }

    #[test]
    fn test_other_actions_declined() {
        assert!(!ConnectionQuery::with_action("stream").is_shell());
        assert!(!ConnectionQuery::with_action("SHELL ").is_shell());
        assert!(!ConnectionQuery::default().is_shell());
    }

    #[test]
    fn test_query_deserializes_with_extra_params() {
        let query: ConnectionQuery =
            serde_json::from_str(r#"{"action":"shell","udid":"ABC123"}"#).unwrap();
        assert!(query.is_shell());
    }
}
