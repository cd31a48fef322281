//! Control messages exchanged before a shell session is live.
//!
//! Wire format:
//!
//! ```json
//! { "type": "shell", "data": { "type": "start", "udid": "ABC123", "cols": 100, "rows": 30 } }
//! ```
//!
//! Anything that is valid JSON but not addressed to the shell domain (other
//! domains, a missing or non-string `type`, non-object payloads) parses to
//! `None`, as do shell payloads with an unknown subtype.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Domain tag carried by every shell control message.
pub const SHELL_DOMAIN: &str = "shell";

/// Parameters of a `start` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartParams {
    /// Device serial the shell runs against.
    pub udid: String,
    #[serde(default)]
    pub cols: Option<u16>,
    #[serde(default)]
    pub rows: Option<u16>,
}

/// A recognised shell control request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellRequest {
    Start(StartParams),
    Stop,
}

/// Parse a raw transport message as a shell control request.
///
/// Returns `Err` only for payloads that are not valid JSON, or `start`
/// requests whose parameters do not deserialize.
pub fn parse_control(raw: &str) -> Result<Option<ShellRequest>> {
    let mut envelope: Value = serde_json::from_str(raw)?;
    if envelope.get("type").and_then(Value::as_str) != Some(SHELL_DOMAIN) {
        return Ok(None);
    }

    let data = envelope.get_mut("data").map(Value::take).unwrap_or_default();
    match data.get("type").and_then(Value::as_str) {
        Some("start") => {
            let params: StartParams = serde_json::from_value(data)?;
            Ok(Some(ShellRequest::Start(params)))
        }
        Some("stop") => Ok(Some(ShellRequest::Stop)),
        _ => Ok(None),
    }
}

/// Build the error notice sent to the client when a start request fails.
pub fn error_notice(message: &str) -> String {
    serde_json::json!({
        "type": SHELL_DOMAIN,
        "data": {
            "type": "error",
            "message": message,
        }
    })
    .to_string()
}
