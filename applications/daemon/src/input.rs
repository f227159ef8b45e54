//! Command lines read from stdin
//!
//! One JSON object per line: `{"action": "seek-to", "payload": {"position": 5000}}`.
//! `payload` may be omitted for commands without fields.

use cadenza_playback::{Payload, PlaybackError, PlaybackHandle};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InputLine {
    pub action: String,

    #[serde(default)]
    pub payload: Payload,
}

/// Parse one line; blank lines yield `None`
pub fn parse_line(line: &str) -> serde_json::Result<Option<InputLine>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

/// Parse a line and hand it to the playback service
///
/// Unparseable lines and malformed commands are logged and skipped. Only a
/// closed control channel is reported.
pub fn dispatch_line(handle: &PlaybackHandle, line: &str) -> cadenza_playback::Result<()> {
    let input = match parse_line(line) {
        Ok(Some(input)) => input,
        Ok(None) => return Ok(()),
        Err(e) => {
            warn!("Skipping unreadable input line: {}", e);
            return Ok(());
        }
    };

    match handle.dispatch(&input.action, &input.payload) {
        Err(PlaybackError::Command(_)) => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_with_payload() {
        let line = parse_line(r#"{"action": "seek-to", "payload": {"position": 5000}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(line.action, "seek-to");
        assert_eq!(line.payload.get("position"), Some(&json!(5000)));
    }

    #[test]
    fn payload_is_optional() {
        let line = parse_line(r#"{"action":"play"}"#).unwrap().unwrap();
        assert_eq!(line.action, "play");
        assert!(line.payload.is_empty());
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(parse_line("").unwrap(), None);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(parse_line("play please").is_err());
        assert!(parse_line(r#"{"payload": {}}"#).is_err());
    }
}
