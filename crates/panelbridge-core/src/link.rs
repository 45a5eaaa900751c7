//! Device link wire types.
//!
//! The panel speaks line-delimited JSON: it sends `{"user_input": "..."}`
//! when a switch, button or encoder moves, and receives
//! `{"cmd": "...", "value": ...}` to drive displays and LEDs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

/// Input event from the panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInput {
    pub user_input: String,
}

impl DeviceInput {
    pub fn new(user_input: impl Into<String>) -> Self {
        Self {
            user_input: user_input.into(),
        }
    }
}

/// Output frame for the panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCommand {
    pub cmd: String,
    pub value: Value,
}

/// Destination for panel output frames.
///
/// Sending is fire-and-forget: a link that is down drops the frame.
pub trait DeviceSink: Send + Sync {
    fn send_command(&self, command: DeviceCommand);
}

/// Parse one line from the panel. Blank lines, text logs and JSON without a
/// `user_input` field yield `None`.
pub fn parse_input_line(line: &str) -> Option<DeviceInput> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<DeviceInput>(line) {
        Ok(input) => Some(input),
        Err(e) => {
            debug!(%line, "Ignoring non-input line from panel: {}", e);
            None
        }
    }
}

/// Encode an output frame as a single newline-terminated line.
pub fn encode_command(command: &DeviceCommand) -> serde_json::Result<String> {
    let mut line = serde_json::to_string(command)?;
    line.push('\n');
    Ok(line)
}

/// Sink that forwards frames into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<DeviceCommand>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DeviceCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl DeviceSink for ChannelSink {
    fn send_command(&self, command: DeviceCommand) {
        if self.tx.send(command).is_err() {
            debug!("Device channel closed, dropping frame");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_input_line() {
        assert_eq!(
            parse_input_line("{\"user_input\":\"heading_encoder_increment\"}\r\n"),
            Some(DeviceInput::new("heading_encoder_increment"))
        );
    }

    #[test]
    fn test_parse_ignores_noise() {
        assert_eq!(parse_input_line(""), None);
        assert_eq!(parse_input_line("   "), None);
        assert_eq!(parse_input_line("Booting panel v1.2"), None);
        assert_eq!(parse_input_line("{\"cmd\":\"x\"}"), None);
    }

    #[test]
    fn test_encode_command() {
        let command = DeviceCommand {
            cmd: "set_altitude".to_string(),
            value: json!(12000),
        };
        assert_eq!(
            encode_command(&command).unwrap(),
            "{\"cmd\":\"set_altitude\",\"value\":12000}\n"
        );
    }

    #[tokio::test]
    async fn test_channel_sink() {
        let (sink, mut rx) = ChannelSink::new();
        sink.send_command(DeviceCommand {
            cmd: "mode".to_string(),
            value: json!("IDLE"),
        });
        let received = rx.recv().await.unwrap();
        assert_eq!(received.cmd, "mode");
        assert_eq!(received.value, json!("IDLE"));
    }
}
