//! USB serial panel ports.

use tokio_serial::{SerialPortBuilderExt, SerialPortInfo, SerialPortType, SerialStream};
use tracing::{debug, info};

use crate::error::{LinkError, LinkResult};
use crate::link::PortOpener;

/// Substrings that mark a likely panel port (matched case-insensitively).
const PANEL_HINTS: [&str; 3] = ["arduino", "usb", "serial"];

/// Opens a configured serial port, or the first autodiscovered one.
#[derive(Debug, Clone)]
pub struct SerialOpener {
    port: Option<String>,
    baud_rate: u32,
}

impl SerialOpener {
    pub fn new(port: Option<String>, baud_rate: u32) -> Self {
        Self { port, baud_rate }
    }
}

impl PortOpener for SerialOpener {
    type Stream = SerialStream;

    fn open(&self) -> LinkResult<(String, SerialStream)> {
        let path = match &self.port {
            Some(path) => path.clone(),
            None => discover_port()?,
        };

        let stream = tokio_serial::new(path.as_str(), self.baud_rate)
            .open_native_async()
            .map_err(|e| LinkError::Open {
                path: path.clone(),
                message: e.to_string(),
            })?;
        debug!(port = %path, baud = self.baud_rate, "Serial port open");
        Ok((path, stream))
    }
}

/// Find the first port that looks like a panel.
pub fn discover_port() -> LinkResult<String> {
    let ports = tokio_serial::available_ports().map_err(|e| LinkError::Discovery(e.to_string()))?;
    debug!(count = ports.len(), "Enumerated serial ports");

    let path = select_panel_port(&ports).ok_or(LinkError::NoPort)?;
    info!(port = %path, "Discovered panel port");
    Ok(path)
}

pub fn select_panel_port(ports: &[SerialPortInfo]) -> Option<String> {
    ports
        .iter()
        .find(|port| is_panel_port(port))
        .map(|port| port.port_name.clone())
}

fn is_panel_port(port: &SerialPortInfo) -> bool {
    let mut fields = vec![port.port_name.as_str()];
    if let SerialPortType::UsbPort(usb) = &port.port_type {
        fields.extend(usb.manufacturer.as_deref());
        fields.extend(usb.product.as_deref());
    }
    fields.into_iter().any(mentions_panel)
}

fn mentions_panel(text: &str) -> bool {
    let text = text.to_ascii_lowercase();
    PANEL_HINTS.iter().any(|hint| text.contains(hint))
}
