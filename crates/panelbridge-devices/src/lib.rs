//! Panel device links for PanelBridge.
//!
//! [`DeviceLink`] keeps a line-framed JSON connection to the panel open,
//! reconnecting after a fixed delay. Where the bytes come from is decided
//! by a [`PortOpener`]; with the `serial` feature, [`SerialOpener`] opens a
//! USB serial port, autodiscovered unless a path is given.

pub mod error;
pub mod framing;
pub mod link;
#[cfg(feature = "serial")]
pub mod serial;

pub use error::{LinkError, LinkResult};
pub use link::{DeviceLink, LinkConfig, PortOpener};
#[cfg(feature = "serial")]
pub use serial::{SerialOpener, discover_port};
