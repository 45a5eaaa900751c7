//! Core of the PanelBridge cockpit panel bridge.
//!
//! Connects a hardware control panel to the X-Plane web API. Simulator
//! values flow out to panel displays and LEDs through the
//! [`session::ProtocolSession`]; panel inputs flow in through the
//! [`dispatch::Dispatcher`]. Both directions are driven by a
//! [`mapping::MappingRegistry`], usually filled from an aircraft
//! [`profiles::Aircraft`] profile.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod link;
pub mod mapping;
pub mod pipeline;
pub mod profiles;
pub mod protocol;
pub mod resolver;
pub mod session;

pub use client::{SimulatorApi, XPlaneClient};
pub use config::BridgeConfig;
pub use dispatch::Dispatcher;
pub use error::{BridgeError, Result};
pub use link::{DeviceCommand, DeviceInput, DeviceSink};
pub use mapping::{InboundMapping, MappingError, MappingRegistry, OutboundMapping, WriteValue};
pub use profiles::Aircraft;
pub use resolver::{IdentifierKind, IdentifierResolver};
pub use session::{ProtocolSession, SessionConfig, SessionState};

/// Re-exports commonly used types.
pub mod prelude {
    pub use crate::client::{SimulatorApi, XPlaneClient};
    pub use crate::config::BridgeConfig;
    pub use crate::dispatch::Dispatcher;
    pub use crate::error::{BridgeError, Result};
    pub use crate::link::{ChannelSink, DeviceCommand, DeviceInput, DeviceSink};
    pub use crate::mapping::{InputKind, MappingRegistry, OutboundMapping, ValueMap, WriteValue};
    pub use crate::pipeline::TransformKind;
    pub use crate::profiles::Aircraft;
    pub use crate::resolver::{IdentifierKind, IdentifierResolver};
    pub use crate::session::{ProtocolSession, SessionConfig, SessionState};
}
