//! Panel input dispatch: maps an input key to simulator commands or writes.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::error::{BridgeError, Result};
use crate::link::DeviceInput;
use crate::mapping::{InputKind, MappingRegistry};
use crate::session::ProtocolSession;

/// Routes panel inputs through the inbound mapping table to the session.
pub struct Dispatcher {
    registry: Arc<MappingRegistry>,
    session: Arc<ProtocolSession>,
}

impl Dispatcher {
    pub fn new(registry: Arc<MappingRegistry>, session: Arc<ProtocolSession>) -> Self {
        Self { registry, session }
    }

    /// Dispatch one input and return the request id that was sent.
    pub async fn try_dispatch(&self, input: &DeviceInput) -> Result<u64> {
        let mapping = self
            .registry
            .inbound(&input.user_input)
            .ok_or_else(|| BridgeError::UnknownInput(input.user_input.clone()))?;

        debug!(input = %input.user_input, kind = ?mapping.kind, "Dispatching panel input");
        match mapping.kind {
            InputKind::Command => {
                self.session
                    .execute_commands(&mapping.actions, mapping.hold)
                    .await
            }
            InputKind::DataRef => {
                let value = mapping
                    .value
                    .as_ref()
                    .ok_or_else(|| BridgeError::MissingValue(input.user_input.clone()))?;
                self.session.write_values(&mapping.actions, value).await
            }
        }
    }

    /// Dispatch one input, logging instead of returning failures.
    pub async fn dispatch(&self, input: &DeviceInput) {
        match self.try_dispatch(input).await {
            Ok(_) => {}
            Err(e @ BridgeError::UnknownInput(_)) => warn!("{}, ignoring", e),
            Err(e) => error!(input = %input.user_input, "Input dispatch failed: {}", e),
        }
    }

    /// Dispatch on its own task.
    pub fn spawn(self: &Arc<Self>, input: DeviceInput) -> JoinHandle<()> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move { dispatcher.dispatch(&input).await })
    }

    /// Consume inputs in arrival order until the channel closes.
    pub async fn run(self: Arc<Self>, mut inputs: mpsc::Receiver<DeviceInput>) {
        while let Some(input) = inputs.recv().await {
            self.spawn(input);
        }
        debug!("Panel input channel closed");
    }
}
