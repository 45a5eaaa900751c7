//! Mapping registry between simulator entities and panel inputs/outputs.
//!
//! Two directed tables are kept:
//! - **outbound**: simulator data reference name -> panel command, with the
//!   threshold and transform applied before forwarding
//! - **inbound**: panel input key -> simulator command(s) or data reference
//!   write(s)
//!
//! The registry is filled once at startup (usually by an aircraft profile)
//! and shared read-only afterwards.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::pipeline::TransformKind;

/// Errors raised when a mapping fails validation.
#[derive(Debug, Error, PartialEq)]
pub enum MappingError {
    #[error("Entity name must not be empty")]
    EmptyName,

    #[error("Mapping for \"{0}\" has an empty target command")]
    EmptyTarget(String),

    #[error("Mapping for \"{0}\" has no actions")]
    NoActions(String),

    #[error("Mapping for \"{0}\" has an invalid threshold: {1}")]
    InvalidThreshold(String, f64),

    #[error("Data reference input \"{0}\" has no value to write")]
    MissingValue(String),
}

/// Result type for mapping operations.
pub type MappingResult<T> = Result<T, MappingError>;

/// Lookup table used by [`TransformKind::ValueMap`], keyed by the raw value
/// rendered as a string (`2` and `2.0` both map to `"2"`).
pub type ValueMap = BTreeMap<String, Value>;

/// How a simulator data reference is forwarded to the panel.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMapping {
    /// Panel command that receives the value
    pub target_command: String,
    /// Minimum numeric change before a new value is forwarded
    pub threshold: f64,
    /// Transform applied to the raw simulator value
    pub transform: Option<TransformKind>,
    /// Table for [`TransformKind::ValueMap`]
    pub value_map: Option<ValueMap>,
}

impl OutboundMapping {
    pub fn new(target_command: impl Into<String>) -> Self {
        Self {
            target_command: target_command.into(),
            threshold: 0.0,
            transform: None,
            value_map: None,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_transform(mut self, transform: TransformKind) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Use a lookup table; also selects the value-map transform.
    pub fn with_value_map(mut self, table: ValueMap) -> Self {
        self.transform = Some(TransformKind::ValueMap);
        self.value_map = Some(table);
        self
    }
}

/// What an inbound panel input does on the simulator side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Command,
    DataRef,
}

/// Value written by a data reference input.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteValue {
    /// Literal value written as-is
    Literal(Value),
    /// Read the current value of the first target, write its inverse
    Toggle,
}

impl From<i64> for WriteValue {
    fn from(v: i64) -> Self {
        Self::Literal(Value::from(v))
    }
}

impl From<f64> for WriteValue {
    fn from(v: f64) -> Self {
        Self::Literal(Value::from(v))
    }
}

impl From<bool> for WriteValue {
    fn from(v: bool) -> Self {
        Self::Literal(Value::Bool(v))
    }
}

/// Simulator action(s) bound to one panel input key.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMapping {
    pub kind: InputKind,
    /// Simulator entity names, activated/written together
    pub actions: Vec<String>,
    /// Value for data reference writes
    pub value: Option<WriteValue>,
    /// Command hold duration in seconds, 0 = press and release
    pub hold: f64,
}

impl InboundMapping {
    pub fn command(actions: impl IntoActions, hold: f64) -> Self {
        Self {
            kind: InputKind::Command,
            actions: actions.into_actions(),
            value: None,
            hold,
        }
    }

    pub fn dataref(actions: impl IntoActions, value: impl Into<WriteValue>) -> Self {
        Self {
            kind: InputKind::DataRef,
            actions: actions.into_actions(),
            value: Some(value.into()),
            hold: 0.0,
        }
    }
}

/// One or several simulator entity names.
pub trait IntoActions {
    fn into_actions(self) -> Vec<String>;
}

impl IntoActions for &str {
    fn into_actions(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoActions for String {
    fn into_actions(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoActions for &[&str] {
    fn into_actions(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl<const N: usize> IntoActions for [&str; N] {
    fn into_actions(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl IntoActions for Vec<String> {
    fn into_actions(self) -> Vec<String> {
        self
    }
}

/// Outbound and inbound mapping tables.
#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    outbound: HashMap<String, OutboundMapping>,
    inbound: HashMap<String, InboundMapping>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the outbound mapping of a data reference.
    pub fn register_outbound(
        &mut self,
        entity_name: impl Into<String>,
        mapping: OutboundMapping,
    ) -> MappingResult<()> {
        let entity_name = entity_name.into();
        if entity_name.is_empty() {
            return Err(MappingError::EmptyName);
        }
        if mapping.target_command.is_empty() {
            return Err(MappingError::EmptyTarget(entity_name));
        }
        if !mapping.threshold.is_finite() || mapping.threshold < 0.0 {
            return Err(MappingError::InvalidThreshold(entity_name, mapping.threshold));
        }

        debug!(
            dataref = %entity_name,
            command = %mapping.target_command,
            threshold = mapping.threshold,
            transform = ?mapping.transform,
            "Simulator to panel mapping added"
        );
        self.outbound.insert(entity_name, mapping);
        Ok(())
    }

    /// Register (or replace) the mapping of a panel input key.
    pub fn register_inbound(
        &mut self,
        input_key: impl Into<String>,
        mapping: InboundMapping,
    ) -> MappingResult<()> {
        let input_key = input_key.into();
        if input_key.is_empty() {
            return Err(MappingError::EmptyName);
        }
        if mapping.actions.is_empty() || mapping.actions.iter().any(|a| a.is_empty()) {
            return Err(MappingError::NoActions(input_key));
        }
        if mapping.kind == InputKind::DataRef && mapping.value.is_none() {
            return Err(MappingError::MissingValue(input_key));
        }

        debug!(
            input = %input_key,
            kind = ?mapping.kind,
            actions = ?mapping.actions,
            "Panel to simulator mapping added"
        );
        self.inbound.insert(input_key, mapping);
        Ok(())
    }

    pub fn outbound(&self, entity_name: &str) -> Option<&OutboundMapping> {
        self.outbound.get(entity_name)
    }

    pub fn inbound(&self, input_key: &str) -> Option<&InboundMapping> {
        self.inbound.get(input_key)
    }

    /// Names of every mapped data reference, sorted for a stable subscribe order.
    pub fn outbound_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.outbound.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn outbound_len(&self) -> usize {
        self.outbound.len()
    }

    pub fn inbound_len(&self) -> usize {
        self.inbound.len()
    }

    // Convenience registrations used by aircraft profiles.

    pub fn add_dataref(&mut self, name: &str, mapping: OutboundMapping) -> MappingResult<()> {
        self.register_outbound(name, mapping)
    }

    /// Any non-zero-ish value lights the panel output.
    pub fn add_boolean_dataref(&mut self, name: &str, panel_cmd: &str) -> MappingResult<()> {
        self.register_outbound(
            name,
            OutboundMapping::new(panel_cmd).with_transform(TransformKind::Boolean),
        )
    }

    pub fn add_value_map_dataref(
        &mut self,
        name: &str,
        panel_cmd: &str,
        table: ValueMap,
    ) -> MappingResult<()> {
        self.register_outbound(name, OutboundMapping::new(panel_cmd).with_value_map(table))
    }

    /// `{switch}_on` writes 1 and `{switch}_off` writes 0.
    pub fn add_toggle_switch_dataref(
        &mut self,
        switch: &str,
        dataref: impl IntoActions,
    ) -> MappingResult<()> {
        let actions = dataref.into_actions();
        self.register_inbound(
            format!("{switch}_on"),
            InboundMapping::dataref(actions.clone(), 1i64),
        )?;
        self.register_inbound(format!("{switch}_off"), InboundMapping::dataref(actions, 0i64))
    }

    /// `{switch}_on`/`{switch}_off` trigger commands; `off` defaults to `on`.
    pub fn add_toggle_switch_commands(
        &mut self,
        switch: &str,
        on: impl IntoActions,
        off: Option<Vec<String>>,
    ) -> MappingResult<()> {
        let on = on.into_actions();
        let off = off.unwrap_or_else(|| on.clone());
        self.register_inbound(format!("{switch}_on"), InboundMapping::command(on, 0.0))?;
        self.register_inbound(format!("{switch}_off"), InboundMapping::command(off, 0.0))
    }

    pub fn add_momentary_command(
        &mut self,
        switch: &str,
        commands: impl IntoActions,
        hold: f64,
    ) -> MappingResult<()> {
        self.register_inbound(switch, InboundMapping::command(commands, hold))
    }

    pub fn add_momentary_dataref(
        &mut self,
        switch: &str,
        dataref: impl IntoActions,
        value: impl Into<WriteValue>,
    ) -> MappingResult<()> {
        self.register_inbound(switch, InboundMapping::dataref(dataref, value))
    }

    /// `{encoder}_increment` and `{encoder}_decrement`.
    pub fn add_rotary_encoder_commands(
        &mut self,
        encoder: &str,
        increment: impl IntoActions,
        decrement: impl IntoActions,
    ) -> MappingResult<()> {
        self.register_inbound(
            format!("{encoder}_increment"),
            InboundMapping::command(increment, 0.0),
        )?;
        self.register_inbound(
            format!("{encoder}_decrement"),
            InboundMapping::command(decrement, 0.0),
        )
    }
}
