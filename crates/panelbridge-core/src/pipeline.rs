//! Value pipeline: transforms applied to simulator values and the change
//! detector that decides whether a value is worth sending to the panel.

use std::collections::HashMap;
use std::f64::consts::PI;

use serde_json::Value;

use crate::error::{BridgeError, Result};
use crate::mapping::ValueMap;

/// Transform applied to a raw simulator value before forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformKind {
    /// `1` when the value is above 0.5, else `0`
    Boolean,
    /// Nearest integer, ties away from zero
    Round,
    /// Radians to whole degrees
    ToDegrees,
    /// Substitute through a lookup table, pass through on a miss
    ValueMap,
}

impl TransformKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformKind::Boolean => "boolean",
            TransformKind::Round => "round",
            TransformKind::ToDegrees => "to_degrees",
            TransformKind::ValueMap => "value_map",
        }
    }

    /// Apply the transform. Numeric transforms fail on non-numeric input.
    pub fn apply(&self, raw: &Value, table: Option<&ValueMap>) -> Result<Value> {
        match self {
            TransformKind::Boolean => {
                let v = self.numeric(raw)?;
                Ok(Value::from(if v > 0.5 { 1 } else { 0 }))
            }
            TransformKind::Round => Ok(integral(self.numeric(raw)?.round())),
            TransformKind::ToDegrees => {
                Ok(integral((self.numeric(raw)? * (180.0 / PI)).round()))
            }
            TransformKind::ValueMap => Ok(table
                .zip(lookup_key(raw))
                .and_then(|(table, key)| table.get(&key).cloned())
                .unwrap_or_else(|| raw.clone())),
        }
    }

    fn numeric(&self, raw: &Value) -> Result<f64> {
        match raw {
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            _ => raw.as_f64().ok_or_else(|| BridgeError::Transform {
                transform: self.as_str(),
                value: raw.clone(),
            }),
        }
    }
}

/// Run the optional transform of a mapping over a raw value.
pub fn transform(kind: Option<TransformKind>, raw: &Value, table: Option<&ValueMap>) -> Result<Value> {
    match kind {
        Some(kind) => kind.apply(raw, table),
        None => Ok(raw.clone()),
    }
}

/// Render a raw value as a lookup table key, so `2` and `2.0` both become `"2"`.
pub fn lookup_key(raw: &Value) -> Option<String> {
    match raw {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(i.to_string());
            }
            if let Some(u) = n.as_u64() {
                return Some(u.to_string());
            }
            let f = n.as_f64()?;
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                Some((f as i64).to_string())
            } else {
                Some(f.to_string())
            }
        }
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn integral(v: f64) -> Value {
    if v.is_finite() && v.abs() < i64::MAX as f64 {
        Value::from(v as i64)
    } else {
        Value::from(v)
    }
}

/// Remembers the last value sent for each panel command.
///
/// Keys are panel commands, not simulator names: several data references
/// may feed the same command.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    previous: HashMap<String, Value>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether `new` should go to the panel, recording it when it does.
    ///
    /// The first value for a command always forwards. Two numbers forward when
    /// they differ by at least `threshold`; anything else forwards when the
    /// values differ.
    pub fn should_forward(&mut self, command: &str, new: &Value, threshold: f64) -> bool {
        let forward = match self.previous.get(command) {
            None => true,
            Some(old) => match (old.as_f64(), new.as_f64()) {
                (Some(old), Some(new)) => (new - old).abs() >= threshold,
                _ => old != new,
            },
        };

        if forward {
            self.previous.insert(command.to_string(), new.clone());
        }
        forward
    }

    pub fn previous(&self, command: &str) -> Option<&Value> {
        self.previous.get(command)
    }
}
