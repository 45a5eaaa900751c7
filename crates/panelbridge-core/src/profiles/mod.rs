//! Built-in aircraft profiles.
//!
//! A profile fills a [`MappingRegistry`] with the displays, encoders,
//! switches and annunciators of one aircraft model.

mod ff_757;
mod zibo_737;

use std::fmt;
use std::str::FromStr;

use crate::mapping::{MappingRegistry, MappingResult};

/// Supported aircraft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aircraft {
    Ff757,
    Zibo737,
}

impl Aircraft {
    pub const ALL: [Aircraft; 2] = [Aircraft::Ff757, Aircraft::Zibo737];

    pub fn id(&self) -> &'static str {
        match self {
            Aircraft::Ff757 => "ff_757",
            Aircraft::Zibo737 => "zibo_737",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Aircraft::Ff757 => "FF 757",
            Aircraft::Zibo737 => "Zibo 737",
        }
    }

    /// Register every mapping of this aircraft.
    pub fn apply(&self, registry: &mut MappingRegistry) -> MappingResult<()> {
        match self {
            Aircraft::Ff757 => ff_757::initialize_mappings(registry),
            Aircraft::Zibo737 => zibo_737::initialize_mappings(registry),
        }
    }

    /// Build a registry holding only this aircraft's mappings.
    pub fn registry(&self) -> MappingResult<MappingRegistry> {
        let mut registry = MappingRegistry::new();
        self.apply(&mut registry)?;
        Ok(registry)
    }
}

impl fmt::Display for Aircraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Aircraft {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Aircraft::ALL
            .into_iter()
            .find(|a| a.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let known: Vec<&str> = Aircraft::ALL.iter().map(|a| a.id()).collect();
                format!("unknown aircraft \"{}\", expected one of: {}", s, known.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::InputKind;

    #[test]
    fn test_parse_aircraft() {
        assert_eq!("zibo_737".parse::<Aircraft>().unwrap(), Aircraft::Zibo737);
        assert_eq!("FF_757".parse::<Aircraft>().unwrap(), Aircraft::Ff757);
        assert!("a320".parse::<Aircraft>().unwrap_err().contains("zibo_737"));
    }

    #[test]
    fn test_every_profile_builds() {
        for aircraft in Aircraft::ALL {
            let registry = aircraft.registry().unwrap();
            assert!(registry.outbound_len() > 0, "{} has no outputs", aircraft);
            assert!(registry.inbound_len() > 0, "{} has no inputs", aircraft);
        }
    }

    #[test]
    fn test_zibo_profile() {
        let registry = Aircraft::Zibo737.registry().unwrap();

        let alt = registry.outbound("laminar/B738/autopilot/mcp_alt_dial").unwrap();
        assert_eq!(alt.target_command, "set_altitude");
        assert_eq!(alt.threshold, 100.0);

        let course = registry.inbound("vertical_speed_encoder_increment").unwrap();
        assert_eq!(course.kind, InputKind::Command);
        assert_eq!(course.actions.len(), 2);

        let lnav = registry.inbound("l_nav").unwrap();
        assert_eq!(lnav.hold, 0.1);

        assert_eq!(registry.inbound("landing_l_on").unwrap().kind, InputKind::DataRef);
        assert_eq!(
            registry.inbound("disengage_off").unwrap().actions,
            vec!["laminar/B738/autopilot/disconnect_toggle"]
        );
    }
}
