use crate::mapping::{MappingRegistry, MappingResult, OutboundMapping};
use crate::pipeline::TransformKind;

pub(super) fn initialize_mappings(registry: &mut MappingRegistry) -> MappingResult<()> {
    registry.add_dataref(
        "1-sim/AP/altSetting",
        OutboundMapping::new("set_alt")
            .with_threshold(10.0)
            .with_transform(TransformKind::Round),
    )?;

    registry.add_rotary_encoder_commands(
        "altitude_encoder",
        "1-sim/comm/AP/altUP",
        "1-sim/comm/AP/altDN",
    )?;

    Ok(())
}
