use crate::mapping::{MappingRegistry, MappingResult, OutboundMapping};
use crate::pipeline::TransformKind;

/// Hold time for MCP push buttons, in seconds.
const PRESS: f64 = 0.1;

pub(super) fn initialize_mappings(registry: &mut MappingRegistry) -> MappingResult<()> {
    // Displays
    let displays = [
        ("laminar/B738/autopilot/mcp_speed_dial_kts", "set_speed", 1.0),
        ("laminar/B738/autopilot/mcp_hdg_dial", "set_heading", 1.0),
        ("laminar/B738/autopilot/mcp_alt_dial", "set_altitude", 100.0),
        // Course shares the vertical speed display on the panel
        ("laminar/B738/autopilot/course_pilot", "set_vertical_speed", 1.0),
    ];
    for (dataref, cmd, threshold) in displays {
        registry.add_dataref(
            dataref,
            OutboundMapping::new(cmd)
                .with_threshold(threshold)
                .with_transform(TransformKind::Round),
        )?;
    }

    // Encoders
    registry.add_rotary_encoder_commands(
        "speed_encoder",
        "sim/autopilot/airspeed_up",
        "sim/autopilot/airspeed_down",
    )?;
    registry.add_rotary_encoder_commands(
        "heading_encoder",
        "laminar/B738/autopilot/heading_up",
        "laminar/B738/autopilot/heading_dn",
    )?;
    registry.add_rotary_encoder_commands(
        "altitude_encoder",
        "laminar/B738/autopilot/altitude_up",
        "laminar/B738/autopilot/altitude_dn",
    )?;
    registry.add_rotary_encoder_commands(
        "vertical_speed_encoder",
        [
            "laminar/B738/autopilot/course_pilot_up",
            "laminar/B738/autopilot/course_copilot_up",
        ],
        [
            "laminar/B738/autopilot/course_pilot_dn",
            "laminar/B738/autopilot/course_copilot_dn",
        ],
    )?;

    // Switches
    registry.add_toggle_switch_commands(
        "at_arm",
        "laminar/B738/autopilot/autothrottle_arm_toggle",
        None,
    )?;
    registry.add_toggle_switch_commands(
        "flight_director",
        "laminar/B738/autopilot/flight_director_toggle",
        None,
    )?;
    registry.add_toggle_switch_dataref("landing_l", "laminar/B738/switch/land_lights_left_pos")?;
    registry.add_toggle_switch_dataref("landing_r", "laminar/B738/switch/land_lights_right_pos")?;
    registry.add_toggle_switch_dataref("runway_l", "laminar/B738/toggle_switch/rwy_light_left")?;
    registry.add_toggle_switch_dataref("runway_r", "laminar/B738/toggle_switch/rwy_light_right")?;
    registry.add_toggle_switch_commands(
        "taxi",
        "laminar/B738/toggle_switch/taxi_light_brigh_toggle",
        None,
    )?;
    registry.add_toggle_switch_commands(
        "position_strobe",
        "laminar/B738/toggle_switch/position_light_up",
        Some(vec!["laminar/B738/toggle_switch/position_light_down".to_string()]),
    )?;
    registry.add_toggle_switch_commands(
        "position_steady",
        "laminar/B738/toggle_switch/position_light_down",
        Some(vec!["laminar/B738/toggle_switch/position_light_up".to_string()]),
    )?;
    registry.add_toggle_switch_dataref("anti_col", "sim/cockpit2/switches/beacon_on")?;
    registry.add_toggle_switch_dataref("wing", "laminar/B738/toggle_switch/wing_light")?;
    registry.add_toggle_switch_dataref("logo", "laminar/B738/toggle_switch/logo_light")?;
    registry.add_toggle_switch_commands("disengage", "laminar/B738/autopilot/disconnect_toggle", None)?;

    // Momentary buttons
    let buttons = [
        ("speed_hold", "laminar/B738/autopilot/speed_press"),
        ("heading_hold", "laminar/B738/autopilot/hdg_sel_press"),
        ("l_nav", "laminar/B738/autopilot/lnav_press"),
        ("v_nav", "laminar/B738/autopilot/vnav_press"),
        ("altitude_hold", "laminar/B738/autopilot/alt_hld_press"),
        ("vertical_speed_hold", "laminar/B738/autopilot/vs_press"),
        ("app", "laminar/B738/autopilot/app_press"),
        ("loc", "laminar/B738/autopilot/vorloc_press"),
        ("cmd", "laminar/B738/autopilot/cmd_a_press"),
    ];
    for (switch, command) in buttons {
        registry.add_momentary_command(switch, command, PRESS)?;
    }

    // LEDs
    let leds = [
        ("laminar/B738/autopilot/hdg_sel_status", "heading_led"),
        ("laminar/B738/autopilot/alt_hld_status", "altitude_led"),
        ("laminar/B738/autopilot/vs_status", "vertical_speed_led"),
        ("laminar/B738/autopilot/lnav_status", "l_nav_led"),
        ("laminar/B738/autopilot/vnav_status1", "v_nav_led"),
        ("laminar/B738/autopilot/vorloc_status", "loc_led"),
        ("laminar/B738/autopilot/app_status", "app_led"),
        ("laminar/B738/autopilot/cmd_a_status", "cmd_led"),
    ];
    for (dataref, led) in leds {
        registry.add_boolean_dataref(dataref, led)?;
    }

    Ok(())
}
