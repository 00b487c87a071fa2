//! OSD commands.

use tracing::warn;

use super::{is_truthy, Args};
use crate::core::{CommandPayload, Pipeline};
use crate::errors::CmdflowError;

/// Cluster-wide OSD flags that can be set or unset.
pub const OSD_FLAGS: &[&str] = &[
    "pause",
    "noup",
    "nodown",
    "noout",
    "noin",
    "nobackfill",
    "norecover",
    "noscrub",
    "nodeep-scrub",
];

/// Commands that can be run against a single up OSD.
pub const OSD_IMPLEMENTED_COMMANDS: &[&str] = &["scrub", "deep_scrub", "repair"];

/// Pipeline setting or unsetting cluster flags.
///
/// Unknown flags are logged and ignored.
#[must_use]
pub fn osd_flags_pipeline(args: &Args) -> Pipeline {
    let invalid: Vec<&str> = args
        .keys()
        .map(String::as_str)
        .filter(|flag| !OSD_FLAGS.contains(flag))
        .collect();
    if !invalid.is_empty() {
        warn!(flags = ?invalid, "Flags not valid to set/unset");
    }

    let commands = args
        .iter()
        .filter(|(flag, _)| OSD_FLAGS.contains(&flag.as_str()))
        .map(|(flag, value)| {
            let mode = if is_truthy(value) { "set" } else { "unset" };
            CommandPayload::new(format!("osd {mode}")).with_arg("key", flag.as_str())
        })
        .collect();

    vec![commands]
}

/// Pipeline changing one OSD's in/out state, marking it down, or reweighting.
pub fn osd_update_pipeline(osd_id: i64, args: &Args) -> Result<Pipeline, CmdflowError> {
    let ids = vec![osd_id.to_string()];
    let mut commands = Vec::new();

    if let Some(value) = args.get("in") {
        let prefix = if is_truthy(value) { "osd in" } else { "osd out" };
        commands.push(CommandPayload::new(prefix).with_arg("ids", ids.clone()));
    }

    if let Some(value) = args.get("up") {
        if is_truthy(value) {
            return Err(CmdflowError::invalid(
                "It is not valid to set a down OSD to be up",
            ));
        }
        commands.push(CommandPayload::new("osd down").with_arg("ids", ids));
    }

    if let Some(weight) = args.get("reweight") {
        commands.push(
            CommandPayload::new("osd reweight")
                .with_arg("id", osd_id)
                .with_arg("weight", weight.clone()),
        );
    }

    Ok(vec![commands])
}

/// Pipeline running a maintenance command on one OSD.
pub fn osd_command_pipeline(osd_id: i64, command: &str) -> Result<Pipeline, CmdflowError> {
    if !OSD_IMPLEMENTED_COMMANDS.contains(&command) {
        return Err(CmdflowError::invalid(format!(
            "Command \"{command}\" not available"
        )));
    }

    Ok(vec![vec![CommandPayload::new(format!("osd {command}"))
        .with_arg("who", osd_id.to_string())]])
}
