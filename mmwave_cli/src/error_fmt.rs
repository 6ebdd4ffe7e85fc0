//! Human-readable error descriptions and structured JSON error formatting.

use mmwave_core::error::{BuildError, TrackerError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSource | BuildError::MissingPublisher => format!(
                "What happened: The tracker was built without a {}.\nLikely causes: Internal wiring error in the CLI.\nHow to fix: Please report this with the command line you used.",
                if matches!(be, BuildError::MissingSource) { "frame source" } else { "publisher" }
            ),
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun `mmwave check-config`."
            ),
            BuildError::InvalidPolygon { zone, reason } => format!(
                "What happened: Zone '{zone}' has an unusable polygon ({reason}).\nLikely causes: Vertices out of order, a repeated point, or a concave shape.\nHow to fix: List the corners of a convex shape in order around its edge, clockwise or counter-clockwise."
            ),
            BuildError::DuplicateZone(name) => format!(
                "What happened: Zone name '{name}' is used more than once.\nLikely causes: A copied [[zones]] block.\nHow to fix: Give every zone a unique name."
            ),
            BuildError::TooManyZones(n) => format!(
                "What happened: {n} zones are configured.\nLikely causes: Too many [[zones]] blocks.\nHow to fix: Keep at most {} zones.",
                mmwave_core::MAX_ZONES
            ),
            BuildError::TooManyTargets(n) => format!(
                "What happened: {n} targets are configured.\nLikely causes: Too many [[targets]] blocks; the radar reports at most three.\nHow to fix: Keep 1 to 3 [[targets]] entries."
            ),
            BuildError::TiltOrder { min, max } => format!(
                "What happened: The tilt window is empty (min_tilt_angle {min} >= max_tilt_angle {max}).\nLikely causes: Swapped values, or a restored value from the limits file.\nHow to fix: Make min_tilt_angle smaller than max_tilt_angle, or delete the stale entry from the limits file."
            ),
        };
    }

    if let Some(te) = err.downcast_ref::<TrackerError>() {
        return match te {
            TrackerError::Persist(msg) => format!(
                "What happened: A limit was applied but could not be saved ({msg}).\nLikely causes: The limits file directory is missing or not writable.\nHow to fix: Check storage.limits_file in the config and its permissions."
            ),
            TrackerError::Config(msg) => format!(
                "What happened: {msg}.\nLikely causes: A limit or zone name that the config does not define.\nHow to fix: Use max_distance, min_tilt_angle or max_tilt_angle, and zone names from [[zones]]."
            ),
            TrackerError::State(msg) => format!(
                "What happened: {msg}.\nLikely causes: The limit is configured as a plain number, which makes it fixed.\nHow to fix: Configure it as a table, e.g. `max_tilt_angle = {{ initial = 60.0, step = 1.0 }}`."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from loading files
    let chain = err
        .chain()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(": ");
    let lower = chain.to_ascii_lowercase();

    if lower.contains("frames csv must have headers") {
        return "Invalid headers in frames CSV. Expected 't_ms,slot,x,y,speed,resolution'.".to_string();
    }

    if lower.contains("frames csv") || lower.contains("invalid csv row") {
        return format!(
            "What happened: The recorded frames could not be read ({chain}).\nLikely causes: Missing file, a malformed row, or timestamps out of order.\nHow to fix: Check the CSV; rows sharing a t_ms form one frame and t_ms must not decrease."
        );
    }

    if lower.contains("failed to read config file") {
        return format!(
            "What happened: The config file could not be read ({chain}).\nLikely causes: Wrong --config path.\nHow to fix: Pass --config <FILE> pointing at an existing TOML file."
        );
    }

    if lower.contains("failed to parse toml") || lower.contains("invalid configuration") {
        return format!(
            "What happened: Configuration is invalid ({chain}).\nLikely causes: A typo, a value of the wrong type, or an out-of-range value.\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 configuration, 4 persistence, 5 input, 1 anything else.
/// Argument errors exit with 2 from clap before any of this runs.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 3;
    }
    match err.downcast_ref::<TrackerError>() {
        Some(TrackerError::Config(_) | TrackerError::State(_)) => 3,
        Some(TrackerError::Persist(_)) => 4,
        Some(TrackerError::Source(_) | TrackerError::Timeout) => 5,
        Some(_) => 1,
        None => {
            let lower = err.to_string().to_ascii_lowercase();
            if lower.contains("config") || lower.contains("toml") {
                3
            } else if lower.contains("csv") {
                5
            } else {
                1
            }
        }
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSource => "MissingSource",
            BuildError::MissingPublisher => "MissingPublisher",
            BuildError::InvalidConfig(_) => "InvalidConfig",
            BuildError::InvalidPolygon { .. } => "InvalidPolygon",
            BuildError::DuplicateZone(_) => "DuplicateZone",
            BuildError::TooManyZones(_) => "TooManyZones",
            BuildError::TooManyTargets(_) => "TooManyTargets",
            BuildError::TiltOrder { .. } => "TiltOrder",
        };
    }
    match err.downcast_ref::<TrackerError>() {
        Some(TrackerError::Config(_)) => "Config",
        Some(TrackerError::Source(_)) => "Source",
        Some(TrackerError::Timeout) => "Timeout",
        Some(TrackerError::State(_)) => "State",
        Some(TrackerError::Persist(_)) => "Persist",
        Some(TrackerError::Publish(_)) => "Publish",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = reason_name(err);
    let msg = humanize(err);
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::InvalidPolygon { zone, .. } | BuildError::DuplicateZone(zone)) => {
            json!({ "reason": reason, "details": { "zone": zone }, "message": msg }).to_string()
        }
        _ => json!({ "reason": reason, "message": msg, "exit_code": exit_code_for_error(err) })
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mmwave_core::PolygonError;

    #[test]
    fn build_errors_map_to_config_exit_code() {
        let err = eyre::Report::new(BuildError::InvalidPolygon {
            zone: "Desk".into(),
            reason: PolygonError::NotConvex,
        });
        assert_eq!(exit_code_for_error(&err), 3);
        assert!(humanize(&err).contains("Zone 'Desk'"));
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "InvalidPolygon");
        assert_eq!(v["details"]["zone"], "Desk");
    }

    #[test]
    fn persist_errors_have_their_own_code() {
        let err = eyre::Report::new(TrackerError::Persist("read-only".into()));
        assert_eq!(exit_code_for_error(&err), 4);
        assert!(humanize(&err).contains("could not be saved"));
    }

    #[test]
    fn csv_header_errors_are_explained() {
        let err = eyre::eyre!("frames CSV must have headers 't_ms,slot,x,y,speed,resolution', got: a,b");
        assert!(humanize(&err).starts_with("Invalid headers in frames CSV"));
        assert_eq!(exit_code_for_error(&err), 5);
    }
}
