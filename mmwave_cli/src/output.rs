//! Console publisher: prints entity values when they change.

use mmwave_traits::{BoxError, Publisher, TargetValues};
use serde_json::json;
use std::collections::HashMap;
use std::io::Write;

#[derive(Debug, Clone, PartialEq)]
enum Shown {
    Target(Option<TargetValues>),
    Occupancy(bool),
    Count(Option<u8>),
    Presence(bool, Option<u8>),
}

/// Writes one line per changed entity, either human-readable or JSON.
///
/// The tracker republishes zone and presence values every frame; repeats of
/// the last shown value are skipped.
pub struct StdoutPublisher<W: Write = std::io::Stdout> {
    out: W,
    json: bool,
    last: HashMap<String, Shown>,
}

impl StdoutPublisher {
    pub fn new(json: bool) -> Self {
        Self::with_writer(std::io::stdout(), json)
    }
}

impl<W: Write> StdoutPublisher<W> {
    pub fn with_writer(out: W, json: bool) -> Self {
        Self {
            out,
            json,
            last: HashMap::new(),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    /// True when `value` differs from what was last shown under `key`.
    fn changed(&mut self, key: String, value: Shown) -> bool {
        if self.last.get(&key) == Some(&value) {
            return false;
        }
        self.last.insert(key, value);
        true
    }

    fn emit(&mut self, human: String, json: serde_json::Value) -> Result<(), BoxError> {
        if self.json {
            writeln!(self.out, "{json}")?;
        } else {
            writeln!(self.out, "{human}")?;
        }
        Ok(())
    }
}

fn opt_count(count: Option<u8>) -> String {
    count.map_or_else(|| "unknown".to_string(), |c| c.to_string())
}

impl<W: Write> Publisher for StdoutPublisher<W> {
    fn publish_target(
        &mut self,
        slot: usize,
        name: &str,
        values: Option<&TargetValues>,
    ) -> Result<(), BoxError> {
        if !self.changed(format!("target/{slot}"), Shown::Target(values.copied())) {
            return Ok(());
        }
        match values {
            Some(v) => self.emit(
                format!(
                    "target {} \"{name}\": x={:.2} y={:.2} speed={:.2} distance={:.2} angle={:.1} resolution={:.2}",
                    slot + 1,
                    v.x,
                    v.y,
                    v.speed,
                    v.distance,
                    v.angle,
                    v.distance_resolution
                ),
                json!({
                    "event": "target",
                    "slot": slot,
                    "name": name,
                    "active": true,
                    "x": v.x,
                    "y": v.y,
                    "speed": v.speed,
                    "distance": v.distance,
                    "angle": v.angle,
                    "distance_resolution": v.distance_resolution,
                }),
            ),
            None => self.emit(
                format!("target {} \"{name}\": inactive", slot + 1),
                json!({ "event": "target", "slot": slot, "name": name, "active": false }),
            ),
        }
    }

    fn publish_zone_occupancy(&mut self, zone: &str, occupied: bool) -> Result<(), BoxError> {
        if !self.changed(format!("zone/{zone}/occupied"), Shown::Occupancy(occupied)) {
            return Ok(());
        }
        self.emit(
            format!("zone \"{zone}\": occupied={occupied}"),
            json!({ "event": "zone_occupancy", "zone": zone, "occupied": occupied }),
        )
    }

    fn publish_zone_target_count(
        &mut self,
        zone: &str,
        count: Option<u8>,
    ) -> Result<(), BoxError> {
        if !self.changed(format!("zone/{zone}/count"), Shown::Count(count)) {
            return Ok(());
        }
        self.emit(
            format!("zone \"{zone}\": targets={}", opt_count(count)),
            json!({ "event": "zone_target_count", "zone": zone, "target_count": count }),
        )
    }

    fn publish_presence(
        &mut self,
        occupied: bool,
        target_count: Option<u8>,
    ) -> Result<(), BoxError> {
        if !self.changed("presence".into(), Shown::Presence(occupied, target_count)) {
            return Ok(());
        }
        self.emit(
            format!(
                "presence: occupied={occupied} targets={}",
                opt_count(target_count)
            ),
            json!({ "event": "presence", "occupied": occupied, "target_count": target_count }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(p: StdoutPublisher<Vec<u8>>) -> String {
        String::from_utf8(p.into_inner()).unwrap()
    }

    #[test]
    fn repeats_are_suppressed() {
        let mut p = StdoutPublisher::with_writer(Vec::new(), false);
        p.publish_zone_occupancy("Desk", true).unwrap();
        p.publish_zone_occupancy("Desk", true).unwrap();
        p.publish_zone_occupancy("Desk", false).unwrap();
        p.publish_presence(false, None).unwrap();
        assert_eq!(
            text(p),
            "zone \"Desk\": occupied=true\nzone \"Desk\": occupied=false\npresence: occupied=false targets=unknown\n"
        );
    }

    #[test]
    fn json_lines_carry_event_kind() {
        let mut p = StdoutPublisher::with_writer(Vec::new(), true);
        let v = TargetValues {
            x: 0.5,
            y: 1.0,
            distance: 1.118,
            ..TargetValues::default()
        };
        p.publish_target(0, "Target 1", Some(&v)).unwrap();
        p.publish_target(0, "Target 1", None).unwrap();
        let out = text(p);
        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "target");
        assert_eq!(lines[0]["active"], true);
        assert_eq!(lines[1]["active"], false);
    }
}
