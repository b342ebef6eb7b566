//! Records a scenario uses to point at entities owned by the inputs.
//!
//! References hold the target's id as a plain string. They are checked
//! against the inputs by the job's resolve pass, never at construction.

use crate::{
    duration::Duration,
    validation::{check_min, check_range, require_text, Validate, ValidationError},
    wire::{nullable, tags, WireField, WireWriter},
    wire_fields,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A weather stream, identified by its station and its own id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StationStream {
    pub station: String,
    pub stream: String,
    pub primary: bool,
}

impl StationStream {
    pub fn new(station: impl Into<String>, stream: impl Into<String>, primary: bool) -> Self {
        StationStream {
            station: station.into(),
            stream: stream.into(),
            primary,
        }
    }

    pub(crate) fn stream_into(&self, out: &mut WireWriter) {
        out.record(tags::STREAM_REF, wire_fields![self.station, self.stream, self.primary]);
    }
}

impl Validate for StationStream {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "station", &self.station);
        require_text(&mut errors, "stream", &self.stream);
        errors
    }
}

/// Perturbations that turn one ignition into a sub-scenario.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubScenarioOptions {
    pub name: String,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub dx: f64,
    pub dy: f64,
    pub dt: Duration,
    /// Change in wind direction, degrees.
    pub dwd: f64,
    /// Fixed wind direction, degrees.
    pub wind_direction: Option<f64>,
}

impl Validate for SubScenarioOptions {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "name", &self.name);
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if start >= end {
                errors.push(ValidationError::leaf(
                    "endTime",
                    format!("end {end} is not after start {start}"),
                ));
            }
        }
        check_range(&mut errors, "dwd", self.dwd, -360.0, 360.0);
        if let Some(direction) = self.wind_direction {
            check_range(&mut errors, "windDirection", direction, 0.0, 360.0);
        }
        errors
    }
}

/// Use of an ignition, optionally as its own sub-scenario.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnitionReference {
    pub ignition: String,
    pub sub_scenario: Option<SubScenarioOptions>,
}

impl IgnitionReference {
    pub fn new(ignition: impl Into<String>) -> Self {
        IgnitionReference {
            ignition: ignition.into(),
            sub_scenario: None,
        }
    }

    pub(crate) fn stream_into(&self, out: &mut WireWriter) {
        out.value(tags::IGNITION_REF, &self.ignition);
        if let Some(sub) = &self.sub_scenario {
            out.record(
                tags::SUB_SCENARIO,
                vec![
                    self.ignition.clone(),
                    sub.name.clone(),
                    nullable(sub.start_time.as_ref()),
                    nullable(sub.end_time.as_ref()),
                    sub.dx.to_field(),
                    sub.dy.to_field(),
                    sub.dt.to_field(),
                    sub.dwd.to_field(),
                    nullable(sub.wind_direction.as_ref()),
                ],
            );
        }
    }
}

impl Validate for IgnitionReference {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "ignition", &self.ignition);
        crate::validation::push_child(
            &mut errors,
            "subScenario",
            || "SubScenarioOptions".into(),
            &self.sub_scenario,
        );
        errors
    }
}

/// Stacking position of a grid, patch or weather layer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerInfo {
    pub layer: String,
    /// Higher indices are applied on top of lower ones.
    pub index: u32,
}

impl LayerInfo {
    pub fn new(layer: impl Into<String>, index: u32) -> Self {
        LayerInfo {
            layer: layer.into(),
            index,
        }
    }

    pub(crate) fn stream_into(&self, out: &mut WireWriter) {
        out.record(tags::LAYER_INFO, wire_fields![self.layer, self.index]);
    }
}

impl Validate for LayerInfo {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "layer", &self.layer);
        errors
    }
}

/// What happens when the fire reaches an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "count", rename_all = "snake_case")]
pub enum AssetOperation {
    #[default]
    NoEffect,
    StopImmediately,
    /// Stop once this many asset geometries have been reached.
    StopAfter(u32),
    StopAfterAll,
}

impl AssetOperation {
    fn code(self) -> i32 {
        match self {
            AssetOperation::NoEffect => -1,
            AssetOperation::StopImmediately => 0,
            AssetOperation::StopAfter(_) => 1,
            AssetOperation::StopAfterAll => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetReference {
    pub asset: String,
    pub operation: AssetOperation,
}

impl AssetReference {
    pub fn new(asset: impl Into<String>, operation: AssetOperation) -> Self {
        AssetReference {
            asset: asset.into(),
            operation,
        }
    }

    pub(crate) fn stream_into(&self, out: &mut WireWriter) {
        let count = match self.operation {
            AssetOperation::StopAfter(count) => Some(count),
            _ => None,
        };
        out.record(
            tags::ASSET_REF,
            vec![
                self.asset.clone(),
                self.operation.code().to_field(),
                nullable(count.as_ref()),
            ],
        );
    }
}

impl Validate for AssetReference {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "asset", &self.asset);
        if let AssetOperation::StopAfter(count) = self.operation {
            check_min(&mut errors, "operation", f64::from(count), 1.0);
        }
        errors
    }
}

/// A point in a target file, used by wind and vector targets.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetReference {
    pub target: String,
    pub geometry_index: Option<u32>,
    pub point_index: Option<u32>,
}

impl TargetReference {
    pub fn new(target: impl Into<String>) -> Self {
        TargetReference {
            target: target.into(),
            ..Default::default()
        }
    }

    pub(crate) fn stream_into(&self, tag: &str, out: &mut WireWriter) {
        out.record(
            tag,
            vec![
                self.target.clone(),
                nullable(self.geometry_index.as_ref()),
                nullable(self.point_index.as_ref()),
            ],
        );
    }
}

impl Validate for TargetReference {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "target", &self.target);
        if self.point_index.is_some() && self.geometry_index.is_none() {
            errors.push(ValidationError::leaf(
                "geometryIndex",
                "is required when a point index is set",
            ));
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_scenario_follows_ignition_ref() {
        let mut reference = IgnitionReference::new("ign");
        reference.sub_scenario = Some(SubScenarioOptions {
            name: "west".into(),
            dwd: -10.0,
            ..Default::default()
        });
        assert!(reference.is_valid());
        let mut out = WireWriter::new();
        reference.stream_into(&mut out);
        assert_eq!(
            out.render(),
            "ignitionref\nign\nsubscenario\nign|west|null|null|0|0|PT0S|-10|null\n"
        );
    }

    #[test]
    fn test_asset_operation_codes() {
        let mut out = WireWriter::new();
        AssetReference::new("cabins", AssetOperation::StopAfter(3)).stream_into(&mut out);
        AssetReference::new("roads", AssetOperation::NoEffect).stream_into(&mut out);
        assert_eq!(
            out.render(),
            "assetref\ncabins|1|3\nassetref\nroads|-1|null\n"
        );
        assert!(!AssetReference::new("a", AssetOperation::StopAfter(0)).is_valid());
    }

    #[test]
    fn test_target_point_needs_geometry() {
        let reference = TargetReference {
            target: "tgt".into(),
            geometry_index: None,
            point_index: Some(2),
        };
        assert_eq!(reference.check_valid().len(), 1);
    }
}
