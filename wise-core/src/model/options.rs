//! Option bundles carried by a scenario.
//!
//! Bundles are plain value structs with working defaults. Their `set_*`
//! methods follow the inline policy; direct field writes never do.

use crate::{
    duration::{Duration, SECONDS_PER_DAY, SECONDS_PER_MINUTE},
    error::Result,
    validation::{
        check_min, check_range, guard, guard_value, min_problem, range_problem, Validate,
        ValidationError,
    },
    wire::{nullable, tags, Streamable, WireField, WireWriter},
    wire_fields,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Longest acceleration timestep the Builder accepts.
pub const MAX_ACCEL_TIMESTEP_MINUTES: u32 = 5;

fn accel_problem(value: &Duration) -> Option<String> {
    if !value.is_valid() {
        Some("must be a positive duration".to_string())
    } else if value.to_seconds() > f64::from(MAX_ACCEL_TIMESTEP_MINUTES) * SECONDS_PER_MINUTE {
        Some(format!(
            "may not exceed {MAX_ACCEL_TIMESTEP_MINUTES} minutes, got {value}"
        ))
    } else {
        None
    }
}

fn percentile_problem(value: f64) -> Option<String> {
    (value.is_nan() || value <= 0.0 || value >= 100.0)
        .then(|| format!("must be strictly between 0 and 100, got {value}"))
}

/// Fire growth model settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FgmOptions {
    pub max_accel_timestep: Duration,
    /// Metres.
    pub distance_resolution: f64,
    /// Metres.
    pub perimeter_resolution: f64,
    /// Spread below this rate (m/min) is treated as no spread.
    pub minimum_spread_ros: f64,
    pub stop_at_grid_end: bool,
    pub breaching: bool,
    pub dynamic_spatial_threshold: bool,
    pub spotting: bool,
    pub purge_non_displayable: bool,
    /// Ignition perturbation in metres along x.
    pub dx: f64,
    /// Ignition perturbation in metres along y.
    pub dy: f64,
    /// Ignition start time perturbation.
    pub dt: Duration,
    pub growth_percentile_applied: bool,
    pub growth_percentile: f64,
    pub suppress_tight_concave: bool,
    /// Diameter in metres of a point ignition's initial polygon.
    pub ignition_size: f64,
    pub initial_vertex_count: u32,
}

impl Default for FgmOptions {
    fn default() -> Self {
        FgmOptions {
            max_accel_timestep: Duration::minutes(2),
            distance_resolution: 1.0,
            perimeter_resolution: 1.0,
            minimum_spread_ros: 0.0,
            stop_at_grid_end: true,
            breaching: true,
            dynamic_spatial_threshold: true,
            spotting: true,
            purge_non_displayable: false,
            dx: 0.0,
            dy: 0.0,
            dt: Duration::default(),
            growth_percentile_applied: false,
            growth_percentile: 50.0,
            suppress_tight_concave: false,
            ignition_size: 0.5,
            initial_vertex_count: 16,
        }
    }
}

impl FgmOptions {
    pub fn set_max_accel_timestep(&mut self, value: Duration) -> Result<()> {
        guard("maxAccelTimestep", accel_problem(&value))?;
        self.max_accel_timestep = value;
        Ok(())
    }

    pub fn set_distance_resolution(&mut self, value: f64) -> Result<()> {
        guard("distanceResolution", range_problem(value, 0.2, 10.0))?;
        self.distance_resolution = value;
        Ok(())
    }

    pub fn set_perimeter_resolution(&mut self, value: f64) -> Result<()> {
        guard("perimeterResolution", range_problem(value, 0.2, 10.0))?;
        self.perimeter_resolution = value;
        Ok(())
    }

    pub fn set_minimum_spread_ros(&mut self, value: f64) -> Result<()> {
        guard("minimumSpreadRos", min_problem(value, 0.0))?;
        self.minimum_spread_ros = value;
        Ok(())
    }

    /// Turn on percentile growth at `value`.
    pub fn set_growth_percentile(&mut self, value: f64) -> Result<()> {
        guard("growthPercentile", percentile_problem(value))?;
        self.growth_percentile = value;
        self.growth_percentile_applied = true;
        Ok(())
    }

    pub fn set_ignition_size(&mut self, value: f64) -> Result<()> {
        guard("ignitionSize", range_problem(value, 0.0, 25.0))?;
        self.ignition_size = value;
        Ok(())
    }
}

impl Validate for FgmOptions {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if let Some(message) = accel_problem(&self.max_accel_timestep) {
            errors.push(ValidationError::leaf("maxAccelTimestep", message));
        }
        check_range(&mut errors, "distanceResolution", self.distance_resolution, 0.2, 10.0);
        check_range(&mut errors, "perimeterResolution", self.perimeter_resolution, 0.2, 10.0);
        check_min(&mut errors, "minimumSpreadRos", self.minimum_spread_ros, 0.0);
        check_min(&mut errors, "dx", self.dx, 0.0);
        check_min(&mut errors, "dy", self.dy, 0.0);
        if self.dt.negative {
            errors.push(ValidationError::leaf("dt", "may not be negative"));
        }
        if let Some(message) = percentile_problem(self.growth_percentile) {
            errors.push(ValidationError::leaf("growthPercentile", message));
        }
        check_range(&mut errors, "ignitionSize", self.ignition_size, 0.0, 25.0);
        check_range(
            &mut errors,
            "initialVertexCount",
            f64::from(self.initial_vertex_count),
            6.0,
            64.0,
        );
        errors
    }
}

impl Streamable for FgmOptions {
    fn stream(&self, out: &mut WireWriter) {
        out.record(
            tags::FGM_OPTIONS,
            wire_fields![
                self.max_accel_timestep,
                self.distance_resolution,
                self.perimeter_resolution,
                self.minimum_spread_ros,
                self.stop_at_grid_end,
                self.breaching,
                self.dynamic_spatial_threshold,
                self.spotting,
                self.purge_non_displayable,
                self.dx,
                self.dy,
                self.dt,
                self.growth_percentile_applied,
                self.growth_percentile,
                self.suppress_tight_concave,
                self.ignition_size,
                self.initial_vertex_count,
            ],
        );
    }
}

/// Fire behaviour prediction switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FbpOptions {
    pub terrain_effect: bool,
    pub wind_effect: bool,
}

impl Default for FbpOptions {
    fn default() -> Self {
        FbpOptions {
            terrain_effect: true,
            wind_effect: true,
        }
    }
}

impl Validate for FbpOptions {
    fn check_valid(&self) -> Vec<ValidationError> {
        Vec::new()
    }
}

impl Streamable for FbpOptions {
    fn stream(&self, out: &mut WireWriter) {
        out.record(tags::FBP_OPTIONS, wire_fields![self.terrain_effect, self.wind_effect]);
    }
}

fn override_problem(value: f64) -> Option<String> {
    (value != -1.0 && !(0.0..=300.0).contains(&value))
        .then(|| format!("must be -1 or between 0 and 300, got {value}"))
}

fn nodata_elevation_problem(value: f64) -> Option<String> {
    (value != -99.0 && !(0.0..=7000.0).contains(&value))
        .then(|| format!("must be -99 or between 0 and 7000, got {value}"))
}

/// Foliar moisture content settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FmcOptions {
    /// Percent FMC used everywhere, or -1 to calculate it.
    pub percent_override: f64,
    /// Elevation used where the grid has no data, or -99 for none.
    pub nodata_elevation: f64,
    pub terrain: bool,
    pub accurate_location: bool,
}

impl Default for FmcOptions {
    fn default() -> Self {
        FmcOptions {
            percent_override: -1.0,
            nodata_elevation: -99.0,
            terrain: true,
            accurate_location: false,
        }
    }
}

impl FmcOptions {
    pub fn set_percent_override(&mut self, value: f64) -> Result<()> {
        guard("percentOverride", override_problem(value))?;
        self.percent_override = value;
        Ok(())
    }

    pub fn set_nodata_elevation(&mut self, value: f64) -> Result<()> {
        guard("nodataElevation", nodata_elevation_problem(value))?;
        self.nodata_elevation = value;
        Ok(())
    }
}

impl Validate for FmcOptions {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if let Some(message) = override_problem(self.percent_override) {
            errors.push(ValidationError::leaf("percentOverride", message));
        }
        if let Some(message) = nodata_elevation_problem(self.nodata_elevation) {
            errors.push(ValidationError::leaf("nodataElevation", message));
        }
        errors
    }
}

impl Streamable for FmcOptions {
    fn stream(&self, out: &mut WireWriter) {
        out.record(
            tags::FMC_OPTIONS,
            wire_fields![
                self.percent_override,
                self.nodata_elevation,
                self.terrain,
                self.accurate_location
            ],
        );
    }
}

/// Fire weather index interpolation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FwiOptions {
    pub spatial_interpolation: bool,
    pub from_spatial_weather: bool,
    pub history_on_effected_fwi: bool,
    pub burning_conditions_on: bool,
    pub temporal_interpolation: bool,
}

impl Default for FwiOptions {
    fn default() -> Self {
        FwiOptions {
            spatial_interpolation: false,
            from_spatial_weather: false,
            history_on_effected_fwi: false,
            burning_conditions_on: true,
            temporal_interpolation: false,
        }
    }
}

impl Validate for FwiOptions {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if (self.from_spatial_weather || self.history_on_effected_fwi) && !self.spatial_interpolation {
            errors.push(ValidationError::leaf(
                "spatialInterpolation",
                "is required by spatial weather and history options",
            ));
        }
        errors
    }
}

impl Streamable for FwiOptions {
    fn stream(&self, out: &mut WireWriter) {
        out.record(
            tags::FWI_OPTIONS,
            wire_fields![
                self.spatial_interpolation,
                self.from_spatial_weather,
                self.history_on_effected_fwi,
                self.burning_conditions_on,
                self.temporal_interpolation
            ],
        );
    }
}

/// Conditions a day must meet for the fire to burn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurningCondition {
    pub date: Option<NaiveDate>,
    /// Start of the burning window as an offset from local midnight.
    pub start_time: Duration,
    pub end_time: Duration,
    /// Burn only while FWI is above this value.
    pub fwi_greater: f64,
    /// Burn only while wind speed (km/h) is above this value.
    pub ws_greater: f64,
    /// Burn only while relative humidity (%) is below this value.
    pub rh_less: f64,
    /// Burn only while ISI is above this value.
    pub isi_greater: f64,
}

impl Default for BurningCondition {
    fn default() -> Self {
        BurningCondition {
            date: None,
            start_time: Duration::default(),
            end_time: Duration::hours(23),
            fwi_greater: 0.0,
            ws_greater: 0.0,
            rh_less: 100.0,
            isi_greater: 0.0,
        }
    }
}

impl BurningCondition {
    pub fn new(date: NaiveDate, start_time: Duration, end_time: Duration) -> Self {
        BurningCondition {
            date: Some(date),
            start_time,
            end_time,
            ..Default::default()
        }
    }

    pub fn set_window(&mut self, start_time: Duration, end_time: Duration) -> Result<()> {
        let candidate = BurningCondition {
            start_time,
            end_time,
            ..*self
        };
        guard("window", window_problem(&candidate))?;
        self.start_time = start_time;
        self.end_time = end_time;
        Ok(())
    }

    pub fn set_rh_less(&mut self, value: f64) -> Result<()> {
        guard("rhLess", range_problem(value, 0.0, 100.0))?;
        self.rh_less = value;
        Ok(())
    }
}

fn window_problem(condition: &BurningCondition) -> Option<String> {
    let start = condition.start_time.to_seconds();
    let end = condition.end_time.to_seconds();
    if condition.start_time.negative || condition.end_time.negative {
        Some("window times may not be negative".to_string())
    } else if end > SECONDS_PER_DAY || start > SECONDS_PER_DAY {
        Some("window must fall within one day".to_string())
    } else if start > end {
        Some(format!(
            "start {} is after end {}",
            condition.start_time, condition.end_time
        ))
    } else {
        None
    }
}

impl Validate for BurningCondition {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.date.is_none() {
            errors.push(ValidationError::leaf("date", "is required"));
        }
        if let Some(message) = window_problem(self) {
            errors.push(ValidationError::leaf("endTime", message));
        }
        check_min(&mut errors, "fwiGreater", self.fwi_greater, 0.0);
        check_range(&mut errors, "wsGreater", self.ws_greater, 0.0, 200.0);
        check_range(&mut errors, "rhLess", self.rh_less, 0.0, 100.0);
        check_min(&mut errors, "isiGreater", self.isi_greater, 0.0);
        errors
    }
}

impl Streamable for BurningCondition {
    fn stream(&self, out: &mut WireWriter) {
        let mut fields = vec![nullable(self.date.as_ref())];
        fields.extend(wire_fields![
            self.start_time,
            self.end_time,
            self.fwi_greater,
            self.ws_greater,
            self.rh_less,
            self.isi_greater
        ]);
        out.record(tags::BURNING_CONDITION, fields);
    }
}

/// A stop condition: the value must hold for `duration` before modelling
/// stops.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopThreshold {
    pub threshold: f64,
    pub duration: Duration,
}

impl Validate for StopThreshold {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_min(&mut errors, "threshold", self.threshold, 0.0);
        if !self.duration.is_valid() {
            errors.push(ValidationError::leaf("duration", "must be a positive duration"));
        }
        errors
    }
}

/// Conditions that end a scenario before its end time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StopModellingOptions {
    /// Stop this long after the first asset is reached.
    pub response_time: Option<Duration>,
    pub fi90: Option<StopThreshold>,
    pub fi95: Option<StopThreshold>,
    pub fi100: Option<StopThreshold>,
    pub rh: Option<StopThreshold>,
    pub precipitation: Option<StopThreshold>,
    pub area: Option<StopThreshold>,
    pub burn_distance: Option<StopThreshold>,
}

impl StopModellingOptions {
    fn thresholds(&self) -> [(&'static str, &Option<StopThreshold>); 7] {
        [
            ("fi90", &self.fi90),
            ("fi95", &self.fi95),
            ("fi100", &self.fi100),
            ("rh", &self.rh),
            ("precipitation", &self.precipitation),
            ("area", &self.area),
            ("burnDistance", &self.burn_distance),
        ]
    }
}

impl Validate for StopModellingOptions {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if let Some(response_time) = &self.response_time {
            if !response_time.is_valid() {
                errors.push(ValidationError::leaf("responseTime", "must be a positive duration"));
            }
        }
        for (name, threshold) in self.thresholds() {
            crate::validation::push_child(&mut errors, name, || "StopThreshold".into(), threshold);
        }
        if let Some(rh) = &self.rh {
            check_range(&mut errors, "rh", rh.threshold, 0.0, 100.0);
        }
        errors
    }
}

impl Streamable for StopModellingOptions {
    fn stream(&self, out: &mut WireWriter) {
        let mut fields = vec![nullable(self.response_time.as_ref())];
        for (_, threshold) in self.thresholds() {
            fields.push(nullable(threshold.as_ref().map(|t| &t.threshold)));
            fields.push(nullable(threshold.as_ref().map(|t| &t.duration)));
        }
        out.record(tags::STOP_OPTIONS, fields);
    }
}

/// How wind gusts are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GustingMode {
    #[default]
    NoGusting,
    AverageGusting,
    TimeDerivedGusting,
    RosDerivedGusting,
}

/// Where in the hour gusts are concentrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GustBias {
    Middle,
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GustingOptions {
    pub mode: GustingMode,
    pub percent_gusting: Option<f64>,
    pub gusts_per_hour: Option<u32>,
    pub bias: Option<GustBias>,
}

impl GustingOptions {
    pub fn new(mode: GustingMode, percent_gusting: f64) -> Self {
        GustingOptions {
            mode,
            percent_gusting: Some(percent_gusting),
            ..Default::default()
        }
    }

    pub fn set_gusts_per_hour(&mut self, value: u32, bias: GustBias) -> Result<()> {
        let candidate = GustingOptions {
            gusts_per_hour: Some(value),
            bias: Some(bias),
            ..*self
        };
        guard_value("gusting", &candidate)?;
        *self = candidate;
        Ok(())
    }
}

impl Validate for GustingOptions {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.mode == GustingMode::NoGusting {
            return errors;
        }
        match self.percent_gusting {
            Some(percent) => check_range(&mut errors, "percentGusting", percent, 0.0, 100.0),
            None => errors.push(ValidationError::leaf("percentGusting", "is required")),
        }
        if self.mode == GustingMode::TimeDerivedGusting {
            match self.gusts_per_hour {
                Some(count) => check_range(&mut errors, "gustsPerHour", f64::from(count), 1.0, 60.0),
                None => errors.push(ValidationError::leaf("gustsPerHour", "is required")),
            }
            if self.bias.is_none() {
                errors.push(ValidationError::leaf("bias", "is required"));
            }
        }
        errors
    }
}

impl Streamable for GustingOptions {
    fn stream(&self, out: &mut WireWriter) {
        let bias = self.bias.map(|bias| bias as u8);
        out.record(
            tags::GUSTING_OPTIONS,
            vec![
                (self.mode as u8).to_field(),
                nullable(self.percent_gusting.as_ref()),
                nullable(self.gusts_per_hour.as_ref()),
                nullable(bias.as_ref()),
            ],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{with_policy, Property};

    #[test]
    fn test_defaults_are_valid() {
        assert!(FgmOptions::default().is_valid());
        assert!(FbpOptions::default().is_valid());
        assert!(FmcOptions::default().is_valid());
        assert!(FwiOptions::default().is_valid());
        assert!(StopModellingOptions::default().is_valid());
        assert!(GustingOptions::default().is_valid());
    }

    #[test]
    fn test_fgm_ranges() {
        let options = FgmOptions {
            max_accel_timestep: Duration::minutes(6),
            distance_resolution: 0.1,
            growth_percentile: 100.0,
            ignition_size: 30.0,
            ..Default::default()
        };
        let properties: Vec<Property> = options
            .check_valid()
            .into_iter()
            .map(|e| e.property)
            .collect();
        assert_eq!(
            properties,
            vec![
                Property::from("maxAccelTimestep"),
                Property::from("distanceResolution"),
                Property::from("growthPercentile"),
                Property::from("ignitionSize"),
            ]
        );
    }

    #[test]
    fn test_fgm_setters_follow_policy() {
        with_policy(true, || {
            let mut options = FgmOptions::default();
            assert!(options.set_max_accel_timestep(Duration::minutes(5)).is_ok());
            assert!(options.set_max_accel_timestep(Duration::minutes(10)).is_err());
            assert_eq!(options.max_accel_timestep, Duration::minutes(5));
            assert!(options.set_growth_percentile(0.0).is_err());
            assert!(!options.growth_percentile_applied);
            options.set_growth_percentile(90.0).unwrap();
            assert!(options.growth_percentile_applied);
        });
        with_policy(false, || {
            let mut options = FgmOptions::default();
            options.set_perimeter_resolution(11.0).unwrap();
            assert_eq!(options.check_valid().len(), 1);
        });
    }

    #[test]
    fn test_fmc_sentinels() {
        with_policy(true, || {
            let mut options = FmcOptions::default();
            options.set_percent_override(-1.0).unwrap();
            options.set_percent_override(120.0).unwrap();
            assert!(options.set_percent_override(-2.0).is_err());
            options.set_nodata_elevation(-99.0).unwrap();
            assert!(options.set_nodata_elevation(7500.0).is_err());
            assert_eq!(options.percent_override, 120.0);
        });
    }

    #[test]
    fn test_burning_condition_window() {
        let date = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
        let condition = BurningCondition::new(date, Duration::hours(20), Duration::hours(8));
        assert_eq!(condition.check_valid().len(), 1);
        let mut out = WireWriter::new();
        BurningCondition::new(date, Duration::default(), Duration::hours(23)).stream(&mut out);
        assert_eq!(
            out.render(),
            "burningcondition\n2019-01-01|PT0S|PT23H|0|0|100|0\n"
        );
    }

    #[test]
    fn test_stop_options_stream_nulls() {
        let options = StopModellingOptions {
            response_time: Some(Duration::hours(2)),
            rh: Some(StopThreshold {
                threshold: 80.0,
                duration: Duration::hours(1),
            }),
            ..Default::default()
        };
        let mut out = WireWriter::new();
        options.stream(&mut out);
        assert_eq!(
            out.render(),
            "stopoptions\nPT2H|null|null|null|null|null|null|80|PT1H|null|null|null|null|null|null\n"
        );
    }

    #[test]
    fn test_gusting_requirements() {
        let mut gusting = GustingOptions::new(GustingMode::TimeDerivedGusting, 40.0);
        assert_eq!(gusting.check_valid().len(), 2);
        gusting.set_gusts_per_hour(4, GustBias::Start).unwrap();
        assert!(gusting.is_valid());
        let mut out = WireWriter::new();
        gusting.stream(&mut out);
        assert_eq!(out.render(), "gustingoptions\n2|40|4|1\n");
    }
}
