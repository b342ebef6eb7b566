//! A single simulation run and its wire fragment.
//!
//! A scenario is streamed as a block delimited by `scenariobegin` and
//! `scenarioend`. Inside the block every scalar is its own record, in this
//! order: name, comments, start time, end time, display interval. The option
//! bundles follow (FGM, FBP, FMC, FWI), then burning conditions and the
//! reference records. The Builder reads the block statefully, so the order
//! does not change between releases.

use super::{
    options::{
        BurningCondition, FbpOptions, FgmOptions, FmcOptions, FwiOptions, GustingOptions,
        StopModellingOptions,
    },
    reference::{AssetReference, IgnitionReference, LayerInfo, StationStream, TargetReference},
};
use crate::{
    duration::Duration,
    error::{Result, WiseError},
    id::{check_id, next_default_id, Entity, EntityKind},
    validation::{
        check_comments, guard, guard_value, push_child, push_items, text_problem, Validate,
        ValidationError,
    },
    wire::{nullable, tags, Streamable, WireReader, WireRecord, WireWriter},
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use wise_utils::dates;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub id: String,
    pub comments: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    /// How often intermediate perimeters are reported.
    pub display_interval: Duration,
    pub fgm_options: FgmOptions,
    pub fbp_options: FbpOptions,
    pub fmc_options: FmcOptions,
    pub fwi_options: FwiOptions,
    pub burning_conditions: Vec<BurningCondition>,
    /// Ids of fuel breaks that apply to this scenario.
    pub vectors: Vec<String>,
    pub station_streams: Vec<StationStream>,
    pub ignitions: Vec<IgnitionReference>,
    pub layers: Vec<LayerInfo>,
    pub assets: Vec<AssetReference>,
    pub wind_target: Option<TargetReference>,
    pub vector_target: Option<TargetReference>,
    pub stop_options: Option<StopModellingOptions>,
    pub gusting: Option<GustingOptions>,
}

impl Default for Scenario {
    fn default() -> Self {
        Scenario {
            id: next_default_id(EntityKind::Scenario),
            comments: None,
            start_time: None,
            end_time: None,
            display_interval: Duration::hours(1),
            fgm_options: FgmOptions::default(),
            fbp_options: FbpOptions::default(),
            fmc_options: FmcOptions::default(),
            fwi_options: FwiOptions::default(),
            burning_conditions: Vec::new(),
            vectors: Vec::new(),
            station_streams: Vec::new(),
            ignitions: Vec::new(),
            layers: Vec::new(),
            assets: Vec::new(),
            wind_target: None,
            vector_target: None,
            stop_options: None,
            gusting: None,
        }
    }
}

fn window_problem(start: NaiveDateTime, end: NaiveDateTime) -> Option<String> {
    (start >= end).then(|| format!("end {end} is not after start {start}"))
}

impl Scenario {
    pub fn new(start_time: NaiveDateTime, end_time: NaiveDateTime) -> Self {
        Scenario {
            start_time: Some(start_time),
            end_time: Some(end_time),
            ..Default::default()
        }
    }

    pub fn set_times(&mut self, start_time: NaiveDateTime, end_time: NaiveDateTime) -> Result<()> {
        guard("endTime", window_problem(start_time, end_time))?;
        self.start_time = Some(start_time);
        self.end_time = Some(end_time);
        Ok(())
    }

    pub fn set_display_interval(&mut self, interval: Duration) -> Result<()> {
        let problem = (!interval.is_valid()).then(|| "must be a positive duration".to_string());
        guard("displayInterval", problem)?;
        self.display_interval = interval;
        Ok(())
    }

    pub fn set_fgm_options(&mut self, options: FgmOptions) -> Result<()> {
        guard_value("fgmOptions", &options)?;
        self.fgm_options = options;
        Ok(())
    }

    pub fn set_fmc_options(&mut self, options: FmcOptions) -> Result<()> {
        guard_value("fmcOptions", &options)?;
        self.fmc_options = options;
        Ok(())
    }

    /// Use a weather stream. A lone stream is used as primary whether or
    /// not it is marked; with several, exactly one must be marked primary.
    pub fn add_station_stream(&mut self, station: &str, stream: &str, primary: bool) -> Result<()> {
        let reference = StationStream::new(station, stream, primary);
        guard_value("stationStreams", &reference)?;
        let problem = (primary && self.station_streams.iter().any(|s| s.primary))
            .then(|| "only one stream may be primary".to_string());
        guard("stationStreams", problem)?;
        self.station_streams.push(reference);
        Ok(())
    }

    pub fn add_ignition(&mut self, ignition: &str) -> Result<&mut IgnitionReference> {
        guard("ignitions", text_problem(ignition))?;
        self.ignitions.push(IgnitionReference::new(ignition));
        let index = self.ignitions.len() - 1;
        Ok(&mut self.ignitions[index])
    }

    pub fn add_fuel_break(&mut self, fuel_break: &str) -> Result<()> {
        guard("vectors", text_problem(fuel_break))?;
        self.vectors.push(fuel_break.to_string());
        Ok(())
    }

    pub fn add_layer(&mut self, layer: &str, index: u32) -> Result<()> {
        guard("layers", text_problem(layer))?;
        self.layers.push(LayerInfo::new(layer, index));
        Ok(())
    }

    pub fn add_asset(&mut self, asset: AssetReference) -> Result<()> {
        guard_value("assets", &asset)?;
        self.assets.push(asset);
        Ok(())
    }

    pub fn add_burning_condition(&mut self, condition: BurningCondition) -> Result<()> {
        guard_value("burningConditions", &condition)?;
        self.burning_conditions.push(condition);
        Ok(())
    }

    /// Rebuild the scalar fields and references of a scenario from its wire
    /// fragment. Option bundles other than FBP keep their defaults.
    pub fn from_records(records: &[WireRecord]) -> Result<Scenario> {
        let begin = records
            .iter()
            .position(|r| r.tag == tags::SCENARIO_BEGIN)
            .ok_or_else(|| WiseError::invalid("scenario", "missing scenariobegin"))?;
        let end = records[begin..]
            .iter()
            .position(|r| r.tag == tags::SCENARIO_END)
            .map(|offset| begin + offset)
            .ok_or_else(|| WiseError::invalid("scenario", "missing scenarioend"))?;
        let block = &records[begin + 1..end];

        let name = WireReader::find(block, tags::SCENARIO_NAME)
            .and_then(|r| r.field(0))
            .ok_or_else(|| WiseError::invalid("scenarioname", "missing"))?;
        let mut scenario = Scenario {
            id: name.to_string(),
            ..Default::default()
        };
        scenario.comments = WireReader::find(block, tags::SCENARIO_COMMENTS)
            .and_then(|r| r.field(0))
            .map(str::to_string);
        scenario.start_time = read_time(block, tags::START_TIME)?;
        scenario.end_time = read_time(block, tags::END_TIME)?;
        if let Some(text) = WireReader::find(block, tags::DISPLAY_INTERVAL).and_then(|r| r.field(0)) {
            scenario.display_interval = text.parse()?;
        }
        if let Some(record) = WireReader::find(block, tags::FBP_OPTIONS) {
            scenario.fbp_options = FbpOptions {
                terrain_effect: record.field(0) == Some("true"),
                wind_effect: record.field(1) == Some("true"),
            };
        }
        for record in WireReader::find_all(block, tags::VECTOR_REF) {
            scenario.vectors.extend(record.field(0).map(str::to_string));
        }
        for record in WireReader::find_all(block, tags::STREAM_REF) {
            if let (Some(station), Some(stream)) = (record.field(0), record.field(1)) {
                scenario
                    .station_streams
                    .push(StationStream::new(station, stream, record.field(2) == Some("true")));
            }
        }
        for record in WireReader::find_all(block, tags::IGNITION_REF) {
            scenario
                .ignitions
                .extend(record.field(0).map(IgnitionReference::new));
        }
        for record in WireReader::find_all(block, tags::LAYER_INFO) {
            if let (Some(layer), Some(index)) = (record.field(0), record.field(1)) {
                let index = index
                    .parse()
                    .map_err(|_| WiseError::invalid("layerinfo", format!("bad index '{index}'")))?;
                scenario.layers.push(LayerInfo::new(layer, index));
            }
        }
        Ok(scenario)
    }
}

fn read_time(block: &[WireRecord], tag: &str) -> Result<Option<NaiveDateTime>> {
    match WireReader::find(block, tag).and_then(|r| r.field(0)) {
        None | Some(tags::NULL) => Ok(None),
        Some(text) => dates::parse_date_time(text)
            .map(Some)
            .map_err(|e| WiseError::invalid(tag, e.to_string())),
    }
}

impl Validate for Scenario {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_id(&mut errors, &self.id);
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => {
                if let Some(message) = window_problem(start, end) {
                    errors.push(ValidationError::leaf("endTime", message));
                }
            }
            (start, end) => {
                if start.is_none() {
                    errors.push(ValidationError::leaf("startTime", "is required"));
                }
                if end.is_none() {
                    errors.push(ValidationError::leaf("endTime", "is required"));
                }
            }
        }
        if !self.display_interval.is_valid() {
            errors.push(ValidationError::leaf("displayInterval", "must be a positive duration"));
        }
        push_child(&mut errors, "fgmOptions", || "FgmOptions".into(), &self.fgm_options);
        push_child(&mut errors, "fbpOptions", || "FbpOptions".into(), &self.fbp_options);
        push_child(&mut errors, "fmcOptions", || "FmcOptions".into(), &self.fmc_options);
        push_child(&mut errors, "fwiOptions", || "FwiOptions".into(), &self.fwi_options);
        push_items(&mut errors, "burningConditions", &self.burning_conditions);
        let bad_vectors: Vec<ValidationError> = self
            .vectors
            .iter()
            .enumerate()
            .filter_map(|(index, vector)| {
                text_problem(vector).map(|message| ValidationError::leaf(index, message))
            })
            .collect();
        if !bad_vectors.is_empty() {
            errors.push(ValidationError::node(
                "vectors",
                "contains invalid entries",
                bad_vectors,
            ));
        }

        if self.station_streams.is_empty() {
            errors.push(ValidationError::leaf(
                "stationStreams",
                "needs at least one weather stream",
            ));
        } else if self.station_streams.len() > 1 {
            let primaries = self.station_streams.iter().filter(|s| s.primary).count();
            if primaries != 1 {
                errors.push(ValidationError::leaf(
                    "stationStreams",
                    format!("exactly one stream must be primary, found {primaries}"),
                ));
            }
        }
        push_items(&mut errors, "stationStreams", &self.station_streams);
        if self.ignitions.is_empty() {
            errors.push(ValidationError::leaf("ignitions", "needs at least one ignition"));
        }
        push_items(&mut errors, "ignitions", &self.ignitions);
        push_items(&mut errors, "layers", &self.layers);
        push_items(&mut errors, "assets", &self.assets);
        push_child(&mut errors, "windTarget", || "TargetReference".into(), &self.wind_target);
        push_child(&mut errors, "vectorTarget", || "TargetReference".into(), &self.vector_target);
        push_child(
            &mut errors,
            "stopOptions",
            || "StopModellingOptions".into(),
            &self.stop_options,
        );
        push_child(&mut errors, "gusting", || "GustingOptions".into(), &self.gusting);
        check_comments(&mut errors, &self.comments);
        errors
    }
}

impl Entity for Scenario {
    const KIND: EntityKind = EntityKind::Scenario;

    fn id(&self) -> &str {
        &self.id
    }

    fn id_mut(&mut self) -> &mut String {
        &mut self.id
    }
}

impl Streamable for Scenario {
    fn stream(&self, out: &mut WireWriter) {
        out.marker(tags::SCENARIO_BEGIN);
        out.value(tags::SCENARIO_NAME, &self.id);
        out.optional(tags::SCENARIO_COMMENTS, self.comments.as_ref());
        out.value(tags::START_TIME, nullable(self.start_time.as_ref()));
        out.value(tags::END_TIME, nullable(self.end_time.as_ref()));
        out.value(tags::DISPLAY_INTERVAL, self.display_interval);
        out.stream(&self.fgm_options)
            .stream(&self.fbp_options)
            .stream(&self.fmc_options)
            .stream(&self.fwi_options)
            .stream(&self.burning_conditions);
        for vector in &self.vectors {
            out.value(tags::VECTOR_REF, vector);
        }
        for reference in &self.station_streams {
            reference.stream_into(out);
        }
        for reference in &self.ignitions {
            reference.stream_into(out);
        }
        for layer in &self.layers {
            layer.stream_into(out);
        }
        for asset in &self.assets {
            asset.stream_into(out);
        }
        if let Some(target) = &self.wind_target {
            target.stream_into(tags::WIND_TARGET, out);
        }
        if let Some(target) = &self.vector_target {
            target.stream_into(tags::VECTOR_TARGET, out);
        }
        out.stream(&self.stop_options).stream(&self.gusting);
        out.marker(tags::SCENARIO_END);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{with_policy, Property};
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn runnable() -> Scenario {
        let mut scenario = Scenario::new(at(1), at(2));
        scenario.id = "scen0".into();
        scenario.add_station_stream("ws", "stream", true).unwrap();
        scenario.add_ignition("ign").unwrap();
        scenario
    }

    #[test]
    fn test_default_reports_required_fields() {
        let properties: Vec<Property> = Scenario::default()
            .check_valid()
            .into_iter()
            .map(|e| e.property)
            .collect();
        assert_eq!(
            properties,
            vec![
                Property::from("startTime"),
                Property::from("endTime"),
                Property::from("stationStreams"),
                Property::from("ignitions"),
            ]
        );
    }

    #[test]
    fn test_fragment_order() {
        let mut out = WireWriter::new();
        runnable().stream(&mut out);
        let lines = out.lines();
        assert_eq!(
            lines[..10],
            [
                "scenariobegin",
                "scenarioname",
                "scen0",
                "starttime",
                "2019-01-01T00:00:00",
                "endtime",
                "2019-01-02T00:00:00",
                "displayinterval",
                "PT1H",
                "fgmoptions",
            ]
        );
        assert_eq!(lines.last().map(String::as_str), Some("scenarioend"));
        let tags_seen: Vec<String> = WireReader::parse(&out.render())
            .into_iter()
            .map(|r| r.tag)
            .collect();
        let position = |tag: &str| tags_seen.iter().position(|t| t == tag).unwrap();
        assert!(position(tags::FWI_OPTIONS) < position(tags::STREAM_REF));
        assert!(position(tags::STREAM_REF) < position(tags::IGNITION_REF));
    }

    #[test]
    fn test_fragment_round_trip() {
        let mut scenario = runnable();
        scenario.comments = Some("day one".into());
        scenario.add_fuel_break("river").unwrap();
        scenario.add_layer("fuelpatch0", 2).unwrap();
        let mut out = WireWriter::new();
        scenario.stream(&mut out);
        let parsed = Scenario::from_records(&WireReader::parse(&out.render())).unwrap();
        assert_eq!(parsed.id, "scen0");
        assert_eq!(parsed.start_time, Some(at(1)));
        assert_eq!(parsed.end_time, Some(at(2)));
        assert_eq!(parsed.display_interval, Duration::hours(1));
        assert_eq!(parsed.comments.as_deref(), Some("day one"));
        assert_eq!(parsed.station_streams, scenario.station_streams);
        assert_eq!(parsed.ignitions, scenario.ignitions);
        assert_eq!(parsed.vectors, vec!["river"]);
        assert_eq!(parsed.layers, scenario.layers);
    }

    #[test]
    fn test_start_must_precede_end() {
        with_policy(true, || {
            let mut scenario = runnable();
            assert!(scenario.set_times(at(2), at(2)).is_err());
            assert_eq!(scenario.start_time, Some(at(1)));
        });
        let mut scenario = runnable();
        scenario.end_time = Some(at(1));
        assert_eq!(scenario.check_valid().len(), 1);
    }

    #[test]
    fn test_primary_stream_rules() {
        with_policy(false, || {
            let mut scenario = runnable();
            scenario.add_station_stream("ws", "second", false).unwrap();
            assert!(scenario.is_valid());
            scenario.add_station_stream("ws", "third", true).unwrap();
            let errors = scenario.check_valid();
            assert_eq!(errors.len(), 1);
            assert!(errors[0].message.contains("exactly one"));
        });
        with_policy(true, || {
            let mut scenario = runnable();
            assert!(scenario.add_station_stream("ws", "third", true).is_err());
            assert_eq!(scenario.station_streams.len(), 1);
        });
    }

    #[test]
    fn test_bad_vectors_share_one_node() {
        let mut scenario = runnable();
        scenario.vectors = vec!["river".into(), "".into(), "a|b".into()];
        let errors = scenario.check_valid();
        assert_eq!(errors.len(), 1);
        let paths: Vec<String> = errors[0].flatten().into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["vectors[1]", "vectors[2]"]);
    }

    #[test]
    fn test_single_unmarked_stream_is_enough() {
        let mut scenario = Scenario::new(at(1), at(2));
        scenario.station_streams.push(StationStream::new("ws", "stream", false));
        scenario.ignitions.push(IgnitionReference::new("ign"));
        assert!(scenario.is_valid());
    }

    #[test]
    fn test_nested_option_errors() {
        let mut scenario = runnable();
        scenario.fmc_options.percent_override = 500.0;
        let errors = scenario.check_valid();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].flatten()[0].0, "fmcOptions.percentOverride");
        assert_eq!(errors[0].object.as_deref(), Some("FmcOptions"));
    }
}
