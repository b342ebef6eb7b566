//! The Builder's line-oriented record format.
//!
//! A record is a tag line followed, unless the tag is a marker, by one line
//! of `|`-joined fields:
//!
//! ```text
//! scenariobegin
//! scenarioname
//! scen0
//! starttime
//! 2019-01-01T00:00:00
//! ```
//!
//! The Builder parses records statefully, line by line, so the order in
//! which a [`Streamable`] type emits its records is part of the protocol.
//! [`WireWriter`] collects emissions without touching any socket; the
//! transport only ever sees the rendered lines.

use crate::duration::Duration;
use chrono::{NaiveDate, NaiveDateTime};
use wise_utils::{dates, fields::split_line};

/// Parameter tags understood by the Builder.
pub mod tags {
    pub const JOB_OPTIONS: &str = "joboptions";
    pub const JOB_NAME: &str = "jobname";
    pub const JOB_COMMENTS: &str = "jobcomments";
    pub const TIMEZONE: &str = "timezone";
    pub const PROJECTION_FILE: &str = "projfile";
    pub const LUT_FILE: &str = "lutfile";
    pub const FUELMAP_FILE: &str = "fuelmapfile";
    pub const ELEVATION_FILE: &str = "elevationfile";

    pub const FUEL_DEFINITION: &str = "fueldefinition";
    pub const FUEL_SPREAD: &str = "fuelspread";
    pub const FUEL_FMC: &str = "fuelfmc";
    pub const FUEL_SFC: &str = "fuelsfc";
    pub const FUEL_ROS: &str = "fuelros";
    pub const FUEL_ACCEL: &str = "fuelaccel";
    pub const FUEL_LB: &str = "fuellb";
    pub const FUEL_CFB: &str = "fuelcfb";
    pub const FUEL_FLAME_LENGTH: &str = "fuelflamelength";

    pub const GRID_FILE: &str = "gridfile";
    pub const FUEL_PATCH: &str = "fuelpatch";
    pub const FUEL_BREAK: &str = "fuelbreak";
    pub const WEATHER_STATION: &str = "weatherstation";
    pub const WEATHER_STREAM: &str = "weatherstream";
    pub const WEATHER_STREAM_RANGE: &str = "weatherstreamrange";
    pub const WEATHER_STREAM_DIURNAL: &str = "weatherstreamdiurnal";
    pub const WEATHER_PATCH: &str = "weatherpatch";
    pub const WEATHER_PATCH_DETAIL: &str = "weatherpatchdetail";
    pub const WEATHER_GRID: &str = "weathergrid";
    pub const WEATHER_GRID_FILE: &str = "weathergridfile";
    pub const IGNITION: &str = "ignition";
    pub const ASSET_FILE: &str = "assetfile";
    pub const TARGET_FILE: &str = "targetfile";

    pub const SCENARIO_BEGIN: &str = "scenariobegin";
    pub const SCENARIO_NAME: &str = "scenarioname";
    pub const SCENARIO_COMMENTS: &str = "scenariocomments";
    pub const START_TIME: &str = "starttime";
    pub const END_TIME: &str = "endtime";
    pub const DISPLAY_INTERVAL: &str = "displayinterval";
    pub const FGM_OPTIONS: &str = "fgmoptions";
    pub const FBP_OPTIONS: &str = "fbpoptions";
    pub const FMC_OPTIONS: &str = "fmcoptions";
    pub const FWI_OPTIONS: &str = "fwioptions";
    pub const BURNING_CONDITION: &str = "burningcondition";
    pub const VECTOR_REF: &str = "vectorref";
    pub const STREAM_REF: &str = "streamref";
    pub const IGNITION_REF: &str = "ignitionref";
    pub const SUB_SCENARIO: &str = "subscenario";
    pub const LAYER_INFO: &str = "layerinfo";
    pub const ASSET_REF: &str = "assetref";
    pub const WIND_TARGET: &str = "windtarget";
    pub const VECTOR_TARGET: &str = "vectortarget";
    pub const STOP_OPTIONS: &str = "stopoptions";
    pub const GUSTING_OPTIONS: &str = "gustingoptions";
    pub const SCENARIO_END: &str = "scenarioend";

    pub const OUTPUT_GRID: &str = "outputgridfile";
    pub const OUTPUT_VECTOR: &str = "outputvectorfile";
    pub const OUTPUT_SUMMARY: &str = "outputsummaryfile";
    pub const OUTPUT_STATS: &str = "outputstatsfile";

    pub const ATTACHMENT: &str = "attachment";

    /// Tags that are sent without a data line.
    pub const MARKERS: &[&str] = &[SCENARIO_BEGIN, SCENARIO_END];

    /// Literal the Builder reads as "no value" inside a field list.
    pub const NULL: &str = "null";
}

/// A value that can be written as one field of a record.
pub trait WireField {
    fn to_field(&self) -> String;
}

impl<T: WireField + ?Sized> WireField for &T {
    fn to_field(&self) -> String {
        (**self).to_field()
    }
}

impl WireField for str {
    fn to_field(&self) -> String {
        self.to_string()
    }
}

impl WireField for String {
    fn to_field(&self) -> String {
        self.clone()
    }
}

macro_rules! display_field {
    ($($ty:ty),*) => {
        $(impl WireField for $ty {
            fn to_field(&self) -> String {
                self.to_string()
            }
        })*
    };
}

display_field!(f64, i32, i64, u8, u32, u64, usize, bool, Duration);

impl WireField for NaiveDate {
    fn to_field(&self) -> String {
        dates::format_date(self)
    }
}

impl WireField for NaiveDateTime {
    fn to_field(&self) -> String {
        dates::format_date_time(self)
    }
}

/// The value's field text, or the explicit `null` literal.
pub fn nullable<T: WireField>(value: Option<&T>) -> String {
    value.map_or_else(|| tags::NULL.to_string(), WireField::to_field)
}

/// Append a trailing optional field. Only the last field of a record may
/// be optional, so the Builder detects absence by the field count.
pub fn push_trailing<T: WireField>(fields: &mut Vec<String>, value: Option<&T>) {
    if let Some(value) = value {
        fields.push(value.to_field());
    }
}

/// Build a field list from heterogeneous values.
#[macro_export]
macro_rules! wire_fields {
    ($($value:expr),* $(,)?) => {
        vec![$($crate::wire::WireField::to_field(&$value)),*]
    };
}

/// One tagged record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRecord {
    pub tag: String,
    pub fields: Vec<String>,
}

impl WireRecord {
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }
}

/// Something that knows how to write itself as records.
pub trait Streamable {
    fn stream(&self, out: &mut WireWriter);
}

impl<T: Streamable> Streamable for Option<T> {
    fn stream(&self, out: &mut WireWriter) {
        if let Some(value) = self {
            value.stream(out);
        }
    }
}

impl<T: Streamable> Streamable for Vec<T> {
    fn stream(&self, out: &mut WireWriter) {
        for value in self {
            value.stream(out);
        }
    }
}

/// Ordered list of record emissions.
#[derive(Debug, Default, Clone)]
pub struct WireWriter {
    records: Vec<WireRecord>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a record with a data line.
    pub fn record(&mut self, tag: &str, fields: Vec<String>) {
        self.records.push(WireRecord {
            tag: tag.to_string(),
            fields,
        });
    }

    /// Emit a record carrying exactly one field.
    pub fn value(&mut self, tag: &str, value: impl WireField) {
        self.record(tag, vec![value.to_field()]);
    }

    /// Emit a single-field record only when the value is present.
    pub fn optional<T: WireField>(&mut self, tag: &str, value: Option<T>) {
        if let Some(value) = value {
            self.value(tag, value);
        }
    }

    /// Emit a tag with no data line.
    pub fn marker(&mut self, tag: &str) {
        self.records.push(WireRecord {
            tag: tag.to_string(),
            fields: Vec::new(),
        });
    }

    pub fn stream(&mut self, item: &impl Streamable) -> &mut Self {
        item.stream(self);
        self
    }

    pub fn records(&self) -> &[WireRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<WireRecord> {
        self.records
    }

    /// The text lines exactly as they go on the socket, without newlines.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.records.len() * 2);
        for record in &self.records {
            lines.push(record.tag.clone());
            if !tags::MARKERS.contains(&record.tag.as_str()) {
                lines.push(record.fields.join("|"));
            }
        }
        lines
    }

    /// Newline-terminated rendering of every record.
    pub fn render(&self) -> String {
        let mut text = String::new();
        for line in self.lines() {
            text.push_str(&line);
            text.push('\n');
        }
        text
    }
}

/// Reads rendered record text back into records.
pub struct WireReader;

impl WireReader {
    pub fn parse(text: &str) -> Vec<WireRecord> {
        let mut records = Vec::new();
        let mut lines = text.lines();
        while let Some(tag) = lines.next() {
            let tag = tag.trim_end_matches('\r');
            if tag.is_empty() {
                continue;
            }
            let fields = if tags::MARKERS.contains(&tag) {
                Vec::new()
            } else {
                lines
                    .next()
                    .map(|line| split_line(line).into_iter().map(str::to_string).collect())
                    .unwrap_or_default()
            };
            records.push(WireRecord {
                tag: tag.to_string(),
                fields,
            });
        }
        records
    }

    /// First record with `tag`.
    pub fn find<'a>(records: &'a [WireRecord], tag: &str) -> Option<&'a WireRecord> {
        records.iter().find(|record| record.tag == tag)
    }

    /// Every record with `tag`, in order.
    pub fn find_all<'a>(records: &'a [WireRecord], tag: &str) -> Vec<&'a WireRecord> {
        records.iter().filter(|record| record.tag == tag).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_records_and_markers() {
        let mut out = WireWriter::new();
        out.marker(tags::SCENARIO_BEGIN);
        out.value(tags::SCENARIO_NAME, "scen0");
        out.record(tags::FBP_OPTIONS, wire_fields![true, false]);
        out.optional::<&str>(tags::SCENARIO_COMMENTS, None);
        out.marker(tags::SCENARIO_END);
        assert_eq!(
            out.render(),
            "scenariobegin\nscenarioname\nscen0\nfbpoptions\ntrue|false\nscenarioend\n"
        );
    }

    #[test]
    fn test_numbers_format_like_display() {
        assert_eq!(85.0f64.to_field(), "85");
        assert_eq!(0.35f64.to_field(), "0.35");
        assert_eq!(Duration::hours(1).to_field(), "PT1H");
    }

    #[test]
    fn test_nullable() {
        assert_eq!(nullable::<String>(None), "null");
        assert_eq!(nullable(Some(&"C-2".to_string())), "C-2");
    }

    #[test]
    fn test_reader_round_trip() {
        let mut out = WireWriter::new();
        out.marker(tags::SCENARIO_BEGIN);
        out.record(tags::STREAM_REF, wire_fields!["station", "stream", true]);
        out.value(tags::SCENARIO_COMMENTS, "");
        out.marker(tags::SCENARIO_END);
        let records = WireReader::parse(&out.render());
        assert_eq!(records, out.records());
        let stream_ref = WireReader::find(&records, tags::STREAM_REF).unwrap();
        assert_eq!(stream_ref.field(2), Some("true"));
    }
}
