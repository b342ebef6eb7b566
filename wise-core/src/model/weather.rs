//! Weather stations and the weather streams recorded at them.

use crate::{
    error::Result,
    geo::LatLon,
    id::{check_id, next_default_id, Arena, Entity, EntityKind},
    validation::{
        check_comments, check_range, guard, guard_value, push_child, range_problem,
        require_text, Validate, ValidationError,
    },
    wire::{nullable, push_trailing, tags, Streamable, WireWriter},
    wire_fields,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Method used to derive hourly FFMC values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HffmcMethod {
    #[default]
    VanWagner,
    Lawson,
}

impl HffmcMethod {
    fn code(self) -> u8 {
        match self {
            HffmcMethod::VanWagner => 0,
            HffmcMethod::Lawson => 1,
        }
    }
}

/// The observed hourly FFMC the stream is seeded with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HffmcOptions {
    pub value: f64,
    /// Hour of the observation, or -1 to let the Builder pick.
    pub hour: i32,
    pub method: HffmcMethod,
}

impl Default for HffmcOptions {
    fn default() -> Self {
        HffmcOptions {
            value: 85.0,
            hour: -1,
            method: HffmcMethod::VanWagner,
        }
    }
}

impl Validate for HffmcOptions {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_range(&mut errors, "value", self.value, 0.0, 101.0);
        check_range(&mut errors, "hour", f64::from(self.hour), -1.0, 23.0);
        errors
    }
}

/// Fire weather index codes at the start of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartingCodes {
    pub ffmc: f64,
    pub dmc: f64,
    pub dc: f64,
    pub precipitation: f64,
}

impl Default for StartingCodes {
    fn default() -> Self {
        StartingCodes {
            ffmc: 85.0,
            dmc: 6.0,
            dc: 15.0,
            precipitation: 0.0,
        }
    }
}

impl Validate for StartingCodes {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_range(&mut errors, "ffmc", self.ffmc, 0.0, 101.0);
        check_range(&mut errors, "dmc", self.dmc, 0.0, 500.0);
        check_range(&mut errors, "dc", self.dc, 0.0, 1500.0);
        crate::validation::check_min(&mut errors, "precipitation", self.precipitation, 0.0);
        errors
    }
}

/// Coefficients of the diurnal temperature and wind curves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiurnalParameters {
    pub temperature_alpha: f64,
    pub temperature_beta: f64,
    pub temperature_gamma: f64,
    pub wind_alpha: f64,
    pub wind_beta: f64,
    pub wind_gamma: f64,
}

impl Default for DiurnalParameters {
    fn default() -> Self {
        DiurnalParameters {
            temperature_alpha: -0.77,
            temperature_beta: 2.8,
            temperature_gamma: -2.2,
            wind_alpha: 1.0,
            wind_beta: 1.24,
            wind_gamma: -3.59,
        }
    }
}

impl Validate for DiurnalParameters {
    fn check_valid(&self) -> Vec<ValidationError> {
        [
            ("temperatureAlpha", self.temperature_alpha),
            ("temperatureBeta", self.temperature_beta),
            ("temperatureGamma", self.temperature_gamma),
            ("windAlpha", self.wind_alpha),
            ("windBeta", self.wind_beta),
            ("windGamma", self.wind_gamma),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_finite())
        .map(|(name, _)| ValidationError::leaf(name, "must be a finite number"))
        .collect()
    }
}

/// A weather file attached to a station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherStream {
    pub id: String,
    /// Path on the Builder or an attachment token.
    pub filename: String,
    pub hffmc: HffmcOptions,
    pub starting_codes: StartingCodes,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub diurnal: Option<DiurnalParameters>,
    pub comments: Option<String>,
}

impl Default for WeatherStream {
    fn default() -> Self {
        WeatherStream {
            id: next_default_id(EntityKind::WeatherStream),
            filename: String::new(),
            hffmc: HffmcOptions::default(),
            starting_codes: StartingCodes::default(),
            start_date: None,
            end_date: None,
            diurnal: None,
            comments: None,
        }
    }
}

impl WeatherStream {
    pub fn new(filename: impl Into<String>) -> Self {
        WeatherStream {
            filename: filename.into(),
            ..Default::default()
        }
    }

    pub fn set_starting_codes(&mut self, codes: StartingCodes) -> Result<()> {
        guard_value("startingCodes", &codes)?;
        self.starting_codes = codes;
        Ok(())
    }

    pub fn set_hffmc(&mut self, hffmc: HffmcOptions) -> Result<()> {
        guard_value("hffmc", &hffmc)?;
        self.hffmc = hffmc;
        Ok(())
    }

    /// Limit the stream to a date range. `start` may not follow `end`.
    pub fn set_range(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<()> {
        let problem = match (start, end) {
            (Some(s), Some(e)) if s > e => Some(format!("start {s} is after end {e}")),
            _ => None,
        };
        guard("range", problem)?;
        self.start_date = start;
        self.end_date = end;
        Ok(())
    }

    /// Write this stream's records on behalf of its owning station.
    pub fn stream_for(&self, station: &str, out: &mut WireWriter) {
        let mut fields = wire_fields![
            station,
            self.id,
            self.filename,
            self.hffmc.value,
            self.hffmc.hour,
            self.hffmc.method.code(),
            self.starting_codes.ffmc,
            self.starting_codes.dmc,
            self.starting_codes.dc,
            self.starting_codes.precipitation,
        ];
        push_trailing(&mut fields, self.comments.as_ref());
        out.record(tags::WEATHER_STREAM, fields);
        if self.start_date.is_some() || self.end_date.is_some() {
            out.record(
                tags::WEATHER_STREAM_RANGE,
                vec![
                    station.to_string(),
                    self.id.clone(),
                    nullable(self.start_date.as_ref()),
                    nullable(self.end_date.as_ref()),
                ],
            );
        }
        if let Some(diurnal) = &self.diurnal {
            out.record(
                tags::WEATHER_STREAM_DIURNAL,
                wire_fields![
                    station,
                    self.id,
                    diurnal.temperature_alpha,
                    diurnal.temperature_beta,
                    diurnal.temperature_gamma,
                    diurnal.wind_alpha,
                    diurnal.wind_beta,
                    diurnal.wind_gamma,
                ],
            );
        }
    }
}

impl Validate for WeatherStream {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_id(&mut errors, &self.id);
        require_text(&mut errors, "filename", &self.filename);
        push_child(&mut errors, "hffmc", || "HffmcOptions".into(), &self.hffmc);
        push_child(
            &mut errors,
            "startingCodes",
            || "StartingCodes".into(),
            &self.starting_codes,
        );
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                errors.push(ValidationError::leaf(
                    "endDate",
                    format!("end {end} is before start {start}"),
                ));
            }
        }
        push_child(&mut errors, "diurnal", || "DiurnalParameters".into(), &self.diurnal);
        check_comments(&mut errors, &self.comments);
        errors
    }
}

impl Entity for WeatherStream {
    const KIND: EntityKind = EntityKind::WeatherStream;

    fn id(&self) -> &str {
        &self.id
    }

    fn id_mut(&mut self) -> &mut String {
        &mut self.id
    }
}

/// A location that weather streams are recorded at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherStation {
    pub id: String,
    pub location: LatLon,
    /// Metres above sea level.
    pub elevation: f64,
    pub comments: Option<String>,
    pub streams: Arena<WeatherStream>,
}

impl Default for WeatherStation {
    fn default() -> Self {
        WeatherStation {
            id: next_default_id(EntityKind::WeatherStation),
            location: LatLon::default(),
            elevation: 0.0,
            comments: None,
            streams: Arena::new(),
        }
    }
}

impl WeatherStation {
    pub fn new(location: LatLon, elevation: f64) -> Self {
        WeatherStation {
            location,
            elevation,
            ..Default::default()
        }
    }

    pub fn set_location(&mut self, location: LatLon) -> Result<()> {
        guard_value("location", &location)?;
        self.location = location;
        Ok(())
    }

    pub fn set_elevation(&mut self, elevation: f64) -> Result<()> {
        guard("elevation", range_problem(elevation, -500.0, 9000.0))?;
        self.elevation = elevation;
        Ok(())
    }

    /// Attach a new weather file and return it for further setup.
    pub fn add_weather_stream(&mut self, filename: impl Into<String>) -> Result<&mut WeatherStream> {
        self.streams.add(WeatherStream::new(filename))
    }
}

impl Validate for WeatherStation {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_id(&mut errors, &self.id);
        push_child(&mut errors, "location", || "LatLon".into(), &self.location);
        check_range(&mut errors, "elevation", self.elevation, -500.0, 9000.0);
        check_comments(&mut errors, &self.comments);
        let stream_errors = self.streams.check_valid();
        if !stream_errors.is_empty() {
            errors.push(ValidationError::node(
                "streams",
                "contains invalid streams",
                stream_errors,
            ));
        }
        errors
    }
}

impl Entity for WeatherStation {
    const KIND: EntityKind = EntityKind::WeatherStation;

    fn id(&self) -> &str {
        &self.id
    }

    fn id_mut(&mut self) -> &mut String {
        &mut self.id
    }
}

impl Streamable for WeatherStation {
    fn stream(&self, out: &mut WireWriter) {
        let mut fields = wire_fields![
            self.id,
            self.location.latitude,
            self.location.longitude,
            self.elevation,
        ];
        push_trailing(&mut fields, self.comments.as_ref());
        out.record(tags::WEATHER_STATION, fields);
        for stream in &self.streams {
            stream.stream_for(&self.id, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{with_policy, Property};
    use crate::wire::WireReader;

    #[test]
    fn test_default_stream_requires_filename_only() {
        let stream = WeatherStream::default();
        let errors = stream.check_valid();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].property, Property::from("filename"));
    }

    #[test]
    fn test_station_streams_after_station_record() {
        let mut station = WeatherStation::new(LatLon::new(51.6547, -115.3617), 1300.0);
        station.id = "ws".into();
        let stream = station.add_weather_stream("weather.txt").unwrap();
        stream.id = "stream".into();
        stream.start_date = NaiveDate::from_ymd_opt(2019, 1, 1);
        let mut out = WireWriter::new();
        station.stream(&mut out);
        let records = WireReader::parse(&out.render());
        let order: Vec<&str> = records.iter().map(|r| r.tag.as_str()).collect();
        assert_eq!(
            order,
            vec![
                tags::WEATHER_STATION,
                tags::WEATHER_STREAM,
                tags::WEATHER_STREAM_RANGE
            ]
        );
        assert_eq!(records[0].fields, vec!["ws", "51.6547", "-115.3617", "1300"]);
        assert_eq!(records[1].fields[..3], ["ws", "stream", "weather.txt"]);
        assert_eq!(records[2].fields, vec!["ws", "stream", "2019-01-01", "null"]);
    }

    #[test]
    fn test_bad_codes_deferred_then_reported() {
        with_policy(false, || {
            let mut stream = WeatherStream::new("w.txt");
            let codes = StartingCodes {
                ffmc: 120.0,
                ..Default::default()
            };
            stream.set_starting_codes(codes).unwrap();
            assert_eq!(stream.starting_codes.ffmc, 120.0);
            let flat: Vec<String> = stream
                .check_valid()
                .iter()
                .flat_map(|e| e.flatten())
                .map(|(path, _)| path)
                .collect();
            assert_eq!(flat, vec!["startingCodes.ffmc"]);
        });
    }

    #[test]
    fn test_bad_codes_rejected_inline() {
        with_policy(true, || {
            let mut stream = WeatherStream::new("w.txt");
            let codes = StartingCodes {
                dc: -1.0,
                ..Default::default()
            };
            assert!(stream.set_starting_codes(codes).is_err());
            assert_eq!(stream.starting_codes, StartingCodes::default());
            let d = NaiveDate::from_ymd_opt(2019, 1, 2);
            let e = NaiveDate::from_ymd_opt(2019, 1, 1);
            assert!(stream.set_range(d, e).is_err());
        });
    }

    #[test]
    fn test_station_nests_stream_errors() {
        let mut station = WeatherStation::new(LatLon::new(51.0, -115.0), 1000.0);
        station.streams.add(WeatherStream::default()).unwrap();
        let errors = station.check_valid();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].property, Property::from("streams"));
        assert_eq!(errors[0].count(), 1);
    }
}
