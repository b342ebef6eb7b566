use crate::{
    duration::Duration,
    validation::{check_range, Validate, ValidationError},
    wire::{tags, Streamable, WireField, WireWriter},
    wire_fields,
};
use serde::{Deserialize, Serialize};

/// A WGS84 location in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLon {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLon {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        LatLon {
            latitude,
            longitude,
        }
    }
}

impl Validate for LatLon {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_range(&mut errors, "latitude", self.latitude, -90.0, 90.0);
        check_range(&mut errors, "longitude", self.longitude, -180.0, 180.0);
        errors
    }
}

/// Append `count|lat|lon|lat|lon...` for an inline geometry.
pub fn push_points(fields: &mut Vec<String>, points: &[LatLon]) {
    fields.push(points.len().to_field());
    for point in points {
        fields.push(point.latitude.to_field());
        fields.push(point.longitude.to_field());
    }
}

/// Check every vertex and the minimum vertex count of a geometry.
pub fn check_points(
    errors: &mut Vec<ValidationError>,
    property: &str,
    points: &[LatLon],
    minimum: usize,
) {
    if points.len() < minimum {
        errors.push(ValidationError::leaf(
            property,
            format!("needs at least {minimum} points, got {}", points.len()),
        ));
    }
    crate::validation::push_items(errors, property, points);
}

/// Largest UTC offset a timezone may carry, in hours.
pub const MAX_OFFSET_HOURS: f64 = 14.0;

/// The timezone every time in a job is expressed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeZone {
    /// One of the Builder's named timezones.
    Id { id: u32 },
    /// A fixed offset from UTC, e.g. `-PT6H`.
    Offset { offset: Duration, dst: bool },
}

impl Validate for TimeZone {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if let TimeZone::Offset { offset, .. } = self {
            let hours = offset.to_seconds() / crate::duration::SECONDS_PER_HOUR;
            check_range(&mut errors, "offset", hours, -MAX_OFFSET_HOURS, MAX_OFFSET_HOURS);
        }
        errors
    }
}

impl Streamable for TimeZone {
    fn stream(&self, out: &mut WireWriter) {
        match self {
            TimeZone::Id { id } => out.record(tags::TIMEZONE, wire_fields!["id", id]),
            TimeZone::Offset { offset, dst } => {
                out.record(tags::TIMEZONE, wire_fields!["offset", offset, dst])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lat_lon_ranges() {
        assert!(LatLon::new(51.65, -115.32).is_valid());
        assert_eq!(LatLon::new(91.0, 181.0).check_valid().len(), 2);
    }

    #[test]
    fn test_push_points() {
        let mut fields = Vec::new();
        push_points(&mut fields, &[LatLon::new(1.5, 2.0), LatLon::new(3.0, 4.0)]);
        assert_eq!(fields, vec!["2", "1.5", "2", "3", "4"]);
    }

    #[test]
    fn test_timezone_offset_range() {
        let ok = TimeZone::Offset {
            offset: Duration::create_time(6, 0, 0.0, true),
            dst: false,
        };
        assert!(ok.is_valid());
        let bad = TimeZone::Offset {
            offset: Duration::hours(15),
            dst: false,
        };
        assert!(!bad.is_valid());
    }

    #[test]
    fn test_timezone_stream() {
        let mut out = WireWriter::new();
        TimeZone::Offset {
            offset: Duration::create_time(6, 0, 0.0, true),
            dst: true,
        }
        .stream(&mut out);
        assert_eq!(out.render(), "timezone\noffset|-PT6H|true\n");
    }
}
