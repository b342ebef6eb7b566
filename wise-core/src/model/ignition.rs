use crate::{
    error::Result,
    geo::{check_points, push_points, LatLon},
    id::{check_id, next_default_id, Entity, EntityKind},
    validation::{check_comments, guard, require_text, Validate, ValidationError},
    wire::{nullable, push_trailing, tags, Streamable, WireWriter},
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Shape of an inline ignition geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnitionShape {
    Point,
    Line,
    Polygon,
}

impl IgnitionShape {
    fn code(self) -> &'static str {
        match self {
            IgnitionShape::Point => "point",
            IgnitionShape::Line => "line",
            IgnitionShape::Polygon => "polygon",
        }
    }

    fn minimum_points(self) -> usize {
        match self {
            IgnitionShape::Point => 1,
            IgnitionShape::Line => 2,
            IgnitionShape::Polygon => 3,
        }
    }
}

/// Where a fire starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IgnitionGeometry {
    /// A vector file on the Builder, or an attachment token.
    File { filename: String },
    Inline {
        shape: IgnitionShape,
        points: Vec<LatLon>,
    },
}

impl Default for IgnitionGeometry {
    fn default() -> Self {
        IgnitionGeometry::File {
            filename: String::new(),
        }
    }
}

/// A fire start shared by any number of scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ignition {
    pub id: String,
    /// Required; there is no sensible default ignition time.
    pub start_time: Option<NaiveDateTime>,
    pub geometry: IgnitionGeometry,
    pub comments: Option<String>,
}

impl Default for Ignition {
    fn default() -> Self {
        Ignition {
            id: next_default_id(EntityKind::Ignition),
            start_time: None,
            geometry: IgnitionGeometry::default(),
            comments: None,
        }
    }
}

impl Ignition {
    pub fn from_file(start_time: NaiveDateTime, filename: impl Into<String>) -> Self {
        Ignition {
            start_time: Some(start_time),
            geometry: IgnitionGeometry::File {
                filename: filename.into(),
            },
            ..Default::default()
        }
    }

    pub fn from_points(start_time: NaiveDateTime, shape: IgnitionShape, points: Vec<LatLon>) -> Self {
        Ignition {
            start_time: Some(start_time),
            geometry: IgnitionGeometry::Inline { shape, points },
            ..Default::default()
        }
    }

    pub fn set_geometry(&mut self, geometry: IgnitionGeometry) -> Result<()> {
        let mut problems = Vec::new();
        check_geometry(&mut problems, &geometry);
        guard("geometry", problems.first().map(|e| e.message.clone()))?;
        self.geometry = geometry;
        Ok(())
    }

    /// The file name when the geometry comes from a file.
    pub fn filename(&self) -> Option<&str> {
        match &self.geometry {
            IgnitionGeometry::File { filename } => Some(filename.as_str()),
            IgnitionGeometry::Inline { .. } => None,
        }
    }
}

fn check_geometry(errors: &mut Vec<ValidationError>, geometry: &IgnitionGeometry) {
    match geometry {
        IgnitionGeometry::File { filename } => require_text(errors, "filename", filename),
        IgnitionGeometry::Inline { shape, points } => {
            check_points(errors, "points", points, shape.minimum_points())
        }
    }
}

impl Validate for Ignition {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_id(&mut errors, &self.id);
        if self.start_time.is_none() {
            errors.push(ValidationError::leaf("startTime", "is required"));
        }
        check_geometry(&mut errors, &self.geometry);
        check_comments(&mut errors, &self.comments);
        errors
    }
}

impl Entity for Ignition {
    const KIND: EntityKind = EntityKind::Ignition;

    fn id(&self) -> &str {
        &self.id
    }

    fn id_mut(&mut self) -> &mut String {
        &mut self.id
    }
}

impl Streamable for Ignition {
    fn stream(&self, out: &mut WireWriter) {
        let mut fields = vec![self.id.clone(), nullable(self.start_time.as_ref())];
        match &self.geometry {
            IgnitionGeometry::File { filename } => {
                fields.push("file".to_string());
                fields.push(filename.clone());
            }
            IgnitionGeometry::Inline { shape, points } => {
                fields.push(shape.code().to_string());
                push_points(&mut fields, points);
            }
        }
        push_trailing(&mut fields, self.comments.as_ref());
        out.record(tags::IGNITION, fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Property;
    use chrono::NaiveDate;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 1, 1)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_default_requires_start_and_file() {
        let ignition = Ignition::default();
        let properties: Vec<_> = ignition
            .check_valid()
            .into_iter()
            .map(|e| e.property)
            .collect();
        assert_eq!(
            properties,
            vec![Property::from("startTime"), Property::from("filename")]
        );
    }

    #[test]
    fn test_polygon_needs_three_points() {
        let ignition = Ignition::from_points(
            start(),
            IgnitionShape::Polygon,
            vec![LatLon::new(51.0, -115.0), LatLon::new(51.1, -115.0)],
        );
        assert_eq!(ignition.check_valid().len(), 1);
    }

    #[test]
    fn test_stream_point() {
        let mut ignition =
            Ignition::from_points(start(), IgnitionShape::Point, vec![LatLon::new(51.5, -115.25)]);
        ignition.id = "ign".into();
        let mut out = WireWriter::new();
        ignition.stream(&mut out);
        assert_eq!(
            out.render(),
            "ignition\nign|2019-01-01T13:00:00|point|1|51.5|-115.25\n"
        );
    }

    #[test]
    fn test_stream_file_with_comments() {
        let mut ignition = Ignition::from_file(start(), "fire.shp");
        ignition.id = "ign".into();
        ignition.comments = Some("from the field".into());
        let mut out = WireWriter::new();
        ignition.stream(&mut out);
        assert_eq!(
            out.render(),
            "ignition\nign|2019-01-01T13:00:00|file|fire.shp|from the field\n"
        );
    }
}
