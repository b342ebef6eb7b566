//! Landscape modifiers: grid overrides, fuel patches, fuel breaks and
//! weather patches and grids.

use crate::{
    duration::{Duration, SECONDS_PER_DAY},
    error::Result,
    geo::{check_points, push_points, LatLon},
    id::{check_id, next_default_id, Entity, EntityKind},
    validation::{
        check_comments, check_min, check_range, guard, min_problem, require_text, Validate,
        ValidationError,
    },
    wire::{nullable, push_trailing, tags, Streamable, WireField, WireWriter},
    wire_fields,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Area a patch applies to.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatchArea {
    File { filename: String },
    Polygon { points: Vec<LatLon> },
    #[default]
    Landscape,
}

impl PatchArea {
    fn push_fields(&self, fields: &mut Vec<String>) {
        match self {
            PatchArea::File { filename } => {
                fields.push("file".to_string());
                fields.push(filename.clone());
            }
            PatchArea::Polygon { points } => {
                fields.push("polygon".to_string());
                push_points(fields, points);
            }
            PatchArea::Landscape => fields.push("landscape".to_string()),
        }
    }

    fn check(&self, errors: &mut Vec<ValidationError>) {
        match self {
            PatchArea::File { filename } => require_text(errors, "filename", filename),
            PatchArea::Polygon { points } => check_points(errors, "points", points, 3),
            PatchArea::Landscape => {}
        }
    }

    /// The referenced file, if any.
    pub fn filename(&self) -> Option<&str> {
        match self {
            PatchArea::File { filename } => Some(filename.as_str()),
            _ => None,
        }
    }
}

/// Report a missing or inverted absolute time window.
fn check_times(
    errors: &mut Vec<ValidationError>,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
) {
    if start.is_none() {
        errors.push(ValidationError::leaf("startTime", "is required"));
    }
    if end.is_none() {
        errors.push(ValidationError::leaf("endTime", "is required"));
    }
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            errors.push(ValidationError::leaf(
                "endTime",
                format!("end {end} is before start {start}"),
            ));
        }
    }
}

/// Report a time-of-day outside one day.
fn check_time_of_day(errors: &mut Vec<ValidationError>, property: &str, value: &Duration) {
    if value.negative {
        errors.push(ValidationError::leaf(property, "may not be negative"));
    } else {
        check_range(errors, property, value.to_seconds(), 0.0, SECONDS_PER_DAY);
    }
}

/// What a grid file overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridFileType {
    #[default]
    FuelGrid,
    DegreeCuring,
    GreenUp,
    PercentConifer,
    PercentDeadFir,
    CrownBaseHeight,
    TreeHeight,
    FuelLoad,
    FbpVector,
}

impl GridFileType {
    fn code(self) -> u8 {
        self as u8
    }
}

/// A raster that overrides fuel attributes across the landscape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridFile {
    pub id: String,
    pub grid_type: GridFileType,
    pub filename: String,
    pub projection: String,
    pub comments: Option<String>,
}

impl Default for GridFile {
    fn default() -> Self {
        GridFile {
            id: next_default_id(EntityKind::GridFile),
            grid_type: GridFileType::default(),
            filename: String::new(),
            projection: String::new(),
            comments: None,
        }
    }
}

impl GridFile {
    pub fn new(
        grid_type: GridFileType,
        filename: impl Into<String>,
        projection: impl Into<String>,
    ) -> Self {
        GridFile {
            grid_type,
            filename: filename.into(),
            projection: projection.into(),
            ..Default::default()
        }
    }
}

impl Validate for GridFile {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_id(&mut errors, &self.id);
        require_text(&mut errors, "filename", &self.filename);
        require_text(&mut errors, "projection", &self.projection);
        check_comments(&mut errors, &self.comments);
        errors
    }
}

impl Entity for GridFile {
    const KIND: EntityKind = EntityKind::GridFile;

    fn id(&self) -> &str {
        &self.id
    }

    fn id_mut(&mut self) -> &mut String {
        &mut self.id
    }
}

impl Streamable for GridFile {
    fn stream(&self, out: &mut WireWriter) {
        let mut fields = wire_fields![self.id, self.grid_type.code(), self.filename, self.projection];
        push_trailing(&mut fields, self.comments.as_ref());
        out.record(tags::GRID_FILE, fields);
    }
}

/// Which fuels a patch replaces.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FromFuel {
    Index(u32),
    Name(String),
    #[default]
    AllFuels,
    AllCombustible,
    NoData,
}

/// The fuel a patch replaces with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ToFuel {
    Index(u32),
    Name(String),
}

impl Default for ToFuel {
    fn default() -> Self {
        ToFuel::Name(String::new())
    }
}

/// Replace fuels over an area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuelPatch {
    pub id: String,
    pub from_fuel: FromFuel,
    pub to_fuel: ToFuel,
    pub area: PatchArea,
    pub comments: Option<String>,
}

impl Default for FuelPatch {
    fn default() -> Self {
        FuelPatch {
            id: next_default_id(EntityKind::FuelPatch),
            from_fuel: FromFuel::default(),
            to_fuel: ToFuel::default(),
            area: PatchArea::default(),
            comments: None,
        }
    }
}

impl FuelPatch {
    pub fn new(from_fuel: FromFuel, to_fuel: ToFuel, area: PatchArea) -> Self {
        FuelPatch {
            from_fuel,
            to_fuel,
            area,
            ..Default::default()
        }
    }
}

impl Validate for FuelPatch {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_id(&mut errors, &self.id);
        if let FromFuel::Name(name) = &self.from_fuel {
            require_text(&mut errors, "fromFuel", name);
        }
        if let ToFuel::Name(name) = &self.to_fuel {
            require_text(&mut errors, "toFuel", name);
        }
        self.area.check(&mut errors);
        check_comments(&mut errors, &self.comments);
        errors
    }
}

impl Entity for FuelPatch {
    const KIND: EntityKind = EntityKind::FuelPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn id_mut(&mut self) -> &mut String {
        &mut self.id
    }
}

impl Streamable for FuelPatch {
    fn stream(&self, out: &mut WireWriter) {
        let mut fields = vec![self.id.clone()];
        let (from_kind, from_value) = match &self.from_fuel {
            FromFuel::Index(index) => ("index", Some(index.to_field())),
            FromFuel::Name(name) => ("name", Some(name.clone())),
            FromFuel::AllFuels => ("all", None),
            FromFuel::AllCombustible => ("allcombustible", None),
            FromFuel::NoData => ("nodata", None),
        };
        fields.push(from_kind.to_string());
        fields.push(nullable(from_value.as_ref()));
        match &self.to_fuel {
            ToFuel::Index(index) => fields.extend(wire_fields!["index", index]),
            ToFuel::Name(name) => fields.extend(wire_fields!["name", name]),
        }
        self.area.push_fields(&mut fields);
        push_trailing(&mut fields, self.comments.as_ref());
        out.record(tags::FUEL_PATCH, fields);
    }
}

/// Shape of a fuel break.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BreakGeometry {
    File { filename: String },
    Polygon { points: Vec<LatLon> },
    Polyline { points: Vec<LatLon> },
}

impl Default for BreakGeometry {
    fn default() -> Self {
        BreakGeometry::File {
            filename: String::new(),
        }
    }
}

/// A non-burnable barrier, referenced from scenarios by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuelBreak {
    pub id: String,
    /// Metres; only meaningful for polylines.
    pub width: f64,
    pub geometry: BreakGeometry,
    pub comments: Option<String>,
}

impl Default for FuelBreak {
    fn default() -> Self {
        FuelBreak {
            id: next_default_id(EntityKind::FuelBreak),
            width: 0.0,
            geometry: BreakGeometry::default(),
            comments: None,
        }
    }
}

impl FuelBreak {
    pub fn new(geometry: BreakGeometry) -> Self {
        FuelBreak {
            geometry,
            ..Default::default()
        }
    }

    pub fn set_width(&mut self, width: f64) -> Result<()> {
        guard("width", min_problem(width, 0.0))?;
        self.width = width;
        Ok(())
    }

    pub fn filename(&self) -> Option<&str> {
        match &self.geometry {
            BreakGeometry::File { filename } => Some(filename.as_str()),
            _ => None,
        }
    }
}

impl Validate for FuelBreak {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_id(&mut errors, &self.id);
        check_min(&mut errors, "width", self.width, 0.0);
        match &self.geometry {
            BreakGeometry::File { filename } => require_text(&mut errors, "filename", filename),
            BreakGeometry::Polygon { points } => check_points(&mut errors, "points", points, 3),
            BreakGeometry::Polyline { points } => check_points(&mut errors, "points", points, 2),
        }
        check_comments(&mut errors, &self.comments);
        errors
    }
}

impl Entity for FuelBreak {
    const KIND: EntityKind = EntityKind::FuelBreak;

    fn id(&self) -> &str {
        &self.id
    }

    fn id_mut(&mut self) -> &mut String {
        &mut self.id
    }
}

impl Streamable for FuelBreak {
    fn stream(&self, out: &mut WireWriter) {
        let mut fields = wire_fields![self.id, self.width];
        match &self.geometry {
            BreakGeometry::File { filename } => fields.extend(wire_fields!["file", filename]),
            BreakGeometry::Polygon { points } => {
                fields.push("polygon".to_string());
                push_points(&mut fields, points);
            }
            BreakGeometry::Polyline { points } => {
                fields.push("polyline".to_string());
                push_points(&mut fields, points);
            }
        }
        push_trailing(&mut fields, self.comments.as_ref());
        out.record(tags::FUEL_BREAK, fields);
    }
}

/// Weather value a patch modifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherVariable {
    Temperature,
    RelativeHumidity,
    Precipitation,
    WindSpeed,
    WindDirection,
}

impl WeatherVariable {
    fn code(self) -> &'static str {
        match self {
            WeatherVariable::Temperature => "temperature",
            WeatherVariable::RelativeHumidity => "rh",
            WeatherVariable::Precipitation => "precip",
            WeatherVariable::WindSpeed => "windspeed",
            WeatherVariable::WindDirection => "winddirection",
        }
    }

    /// Allowed range of an absolute value.
    fn bounds(self) -> (f64, f64) {
        match self {
            WeatherVariable::Temperature => (-50.0, 60.0),
            WeatherVariable::RelativeHumidity => (0.0, 100.0),
            WeatherVariable::Precipitation => (0.0, f64::MAX),
            WeatherVariable::WindSpeed => (0.0, 200.0),
            WeatherVariable::WindDirection => (0.0, 360.0),
        }
    }
}

/// How a patch combines its value with the underlying weather.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchOperation {
    #[default]
    Equal,
    Plus,
    Minus,
    Multiply,
    Divide,
}

impl PatchOperation {
    fn code(self) -> u8 {
        self as u8
    }
}

/// One modification carried by a weather patch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherPatchDetail {
    pub variable: WeatherVariable,
    pub operation: PatchOperation,
    pub value: f64,
}

impl Validate for WeatherPatchDetail {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        match self.operation {
            PatchOperation::Equal => {
                let (min, max) = self.variable.bounds();
                check_range(&mut errors, "value", self.value, min, max);
            }
            PatchOperation::Multiply | PatchOperation::Divide => {
                if self.value.is_nan() || self.value <= 0.0 {
                    errors.push(ValidationError::leaf("value", "must be greater than 0"));
                }
            }
            PatchOperation::Plus | PatchOperation::Minus => {
                if !self.value.is_finite() {
                    errors.push(ValidationError::leaf("value", "must be a finite number"));
                }
            }
        }
        errors
    }
}

/// Modify weather inside an area for a period of time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherPatch {
    pub id: String,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub start_time_of_day: Duration,
    pub end_time_of_day: Duration,
    pub operations: Vec<WeatherPatchDetail>,
    pub area: PatchArea,
    pub comments: Option<String>,
}

impl Default for WeatherPatch {
    fn default() -> Self {
        WeatherPatch {
            id: next_default_id(EntityKind::WeatherPatch),
            start_time: None,
            end_time: None,
            start_time_of_day: Duration::default(),
            end_time_of_day: Duration::hours(23),
            operations: Vec::new(),
            area: PatchArea::default(),
            comments: None,
        }
    }
}

impl WeatherPatch {
    pub fn new(start_time: NaiveDateTime, end_time: NaiveDateTime, area: PatchArea) -> Self {
        WeatherPatch {
            start_time: Some(start_time),
            end_time: Some(end_time),
            area,
            ..Default::default()
        }
    }

    pub fn add_operation(
        &mut self,
        variable: WeatherVariable,
        operation: PatchOperation,
        value: f64,
    ) -> Result<()> {
        let detail = WeatherPatchDetail {
            variable,
            operation,
            value,
        };
        crate::validation::guard_value(variable.code(), &detail)?;
        self.operations.push(detail);
        Ok(())
    }
}

impl Validate for WeatherPatch {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_id(&mut errors, &self.id);
        check_times(&mut errors, self.start_time, self.end_time);
        check_time_of_day(&mut errors, "startTimeOfDay", &self.start_time_of_day);
        check_time_of_day(&mut errors, "endTimeOfDay", &self.end_time_of_day);
        if self.operations.is_empty() {
            errors.push(ValidationError::leaf("operations", "needs at least one operation"));
        }
        crate::validation::push_items(&mut errors, "operations", &self.operations);
        self.area.check(&mut errors);
        check_comments(&mut errors, &self.comments);
        errors
    }
}

impl Entity for WeatherPatch {
    const KIND: EntityKind = EntityKind::WeatherPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn id_mut(&mut self) -> &mut String {
        &mut self.id
    }
}

impl Streamable for WeatherPatch {
    fn stream(&self, out: &mut WireWriter) {
        let mut fields = vec![
            self.id.clone(),
            nullable(self.start_time.as_ref()),
            self.start_time_of_day.to_field(),
            nullable(self.end_time.as_ref()),
            self.end_time_of_day.to_field(),
        ];
        self.area.push_fields(&mut fields);
        push_trailing(&mut fields, self.comments.as_ref());
        out.record(tags::WEATHER_PATCH, fields);
        for detail in &self.operations {
            out.record(
                tags::WEATHER_PATCH_DETAIL,
                wire_fields![
                    self.id,
                    detail.variable.code(),
                    detail.operation.code(),
                    detail.value
                ],
            );
        }
    }
}

/// Which wind component a weather grid replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherGridKind {
    #[default]
    WindSpeed,
    WindDirection,
}

impl WeatherGridKind {
    fn code(self) -> &'static str {
        match self {
            WeatherGridKind::WindSpeed => "windspeed",
            WeatherGridKind::WindDirection => "winddirection",
        }
    }
}

/// Wind direction sector a grid file applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridSector {
    Default,
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl GridSector {
    fn code(self) -> &'static str {
        match self {
            GridSector::Default => "default",
            GridSector::North => "N",
            GridSector::NorthEast => "NE",
            GridSector::East => "E",
            GridSector::SouthEast => "SE",
            GridSector::South => "S",
            GridSector::SouthWest => "SW",
            GridSector::West => "W",
            GridSector::NorthWest => "NW",
        }
    }
}

/// One raster of a weather grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherGridSector {
    pub sector: GridSector,
    /// Wind speed the raster was modelled for, in km/h.
    pub speed: f64,
    pub filename: String,
    pub projection: String,
}

impl Validate for WeatherGridSector {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_range(&mut errors, "speed", self.speed, 0.0, 200.0);
        require_text(&mut errors, "filename", &self.filename);
        require_text(&mut errors, "projection", &self.projection);
        errors
    }
}

/// Replace wind speed or direction with modelled rasters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherGrid {
    pub id: String,
    pub kind: WeatherGridKind,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub start_time_of_day: Duration,
    pub end_time_of_day: Duration,
    pub sectors: Vec<WeatherGridSector>,
    pub comments: Option<String>,
}

impl Default for WeatherGrid {
    fn default() -> Self {
        WeatherGrid {
            id: next_default_id(EntityKind::WeatherGrid),
            kind: WeatherGridKind::default(),
            start_time: None,
            end_time: None,
            start_time_of_day: Duration::default(),
            end_time_of_day: Duration::hours(23),
            sectors: Vec::new(),
            comments: None,
        }
    }
}

impl WeatherGrid {
    pub fn new(kind: WeatherGridKind, start_time: NaiveDateTime, end_time: NaiveDateTime) -> Self {
        WeatherGrid {
            kind,
            start_time: Some(start_time),
            end_time: Some(end_time),
            ..Default::default()
        }
    }

    pub fn add_sector(&mut self, sector: WeatherGridSector) -> Result<()> {
        let problem = self
            .sectors
            .iter()
            .any(|s| s.sector == sector.sector)
            .then(|| format!("sector {} is already set", sector.sector.code()));
        guard("sectors", problem)?;
        crate::validation::guard_value("sectors", &sector)?;
        self.sectors.push(sector);
        Ok(())
    }
}

impl Validate for WeatherGrid {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_id(&mut errors, &self.id);
        check_times(&mut errors, self.start_time, self.end_time);
        check_time_of_day(&mut errors, "startTimeOfDay", &self.start_time_of_day);
        check_time_of_day(&mut errors, "endTimeOfDay", &self.end_time_of_day);
        if self.sectors.is_empty() {
            errors.push(ValidationError::leaf("sectors", "needs at least one grid file"));
        }
        for (index, sector) in self.sectors.iter().enumerate() {
            if self.sectors[..index].iter().any(|s| s.sector == sector.sector) {
                errors.push(ValidationError::leaf(
                    "sectors",
                    format!("sector {} is set more than once", sector.sector.code()),
                ));
            }
        }
        crate::validation::push_items(&mut errors, "sectors", &self.sectors);
        check_comments(&mut errors, &self.comments);
        errors
    }
}

impl Entity for WeatherGrid {
    const KIND: EntityKind = EntityKind::WeatherGrid;

    fn id(&self) -> &str {
        &self.id
    }

    fn id_mut(&mut self) -> &mut String {
        &mut self.id
    }
}

impl Streamable for WeatherGrid {
    fn stream(&self, out: &mut WireWriter) {
        let mut fields = vec![
            self.id.clone(),
            self.kind.code().to_string(),
            nullable(self.start_time.as_ref()),
            self.start_time_of_day.to_field(),
            nullable(self.end_time.as_ref()),
            self.end_time_of_day.to_field(),
        ];
        push_trailing(&mut fields, self.comments.as_ref());
        out.record(tags::WEATHER_GRID, fields);
        for sector in &self.sectors {
            out.record(
                tags::WEATHER_GRID_FILE,
                wire_fields![
                    self.id,
                    sector.sector.code(),
                    sector.speed,
                    sector.filename,
                    sector.projection
                ],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::with_policy;
    use crate::wire::WireReader;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_fuel_patch_stream() {
        let mut patch = FuelPatch::new(
            FromFuel::AllCombustible,
            ToFuel::Name("O-1a".into()),
            PatchArea::Landscape,
        );
        patch.id = "fp".into();
        let mut out = WireWriter::new();
        patch.stream(&mut out);
        assert_eq!(
            out.render(),
            "fuelpatch\nfp|allcombustible|null|name|O-1a|landscape\n"
        );
    }

    #[test]
    fn test_fuel_patch_polygon_needs_points() {
        let patch = FuelPatch::new(
            FromFuel::Index(2),
            ToFuel::Index(101),
            PatchArea::Polygon { points: Vec::new() },
        );
        assert_eq!(patch.check_valid().len(), 1);
    }

    #[test]
    fn test_fuel_break_width() {
        with_policy(true, || {
            let mut fuel_break = FuelBreak::new(BreakGeometry::Polyline {
                points: vec![LatLon::new(51.0, -115.0), LatLon::new(51.1, -115.1)],
            });
            assert!(fuel_break.set_width(-1.0).is_err());
            fuel_break.set_width(12.5).unwrap();
            assert!(fuel_break.is_valid());
        });
    }

    #[test]
    fn test_weather_patch_details_follow_patch() {
        let mut patch = WeatherPatch::new(at(1, 12), at(2, 12), PatchArea::Landscape);
        patch.id = "wp".into();
        patch
            .add_operation(WeatherVariable::RelativeHumidity, PatchOperation::Minus, 5.0)
            .unwrap();
        patch
            .add_operation(WeatherVariable::WindSpeed, PatchOperation::Equal, 20.0)
            .unwrap();
        assert!(patch.is_valid());
        let mut out = WireWriter::new();
        patch.stream(&mut out);
        let records = WireReader::parse(&out.render());
        assert_eq!(records.len(), 3);
        assert_eq!(
            records[0].fields,
            vec![
                "wp",
                "2019-01-01T12:00:00",
                "PT0S",
                "2019-01-02T12:00:00",
                "PT23H",
                "landscape"
            ]
        );
        assert_eq!(records[1].fields, vec!["wp", "rh", "2", "5"]);
        assert_eq!(records[2].tag, tags::WEATHER_PATCH_DETAIL);
    }

    #[test]
    fn test_weather_patch_requires_times_and_operation() {
        let patch = WeatherPatch::default();
        let errors = patch.check_valid();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_weather_grid_duplicate_sector() {
        let mut grid = WeatherGrid::new(WeatherGridKind::WindDirection, at(1, 0), at(1, 23));
        let sector = WeatherGridSector {
            sector: GridSector::North,
            speed: 10.0,
            filename: "n.asc".into(),
            projection: "n.prj".into(),
        };
        with_policy(false, || {
            grid.add_sector(sector.clone()).unwrap();
            grid.add_sector(sector.clone()).unwrap();
        });
        assert_eq!(grid.check_valid().len(), 1);
        with_policy(true, || {
            assert!(grid.add_sector(sector).is_err());
        });
    }

    #[test]
    fn test_grid_file_stream() {
        let mut grid = GridFile::new(GridFileType::PercentConifer, "pc.asc", "pc.prj");
        grid.id = "gf".into();
        let mut out = WireWriter::new();
        grid.stream(&mut out);
        assert_eq!(out.render(), "gridfile\ngf|3|pc.asc|pc.prj\n");
    }
}
