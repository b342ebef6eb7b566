use super::{
    asset::{AssetFile, TargetFile},
    fuel::FuelDefinition,
    grid::{FuelBreak, FuelPatch, GridFile, WeatherGrid, WeatherPatch},
    ignition::Ignition,
    scenario::Scenario,
    weather::WeatherStation,
};
use crate::{
    error::Result,
    geo::{LatLon, TimeZone},
    id::{Arena, Entity},
    validation::{push_child, require_text, Validate, ValidationError},
    wire::{tags, Streamable, WireWriter},
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The landscape files every job needs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputFiles {
    pub projection: String,
    pub lut: String,
    pub fuelmap: String,
    pub elevation: Option<String>,
}

impl Validate for InputFiles {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "projection", &self.projection);
        require_text(&mut errors, "lut", &self.lut);
        require_text(&mut errors, "fuelmap", &self.fuelmap);
        if let Some(elevation) = &self.elevation {
            require_text(&mut errors, "elevation", elevation);
        }
        errors
    }
}

impl Streamable for InputFiles {
    fn stream(&self, out: &mut WireWriter) {
        out.value(tags::PROJECTION_FILE, &self.projection);
        out.value(tags::LUT_FILE, &self.lut);
        out.value(tags::FUELMAP_FILE, &self.fuelmap);
        out.optional(tags::ELEVATION_FILE, self.elevation.as_ref());
    }
}

fn push_arena<T: Entity>(errors: &mut Vec<ValidationError>, property: &str, arena: &Arena<T>) {
    let children = arena.check_valid();
    if !children.is_empty() {
        errors.push(ValidationError::node(property, "contains invalid entries", children));
    }
}

/// Everything a job's scenarios draw on.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WiseInputs {
    pub timezone: Option<TimeZone>,
    pub files: InputFiles,
    pub fuel_definitions: Arena<FuelDefinition>,
    pub grid_files: Arena<GridFile>,
    pub fuel_patches: Arena<FuelPatch>,
    pub fuel_breaks: Arena<FuelBreak>,
    pub weather_stations: Arena<WeatherStation>,
    pub weather_patches: Arena<WeatherPatch>,
    pub weather_grids: Arena<WeatherGrid>,
    pub ignitions: Arena<Ignition>,
    pub assets: Arena<AssetFile>,
    pub targets: Arena<TargetFile>,
    pub scenarios: Arena<Scenario>,
}

impl WiseInputs {
    pub fn add_weather_station(&mut self, location: LatLon, elevation: f64) -> Result<&mut WeatherStation> {
        self.weather_stations.add(WeatherStation::new(location, elevation))
    }

    pub fn add_ignition(&mut self, ignition: Ignition) -> Result<&mut Ignition> {
        self.ignitions.add(ignition)
    }

    pub fn add_scenario(&mut self, start_time: NaiveDateTime, end_time: NaiveDateTime) -> Result<&mut Scenario> {
        self.scenarios.add(Scenario::new(start_time, end_time))
    }

    /// Whether `id` names anything a scenario can stack as a layer.
    pub fn has_layer(&self, id: &str) -> bool {
        self.grid_files.contains(id)
            || self.fuel_patches.contains(id)
            || self.weather_patches.contains(id)
            || self.weather_grids.contains(id)
    }

    /// Every file name the inputs refer to, paired with a readable owner.
    pub fn filenames(&self) -> Vec<(String, &str)> {
        let mut names: Vec<(String, &str)> = vec![
            ("files.projection".to_string(), self.files.projection.as_str()),
            ("files.lut".to_string(), self.files.lut.as_str()),
            ("files.fuelmap".to_string(), self.files.fuelmap.as_str()),
        ];
        if let Some(elevation) = &self.files.elevation {
            names.push(("files.elevation".to_string(), elevation.as_str()));
        }
        for grid in &self.grid_files {
            names.push((grid.label(), grid.filename.as_str()));
            names.push((grid.label(), grid.projection.as_str()));
        }
        for patch in &self.fuel_patches {
            names.extend(patch.area.filename().map(|f| (patch.label(), f)));
        }
        for fuel_break in &self.fuel_breaks {
            names.extend(fuel_break.filename().map(|f| (fuel_break.label(), f)));
        }
        for station in &self.weather_stations {
            for stream in &station.streams {
                names.push((stream.label(), stream.filename.as_str()));
            }
        }
        for patch in &self.weather_patches {
            names.extend(patch.area.filename().map(|f| (patch.label(), f)));
        }
        for grid in &self.weather_grids {
            for sector in &grid.sectors {
                names.push((grid.label(), sector.filename.as_str()));
                names.push((grid.label(), sector.projection.as_str()));
            }
        }
        for ignition in &self.ignitions {
            names.extend(ignition.filename().map(|f| (ignition.label(), f)));
        }
        for asset in &self.assets {
            names.push((asset.label(), asset.filename.as_str()));
        }
        for target in &self.targets {
            names.push((target.label(), target.filename.as_str()));
        }
        names
    }
}

impl Validate for WiseInputs {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        match &self.timezone {
            Some(timezone) => push_child(&mut errors, "timezone", || "TimeZone".into(), timezone),
            None => errors.push(ValidationError::leaf("timezone", "is required")),
        }
        push_child(&mut errors, "files", || "InputFiles".into(), &self.files);
        push_arena(&mut errors, "fuelDefinitions", &self.fuel_definitions);
        push_arena(&mut errors, "gridFiles", &self.grid_files);
        push_arena(&mut errors, "fuelPatches", &self.fuel_patches);
        push_arena(&mut errors, "fuelBreaks", &self.fuel_breaks);
        push_arena(&mut errors, "weatherStations", &self.weather_stations);
        push_arena(&mut errors, "weatherPatches", &self.weather_patches);
        push_arena(&mut errors, "weatherGrids", &self.weather_grids);
        push_arena(&mut errors, "ignitions", &self.ignitions);
        push_arena(&mut errors, "assets", &self.assets);
        push_arena(&mut errors, "targets", &self.targets);
        if self.scenarios.is_empty() {
            errors.push(ValidationError::leaf("scenarios", "needs at least one scenario"));
        }
        push_arena(&mut errors, "scenarios", &self.scenarios);
        errors
    }
}

impl Streamable for WiseInputs {
    fn stream(&self, out: &mut WireWriter) {
        out.stream(&self.timezone)
            .stream(&self.files)
            .stream(&self.fuel_definitions)
            .stream(&self.grid_files)
            .stream(&self.fuel_patches)
            .stream(&self.fuel_breaks)
            .stream(&self.weather_stations)
            .stream(&self.weather_patches)
            .stream(&self.weather_grids)
            .stream(&self.ignitions)
            .stream(&self.assets)
            .stream(&self.targets)
            .stream(&self.scenarios);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Property;

    #[test]
    fn test_default_inputs_report_required_fields() {
        let errors = WiseInputs::default().check_valid();
        let properties: Vec<Property> = errors.iter().map(|e| e.property.clone()).collect();
        assert_eq!(
            properties,
            vec![
                Property::from("timezone"),
                Property::from("files"),
                Property::from("scenarios"),
            ]
        );
        assert_eq!(errors[1].count(), 3);
    }

    #[test]
    fn test_input_files_stream() {
        let files = InputFiles {
            projection: "a.prj".into(),
            lut: "a.lut".into(),
            fuelmap: "fuels.tif".into(),
            elevation: None,
        };
        let mut out = WireWriter::new();
        files.stream(&mut out);
        assert_eq!(
            out.render(),
            "projfile\na.prj\nlutfile\na.lut\nfuelmapfile\nfuels.tif\n"
        );
    }
}
