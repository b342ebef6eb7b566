use crate::{
    validation::{push_items, require_text, Validate, ValidationError},
    wire::{nullable, tags, Streamable, WireField, WireWriter},
    wire_fields,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Value written to each cell of an output grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridStatistic {
    #[default]
    BurnGrid,
    Ros,
    FireIntensity,
    FlameLength,
    Cfb,
    Sfc,
    Tfc,
    ArrivalTime,
    BurnedChange,
}

impl GridStatistic {
    fn code(self) -> &'static str {
        match self {
            GridStatistic::BurnGrid => "burn_grid",
            GridStatistic::Ros => "ros",
            GridStatistic::FireIntensity => "fi",
            GridStatistic::FlameLength => "fl",
            GridStatistic::Cfb => "cfb",
            GridStatistic::Sfc => "sfc",
            GridStatistic::Tfc => "tfc",
            GridStatistic::ArrivalTime => "arrival_time",
            GridStatistic::BurnedChange => "burned_change",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    #[default]
    ClosestVertex,
    Idw,
    AreaWeighting,
    Calculate,
    Discrete,
}

/// A raster written when the scenario finishes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOutput {
    pub scenario: String,
    pub filename: String,
    pub statistic: GridStatistic,
    /// Time the grid describes; the scenario end when absent.
    pub output_time: Option<NaiveDateTime>,
    pub interpolation: Interpolation,
}

impl Validate for GridOutput {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "scenario", &self.scenario);
        require_text(&mut errors, "filename", &self.filename);
        errors
    }
}

impl Streamable for GridOutput {
    fn stream(&self, out: &mut WireWriter) {
        out.record(
            tags::OUTPUT_GRID,
            vec![
                self.scenario.clone(),
                self.filename.clone(),
                self.statistic.code().to_string(),
                nullable(self.output_time.as_ref()),
                (self.interpolation as u8).to_field(),
            ],
        );
    }
}

/// Fire perimeters written as a vector file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorOutput {
    pub scenario: String,
    pub filename: String,
    pub multiple_perimeters: bool,
    pub remove_islands: bool,
    pub merge_contacting: bool,
    pub per_ignition: bool,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
}

impl Default for VectorOutput {
    fn default() -> Self {
        VectorOutput {
            scenario: String::new(),
            filename: String::new(),
            multiple_perimeters: false,
            remove_islands: true,
            merge_contacting: true,
            per_ignition: false,
            start_time: None,
            end_time: None,
        }
    }
}

impl Validate for VectorOutput {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "scenario", &self.scenario);
        require_text(&mut errors, "filename", &self.filename);
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if start > end {
                errors.push(ValidationError::leaf(
                    "endTime",
                    format!("end {end} is before start {start}"),
                ));
            }
        }
        errors
    }
}

impl Streamable for VectorOutput {
    fn stream(&self, out: &mut WireWriter) {
        let mut fields = wire_fields![
            self.scenario,
            self.filename,
            self.multiple_perimeters,
            self.remove_islands,
            self.merge_contacting,
            self.per_ignition
        ];
        fields.push(nullable(self.start_time.as_ref()));
        fields.push(nullable(self.end_time.as_ref()));
        out.record(tags::OUTPUT_VECTOR, fields);
    }
}

/// A text summary of the scenario's inputs and settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryOutput {
    pub scenario: String,
    pub filename: String,
}

impl Validate for SummaryOutput {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "scenario", &self.scenario);
        require_text(&mut errors, "filename", &self.filename);
        errors
    }
}

impl Streamable for SummaryOutput {
    fn stream(&self, out: &mut WireWriter) {
        out.record(tags::OUTPUT_SUMMARY, wire_fields![self.scenario, self.filename]);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsFormat {
    #[default]
    Csv,
    Json,
    Xml,
}

impl StatsFormat {
    fn code(self) -> &'static str {
        match self {
            StatsFormat::Csv => "csv",
            StatsFormat::Json => "json",
            StatsFormat::Xml => "xml",
        }
    }
}

/// One column of a statistics file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsColumn {
    DateTime,
    ElapsedTime,
    TimestepDuration,
    TotalArea,
    TotalPerimeter,
    MaximumRos,
    MaximumFi,
    MaximumFl,
    NumVertices,
    NumActiveVertices,
}

impl StatsColumn {
    fn code(self) -> &'static str {
        match self {
            StatsColumn::DateTime => "datetime",
            StatsColumn::ElapsedTime => "elapsed_time",
            StatsColumn::TimestepDuration => "timestep_duration",
            StatsColumn::TotalArea => "total_area",
            StatsColumn::TotalPerimeter => "total_perimeter",
            StatsColumn::MaximumRos => "max_ros",
            StatsColumn::MaximumFi => "max_fi",
            StatsColumn::MaximumFl => "max_fl",
            StatsColumn::NumVertices => "num_vertices",
            StatsColumn::NumActiveVertices => "num_active_vertices",
        }
    }
}

/// Per-timestep statistics of the growing fire.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsOutput {
    pub scenario: String,
    pub filename: String,
    pub format: StatsFormat,
    pub columns: Vec<StatsColumn>,
}

impl Validate for StatsOutput {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "scenario", &self.scenario);
        require_text(&mut errors, "filename", &self.filename);
        if self.columns.is_empty() {
            errors.push(ValidationError::leaf("columns", "needs at least one column"));
        }
        errors
    }
}

impl Streamable for StatsOutput {
    fn stream(&self, out: &mut WireWriter) {
        let mut fields = wire_fields![
            self.scenario,
            self.filename,
            self.format.code(),
            self.columns.len()
        ];
        fields.extend(self.columns.iter().map(|c| c.code().to_string()));
        out.record(tags::OUTPUT_STATS, fields);
    }
}

/// Every file the Builder writes for a job.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WiseOutputs {
    pub grids: Vec<GridOutput>,
    pub vectors: Vec<VectorOutput>,
    pub summaries: Vec<SummaryOutput>,
    pub stats: Vec<StatsOutput>,
}

impl WiseOutputs {
    /// Scenario names referenced by any output, in stream order.
    pub fn scenario_names(&self) -> impl Iterator<Item = (&'static str, &str)> {
        let grids = self.grids.iter().map(|o| ("grids", o.scenario.as_str()));
        let vectors = self.vectors.iter().map(|o| ("vectors", o.scenario.as_str()));
        let summaries = self.summaries.iter().map(|o| ("summaries", o.scenario.as_str()));
        let stats = self.stats.iter().map(|o| ("stats", o.scenario.as_str()));
        grids.chain(vectors).chain(summaries).chain(stats)
    }

    /// Output file names, which may be attachment tokens.
    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        let grids = self.grids.iter().map(|o| o.filename.as_str());
        let vectors = self.vectors.iter().map(|o| o.filename.as_str());
        let summaries = self.summaries.iter().map(|o| o.filename.as_str());
        let stats = self.stats.iter().map(|o| o.filename.as_str());
        grids.chain(vectors).chain(summaries).chain(stats)
    }
}

impl Validate for WiseOutputs {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        push_items(&mut errors, "grids", &self.grids);
        push_items(&mut errors, "vectors", &self.vectors);
        push_items(&mut errors, "summaries", &self.summaries);
        push_items(&mut errors, "stats", &self.stats);
        errors
    }
}

impl Streamable for WiseOutputs {
    fn stream(&self, out: &mut WireWriter) {
        out.stream(&self.grids)
            .stream(&self.vectors)
            .stream(&self.summaries)
            .stream(&self.stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_columns_are_counted() {
        let stats = StatsOutput {
            scenario: "scen0".into(),
            filename: "stats.csv".into(),
            format: StatsFormat::Csv,
            columns: vec![StatsColumn::DateTime, StatsColumn::TotalArea],
        };
        let mut out = WireWriter::new();
        stats.stream(&mut out);
        assert_eq!(
            out.render(),
            "outputstatsfile\nscen0|stats.csv|csv|2|datetime|total_area\n"
        );
    }

    #[test]
    fn test_outputs_nest_errors() {
        let outputs = WiseOutputs {
            grids: vec![GridOutput {
                scenario: "scen0".into(),
                filename: "ros.tif".into(),
                statistic: GridStatistic::Ros,
                ..Default::default()
            }],
            vectors: vec![VectorOutput::default()],
            ..Default::default()
        };
        let errors = outputs.check_valid();
        assert_eq!(errors.len(), 1);
        let flat: Vec<String> = errors[0].flatten().into_iter().map(|(p, _)| p).collect();
        assert_eq!(flat, vec!["vectors[0].scenario", "vectors[0].filename"]);
    }

    #[test]
    fn test_grid_output_stream() {
        let grid = GridOutput {
            scenario: "scen0".into(),
            filename: "fi.tif".into(),
            statistic: GridStatistic::FireIntensity,
            output_time: None,
            interpolation: Interpolation::Idw,
        };
        let mut out = WireWriter::new();
        grid.stream(&mut out);
        assert_eq!(out.render(), "outputgridfile\nscen0|fi.tif|fi|null|1\n");
        let names: Vec<_> = WiseOutputs {
            grids: vec![grid],
            ..Default::default()
        }
        .scenario_names()
        .map(|(_, name)| name.to_string())
        .collect();
        assert_eq!(names, vec!["scen0"]);
    }
}
