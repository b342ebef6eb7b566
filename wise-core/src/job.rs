//! The job root: everything the Builder needs to run one job.

use crate::{
    error::{Result, WiseError},
    id::Entity,
    model::{WiseInputs, WiseOutputs},
    validation::{check_comments, check_min, guard, push_child, text_problem, Validate, ValidationError},
    wire::{tags, Streamable, WireWriter},
    wire_fields,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::debug;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Prefix of file names that refer to job attachments.
pub const ATTACHMENT_PREFIX: &str = "attachment:/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalancing {
    #[default]
    None,
    /// Scenarios are handed out through an external counter so several
    /// Builder instances can share the job.
    ExternalCounter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobOptions {
    pub load_balancing: LoadBalancing,
    pub priority: i32,
    /// Ask the Builder to validate the job without running it.
    pub validate: bool,
}

impl Validate for JobOptions {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_min(&mut errors, "priority", f64::from(self.priority), 0.0);
        errors
    }
}

impl Streamable for JobOptions {
    fn stream(&self, out: &mut WireWriter) {
        let balancing = self.load_balancing as u8;
        out.record(
            tags::JOB_OPTIONS,
            wire_fields![balancing, self.priority, self.validate],
        );
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text).map_err(serde::de::Error::custom)
    }
}

/// A file shipped inside the job instead of living on the Builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub token: String,
    #[serde(with = "base64_bytes")]
    pub contents: Vec<u8>,
}

impl Streamable for Attachment {
    fn stream(&self, out: &mut WireWriter) {
        out.record(
            tags::ATTACHMENT,
            wire_fields![self.token, "base64", STANDARD.encode(&self.contents)],
        );
    }
}

/// A complete job.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Wise {
    /// Name requested for the job. The Builder makes one up when absent
    /// and always answers a submission with the name it used.
    pub name: Option<String>,
    pub comments: Option<String>,
    pub options: JobOptions,
    pub inputs: WiseInputs,
    pub outputs: WiseOutputs,
    pub attachments: Vec<Attachment>,
    /// Index of the next attachment token; never reused.
    next_attachment: usize,
}

impl Wise {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Wise {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn set_name(&mut self, name: &str) -> Result<()> {
        guard("name", text_problem(name))?;
        self.name = Some(name.to_string());
        Ok(())
    }

    /// Ship `contents` with the job and return the token that file name
    /// fields use to refer to it.
    pub fn add_attachment(&mut self, name: &str, contents: impl Into<Vec<u8>>) -> Result<String> {
        guard("attachments", text_problem(name))?;
        let mut token = format!("{ATTACHMENT_PREFIX}{}/{name}", self.next_attachment);
        self.next_attachment += 1;
        while self.has_attachment(&token) {
            token = format!("{ATTACHMENT_PREFIX}{}/{name}", self.next_attachment);
            self.next_attachment += 1;
        }
        self.attachments.push(Attachment {
            name: name.to_string(),
            token: token.clone(),
            contents: contents.into(),
        });
        debug!("Attached {name} as {token}");
        Ok(token)
    }

    /// Attach a local file under its own file name.
    pub fn add_attachment_file(&mut self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                WiseError::invalid("attachments", format!("unusable path {}", path.display()))
            })?;
        let contents = fs::read(path)?;
        self.add_attachment(&name, contents)
    }

    pub fn has_attachment(&self, token: &str) -> bool {
        self.attachments.iter().any(|a| a.token == token)
    }

    /// Check every id a reference record or output holds against the
    /// entities that exist now.
    pub fn resolve(&self) -> Vec<ValidationError> {
        let inputs = &self.inputs;
        let mut errors = Vec::new();
        for scenario in &inputs.scenarios {
            let mut dangling = Vec::new();
            for reference in &scenario.station_streams {
                match inputs.weather_stations.get(&reference.station) {
                    None => dangling.push(ValidationError::leaf(
                        "stationStreams",
                        format!("unknown weather station '{}'", reference.station),
                    )),
                    Some(station) if !station.streams.contains(&reference.stream) => {
                        dangling.push(ValidationError::leaf(
                            "stationStreams",
                            format!(
                                "station '{}' has no weather stream '{}'",
                                reference.station, reference.stream
                            ),
                        ))
                    }
                    Some(_) => {}
                }
            }
            for reference in &scenario.ignitions {
                if !inputs.ignitions.contains(&reference.ignition) {
                    dangling.push(ValidationError::leaf(
                        "ignitions",
                        format!("unknown ignition '{}'", reference.ignition),
                    ));
                }
            }
            for vector in &scenario.vectors {
                if !inputs.fuel_breaks.contains(vector) {
                    dangling.push(ValidationError::leaf(
                        "vectors",
                        format!("unknown fuel break '{vector}'"),
                    ));
                }
            }
            for layer in &scenario.layers {
                if !inputs.has_layer(&layer.layer) {
                    dangling.push(ValidationError::leaf(
                        "layers",
                        format!("unknown layer '{}'", layer.layer),
                    ));
                }
            }
            for asset in &scenario.assets {
                if !inputs.assets.contains(&asset.asset) {
                    dangling.push(ValidationError::leaf(
                        "assets",
                        format!("unknown asset '{}'", asset.asset),
                    ));
                }
            }
            for (property, target) in [
                ("windTarget", &scenario.wind_target),
                ("vectorTarget", &scenario.vector_target),
            ] {
                if let Some(target) = target {
                    if !inputs.targets.contains(&target.target) {
                        dangling.push(ValidationError::leaf(
                            property,
                            format!("unknown target '{}'", target.target),
                        ));
                    }
                }
            }
            if !dangling.is_empty() {
                errors.push(
                    ValidationError::node(scenario.id.as_str(), "has dangling references", dangling)
                        .with_object(scenario.label()),
                );
            }
        }
        for (property, name) in self.outputs.scenario_names() {
            if !inputs.scenarios.contains(name) {
                errors.push(ValidationError::leaf(
                    format!("outputs.{property}"),
                    format!("unknown scenario '{name}'"),
                ));
            }
        }
        let filenames = inputs
            .filenames()
            .into_iter()
            .chain(self.outputs.filenames().map(|name| ("outputs".to_string(), name)));
        for (owner, name) in filenames {
            if name.starts_with(ATTACHMENT_PREFIX) && !self.has_attachment(name) {
                errors.push(
                    ValidationError::leaf("filename", format!("unknown attachment '{name}'"))
                        .with_object(owner),
                );
            }
        }
        errors
    }

    pub fn from_json(text: &str) -> Result<Wise> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Wise> {
        let text = fs::read_to_string(path)?;
        Wise::from_json(&text)
    }

    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Render the whole job as the text sent between `BEGINDATA` and
    /// `ENDDATA`.
    pub fn render(&self) -> WireWriter {
        let mut out = WireWriter::new();
        self.stream(&mut out);
        out
    }
}

impl Validate for Wise {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if let Some(message) = self.name.as_deref().and_then(text_problem) {
            errors.push(ValidationError::leaf("name", message));
        }
        check_comments(&mut errors, &self.comments);
        push_child(&mut errors, "options", || "JobOptions".into(), &self.options);
        push_child(&mut errors, "inputs", || "WiseInputs".into(), &self.inputs);
        push_child(&mut errors, "outputs", || "WiseOutputs".into(), &self.outputs);
        let references = self.resolve();
        if !references.is_empty() {
            errors.push(ValidationError::node(
                "references",
                "contains unresolved references",
                references,
            ));
        }
        errors
    }
}

impl Streamable for Wise {
    fn stream(&self, out: &mut WireWriter) {
        out.stream(&self.options);
        out.optional(tags::JOB_NAME, self.name.as_ref());
        out.optional(tags::JOB_COMMENTS, self.comments.as_ref());
        out.stream(&self.inputs)
            .stream(&self.outputs)
            .stream(&self.attachments);
    }
}
