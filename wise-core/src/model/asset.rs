use crate::{
    error::Result,
    id::{check_id, next_default_id, Entity, EntityKind},
    validation::{check_comments, check_min, guard, min_problem, require_text, Validate, ValidationError},
    wire::{push_trailing, tags, Streamable, WireWriter},
    wire_fields,
};
use serde::{Deserialize, Serialize};

/// Infrastructure the fire may reach, read from a vector file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetFile {
    pub id: String,
    pub filename: String,
    /// Metres around each asset that count as arrival.
    pub buffer: f64,
    pub comments: Option<String>,
}

impl Default for AssetFile {
    fn default() -> Self {
        AssetFile {
            id: next_default_id(EntityKind::AssetFile),
            filename: String::new(),
            buffer: 0.0,
            comments: None,
        }
    }
}

impl AssetFile {
    pub fn new(filename: impl Into<String>) -> Self {
        AssetFile {
            filename: filename.into(),
            ..Default::default()
        }
    }

    pub fn set_buffer(&mut self, buffer: f64) -> Result<()> {
        guard("buffer", min_problem(buffer, 0.0))?;
        self.buffer = buffer;
        Ok(())
    }
}

impl Validate for AssetFile {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_id(&mut errors, &self.id);
        require_text(&mut errors, "filename", &self.filename);
        check_min(&mut errors, "buffer", self.buffer, 0.0);
        check_comments(&mut errors, &self.comments);
        errors
    }
}

impl Entity for AssetFile {
    const KIND: EntityKind = EntityKind::AssetFile;

    fn id(&self) -> &str {
        &self.id
    }

    fn id_mut(&mut self) -> &mut String {
        &mut self.id
    }
}

impl Streamable for AssetFile {
    fn stream(&self, out: &mut WireWriter) {
        let mut fields = wire_fields![self.id, self.filename, self.buffer];
        push_trailing(&mut fields, self.comments.as_ref());
        out.record(tags::ASSET_FILE, fields);
    }
}

/// Points or lines wind and vector targets are aimed at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetFile {
    pub id: String,
    pub filename: String,
    pub comments: Option<String>,
}

impl Default for TargetFile {
    fn default() -> Self {
        TargetFile {
            id: next_default_id(EntityKind::TargetFile),
            filename: String::new(),
            comments: None,
        }
    }
}

impl TargetFile {
    pub fn new(filename: impl Into<String>) -> Self {
        TargetFile {
            filename: filename.into(),
            ..Default::default()
        }
    }
}

impl Validate for TargetFile {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_id(&mut errors, &self.id);
        require_text(&mut errors, "filename", &self.filename);
        check_comments(&mut errors, &self.comments);
        errors
    }
}

impl Entity for TargetFile {
    const KIND: EntityKind = EntityKind::TargetFile;

    fn id(&self) -> &str {
        &self.id
    }

    fn id_mut(&mut self) -> &mut String {
        &mut self.id
    }
}

impl Streamable for TargetFile {
    fn stream(&self, out: &mut WireWriter) {
        let mut fields = wire_fields![self.id, self.filename];
        push_trailing(&mut fields, self.comments.as_ref());
        out.record(tags::TARGET_FILE, fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::with_policy;

    #[test]
    fn test_asset_buffer_policy() {
        with_policy(false, || {
            let mut asset = AssetFile::new("cabins.shp");
            asset.set_buffer(-5.0).unwrap();
            assert_eq!(asset.check_valid().len(), 1);
        });
        with_policy(true, || {
            let mut asset = AssetFile::new("cabins.shp");
            assert!(asset.set_buffer(-5.0).is_err());
            assert_eq!(asset.buffer, 0.0);
        });
    }

    #[test]
    fn test_target_stream() {
        let mut target = TargetFile::new("attachment:/0/targets.shp");
        target.id = "tgt".into();
        let mut out = WireWriter::new();
        target.stream(&mut out);
        assert_eq!(out.render(), "targetfile\ntgt|attachment:/0/targets.shp\n");
    }
}
