//! Process-unique identifiers and the arenas that own identified entities.
//!
//! Entities never point at each other. A scenario that uses a weather
//! stream stores the stream's id as a plain string, so an entity must carry
//! its final id before anything references it: renaming through
//! [`Arena::rename`] does not rewrite existing references.

use crate::{
    error::{Result, WiseError},
    validation::{inline_throw_on_error, text_problem, Validate, ValidationError},
    wire::{Streamable, WireWriter},
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Every type that owns an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    WeatherStation,
    WeatherStream,
    Ignition,
    Scenario,
    FuelPatch,
    FuelBreak,
    GridFile,
    WeatherPatch,
    WeatherGrid,
    AssetFile,
    TargetFile,
    FuelDefinition,
}

const KIND_COUNT: usize = 12;

#[allow(clippy::declare_interior_mutable_const)]
const ZERO: AtomicU64 = AtomicU64::new(0);
static COUNTERS: [AtomicU64; KIND_COUNT] = [ZERO; KIND_COUNT];

impl EntityKind {
    /// Prefix of generated default ids.
    pub fn prefix(self) -> &'static str {
        match self {
            EntityKind::WeatherStation => "weatherstation",
            EntityKind::WeatherStream => "weatherstream",
            EntityKind::Ignition => "ignition",
            EntityKind::Scenario => "scen",
            EntityKind::FuelPatch => "fuelpatch",
            EntityKind::FuelBreak => "fuelbreak",
            EntityKind::GridFile => "gridfile",
            EntityKind::WeatherPatch => "weatherpatch",
            EntityKind::WeatherGrid => "weathergrid",
            EntityKind::AssetFile => "asset",
            EntityKind::TargetFile => "target",
            EntityKind::FuelDefinition => "fueldefinition",
        }
    }

    pub fn type_name(self) -> &'static str {
        match self {
            EntityKind::WeatherStation => "WeatherStation",
            EntityKind::WeatherStream => "WeatherStream",
            EntityKind::Ignition => "Ignition",
            EntityKind::Scenario => "Scenario",
            EntityKind::FuelPatch => "FuelPatch",
            EntityKind::FuelBreak => "FuelBreak",
            EntityKind::GridFile => "GridFile",
            EntityKind::WeatherPatch => "WeatherPatch",
            EntityKind::WeatherGrid => "WeatherGrid",
            EntityKind::AssetFile => "AssetFile",
            EntityKind::TargetFile => "TargetFile",
            EntityKind::FuelDefinition => "FuelDefinition",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Next default id for `kind`, e.g. `scen3`.
///
/// Counters only ever increase, so two entities created in the same
/// process never share a default id.
pub fn next_default_id(kind: EntityKind) -> String {
    let n = COUNTERS[kind.slot()].fetch_add(1, Ordering::Relaxed);
    format!("{}{}", kind.prefix(), n)
}

/// An entity addressable by identifier.
pub trait Entity: Validate {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    fn id_mut(&mut self) -> &mut String;

    /// Replace the id, subject to the inline policy. Uniqueness is checked
    /// by the owning [`Arena`], not here.
    fn set_id(&mut self, id: &str) -> Result<()> {
        crate::validation::guard("id", text_problem(id))?;
        *self.id_mut() = id.to_string();
        Ok(())
    }

    /// Short label used as the offending object of validation errors.
    fn label(&self) -> String {
        format!("{}({})", Self::KIND.type_name(), self.id())
    }
}

/// Report an unusable identifier.
pub fn check_id(errors: &mut Vec<ValidationError>, id: &str) {
    if let Some(message) = text_problem(id) {
        errors.push(ValidationError::leaf("id", message));
    }
}

/// Ordered storage for one entity type, looked up by id.
///
/// Duplicates are refused by [`Arena::add`] only while the inline policy
/// is on; otherwise they are stored and reported by `check_valid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arena<T> {
    items: Vec<T>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Arena { items: Vec::new() }
    }
}

impl<T: Entity> Arena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(Entity::id)
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Store an entity and return a handle to it for further setup.
    pub fn add(&mut self, item: T) -> Result<&mut T> {
        if inline_throw_on_error() {
            if let Some(message) = text_problem(item.id()) {
                return Err(WiseError::invalid("id", message));
            }
            if self.contains(item.id()) {
                return Err(WiseError::DuplicateId(item.id().to_string()));
            }
        }
        let index = self.items.len();
        self.items.push(item);
        Ok(&mut self.items[index])
    }

    /// Change an entity's id. References already holding `old` keep it.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        if inline_throw_on_error() && old != new && self.contains(new) {
            return Err(WiseError::DuplicateId(new.to_string()));
        }
        let item = self
            .get_mut(old)
            .ok_or_else(|| WiseError::UnknownId(old.to_string()))?;
        item.set_id(new)
    }

    pub fn remove(&mut self, id: &str) -> Option<T> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(index))
    }

    /// Ids held by more than one entity, in first-seen order.
    pub fn duplicates(&self) -> Vec<String> {
        let mut seen: Vec<&str> = Vec::new();
        let mut duplicates: Vec<String> = Vec::new();
        for id in self.ids() {
            if seen.contains(&id) {
                if !duplicates.iter().any(|d| d == id) {
                    duplicates.push(id.to_string());
                }
            } else {
                seen.push(id);
            }
        }
        duplicates
    }
}

impl<T: Entity> Validate for Arena<T> {
    fn check_valid(&self) -> Vec<ValidationError> {
        let mut errors: Vec<ValidationError> = self
            .items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let item_errors = item.check_valid();
                (!item_errors.is_empty()).then(|| {
                    ValidationError::node(index, "contains invalid values", item_errors)
                        .with_object(item.label())
                })
            })
            .collect();
        for id in self.duplicates() {
            errors.push(
                ValidationError::leaf("id", format!("'{id}' is used more than once"))
                    .with_object(format!("{}({id})", T::KIND.type_name())),
            );
        }
        errors
    }
}

impl<T: Entity + Streamable> Streamable for Arena<T> {
    fn stream(&self, out: &mut WireWriter) {
        for item in &self.items {
            item.stream(out);
        }
    }
}

impl<'a, T> IntoIterator for &'a Arena<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T> FromIterator<T> for Arena<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Arena {
            items: iter.into_iter().collect(),
        }
    }
}
