//! Recursive validation errors and the inline-throw policy.
//!
//! Every configuration type implements [`Validate`]. `check_valid` never
//! stops at the first problem; it returns a tree of [`ValidationError`]s
//! that mirrors the object graph, with child entity errors nested under
//! the property that holds them.
//!
//! Setters are governed by a process-wide switch. With
//! [`set_inline_throw_on_error`] enabled a setter rejects an out-of-range
//! value immediately and leaves the target untouched. With it disabled
//! (the default) the value is stored as given and only `check_valid`
//! reports it, so partially built or deserialized objects can exist.

use crate::error::{Result, WiseError};
use serde::Serialize;
use std::{
    fmt,
    ops::Deref,
    sync::atomic::{AtomicBool, Ordering},
};

static INLINE_THROW_ON_ERROR: AtomicBool = AtomicBool::new(false);

/// Enable or disable fail-fast setters for the whole process.
pub fn set_inline_throw_on_error(enabled: bool) {
    INLINE_THROW_ON_ERROR.store(enabled, Ordering::SeqCst);
}

/// Whether setters currently reject invalid values.
pub fn inline_throw_on_error() -> bool {
    INLINE_THROW_ON_ERROR.load(Ordering::SeqCst)
}

/// Gate a setter on the inline policy.
///
/// `problem` is the message a validator would report for the new value, or
/// `None` when it is acceptable.
pub fn guard(property: &str, problem: Option<String>) -> Result<()> {
    match problem {
        Some(message) if inline_throw_on_error() => Err(WiseError::invalid(property, message)),
        _ => Ok(()),
    }
}

/// Gate a setter that takes a whole value on its first validation error.
pub fn guard_value(property: &str, value: &impl Validate) -> Result<()> {
    if !inline_throw_on_error() {
        return Ok(());
    }
    match value.check_valid().into_iter().next() {
        Some(error) => Err(WiseError::invalid(
            format!("{property}.{}", error.property),
            error.message,
        )),
        None => Ok(()),
    }
}

/// Which property of the parent an error belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Property {
    Name(String),
    Index(usize),
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Name(name) => write!(f, "{name}"),
            Property::Index(index) => write!(f, "[{index}]"),
        }
    }
}

impl From<&str> for Property {
    fn from(value: &str) -> Self {
        Property::Name(value.to_string())
    }
}

impl From<String> for Property {
    fn from(value: String) -> Self {
        Property::Name(value)
    }
}

impl From<usize> for Property {
    fn from(value: usize) -> Self {
        Property::Index(value)
    }
}

/// One node of a validation error tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub property: Property,
    pub message: String,
    /// Short label of the offending object, e.g. `Scenario(scen0)`.
    pub object: Option<String>,
    pub children: Vec<ValidationError>,
}

impl ValidationError {
    /// A single invalid field.
    pub fn leaf(property: impl Into<Property>, message: impl Into<String>) -> Self {
        ValidationError {
            property: property.into(),
            message: message.into(),
            object: None,
            children: Vec::new(),
        }
    }

    /// An aggregate of child errors.
    pub fn node(
        property: impl Into<Property>,
        message: impl Into<String>,
        children: Vec<ValidationError>,
    ) -> Self {
        ValidationError {
            property: property.into(),
            message: message.into(),
            object: None,
            children,
        }
    }

    pub fn with_object(mut self, object: impl Into<String>) -> Self {
        self.object = Some(object.into());
        self
    }

    /// Number of leaves below (and including) this node.
    pub fn count(&self) -> usize {
        if self.children.is_empty() {
            1
        } else {
            self.children.iter().map(ValidationError::count).sum()
        }
    }

    /// Leaf errors as `(dotted.path, message)` pairs.
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        self.flatten_into(String::new(), &mut out);
        out
    }

    fn flatten_into(&self, prefix: String, out: &mut Vec<(String, String)>) {
        let path = match (&self.property, prefix.is_empty()) {
            (Property::Index(_), _) | (_, true) => format!("{prefix}{}", self.property),
            (Property::Name(_), false) => format!("{prefix}.{}", self.property),
        };
        if self.children.is_empty() {
            out.push((path, self.message.clone()));
        } else {
            for child in &self.children {
                child.flatten_into(path.clone(), out);
            }
        }
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}{}: {}", "", self.property, self.message, indent = depth * 2)?;
        if let Some(object) = &self.object {
            write!(f, " ({object})")?;
        }
        writeln!(f)?;
        for child in &self.children {
            child.write_tree(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}

/// Validity checks shared by every configuration type.
pub trait Validate {
    /// Collect every problem instead of stopping at the first one.
    fn check_valid(&self) -> Vec<ValidationError>;

    fn is_valid(&self) -> bool {
        self.check_valid().is_empty()
    }
}

impl<T: Validate> Validate for Option<T> {
    fn check_valid(&self) -> Vec<ValidationError> {
        self.as_ref().map(Validate::check_valid).unwrap_or_default()
    }
}

/// Nest `child`'s errors under `property` if it has any.
pub fn push_child(
    errors: &mut Vec<ValidationError>,
    property: &str,
    label: impl FnOnce() -> String,
    child: &impl Validate,
) {
    let children = child.check_valid();
    if !children.is_empty() {
        errors.push(
            ValidationError::node(property, "contains invalid values", children).with_object(label()),
        );
    }
}

/// Nest the errors of every invalid item under `property`, one indexed
/// child per item.
pub fn push_items<T: Validate>(errors: &mut Vec<ValidationError>, property: &str, items: &[T]) {
    let children: Vec<ValidationError> = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let item_errors = item.check_valid();
            (!item_errors.is_empty())
                .then(|| ValidationError::node(index, "contains invalid values", item_errors))
        })
        .collect();
    if !children.is_empty() {
        errors.push(ValidationError::node(property, "contains invalid entries", children));
    }
}

/// Message for a value outside the closed range `[min, max]`.
pub fn range_problem(value: f64, min: f64, max: f64) -> Option<String> {
    (!(min..=max).contains(&value)).then(|| format!("must be between {min} and {max}, got {value}"))
}

/// Message for a value below `min`.
pub fn min_problem(value: f64, min: f64) -> Option<String> {
    (value.is_nan() || value < min).then(|| format!("must be at least {min}, got {value}"))
}

/// Message for text that is empty or would break the record framing.
pub fn text_problem(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        Some("is required".to_string())
    } else if wise_utils::fields::has_reserved(value) {
        Some("may not contain '|' or line breaks".to_string())
    } else {
        None
    }
}

pub fn check_range(errors: &mut Vec<ValidationError>, property: &str, value: f64, min: f64, max: f64) {
    if let Some(message) = range_problem(value, min, max) {
        errors.push(ValidationError::leaf(property, message));
    }
}

pub fn check_min(errors: &mut Vec<ValidationError>, property: &str, value: f64, min: f64) {
    if let Some(message) = min_problem(value, min) {
        errors.push(ValidationError::leaf(property, message));
    }
}

pub fn require_text(errors: &mut Vec<ValidationError>, property: &str, value: &str) {
    if let Some(message) = text_problem(value) {
        errors.push(ValidationError::leaf(property, message));
    }
}

/// Optional free text may be absent but never break the framing.
pub fn check_comments(errors: &mut Vec<ValidationError>, value: &Option<String>) {
    if let Some(text) = value {
        if wise_utils::fields::has_reserved(text) {
            errors.push(ValidationError::leaf(
                "comments",
                "may not contain '|' or line breaks",
            ));
        }
    }
}

/// A value that passed `check_valid` when it was wrapped.
#[derive(Debug, Clone)]
pub struct Strict<T>(T);

impl<T: Validate> Strict<T> {
    pub fn new(value: T) -> std::result::Result<Strict<T>, Vec<ValidationError>> {
        let errors = value.check_valid();
        if errors.is_empty() {
            Ok(Strict(value))
        } else {
            Err(errors)
        }
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Strict<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

/// Serializes tests that flip the process-wide policy.
#[cfg(test)]
pub(crate) static POLICY_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
pub(crate) fn with_policy<R>(enabled: bool, f: impl FnOnce() -> R) -> R {
    let _lock = POLICY_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    set_inline_throw_on_error(enabled);
    let result = f();
    set_inline_throw_on_error(false);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Sample {
        value: f64,
        name: String,
    }

    impl Validate for Sample {
        fn check_valid(&self) -> Vec<ValidationError> {
            let mut errors = Vec::new();
            check_range(&mut errors, "value", self.value, 0.0, 1.0);
            require_text(&mut errors, "name", &self.name);
            errors
        }
    }

    #[test]
    fn test_collects_all_errors() {
        let sample = Sample {
            value: 2.0,
            name: String::new(),
        };
        let errors = sample.check_valid();
        assert_eq!(errors.len(), 2);
        assert!(!sample.is_valid());
    }

    #[test]
    fn test_nested_flatten() {
        let samples = vec![
            Sample {
                value: 0.5,
                name: "ok".into(),
            },
            Sample {
                value: -1.0,
                name: "bad".into(),
            },
        ];
        let mut errors = Vec::new();
        push_items(&mut errors, "samples", &samples);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].count(), 1);
        let flat = errors[0].flatten();
        assert_eq!(flat[0].0, "samples[1].value");
    }

    #[test]
    fn test_display_tree() {
        let tree = ValidationError::node(
            "scenario",
            "contains invalid values",
            vec![ValidationError::leaf("startTime", "is required")],
        )
        .with_object("Scenario(scen0)");
        let text = tree.to_string();
        assert!(text.starts_with("scenario: contains invalid values (Scenario(scen0))\n"));
        assert!(text.contains("  startTime: is required"));
    }

    #[test]
    fn test_guard_follows_policy() {
        with_policy(false, || {
            assert!(guard("value", Some("bad".into())).is_ok());
        });
        with_policy(true, || {
            assert!(guard("value", Some("bad".into())).is_err());
            assert!(guard("value", None).is_ok());
        });
    }

    #[test]
    fn test_strict_wrapper() {
        let good = Sample {
            value: 0.1,
            name: "x".into(),
        };
        assert_eq!(Strict::new(good).unwrap().value, 0.1);
        let bad = Sample {
            value: 9.0,
            name: "x".into(),
        };
        assert_eq!(Strict::new(bad).unwrap_err().len(), 1);
    }

    #[test]
    fn test_text_problem() {
        assert!(text_problem("").is_some());
        assert!(text_problem("a|b").is_some());
        assert!(text_problem("stream0").is_none());
    }
}
