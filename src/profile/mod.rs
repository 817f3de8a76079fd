//! Comprehensive profile document and autosave

mod autosave;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use autosave::{Autosaver, ProfileStore};

/// Completion percentage above which a profile counts as started
const MIN_COMPLETION_PERCENTAGE: f64 = 10.0;

/// The job seeker's profile as stored by the backend
///
/// The document is free-form JSON; only the fields the client reasons about
/// (`name`, `completionPercentage`) have typed accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComprehensiveProfile(Map<String, Value>);

impl ComprehensiveProfile {
    /// Create an empty profile
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value; non-objects yield an empty profile
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    /// Display name, if present and non-blank
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.0
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }

    /// Reported completion percentage (0 when absent)
    #[must_use]
    pub fn completion_percentage(&self) -> f64 {
        self.0
            .get("completionPercentage")
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }

    /// Whether enough of the profile exists to generate profile-based insights
    #[must_use]
    pub fn has_profile(&self) -> bool {
        self.completion_percentage() > MIN_COMPLETION_PERCENTAGE || self.name().is_some()
    }

    /// Read a top-level field
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Set a top-level field, returning the previous value
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.to_string(), value.into())
    }

    /// Borrow the underlying JSON object
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}
