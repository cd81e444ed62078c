//! Write payload validation
//!
//! Checks an untyped write payload key by key before anything is
//! committed. A payload with any error is rejected as a whole.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::models::{keys, DocumentPatch};

/// Outcome of validating a write payload
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    /// Every key is known and well-formed
    Valid(DocumentPatch),
    /// At least one problem; nothing may be written
    Invalid(Vec<String>),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid(_))
    }

    pub fn into_result(self) -> Result<DocumentPatch, Vec<String>> {
        match self {
            Validation::Valid(patch) => Ok(patch),
            Validation::Invalid(errors) => Err(errors),
        }
    }
}

/// Validate a raw write payload
///
/// Collects every error instead of stopping at the first one: unknown
/// top-level keys, keys of the wrong shape, then entries that do not fit
/// the entity types.
pub fn validate_patch(payload: &Value) -> Validation {
    let map = match payload.as_object() {
        Some(map) => map,
        None => return Validation::Invalid(vec!["payload must be an object".to_string()]),
    };

    let mut errors = Vec::new();

    for key in map.keys() {
        if !keys::ALL.contains(&key.as_str()) {
            errors.push(format!("Invalid key: {}", key));
        }
    }

    for key in [keys::BOOKMARKS, keys::GROUPS, keys::BACKUPS, keys::SEARCH_HISTORY] {
        if let Some(value) = map.get(key) {
            if !value.is_array() {
                errors.push(format!("{} must be an array", key));
            }
        }
    }

    if let Some(settings) = map.get(keys::SETTINGS) {
        if !settings.is_object() {
            errors.push("settings must be an object".to_string());
        }
    }

    if !errors.is_empty() {
        return Validation::Invalid(errors);
    }

    let mut patch = DocumentPatch::default();
    patch.bookmarks = decode(map, keys::BOOKMARKS, &mut errors);
    patch.groups = decode(map, keys::GROUPS, &mut errors);
    patch.settings = decode(map, keys::SETTINGS, &mut errors);
    patch.backups = decode(map, keys::BACKUPS, &mut errors);
    patch.search_history = decode(map, keys::SEARCH_HISTORY, &mut errors);

    if errors.is_empty() {
        Validation::Valid(patch)
    } else {
        Validation::Invalid(errors)
    }
}

fn decode<T: DeserializeOwned>(
    map: &Map<String, Value>,
    key: &str,
    errors: &mut Vec<String>,
) -> Option<T> {
    let value = map.get(key)?;
    match serde_json::from_value(value.clone()) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            errors.push(format!("{}: {}", key, e));
            None
        }
    }
}
