use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stat type selector for the tracking family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackingKind {
    Passing,
    Rushing,
    Receiving,
}

impl TrackingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingKind::Passing => "passing",
            TrackingKind::Rushing => "rushing",
            TrackingKind::Receiving => "receiving",
        }
    }
}

/// Upstream data boundary. Implementations own transport, storage, and retry
/// policy; errors they return propagate through the engine unchanged.
pub trait DataProvider: Send + Sync {
    /// Roster table: one row per player with name variants, position,
    /// physical, draft, and birth fields.
    fn load_roster(&self) -> Result<Vec<RawRow>>;

    /// Cross-platform identifier table keyed by the canonical id.
    fn load_id_crosswalk(&self) -> Result<Vec<RawRow>>;

    /// Weekly box-score rows for the requested seasons (all players).
    fn load_season_stats(&self, seasons: &[u16]) -> Result<Vec<RawRow>>;

    /// Weekly tracking rows for the requested seasons and stat type.
    fn load_tracking_stats(&self, seasons: &[u16], kind: TrackingKind) -> Result<Vec<RawRow>>;
}

/// A loosely-typed table row as delivered by the provider.
///
/// Cells are `serde_json::Value`; the accessors treat null and empty/blank
/// strings as absent so downstream coalescing doesn't pick up placeholders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    fields: BTreeMap<String, Value>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Non-blank string cell, trimmed.
    pub fn text(&self, key: &str) -> Option<&str> {
        let raw = self.fields.get(key)?.as_str()?;
        let trimmed = raw.trim();
        if trimmed.is_empty() { None } else { Some(trimmed) }
    }

    /// Integer cell; numeric strings and whole floats are accepted.
    pub fn integer(&self, key: &str) -> Option<i64> {
        value_as_integer(self.fields.get(key)?)
    }

    /// Numeric cell; numeric strings are accepted.
    pub fn number(&self, key: &str) -> Option<f64> {
        value_as_number(self.fields.get(key)?)
    }

    /// First non-blank string across the given columns.
    pub fn first_text(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.text(key))
    }

    /// First parseable integer across the given columns.
    pub fn first_integer(&self, keys: &[&str]) -> Option<i64> {
        keys.iter().find_map(|key| self.integer(key))
    }

    /// Merge another row into this one. Colliding keys keep this row's value
    /// and store the other row's value under `<key><suffix>`.
    pub fn merge_suffixed(&mut self, other: &RawRow, suffix: &str) {
        for (key, value) in other.iter() {
            if self.fields.contains_key(key) {
                if self.fields.get(key) != Some(value) {
                    self.fields.insert(format!("{key}{suffix}"), value.clone());
                }
            } else {
                self.fields.insert(key.to_string(), value.clone());
            }
        }
    }
}

impl FromIterator<(String, Value)> for RawRow {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

pub(crate) fn value_as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || s == "-" {
                return None;
            }
            s.parse::<f64>().ok()
        }
        _ => None,
    }
}

pub(crate) fn value_as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.fract() == 0.0).map(|f| f as i64))
        }
        _ => None,
    }
}
