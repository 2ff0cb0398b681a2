//! # Synonym resolution
//!
//! Canonicalizes decoded entity values: if the lower-cased value is a known
//! surface variant, it is replaced by the canonical form, otherwise left
//! unchanged. The table is loaded once at startup and read-only afterwards;
//! there is deliberately no mutation path at request time.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::decoder::EntityMap;
use crate::error::ExtractError;

/// Case-insensitive lookup table from surface variant to canonical value.
/// Keys are lowercased at load time; lookups lowercase the value side only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynonymTable {
    map: HashMap<String, String>,
}

impl SynonymTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(variant, canonical)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut table = Self::new();
        for (variant, canonical) in pairs {
            table.insert(variant.into(), canonical.into());
        }
        table
    }

    /// Load a table from a JSON object file: `{"nyc": "New York City", ...}`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ExtractError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| ExtractError::io(path, e))?;
        let map: HashMap<String, String> = serde_json::from_str(&raw)?;
        Ok(Self::from_pairs(map))
    }

    /// Register one variant. Only available while building the table.
    pub fn insert(&mut self, variant: String, canonical: String) {
        self.map.insert(variant.to_lowercase(), canonical);
    }

    /// Canonical form for a surface value, if one is registered.
    pub fn canonical(&self, value: &str) -> Option<&str> {
        self.map.get(&value.to_lowercase()).map(String::as_str)
    }

    /// Replace every entity value that has a canonical form. Pure with
    /// respect to the table; idempotent as long as canonical forms are not
    /// themselves registered as variants of something else.
    pub fn resolve(&self, mut entities: EntityMap) -> EntityMap {
        for value in entities.values_mut() {
            if let Some(canonical) = self.canonical(value) {
                *value = canonical.to_string();
            }
        }
        entities
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SynonymTable {
        SynonymTable::from_pairs([("nyc", "New York City"), ("sf", "San Francisco")])
    }

    fn city(value: &str) -> EntityMap {
        EntityMap::from([("city".to_string(), value.to_string())])
    }

    #[test]
    fn test_resolve_known_variant() {
        let resolved = table().resolve(city("nyc"));
        assert_eq!(resolved["city"], "New York City");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let resolved = table().resolve(city("NYC"));
        assert_eq!(resolved["city"], "New York City");
    }

    #[test]
    fn test_unknown_value_unchanged() {
        let resolved = table().resolve(city("paris"));
        assert_eq!(resolved["city"], "paris");
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let once = table().resolve(city("nyc"));
        let twice = table().resolve(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_keys_lowercased_at_load() {
        let table = SynonymTable::from_pairs([("NyC", "New York City")]);
        assert_eq!(table.canonical("nYc"), Some("New York City"));
    }

    #[test]
    fn test_empty_table_is_noop() {
        let entities = city("nyc");
        assert_eq!(SynonymTable::new().resolve(entities.clone()), entities);
    }
}
