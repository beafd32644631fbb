//! Localized display names for decoded attributes.
//!
//! Three independent tables map raw strings from the database (country
//! names, region names, city names) to display strings. A key with no
//! entry displays as itself.
//!
//! Tables are loaded once from JSON objects (`{"raw": "display", ...}`) and
//! are read-only afterwards. When a table's file is absent the table falls
//! back to a single built-in entry for the unassigned marker `-`.

use crate::error::{GeoError, Result};
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Display name for the unassigned city marker (private/reserved ranges)
pub const PRIVATE_NETWORK: &str = "内网IP";

/// Marker the database uses for unassigned attributes
pub const UNASSIGNED: &str = "-";

/// File names looked up by [`Translations::load_dir`]
pub const COUNTRY_FILE: &str = "country.json";
/// Region table file name
pub const REGION_FILE: &str = "region.json";
/// City table file name
pub const CITY_FILE: &str = "city.json";

/// Raw string to display string mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationTable {
    entries: FxHashMap<String, String>,
}

impl TranslationTable {
    /// Empty table: every key displays as itself
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding a single entry
    pub fn single(raw: &str, display: &str) -> Self {
        let mut table = Self::new();
        table.insert(raw, display);
        table
    }

    /// Parse a JSON object of string values
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let entries: FxHashMap<String, String> = serde_json::from_reader(reader)?;
        Ok(TranslationTable { entries })
    }

    /// Parse a JSON object from a string
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_json_reader(json.as_bytes())
    }

    /// Load a JSON object from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            GeoError::Translation(format!("Failed to open {}: {}", path.display(), e))
        })?;
        Self::from_json_reader(BufReader::new(file)).map_err(|e| match e {
            GeoError::Translation(msg) => {
                GeoError::Translation(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Load `path` if it exists, otherwise use `fallback`
    pub fn load_or<P: AsRef<Path>>(path: P, fallback: TranslationTable) -> Result<Self> {
        let path = path.as_ref();
        if path.is_file() {
            let table = Self::load(path)?;
            debug!(path = %path.display(), entries = table.len(), "loaded translation table");
            Ok(table)
        } else {
            warn!(path = %path.display(), "translation table not found, using defaults");
            Ok(fallback)
        }
    }

    /// Add or replace an entry
    pub fn insert(&mut self, raw: &str, display: &str) {
        self.entries.insert(raw.to_string(), display.to_string());
    }

    /// Display string for `key`, or `key` itself when there is no entry
    pub fn lookup<'a>(&'a self, key: &'a str) -> &'a str {
        self.lookup_or(key, key)
    }

    /// Display string for `key`, or `default` when there is no entry
    pub fn lookup_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.entries.get(key).map(String::as_str).unwrap_or(default)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TranslationTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        TranslationTable {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// The country, region and city tables used by every query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translations {
    /// Keyed by raw country name
    pub country: TranslationTable,
    /// Keyed by raw region name
    pub region: TranslationTable,
    /// Keyed by raw city name
    pub city: TranslationTable,
}

impl Translations {
    /// Built-in tables used when no translation files are supplied
    pub fn defaults() -> Self {
        Translations {
            country: Self::default_country(),
            region: Self::default_region(),
            city: Self::default_city(),
        }
    }

    /// `-` → `-`
    pub fn default_country() -> TranslationTable {
        TranslationTable::single(UNASSIGNED, UNASSIGNED)
    }

    /// `-` → `-`
    pub fn default_region() -> TranslationTable {
        TranslationTable::single(UNASSIGNED, UNASSIGNED)
    }

    /// `-` → private network marker
    pub fn default_city() -> TranslationTable {
        TranslationTable::single(UNASSIGNED, PRIVATE_NETWORK)
    }

    /// Load `country.json`, `region.json` and `city.json` from `dir`
    ///
    /// Each missing file selects that table's default. A file that exists
    /// but does not hold a JSON object of strings is an error.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        Ok(Translations {
            country: TranslationTable::load_or(dir.join(COUNTRY_FILE), Self::default_country())?,
            region: TranslationTable::load_or(dir.join(REGION_FILE), Self::default_region())?,
            city: TranslationTable::load_or(dir.join(CITY_FILE), Self::default_city())?,
        })
    }
}

impl Default for Translations {
    fn default() -> Self {
        Self::defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_lookup_falls_back_to_key() {
        let table: TranslationTable = [("Japan", "日本")].into_iter().collect();
        assert_eq!(table.lookup("Japan"), "日本");
        assert_eq!(table.lookup("Brazil"), "Brazil");
        assert_eq!(table.lookup_or("Brazil", "?"), "?");
    }

    #[test]
    fn test_defaults() {
        let t = Translations::defaults();
        assert_eq!(t.country.lookup("-"), "-");
        assert_eq!(t.region.lookup("-"), "-");
        assert_eq!(t.city.lookup("-"), PRIVATE_NETWORK);
        assert_eq!(t.city.lookup("Paris"), "Paris");
    }

    #[test]
    fn test_from_json() {
        let table = TranslationTable::from_json_str(r#"{"Tokyo": "东京", "Osaka": "大阪"}"#).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup("Osaka"), "大阪");

        let err = TranslationTable::from_json_str(r#"["not", "a", "map"]"#).unwrap_err();
        assert!(matches!(err, GeoError::Translation(_)));
    }

    #[test]
    fn test_load_dir_mixes_files_and_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(COUNTRY_FILE), r#"{"Japan": "日本"}"#).unwrap();

        let t = Translations::load_dir(dir.path()).unwrap();
        assert_eq!(t.country.lookup("Japan"), "日本");
        // A supplied file replaces the default entirely.
        assert_eq!(t.country.len(), 1);
        assert_eq!(t.region, Translations::default_region());
        assert_eq!(t.city.lookup("-"), PRIVATE_NETWORK);
    }

    #[test]
    fn test_load_dir_rejects_malformed_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CITY_FILE), "{ not json").unwrap();

        let err = Translations::load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, GeoError::Translation(msg) if msg.contains(CITY_FILE)));
    }
}
