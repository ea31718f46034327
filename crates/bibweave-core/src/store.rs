//! Year-keyed JSON stage files with merge-on-write.
//!
//! Each stage writes `{"<year>": [records...]}`. Merging overwrites matching
//! year keys and leaves other years untouched, so re-crawling 2023 does not
//! clobber 2019.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Load a stage file into a year-keyed map.
pub fn load_year_map<T: DeserializeOwned>(path: &Path) -> io::Result<BTreeMap<String, Vec<T>>> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(io::Error::other)
}

/// Write a stage file atomically (tmp file + rename).
pub fn save_year_map<T: Serialize>(
    path: &Path,
    data: &BTreeMap<String, Vec<T>>,
) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    let body = serde_json::to_string_pretty(data).map_err(io::Error::other)?;
    std::fs::write(&tmp, body)?;
    std::fs::rename(&tmp, path)
}

/// Merge `data` into the file at `path`: new year keys overwrite existing
/// ones, all other years are preserved.
pub fn merge_year_map<T: Serialize>(
    path: &Path,
    data: &BTreeMap<String, Vec<T>>,
) -> io::Result<()> {
    let mut existing: BTreeMap<String, Value> = if path.exists() {
        load_year_map(path)?
            .into_iter()
            .map(|(year, records): (String, Vec<Value>)| (year, Value::Array(records)))
            .collect()
    } else {
        BTreeMap::new()
    };
    for (year, records) in data {
        let value = serde_json::to_value(records).map_err(io::Error::other)?;
        existing.insert(year.clone(), value);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    let body = serde_json::to_string_pretty(&existing).map_err(io::Error::other)?;
    std::fs::write(&tmp, body)?;
    std::fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn year_map(pairs: &[(&str, Vec<Value>)]) -> BTreeMap<String, Vec<Value>> {
        pairs
            .iter()
            .map(|(y, v)| (y.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf_base_data.json");
        let data = year_map(&[("2020", vec![json!({"Title": "a"})])]);
        save_year_map(&path, &data).unwrap();
        let loaded: BTreeMap<String, Vec<Value>> = load_year_map(&path).unwrap();
        assert_eq!(loaded, data);
    }

    #[test]
    fn merge_overwrites_matching_years_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        save_year_map(
            &path,
            &year_map(&[
                ("2019", vec![json!({"Title": "old19"})]),
                ("2020", vec![json!({"Title": "old20"})]),
            ]),
        )
        .unwrap();

        merge_year_map(&path, &year_map(&[("2020", vec![json!({"Title": "new20"})])])).unwrap();

        let loaded: BTreeMap<String, Vec<Value>> = load_year_map(&path).unwrap();
        assert_eq!(loaded["2019"][0]["Title"], "old19");
        assert_eq!(loaded["2020"][0]["Title"], "new20");
    }

    #[test]
    fn merge_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("data.json");
        merge_year_map(&path, &year_map(&[("2021", vec![json!(1)])])).unwrap();
        let loaded: BTreeMap<String, Vec<Value>> = load_year_map(&path).unwrap();
        assert_eq!(loaded["2021"], vec![json!(1)]);
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_year_map::<Value>(&dir.path().join("nope.json")).is_err());
    }

    #[test]
    fn no_tmp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        save_year_map(&path, &year_map(&[("2020", vec![])])).unwrap();
        assert!(!path.with_extension("json.tmp").exists());
    }
}
