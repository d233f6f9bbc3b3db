// Filename -> bounding box table for the labeled training images.
//
// The table is a JSON asset: one entry per tag, in upload order, each mapping
// an image file name to `[left, top, width, height]` in normalized units.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::RegionError;

const BUILTIN_TABLE: &str = include_str!("../assets/regions.json");

/// Slack allowed on `left + width` / `top + height` for rounding in the data.
const EDGE_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TagRegions {
    pub name: String,
    pub images: BTreeMap<String, [f64; 4]>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RegionTable {
    tags: Vec<TagRegions>,
}

impl RegionTable {
    /// The Fork/Scissors table shipped with the binary.
    pub fn builtin() -> Result<Self, RegionError> {
        Self::from_json(BUILTIN_TABLE)
    }

    pub fn from_path(path: &Path) -> Result<Self, RegionError> {
        let raw = std::fs::read_to_string(path).map_err(|source| RegionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, RegionError> {
        let table: RegionTable = serde_json::from_str(raw)?;
        table.validate()?;
        Ok(table)
    }

    fn validate(&self) -> Result<(), RegionError> {
        for tag in &self.tags {
            for (file, row) in &tag.images {
                let [left, top, width, height] = *row;
                let in_unit = row.iter().all(|v| (0.0..=1.0).contains(v));
                if !in_unit
                    || left + width > 1.0 + EDGE_TOLERANCE
                    || top + height > 1.0 + EDGE_TOLERANCE
                {
                    return Err(RegionError::OutOfRange {
                        file: file.clone(),
                        values: *row,
                    });
                }
            }
        }
        Ok(())
    }

    /// Tag names in upload order.
    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|t| t.name.as_str())
    }

    pub fn tags(&self) -> &[TagRegions] {
        &self.tags
    }

    /// Box for `file` under `tag`. A missing entry is an error, never a skip.
    pub fn lookup(&self, tag: &str, file: &str) -> Result<[f64; 4], RegionError> {
        let regions = self
            .tags
            .iter()
            .find(|t| t.name == tag)
            .ok_or_else(|| RegionError::UnknownTag(tag.to_string()))?;
        regions
            .images
            .get(file)
            .copied()
            .ok_or_else(|| RegionError::MissingRegion {
                tag: tag.to_string(),
                file: file.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_has_twenty_images_per_tag() {
        let table = RegionTable::builtin().unwrap();
        let names: Vec<&str> = table.tag_names().collect();
        assert_eq!(names, vec!["Fork", "Scissors"]);
        for tag in table.tags() {
            assert_eq!(tag.images.len(), 20, "tag {}", tag.name);
        }
    }

    #[test]
    fn lookup_returns_row() {
        let table = RegionTable::builtin().unwrap();
        let row = table.lookup("Fork", "fork_1.jpg").unwrap();
        assert_eq!(row, [0.145833328, 0.3509314, 0.5894608, 0.238562092]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let table = RegionTable::builtin().unwrap();
        let err = table.lookup("Scissors", "scissors_21.jpg").unwrap_err();
        assert!(matches!(
            err,
            RegionError::MissingRegion { ref tag, ref file } if tag == "Scissors" && file == "scissors_21.jpg"
        ));
    }

    #[test]
    fn unknown_tag_is_an_error() {
        let table = RegionTable::builtin().unwrap();
        assert!(matches!(
            table.lookup("Spoon", "spoon_1.jpg"),
            Err(RegionError::UnknownTag(_))
        ));
    }

    #[test]
    fn out_of_range_box_is_rejected() {
        let raw = r#"{"tags": [{"name": "Fork", "images": {"fork_1.jpg": [0.5, 0.1, 0.6, 0.2]}}]}"#;
        assert!(matches!(
            RegionTable::from_json(raw),
            Err(RegionError::OutOfRange { .. })
        ));
    }

    #[test]
    fn table_loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regions.json");
        std::fs::write(
            &path,
            r#"{"tags": [{"name": "Fork", "images": {"a.jpg": [0.1, 0.1, 0.5, 0.5]}}]}"#,
        )
        .unwrap();
        let table = RegionTable::from_path(&path).unwrap();
        assert_eq!(table.lookup("Fork", "a.jpg").unwrap(), [0.1, 0.1, 0.5, 0.5]);
    }
}
