// Wire models for the Custom Vision training and prediction REST APIs.
// Field names follow the service's camelCase JSON.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Domain type required for object detection projects.
pub const OBJECT_DETECTION: &str = "ObjectDetection";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub domain_type: String,
    #[serde(default)]
    pub exportable: bool,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSettings {
    pub domain_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub settings: Option<ProjectSettings>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_count: i32,
}

/// Normalized bounding box attached to one tag.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub tag_id: String,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Region {
    /// Build a region from a `[left, top, width, height]` table row.
    pub fn from_row(tag_id: &str, row: [f64; 4]) -> Self {
        Region {
            tag_id: tag_id.to_string(),
            left: row[0],
            top: row[1],
            width: row[2],
            height: row[3],
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageFileCreateEntry {
    pub name: String,
    #[serde(serialize_with = "as_base64")]
    pub contents: Vec<u8>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tag_ids: Vec<String>,
    pub regions: Vec<Region>,
}

fn as_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageFileCreateBatch {
    pub images: Vec<ImageFileCreateEntry>,
}

impl ImageFileCreateBatch {
    pub fn single(entry: ImageFileCreateEntry) -> Self {
        ImageFileCreateBatch {
            images: vec![entry],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageCreateResult {
    #[serde(default)]
    pub source_url: Option<String>,
    pub status: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageCreateSummary {
    pub is_batch_successful: bool,
    #[serde(default)]
    pub images: Vec<ImageCreateResult>,
}

impl ImageCreateSummary {
    /// Per-image statuses that are not "OK", joined for error reporting.
    pub fn rejection_reason(&self) -> String {
        let statuses: Vec<&str> = self
            .images
            .iter()
            .map(|i| i.status.as_str())
            .filter(|s| *s != "OK")
            .collect();
        if statuses.is_empty() {
            "batch was not successful".to_string()
        } else {
            statuses.join(", ")
        }
    }
}

/// Training state of an iteration as reported by the service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum TrainingStatus {
    Training,
    Completed,
    Failed,
    Other(String),
}

impl TrainingStatus {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, TrainingStatus::Training)
    }

    pub fn as_str(&self) -> &str {
        match self {
            TrainingStatus::Training => "Training",
            TrainingStatus::Completed => "Completed",
            TrainingStatus::Failed => "Failed",
            TrainingStatus::Other(s) => s,
        }
    }
}

impl From<String> for TrainingStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Training" => TrainingStatus::Training,
            "Completed" => TrainingStatus::Completed,
            "Failed" => TrainingStatus::Failed,
            _ => TrainingStatus::Other(s),
        }
    }
}

impl From<TrainingStatus> for String {
    fn from(status: TrainingStatus) -> Self {
        match status {
            TrainingStatus::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for TrainingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A training iteration. Fields the client does not model are kept in
/// `extra` so an update sends them back unchanged.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Iteration {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub status: TrainingStatus,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trained_at: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub probability: f64,
    #[serde(default)]
    pub tag_id: String,
    pub tag_name: String,
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
}

impl fmt::Display for Prediction {
    /// `<tag>: <pct>% <left>,<top>,<width>,<height>`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.2}%", self.tag_name, self.probability * 100.0)?;
        if let Some(b) = &self.bounding_box {
            write!(f, " {},{},{},{}", b.left, b.top, b.width, b.height)?;
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImagePrediction {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub iteration: String,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}
