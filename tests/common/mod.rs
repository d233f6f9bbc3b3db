#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use customvision_cli::api::{PredictionApi, TrainingApi};
use customvision_cli::error::ApiError;
use customvision_cli::models::{
    BoundingBox, Domain, ImageCreateResult, ImageCreateSummary, ImageFileCreateBatch,
    ImagePrediction, Iteration, Prediction, Project, Tag, TrainingStatus,
};
use customvision_cli::regions::RegionTable;
use reqwest::StatusCode;
use tokio::time::Instant;

#[derive(Default)]
pub struct Calls {
    pub projects: Vec<Project>,
    pub tags: Vec<(String, Tag)>,
    pub uploads: Vec<(String, ImageFileCreateBatch)>,
    pub trains: Vec<String>,
    /// Time of the train call followed by every status check.
    pub status_checks: Vec<Instant>,
    pub updates: Vec<Iteration>,
    pub predictions: Vec<(String, String, usize)>,
}

/// In-memory stand-in for both remote services.
pub struct FakeService {
    domains: Vec<Domain>,
    statuses: Mutex<VecDeque<TrainingStatus>>,
    initial_status: TrainingStatus,
    failing_uploads: HashSet<String>,
    rejected_uploads: HashSet<String>,
    predictions: Vec<Prediction>,
    next_id: Mutex<u32>,
    pub calls: Mutex<Calls>,
}

fn domain(id: &str, domain_type: &str) -> Domain {
    Domain {
        id: id.to_string(),
        name: id.to_string(),
        domain_type: domain_type.to_string(),
        exportable: false,
        enabled: true,
    }
}

pub fn prediction(tag: &str, probability: f64, row: [f64; 4]) -> Prediction {
    Prediction {
        probability,
        tag_id: format!("{}-id", tag),
        tag_name: tag.to_string(),
        bounding_box: Some(BoundingBox {
            left: row[0],
            top: row[1],
            width: row[2],
            height: row[3],
        }),
    }
}

impl FakeService {
    /// Training reports `Training` once, then each of `then` in turn.
    pub fn new(then: Vec<TrainingStatus>) -> Self {
        FakeService {
            domains: vec![
                domain("general", "Classification"),
                domain("od-general", "ObjectDetection"),
            ],
            statuses: Mutex::new(then.into()),
            initial_status: TrainingStatus::Training,
            failing_uploads: HashSet::new(),
            rejected_uploads: HashSet::new(),
            predictions: vec![
                prediction("Fork", 0.9534, [0.25, 0.125, 0.5, 0.5]),
                prediction("Scissors", 0.0123, [0.5, 0.5, 0.25, 0.25]),
            ],
            next_id: Mutex::new(0),
            calls: Mutex::new(Calls::default()),
        }
    }

    pub fn without_object_detection(mut self) -> Self {
        self.domains.retain(|d| d.domain_type != "ObjectDetection");
        self
    }

    pub fn failing_upload(mut self, file: &str) -> Self {
        self.failing_uploads.insert(file.to_string());
        self
    }

    pub fn rejected_upload(mut self, file: &str) -> Self {
        self.rejected_uploads.insert(file.to_string());
        self
    }

    fn id(&self, prefix: &str) -> String {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        format!("{}-{}", prefix, next)
    }

    fn iteration(&self, id: &str, project_id: &str, status: TrainingStatus) -> Iteration {
        Iteration {
            id: id.to_string(),
            name: "Iteration 1".to_string(),
            status,
            is_default: false,
            project_id: Some(project_id.to_string()),
            trained_at: None,
            extra: serde_json::Map::new(),
        }
    }
}

#[async_trait]
impl TrainingApi for FakeService {
    async fn get_domains(&self) -> Result<Vec<Domain>, ApiError> {
        Ok(self.domains.clone())
    }

    async fn create_project(&self, name: &str, domain_id: &str) -> Result<Project, ApiError> {
        let project = Project {
            id: self.id("project"),
            name: name.to_string(),
            description: None,
            settings: Some(customvision_cli::models::ProjectSettings {
                domain_id: domain_id.to_string(),
            }),
        };
        self.calls.lock().unwrap().projects.push(project.clone());
        Ok(project)
    }

    async fn create_tag(&self, project_id: &str, name: &str) -> Result<Tag, ApiError> {
        let tag = Tag {
            id: self.id("tag"),
            name: name.to_string(),
            description: None,
            image_count: 0,
        };
        self.calls
            .lock()
            .unwrap()
            .tags
            .push((project_id.to_string(), tag.clone()));
        Ok(tag)
    }

    async fn create_images_from_files(
        &self,
        project_id: &str,
        batch: &ImageFileCreateBatch,
    ) -> Result<ImageCreateSummary, ApiError> {
        let name = batch.images[0].name.clone();
        if self.failing_uploads.contains(&name) {
            return Err(ApiError::Status {
                operation: "create images",
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "storage unavailable".to_string(),
            });
        }
        self.calls
            .lock()
            .unwrap()
            .uploads
            .push((project_id.to_string(), batch.clone()));
        let rejected = self.rejected_uploads.contains(&name);
        Ok(ImageCreateSummary {
            is_batch_successful: !rejected,
            images: vec![ImageCreateResult {
                source_url: Some(name),
                status: if rejected { "ErrorImageFormat" } else { "OK" }.to_string(),
            }],
        })
    }

    async fn train_project(&self, project_id: &str) -> Result<Iteration, ApiError> {
        let mut calls = self.calls.lock().unwrap();
        calls.trains.push(project_id.to_string());
        calls.status_checks.push(Instant::now());
        Ok(self.iteration("iteration-1", project_id, self.initial_status.clone()))
    }

    async fn get_iteration(
        &self,
        project_id: &str,
        iteration_id: &str,
    ) -> Result<Iteration, ApiError> {
        self.calls.lock().unwrap().status_checks.push(Instant::now());
        let status = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(TrainingStatus::Training);
        Ok(self.iteration(iteration_id, project_id, status))
    }

    async fn update_iteration(
        &self,
        _project_id: &str,
        iteration: &Iteration,
    ) -> Result<Iteration, ApiError> {
        self.calls.lock().unwrap().updates.push(iteration.clone());
        Ok(iteration.clone())
    }
}

#[async_trait]
impl PredictionApi for FakeService {
    async fn predict_image(
        &self,
        project_id: &str,
        iteration_id: &str,
        image: Vec<u8>,
    ) -> Result<ImagePrediction, ApiError> {
        self.calls.lock().unwrap().predictions.push((
            project_id.to_string(),
            iteration_id.to_string(),
            image.len(),
        ));
        Ok(ImagePrediction {
            id: "prediction-1".to_string(),
            project: project_id.to_string(),
            iteration: iteration_id.to_string(),
            created: None,
            predictions: self.predictions.clone(),
        })
    }
}

/// Write one small file per region table entry plus the test image.
pub fn write_sample_images(root: &Path, regions: &RegionTable) {
    for tag in regions.tags() {
        let dir = root.join(&tag.name);
        std::fs::create_dir_all(&dir).unwrap();
        for file in tag.images.keys() {
            std::fs::write(dir.join(file), file.as_bytes()).unwrap();
        }
    }
    let test = root.join("Test");
    std::fs::create_dir_all(&test).unwrap();
    std::fs::write(test.join("test_od_image.jpg"), b"test image").unwrap();
}
