// API client module: the two capability traits the workflow talks to, plus
// reqwest-backed clients for the Custom Vision training (v2.2) and
// prediction (v2.0) REST endpoints.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::config::Credentials;
use crate::error::ApiError;
use crate::models::{
    Domain, ImageCreateSummary, ImageFileCreateBatch, ImagePrediction, Iteration, Project, Tag,
};

const TRAINING_PATH: &str = "customvision/v2.2/Training";
const PREDICTION_PATH: &str = "customvision/v2.0/Prediction";

/// Operations consumed from the training service.
#[async_trait]
pub trait TrainingApi: Send + Sync {
    async fn get_domains(&self) -> Result<Vec<Domain>, ApiError>;
    async fn create_project(&self, name: &str, domain_id: &str) -> Result<Project, ApiError>;
    async fn create_tag(&self, project_id: &str, name: &str) -> Result<Tag, ApiError>;
    async fn create_images_from_files(
        &self,
        project_id: &str,
        batch: &ImageFileCreateBatch,
    ) -> Result<ImageCreateSummary, ApiError>;
    async fn train_project(&self, project_id: &str) -> Result<Iteration, ApiError>;
    async fn get_iteration(&self, project_id: &str, iteration_id: &str)
        -> Result<Iteration, ApiError>;
    async fn update_iteration(
        &self,
        project_id: &str,
        iteration: &Iteration,
    ) -> Result<Iteration, ApiError>;
}

/// Operations consumed from the prediction service.
#[async_trait]
pub trait PredictionApi: Send + Sync {
    async fn predict_image(
        &self,
        project_id: &str,
        iteration_id: &str,
        image: Vec<u8>,
    ) -> Result<ImagePrediction, ApiError>;
}

/// Finish `builder` into a client whose every request carries `key_header: key`.
fn keyed_client(
    builder: ClientBuilder,
    key_header: &'static str,
    key: &str,
) -> Result<Client, ApiError> {
    let mut headers = HeaderMap::new();
    let mut value =
        HeaderValue::from_str(key).map_err(|_| ApiError::InvalidHeader { header: key_header })?;
    value.set_sensitive(true);
    headers.insert(HeaderName::from_static(key_header), value);

    builder
        .default_headers(headers)
        .build()
        .map_err(|source| ApiError::Transport {
            operation: "build client",
            source,
        })
}

/// Send `req` and decode the JSON body, turning non-success statuses into
/// an error that carries the server's response text.
async fn send_json<T: DeserializeOwned>(
    req: RequestBuilder,
    operation: &'static str,
) -> Result<T, ApiError> {
    let res = req
        .send()
        .await
        .map_err(|source| ApiError::Transport { operation, source })?;
    if !res.status().is_success() {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            operation,
            status,
            body,
        });
    }
    res.json::<T>()
        .await
        .map_err(|source| ApiError::Decode { operation, source })
}

/// Client for the training service, authenticated with `Training-Key`.
#[derive(Clone)]
pub struct TrainingClient {
    client: Client,
    base_url: String,
}

impl TrainingClient {
    pub fn new(credentials: &Credentials) -> Result<Self, ApiError> {
        Self::with_builder(credentials, Client::builder())
    }

    /// Like `new`, starting from a caller-configured builder (proxy, timeouts).
    pub fn with_builder(
        credentials: &Credentials,
        builder: ClientBuilder,
    ) -> Result<Self, ApiError> {
        Ok(TrainingClient {
            client: keyed_client(builder, "training-key", &credentials.training_key)?,
            base_url: format!("{}/{}", credentials.endpoint, TRAINING_PATH),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl TrainingApi for TrainingClient {
    #[instrument(skip(self))]
    async fn get_domains(&self) -> Result<Vec<Domain>, ApiError> {
        send_json(self.client.get(self.url("domains")), "get domains").await
    }

    #[instrument(skip(self))]
    async fn create_project(&self, name: &str, domain_id: &str) -> Result<Project, ApiError> {
        let req = self
            .client
            .post(self.url("projects"))
            .query(&[("name", name), ("domainId", domain_id)]);
        send_json(req, "create project").await
    }

    #[instrument(skip(self))]
    async fn create_tag(&self, project_id: &str, name: &str) -> Result<Tag, ApiError> {
        let req = self
            .client
            .post(self.url(&format!("projects/{}/tags", project_id)))
            .query(&[("name", name)]);
        send_json(req, "create tag").await
    }

    #[instrument(skip(self, batch), fields(images = batch.images.len()))]
    async fn create_images_from_files(
        &self,
        project_id: &str,
        batch: &ImageFileCreateBatch,
    ) -> Result<ImageCreateSummary, ApiError> {
        let req = self
            .client
            .post(self.url(&format!("projects/{}/images/files", project_id)))
            .json(batch);
        send_json(req, "create images").await
    }

    #[instrument(skip(self))]
    async fn train_project(&self, project_id: &str) -> Result<Iteration, ApiError> {
        let req = self
            .client
            .post(self.url(&format!("projects/{}/train", project_id)));
        send_json(req, "train project").await
    }

    #[instrument(skip(self))]
    async fn get_iteration(
        &self,
        project_id: &str,
        iteration_id: &str,
    ) -> Result<Iteration, ApiError> {
        let req = self.client.get(self.url(&format!(
            "projects/{}/iterations/{}",
            project_id, iteration_id
        )));
        send_json(req, "get iteration").await
    }

    #[instrument(skip(self, iteration), fields(iteration_id = %iteration.id))]
    async fn update_iteration(
        &self,
        project_id: &str,
        iteration: &Iteration,
    ) -> Result<Iteration, ApiError> {
        let req = self
            .client
            .patch(self.url(&format!(
                "projects/{}/iterations/{}",
                project_id, iteration.id
            )))
            .json(iteration);
        send_json(req, "update iteration").await
    }
}

/// Client for the prediction service, authenticated with `Prediction-Key`.
#[derive(Clone)]
pub struct PredictionClient {
    client: Client,
    base_url: String,
}

impl PredictionClient {
    pub fn new(credentials: &Credentials) -> Result<Self, ApiError> {
        Self::with_builder(credentials, Client::builder())
    }

    /// Like `new`, starting from a caller-configured builder (proxy, timeouts).
    pub fn with_builder(
        credentials: &Credentials,
        builder: ClientBuilder,
    ) -> Result<Self, ApiError> {
        Ok(PredictionClient {
            client: keyed_client(builder, "prediction-key", &credentials.prediction_key)?,
            base_url: format!("{}/{}", credentials.endpoint, PREDICTION_PATH),
        })
    }
}

#[async_trait]
impl PredictionApi for PredictionClient {
    #[instrument(skip(self, image), fields(bytes = image.len()))]
    async fn predict_image(
        &self,
        project_id: &str,
        iteration_id: &str,
        image: Vec<u8>,
    ) -> Result<ImagePrediction, ApiError> {
        let url = format!("{}/{}/image", self.base_url, project_id);
        debug!(%url, "submitting image for prediction");
        let req = self
            .client
            .post(url)
            .query(&[("iterationId", iteration_id)])
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(image);
        send_json(req, "predict image").await
    }
}
