// End-to-end run: project -> tags -> uploads -> train -> poll -> promote ->
// predict. Remote services are injected so the same flow runs against the
// real clients or an in-memory double.

use tracing::{info, instrument};

use crate::api::{PredictionApi, TrainingApi};
use crate::config::WorkflowConfig;
use crate::error::Result;
use crate::models::{ImagePrediction, Iteration, Project, Tag};
use crate::prediction::predict_file;
use crate::progress::{Progress, Silent};
use crate::project::{create_project, create_tags};
use crate::regions::RegionTable;
use crate::training::{promote_iteration, train_and_wait, PollPolicy};
use crate::upload::{plan_uploads, upload_all, UploadReport};

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub project: Project,
    pub tags: Vec<Tag>,
    pub uploads: UploadReport,
    pub iteration: Iteration,
    pub prediction: ImagePrediction,
}

pub struct Workflow<'a, T: ?Sized, P: ?Sized> {
    training: &'a T,
    prediction: &'a P,
    config: &'a WorkflowConfig,
    regions: &'a RegionTable,
    progress: &'a dyn Progress,
}

impl<'a, T, P> Workflow<'a, T, P>
where
    T: TrainingApi + ?Sized,
    P: PredictionApi + ?Sized,
{
    pub fn new(
        training: &'a T,
        prediction: &'a P,
        config: &'a WorkflowConfig,
        regions: &'a RegionTable,
    ) -> Self {
        Workflow {
            training,
            prediction,
            config,
            regions,
            progress: &Silent,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn Progress) -> Self {
        self.progress = progress;
        self
    }

    fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: self.config.poll_interval(),
            max_attempts: self.config.max_poll_attempts,
        }
    }

    /// Run every stage once. Each call creates a brand new project.
    #[instrument(skip(self), fields(project_name = %self.config.project_name))]
    pub async fn run(&self) -> Result<RunReport> {
        self.progress.step("Creating project...");
        let project = create_project(self.training, &self.config.project_name).await?;
        let tags = create_tags(self.training, &project.id, self.regions.tag_names()).await?;

        self.progress.step("Adding images...");
        let plan = plan_uploads(self.regions, &tags, |name| self.config.tag_dir(name)).await?;
        let uploads = upload_all(
            self.training,
            &project.id,
            plan,
            self.config.upload_concurrency,
            self.progress,
        )
        .await
        .into_result()?;

        self.progress.step("Training...");
        let finished = train_and_wait(
            self.training,
            &project.id,
            self.poll_policy(),
            self.progress,
        )
        .await?;
        let iteration = promote_iteration(self.training, &project.id, finished).await?;

        let prediction = predict_file(
            self.prediction,
            &project.id,
            &iteration.id,
            &self.config.test_image_path(),
        )
        .await?;
        info!(project_id = %project.id, iteration_id = %iteration.id, "run complete");

        Ok(RunReport {
            project,
            tags,
            uploads,
            iteration,
            prediction,
        })
    }
}
