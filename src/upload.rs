// Image upload: turn the per-tag directories into single-image batches and
// push them through a bounded fan-out, keeping one result per file.

use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::api::TrainingApi;
use crate::error::{Error, Result, UploadFailure};
use crate::models::{ImageFileCreateBatch, ImageFileCreateEntry, Region, Tag};
use crate::progress::Progress;
use crate::regions::RegionTable;

/// One file ready to be sent.
#[derive(Debug, Clone)]
pub struct PlannedUpload {
    pub tag: String,
    pub file: String,
    pub batch: ImageFileCreateBatch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    pub tag: String,
    pub file: String,
    pub result: std::result::Result<(), String>,
}

/// Results of every upload, in completion order.
#[derive(Debug, Clone, Default)]
pub struct UploadReport {
    pub outcomes: Vec<UploadOutcome>,
}

impl UploadReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failures(&self) -> Vec<UploadFailure> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.result {
                Ok(()) => None,
                Err(reason) => Some(UploadFailure {
                    file: o.file.clone(),
                    reason: reason.clone(),
                }),
            })
            .collect()
    }

    /// Fail the run if any single upload failed.
    pub fn into_result(self) -> Result<Self> {
        let failed = self.failures();
        if failed.is_empty() {
            Ok(self)
        } else {
            Err(Error::UploadFailed {
                failed,
                total: self.total(),
            })
        }
    }
}

/// Regular files in `dir`, sorted by name.
pub async fn list_images(dir: &Path) -> Result<Vec<String>> {
    let io_err = |source| Error::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        if entry.file_type().await.map_err(io_err)?.is_file() {
            files.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    files.sort();
    Ok(files)
}

/// Build one batch per file for every tag. Every file must have a region
/// entry; the first one without aborts planning before anything is sent.
#[instrument(skip(regions, tags, tag_dir))]
pub async fn plan_uploads<F>(
    regions: &RegionTable,
    tags: &[Tag],
    tag_dir: F,
) -> Result<Vec<PlannedUpload>>
where
    F: Fn(&str) -> PathBuf,
{
    let mut plan = Vec::new();
    for tag in tags {
        let dir = tag_dir(&tag.name);
        let files = list_images(&dir).await?;
        debug!(tag = %tag.name, dir = %dir.display(), files = files.len(), "listing images");

        for file in files {
            let row = regions.lookup(&tag.name, &file)?;
            let path = dir.join(&file);
            let contents = tokio::fs::read(&path)
                .await
                .map_err(|source| Error::Io {
                    path: path.clone(),
                    source,
                })?;

            let entry = ImageFileCreateEntry {
                name: file.clone(),
                contents,
                tag_ids: Vec::new(),
                regions: vec![Region::from_row(&tag.id, row)],
            };
            plan.push(PlannedUpload {
                tag: tag.name.clone(),
                file,
                batch: ImageFileCreateBatch::single(entry),
            });
        }
    }
    Ok(plan)
}

/// Send every planned batch with at most `concurrency` requests in flight.
/// Already applied uploads are never rolled back.
#[instrument(skip(api, plan, progress), fields(total = plan.len()))]
pub async fn upload_all<T>(
    api: &T,
    project_id: &str,
    plan: Vec<PlannedUpload>,
    concurrency: usize,
    progress: &dyn Progress,
) -> UploadReport
where
    T: TrainingApi + ?Sized,
{
    progress.uploads_started(plan.len());

    let outcomes: Vec<UploadOutcome> = stream::iter(plan)
        .map(|upload| async move {
            let result = match api.create_images_from_files(project_id, &upload.batch).await {
                Ok(summary) if summary.is_batch_successful => Ok(()),
                Ok(summary) => Err(summary.rejection_reason()),
                Err(e) => Err(e.to_string()),
            };
            if let Err(reason) = &result {
                warn!(file = %upload.file, %reason, "upload failed");
            }
            progress.image_uploaded(&upload.file, result.is_ok());
            UploadOutcome {
                tag: upload.tag,
                file: upload.file,
                result,
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    progress.uploads_finished();
    let report = UploadReport { outcomes };
    info!(succeeded = report.succeeded(), total = report.total(), "uploads finished");
    report
}
