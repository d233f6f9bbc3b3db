use crate::models::TrainingStatus;

/// Observer for a workflow run. The console implements it with spinners and
/// progress bars; every hook defaults to doing nothing.
pub trait Progress: Send + Sync {
    /// A new stage of the run started.
    fn step(&self, _message: &str) {}

    fn uploads_started(&self, _total: usize) {}

    fn image_uploaded(&self, _file: &str, _ok: bool) {}

    fn uploads_finished(&self) {}

    /// Status returned by the train call or a poll.
    fn training_status(&self, _status: &TrainingStatus) {}

    fn training_finished(&self, _status: &TrainingStatus) {}
}

/// Progress sink that ignores everything.
pub struct Silent;

impl Progress for Silent {}
