use std::io;

use axum::http::StatusCode;
use thiserror::Error;
use tracing::{error, info, warn};

use super::dto::JobStatusResponse;
use super::job::{JobAllocator, JobId, UploadedImage};
use super::pipeline::PipelineError;
use super::validator::secure_filename;
use crate::state::AppState;

/// Result of one `/animate` request after the pipeline has had its go.
#[derive(Debug)]
pub struct JobOutcome {
    pub id: JobId,
    pub filename: String,
    pub result: Result<(), PipelineError>,
}

impl JobOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Error)]
pub enum JobLookupError {
    #[error("Invalid job id")]
    InvalidId,
    #[error("Invalid file name")]
    InvalidFileName,
    #[error("Job not found")]
    JobNotFound,
    #[error("File not found")]
    FileNotFound,
    #[error("Failed to read job workspace: {0}")]
    Io(#[from] io::Error),
}

impl JobLookupError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            JobLookupError::InvalidId | JobLookupError::InvalidFileName => StatusCode::BAD_REQUEST,
            JobLookupError::JobNotFound | JobLookupError::FileNotFound => StatusCode::NOT_FOUND,
            JobLookupError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct AnimateService;

impl AnimateService {
    /// Stages the upload and runs both stages on a blocking thread.
    ///
    /// Never fails: every pipeline error ends up in [`JobOutcome::result`].
    pub async fn animate(state: AppState, image: UploadedImage) -> JobOutcome {
        let id = JobAllocator::new(&state.config, &state.storage).allocate_id();
        let filename = image.output_filename();

        let job_id = id.clone();
        let expected = filename.clone();
        let (result, artifact_present) = tokio::task::spawn_blocking(move || {
            let result = Self::run_job(&state, &job_id, &image);
            let present = result.is_ok() && state.storage.artifact_exists(job_id.as_str(), &expected);
            (result, present)
        })
        .await
        .unwrap_or_else(|e| (Err(PipelineError::Interrupted(e.to_string())), false));

        match &result {
            Ok(()) => {
                info!("Done! job {} expects {}", id, filename);
                if !artifact_present {
                    warn!("Job {} reported success but {} is not in its workspace", id, filename);
                }
            }
            Err(e) => error!("Error creating animation for job {} ({}): {}", id, e.stage(), e),
        }

        JobOutcome {
            id,
            filename,
            result,
        }
    }

    /// Synchronous core: persist, create workspace, run the pipeline.
    pub fn run_job(state: &AppState, id: &JobId, image: &UploadedImage) -> Result<(), PipelineError> {
        let job = JobAllocator::new(&state.config, &state.storage).stage(id, image)?;
        state.pipeline.run(&job)
    }

    pub async fn inspect(state: &AppState, raw_id: &str) -> Result<JobStatusResponse, JobLookupError> {
        let id = Self::parse_id(state, raw_id)?;

        if !state.storage.workspace_exists(id.as_str()) {
            return Err(JobLookupError::JobNotFound);
        }

        let files = state.storage.list_workspace(id.as_str()).await?;

        Ok(JobStatusResponse {
            id: id.to_string(),
            files,
        })
    }

    pub async fn open_artifact(
        state: &AppState,
        raw_id: &str,
        file_name: &str,
    ) -> Result<(tokio::fs::File, u64), JobLookupError> {
        let id = Self::parse_id(state, raw_id)?;

        if file_name.is_empty() || secure_filename(file_name) != file_name {
            return Err(JobLookupError::InvalidFileName);
        }

        state
            .storage
            .open_artifact(id.as_str(), file_name)
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => JobLookupError::FileNotFound,
                _ => JobLookupError::Io(e),
            })
    }

    fn parse_id(state: &AppState, raw_id: &str) -> Result<JobId, JobLookupError> {
        JobId::parse(raw_id, &state.config.job_id).ok_or(JobLookupError::InvalidId)
    }
}
