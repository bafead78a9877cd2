use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::settings::{AppConfig, JobIdConfig};
use crate::infrastructure::storage::local::LocalStorage;

/// Bound on regeneration when `verify_unique` finds an existing workspace.
const MAX_ID_ATTEMPTS: usize = 8;

/// Random handle of a job, doubling as its workspace directory name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn generate<R: Rng + ?Sized>(config: &JobIdConfig, rng: &mut R) -> Self {
        let id = (0..config.length)
            .map(|_| config.alphabet[rng.random_range(0..config.alphabet.len())] as char)
            .collect();
        Self(id)
    }

    /// Accepts only ids that could have come out of [`JobId::generate`].
    pub fn parse(raw: &str, config: &JobIdConfig) -> Option<Self> {
        let well_formed = raw.len() == config.length
            && raw.bytes().all(|b| config.alphabet.contains(&b));
        well_formed.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An accepted upload: sanitized name plus the raw bytes.
#[derive(Clone, Debug)]
pub struct UploadedImage {
    pub file_name: String,
    pub bytes: Bytes,
}

impl UploadedImage {
    pub fn new(file_name: String, bytes: Bytes) -> Self {
        Self { file_name, bytes }
    }

    /// `<stem>.gif`, the artifact the animation stage is expected to write.
    pub fn output_filename(&self) -> String {
        let stem = Path::new(&self.file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{stem}.gif")
    }
}

/// Everything the pipeline needs for one job.
#[derive(Clone, Debug)]
pub struct StagedJob {
    pub id: JobId,
    pub image_path: PathBuf,
    pub workspace: PathBuf,
    pub motion_config: PathBuf,
    pub retarget_config: PathBuf,
}

pub struct JobAllocator<'a> {
    config: &'a AppConfig,
    storage: &'a LocalStorage,
}

impl<'a> JobAllocator<'a> {
    pub fn new(config: &'a AppConfig, storage: &'a LocalStorage) -> Self {
        Self { config, storage }
    }

    pub fn allocate_id(&self) -> JobId {
        let mut rng = rand::rng();
        let mut id = JobId::generate(&self.config.job_id, &mut rng);

        if self.config.job_id.verify_unique {
            let mut attempts = 1;
            while self.storage.workspace_exists(id.as_str()) && attempts < MAX_ID_ATTEMPTS {
                warn!("Job id {} already has a workspace, drawing another", id);
                id = JobId::generate(&self.config.job_id, &mut rng);
                attempts += 1;
            }
        }

        id
    }

    /// Persists the upload and creates the job workspace. Single attempt.
    pub fn stage(&self, id: &JobId, image: &UploadedImage) -> io::Result<StagedJob> {
        let image_path = self.storage.save_upload(&image.file_name, &image.bytes)?;
        let workspace = self.storage.create_workspace(id.as_str())?;

        info!(
            "Staged job {}: image {}, workspace {}",
            id,
            image_path.display(),
            workspace.display()
        );

        Ok(StagedJob {
            id: id.clone(),
            image_path,
            workspace,
            motion_config: self.config.motion_config.clone(),
            retarget_config: self.config.retarget_config.clone(),
        })
    }
}
