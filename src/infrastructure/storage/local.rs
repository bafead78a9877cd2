use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::{debug, info};

/// Upload root plus the root under which every job gets its own workspace directory.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    pub upload_dir: PathBuf,
    pub workspace_dir: PathBuf,
}

impl LocalStorage {
    pub fn new(upload_dir: impl Into<PathBuf>, workspace_dir: impl Into<PathBuf>) -> Self {
        let storage = Self {
            upload_dir: upload_dir.into(),
            workspace_dir: workspace_dir.into(),
        };

        info!(
            "✅ Local storage: uploads in {}, workspaces in {}",
            storage.upload_dir.display(),
            storage.workspace_dir.display()
        );

        storage
    }

    pub fn upload_path(&self, file_name: &str) -> PathBuf {
        self.upload_dir.join(file_name)
    }

    pub fn workspace_path(&self, job_id: &str) -> PathBuf {
        self.workspace_dir.join(job_id)
    }

    pub fn workspace_exists(&self, job_id: &str) -> bool {
        self.workspace_path(job_id).is_dir()
    }

    /// Writes the upload in one go. An existing file with the same name is replaced.
    pub fn save_upload(&self, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.upload_path(file_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;

        debug!("Saved {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }

    pub fn create_workspace(&self, job_id: &str) -> io::Result<PathBuf> {
        let path = self.workspace_path(job_id);
        fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Sorted names of the regular files directly inside a job workspace.
    pub async fn list_workspace(&self, job_id: &str) -> io::Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(self.workspace_path(job_id)).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                files.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        files.sort();
        Ok(files)
    }

    pub async fn open_artifact(
        &self,
        job_id: &str,
        file_name: &str,
    ) -> io::Result<(tokio::fs::File, u64)> {
        let path = self.workspace_path(job_id).join(file_name);
        let file = tokio::fs::File::open(&path).await?;
        let meta = file.metadata().await?;

        if !meta.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a file", path.display()),
            ));
        }

        Ok((file, meta.len()))
    }

    pub fn artifact_exists(&self, job_id: &str, file_name: &str) -> bool {
        self.workspace_path(job_id).join(file_name).is_file()
    }
}

#[cfg(test)]
pub(crate) fn scratch_dir(prefix: &str) -> PathBuf {
    use std::sync::atomic::{AtomicUsize, Ordering};
    static SEQ: AtomicUsize = AtomicUsize::new(0);

    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let seq = SEQ.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!(
        "{prefix}-{}-{timestamp}-{seq}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).unwrap();
    dir
}
