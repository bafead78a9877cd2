//! Contracts of the two external pipeline stages.
//!
//! Both stages are long running and may block for as long as they like;
//! callers are expected to drive them from a blocking thread.

use std::io;
use std::path::Path;
use std::process::ExitStatus;

use thiserror::Error;

pub mod command;

#[derive(Debug, Error)]
pub enum StageError {
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("`{program}` exited with {status}: {stderr}")]
    Exited {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("{0}")]
    Failed(String),
}

/// Image in, annotation files written into `output_dir`.
pub trait AnnotationExtractor: Send + Sync {
    fn extract_annotations(&self, image_path: &Path, output_dir: &Path) -> Result<(), StageError>;
}

/// Handle on a finished (or finishing) animation run.
pub trait RunController: Send {
    fn is_run_over(&self) -> Result<bool, StageError>;
}

/// Annotations plus motion/retarget configs in, `<stem>.gif` written into `annotation_dir`.
pub trait AnimationSynthesizer: Send + Sync {
    fn synthesize_animation(
        &self,
        annotation_dir: &Path,
        motion_config: &Path,
        retarget_config: &Path,
    ) -> Result<Box<dyn RunController>, StageError>;
}
