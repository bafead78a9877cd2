use std::io;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use super::job::StagedJob;
use crate::infrastructure::stages::{AnimationSynthesizer, AnnotationExtractor, StageError};

/// Why a job did not produce its animation. Callers over HTTP only ever see a
/// `false` status; this type is for logs and tests.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to stage job: {0}")]
    Staging(#[from] io::Error),
    #[error("annotation stage failed: {0}")]
    Annotation(#[source] StageError),
    #[error("animation stage failed: {0}")]
    Animation(#[source] StageError),
    #[error("pipeline worker did not finish: {0}")]
    Interrupted(String),
}

impl PipelineError {
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Staging(_) => "staging",
            PipelineError::Annotation(_) => "annotation",
            PipelineError::Animation(_) => "animation",
            PipelineError::Interrupted(_) => "worker",
        }
    }
}

/// Runs annotation extraction then animation synthesis, stopping at the first failure.
#[derive(Clone)]
pub struct PipelineOrchestrator {
    annotator: Arc<dyn AnnotationExtractor>,
    animator: Arc<dyn AnimationSynthesizer>,
}

impl PipelineOrchestrator {
    pub fn new(
        annotator: Arc<dyn AnnotationExtractor>,
        animator: Arc<dyn AnimationSynthesizer>,
    ) -> Self {
        Self {
            annotator,
            animator,
        }
    }

    /// Blocks for as long as the stages take.
    pub fn run(&self, job: &StagedJob) -> Result<(), PipelineError> {
        info!(
            "Sending image to animation: {}, {}, {}, {}",
            job.image_path.display(),
            job.workspace.display(),
            job.motion_config.display(),
            job.retarget_config.display()
        );

        self.annotator
            .extract_annotations(&job.image_path, &job.workspace)
            .map_err(PipelineError::Annotation)?;
        info!("Created annotations at {}", job.workspace.display());

        let controller = self
            .animator
            .synthesize_animation(&job.workspace, &job.motion_config, &job.retarget_config)
            .map_err(PipelineError::Animation)?;

        // only surfaces a broken controller, the flag itself is not used
        let _ = controller.is_run_over().map_err(PipelineError::Animation)?;
        info!("Created animation at {}", job.workspace.display());

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::infrastructure::stages::{
        AnimationSynthesizer, AnnotationExtractor, RunController, StageError,
    };

    /// Annotation double: records calls, optionally fails.
    #[derive(Default)]
    pub struct FakeAnnotator {
        pub fail_with: Option<String>,
        pub calls: Mutex<Vec<(PathBuf, PathBuf)>>,
    }

    impl FakeAnnotator {
        pub fn failing(message: &str) -> Self {
            Self {
                fail_with: Some(message.to_string()),
                ..Self::default()
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl AnnotationExtractor for FakeAnnotator {
        fn extract_annotations(
            &self,
            image_path: &Path,
            output_dir: &Path,
        ) -> Result<(), StageError> {
            self.calls
                .lock()
                .unwrap()
                .push((image_path.to_path_buf(), output_dir.to_path_buf()));
            match &self.fail_with {
                Some(message) => Err(StageError::Failed(message.clone())),
                None => Ok(()),
            }
        }
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub enum AnimatorBehaviour {
        /// Writes `artifact` (if any) into the workspace and returns a healthy controller.
        #[default]
        Succeed,
        Fail,
        BrokenController,
    }

    #[derive(Default)]
    pub struct FakeAnimator {
        pub behaviour: AnimatorBehaviour,
        pub artifact: Option<String>,
        pub calls: AtomicUsize,
        pub last_args: Mutex<Option<(PathBuf, PathBuf, PathBuf)>>,
    }

    impl FakeAnimator {
        pub fn with(behaviour: AnimatorBehaviour) -> Self {
            Self {
                behaviour,
                ..Self::default()
            }
        }

        pub fn writing(artifact: &str) -> Self {
            Self {
                artifact: Some(artifact.to_string()),
                ..Self::default()
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    struct FakeController {
        broken: bool,
    }

    impl RunController for FakeController {
        fn is_run_over(&self) -> Result<bool, StageError> {
            if self.broken {
                Err(StageError::Failed("controller has no run state".into()))
            } else {
                Ok(true)
            }
        }
    }

    impl AnimationSynthesizer for FakeAnimator {
        fn synthesize_animation(
            &self,
            annotation_dir: &Path,
            motion_config: &Path,
            retarget_config: &Path,
        ) -> Result<Box<dyn RunController>, StageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_args.lock().unwrap() = Some((
                annotation_dir.to_path_buf(),
                motion_config.to_path_buf(),
                retarget_config.to_path_buf(),
            ));

            match self.behaviour {
                AnimatorBehaviour::Fail => Err(StageError::Failed("renderer crashed".into())),
                AnimatorBehaviour::BrokenController => {
                    Ok(Box::new(FakeController { broken: true }))
                }
                AnimatorBehaviour::Succeed => {
                    if let Some(name) = &self.artifact {
                        std::fs::write(annotation_dir.join(name), b"GIF89a")
                            .map_err(|e| StageError::Failed(e.to_string()))?;
                    }
                    Ok(Box::new(FakeController { broken: false }))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::*;
    use crate::modules::animate::job::JobId;
    use std::path::PathBuf;

    fn staged() -> StagedJob {
        StagedJob {
            id: JobId::parse("aZ3kP9mN2qR7xT1y", &Default::default()).unwrap(),
            image_path: PathBuf::from("uploads/portrait.jpg"),
            workspace: PathBuf::from("jobs/aZ3kP9mN2qR7xT1y"),
            motion_config: PathBuf::from("config/motion/dab.yaml"),
            retarget_config: PathBuf::from("config/retarget/fair1_ppf.yaml"),
        }
    }

    fn orchestrator(
        annotator: &Arc<FakeAnnotator>,
        animator: &Arc<FakeAnimator>,
    ) -> PipelineOrchestrator {
        PipelineOrchestrator::new(annotator.clone(), animator.clone())
    }

    #[test]
    fn both_stages_run_in_order_with_job_paths() {
        let annotator = Arc::new(FakeAnnotator::default());
        let animator = Arc::new(FakeAnimator::default());

        orchestrator(&annotator, &animator).run(&staged()).unwrap();

        let calls = annotator.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![(
                PathBuf::from("uploads/portrait.jpg"),
                PathBuf::from("jobs/aZ3kP9mN2qR7xT1y")
            )]
        );
        let args = animator.last_args.lock().unwrap().clone().unwrap();
        assert_eq!(args.0, PathBuf::from("jobs/aZ3kP9mN2qR7xT1y"));
        assert_eq!(args.1, PathBuf::from("config/motion/dab.yaml"));
        assert_eq!(args.2, PathBuf::from("config/retarget/fair1_ppf.yaml"));
    }

    #[test]
    fn annotation_failure_skips_animation() {
        let annotator = Arc::new(FakeAnnotator::failing("corrupt image"));
        let animator = Arc::new(FakeAnimator::default());

        let err = orchestrator(&annotator, &animator).run(&staged()).unwrap_err();

        assert!(matches!(err, PipelineError::Annotation(_)));
        assert_eq!(err.stage(), "annotation");
        assert!(err.to_string().contains("corrupt image"));
        assert_eq!(animator.call_count(), 0);
    }

    #[test]
    fn animation_failure_is_reported_as_animation_stage() {
        let annotator = Arc::new(FakeAnnotator::default());
        let animator = Arc::new(FakeAnimator::with(AnimatorBehaviour::Fail));

        let err = orchestrator(&annotator, &animator).run(&staged()).unwrap_err();

        assert!(matches!(err, PipelineError::Animation(_)));
        assert_eq!(annotator.call_count(), 1);
    }

    #[test]
    fn broken_controller_fails_the_run() {
        let annotator = Arc::new(FakeAnnotator::default());
        let animator = Arc::new(FakeAnimator::with(AnimatorBehaviour::BrokenController));

        let err = orchestrator(&annotator, &animator).run(&staged()).unwrap_err();

        assert_eq!(err.stage(), "animation");
        assert!(err.to_string().contains("controller has no run state"));
    }
}
