use std::sync::Arc;

use crate::config::settings::AppConfig;
use crate::infrastructure::stages::command::{CommandAnimationSynthesizer, CommandAnnotationExtractor};
use crate::infrastructure::storage::local::LocalStorage;
use crate::modules::animate::pipeline::PipelineOrchestrator;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub storage: LocalStorage,
    pub pipeline: PipelineOrchestrator,
}

impl AppState {
    pub fn new(config: AppConfig, storage: LocalStorage, pipeline: PipelineOrchestrator) -> Self {
        Self {
            config,
            storage,
            pipeline,
        }
    }

    /// Production wiring: both stages run as external processes.
    pub fn from_config(config: AppConfig) -> Self {
        let storage = LocalStorage::new(&config.upload_dir, &config.workspace_dir);
        let pipeline = PipelineOrchestrator::new(
            Arc::new(CommandAnnotationExtractor::new(config.annotation_command.clone())),
            Arc::new(CommandAnimationSynthesizer::new(config.animation_command.clone())),
        );

        Self::new(config, storage, pipeline)
    }
}

#[cfg(test)]
impl AppState {
    pub fn for_tests(
        root: &std::path::Path,
        annotator: Arc<dyn crate::infrastructure::stages::AnnotationExtractor>,
        animator: Arc<dyn crate::infrastructure::stages::AnimationSynthesizer>,
    ) -> Self {
        let config = AppConfig::for_tests(root);
        let storage = LocalStorage::new(&config.upload_dir, &config.workspace_dir);
        Self::new(config, storage, PipelineOrchestrator::new(annotator, animator))
    }
}
