use std::path::Path;
use std::process::{Command, ExitStatus, Output};

use tracing::{debug, info};

use super::{AnimationSynthesizer, AnnotationExtractor, RunController, StageError};
use crate::config::settings::StageCommand;

fn run(command: &StageCommand, extra: &[&Path]) -> Result<Output, StageError> {
    info!("▶️ Running {} {:?} {:?}", command.program, command.args, extra);

    let output = Command::new(&command.program)
        .args(&command.args)
        .args(extra)
        .output()
        .map_err(|source| StageError::Launch {
            program: command.program.clone(),
            source,
        })?;

    if !output.stdout.is_empty() {
        debug!(
            "{} stdout: {}",
            command.program,
            String::from_utf8_lossy(&output.stdout).trim_end()
        );
    }

    Ok(output)
}

fn stderr_tail(output: &Output) -> String {
    let text = String::from_utf8_lossy(&output.stderr);
    let lines: Vec<&str> = text.lines().collect();
    lines[lines.len().saturating_sub(20)..].join("\n")
}

/// Runs `<program> <args..> <image_path> <output_dir>`.
#[derive(Clone, Debug)]
pub struct CommandAnnotationExtractor {
    command: StageCommand,
}

impl CommandAnnotationExtractor {
    pub fn new(command: StageCommand) -> Self {
        Self { command }
    }
}

impl AnnotationExtractor for CommandAnnotationExtractor {
    fn extract_annotations(&self, image_path: &Path, output_dir: &Path) -> Result<(), StageError> {
        let output = run(&self.command, &[image_path, output_dir])?;

        if !output.status.success() {
            return Err(StageError::Exited {
                program: self.command.program.clone(),
                status: output.status,
                stderr: stderr_tail(&output),
            });
        }

        Ok(())
    }
}

/// Runs `<program> <args..> <annotation_dir> <motion_config> <retarget_config>`.
///
/// A non-zero exit does not fail the call itself; it is reported by the
/// returned controller.
#[derive(Clone, Debug)]
pub struct CommandAnimationSynthesizer {
    command: StageCommand,
}

impl CommandAnimationSynthesizer {
    pub fn new(command: StageCommand) -> Self {
        Self { command }
    }
}

impl AnimationSynthesizer for CommandAnimationSynthesizer {
    fn synthesize_animation(
        &self,
        annotation_dir: &Path,
        motion_config: &Path,
        retarget_config: &Path,
    ) -> Result<Box<dyn RunController>, StageError> {
        let output = run(&self.command, &[annotation_dir, motion_config, retarget_config])?;

        Ok(Box::new(ProcessRun {
            program: self.command.program.clone(),
            status: output.status,
            stderr: stderr_tail(&output),
        }))
    }
}

#[derive(Debug)]
pub struct ProcessRun {
    program: String,
    status: ExitStatus,
    stderr: String,
}

impl RunController for ProcessRun {
    fn is_run_over(&self) -> Result<bool, StageError> {
        if self.status.success() {
            Ok(true)
        } else {
            Err(StageError::Exited {
                program: self.program.clone(),
                status: self.status,
                stderr: self.stderr.clone(),
            })
        }
    }
}
