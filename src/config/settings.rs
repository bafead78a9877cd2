use std::path::PathBuf;

use thiserror::Error;

use crate::config::env::{self, EnvKey};

pub const DEFAULT_JOB_ID_ALPHABET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
pub const DEFAULT_JOB_ID_LENGTH: usize = 16;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JOB_ID_LENGTH must be greater than zero")]
    EmptyJobIdLength,
    #[error("JOB_ID_ALPHABET must contain only ASCII letters and digits, got {0:?}")]
    InvalidJobIdAlphabet(String),
    #[error("ALLOWED_EXTENSIONS must name at least one extension")]
    NoAllowedExtensions,
}

/// How job identifiers are drawn.
#[derive(Clone, Debug)]
pub struct JobIdConfig {
    pub alphabet: Vec<u8>,
    pub length: usize,
    /// Regenerate while a workspace with the drawn id already exists.
    pub verify_unique: bool,
}

impl Default for JobIdConfig {
    fn default() -> Self {
        Self {
            alphabet: DEFAULT_JOB_ID_ALPHABET.as_bytes().to_vec(),
            length: DEFAULT_JOB_ID_LENGTH,
            verify_unique: false,
        }
    }
}

/// Program and leading arguments of an external pipeline stage.
#[derive(Clone, Debug)]
pub struct StageCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl StageCommand {
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub upload_dir: PathBuf,
    pub workspace_dir: PathBuf,
    pub motion_config: PathBuf,
    pub retarget_config: PathBuf,
    pub allowed_extensions: Vec<String>,
    pub job_id: JobIdConfig,
    pub max_upload_bytes: usize,
    pub annotation_command: StageCommand,
    pub animation_command: StageCommand,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let alphabet = env::get_or(EnvKey::JobIdAlphabet, DEFAULT_JOB_ID_ALPHABET);

        let config = Self {
            server_host: env::get_or(EnvKey::ServerHost, "0.0.0.0"),
            server_port: env::get_parsed(EnvKey::ServerPort, 5005),
            upload_dir: env::get_or(EnvKey::UploadDir, "uploads/").into(),
            workspace_dir: env::get_or(EnvKey::WorkspaceDir, ".").into(),
            motion_config: env::get_or(EnvKey::MotionConfig, "config/motion/dab.yaml").into(),
            retarget_config: env::get_or(EnvKey::RetargetConfig, "config/retarget/fair1_ppf.yaml")
                .into(),
            allowed_extensions: env::get_list(EnvKey::AllowedExtensions, &["png", "jpg", "jpeg"]),
            job_id: JobIdConfig {
                alphabet: alphabet.into_bytes(),
                length: env::get_parsed(EnvKey::JobIdLength, DEFAULT_JOB_ID_LENGTH),
                verify_unique: env::get_parsed(EnvKey::VerifyUniqueJobId, false),
            },
            max_upload_bytes: env::get_parsed(EnvKey::MaxUploadBytes, 16 * 1024 * 1024),
            annotation_command: StageCommand::parse(&env::get_or(
                EnvKey::AnnotationCommand,
                "python image_to_annotations.py",
            ))
            .unwrap_or_else(|| StageCommand {
                program: "python".to_string(),
                args: vec!["image_to_annotations.py".to_string()],
            }),
            animation_command: StageCommand::parse(&env::get_or(
                EnvKey::AnimationCommand,
                "python annotations_to_animation.py",
            ))
            .unwrap_or_else(|| StageCommand {
                program: "python".to_string(),
                args: vec!["annotations_to_animation.py".to_string()],
            }),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.job_id.length == 0 {
            return Err(ConfigError::EmptyJobIdLength);
        }
        if self.job_id.alphabet.is_empty()
            || !self.job_id.alphabet.iter().all(u8::is_ascii_alphanumeric)
        {
            return Err(ConfigError::InvalidJobIdAlphabet(
                String::from_utf8_lossy(&self.job_id.alphabet).into_owned(),
            ));
        }
        if self.allowed_extensions.is_empty() {
            return Err(ConfigError::NoAllowedExtensions);
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
impl AppConfig {
    /// Config rooted in a scratch directory, stage commands unused.
    pub fn for_tests(root: &std::path::Path) -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            upload_dir: root.join("uploads"),
            workspace_dir: root.join("jobs"),
            motion_config: "config/motion/dab.yaml".into(),
            retarget_config: "config/retarget/fair1_ppf.yaml".into(),
            allowed_extensions: vec!["png".into(), "jpg".into(), "jpeg".into()],
            job_id: JobIdConfig::default(),
            max_upload_bytes: 1024 * 1024,
            annotation_command: StageCommand {
                program: "true".to_string(),
                args: Vec::new(),
            },
            animation_command: StageCommand {
                program: "true".to_string(),
                args: Vec::new(),
            },
        }
    }
}
