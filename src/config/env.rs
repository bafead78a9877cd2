use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerHost,
    ServerPort,
    UploadDir,
    WorkspaceDir,
    MotionConfig,
    RetargetConfig,
    AllowedExtensions,
    JobIdLength,
    JobIdAlphabet,
    VerifyUniqueJobId,
    MaxUploadBytes,
    AnnotationCommand,
    AnimationCommand,
    LogDir,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerHost => "APP_HOST",
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::UploadDir => "UPLOAD_DIR",
            EnvKey::WorkspaceDir => "JOB_WORKSPACE_DIR",
            EnvKey::MotionConfig => "MOTION_CONFIG",
            EnvKey::RetargetConfig => "RETARGET_CONFIG",
            EnvKey::AllowedExtensions => "ALLOWED_EXTENSIONS",
            EnvKey::JobIdLength => "JOB_ID_LENGTH",
            EnvKey::JobIdAlphabet => "JOB_ID_ALPHABET",
            EnvKey::VerifyUniqueJobId => "VERIFY_UNIQUE_JOB_ID",
            EnvKey::MaxUploadBytes => "MAX_UPLOAD_BYTES",
            EnvKey::AnnotationCommand => "ANNOTATION_COMMAND",
            EnvKey::AnimationCommand => "ANIMATION_COMMAND",
            EnvKey::LogDir => "LOG_DIR",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Comma separated list, lowercased, blanks dropped.
pub fn get_list(key: EnvKey, default: &[&str]) -> Vec<String> {
    match get(key) {
        Ok(val) => val
            .split(',')
            .map(|item| item.trim().to_ascii_lowercase())
            .filter(|item| !item.is_empty())
            .collect(),
        Err(_) => default.iter().map(|item| item.to_string()).collect(),
    }
}
