use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No image part in the request")]
    MissingImagePart,
    #[error("No selected file")]
    NoSelectedFile,
    #[error("Invalid file format")]
    InvalidFormat,
}

/// Text after the last `.`, if any.
pub fn extension(file_name: &str) -> Option<&str> {
    file_name.rsplit_once('.').map(|(_, ext)| ext)
}

pub fn has_allowed_extension(file_name: &str, allowed: &[String]) -> bool {
    match extension(file_name) {
        Some(ext) if !ext.is_empty() => allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)),
        _ => false,
    }
}

/// Reduces a client supplied name to something safe to join onto a directory.
///
/// The name is NFKD-normalized and whatever is still non-ASCII is dropped
/// (`été` becomes `ete`, `猫` disappears). Path separators and whitespace runs
/// become `_`, anything outside `[A-Za-z0-9_.-]` is removed and leading or
/// trailing dots and underscores are trimmed. The result may be empty.
pub fn secure_filename(file_name: &str) -> String {
    let spaced: String = file_name
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// Decides whether an upload may enter the pipeline.
///
/// `file_name` is `None` when the request carried no file part at all. On
/// success the sanitized name is returned.
pub fn validate_upload(
    file_name: Option<&str>,
    allowed: &[String],
) -> Result<String, ValidationError> {
    let raw = file_name.ok_or(ValidationError::MissingImagePart)?;

    if raw.is_empty() {
        return Err(ValidationError::NoSelectedFile);
    }

    if !has_allowed_extension(raw, allowed) {
        return Err(ValidationError::InvalidFormat);
    }

    // never empty here: the allowed extension itself survives sanitizing
    Ok(secure_filename(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> Vec<String> {
        vec!["png".into(), "jpg".into(), "jpeg".into()]
    }

    #[test]
    fn missing_part_and_empty_name_are_distinct() {
        assert_eq!(
            validate_upload(None, &allowed()),
            Err(ValidationError::MissingImagePart)
        );
        assert_eq!(
            validate_upload(Some(""), &allowed()),
            Err(ValidationError::NoSelectedFile)
        );
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert_eq!(validate_upload(Some("Portrait.JPG"), &allowed()).unwrap(), "Portrait.JPG");
        assert_eq!(validate_upload(Some("a.JpEg"), &allowed()).unwrap(), "a.JpEg");
        assert_eq!(validate_upload(Some("scan.png"), &allowed()).unwrap(), "scan.png");
    }

    #[test]
    fn disallowed_extensions_are_rejected() {
        for name in ["notes.txt", "anim.gif", "noext", "trailing.", "archive.png.zip"] {
            assert_eq!(
                validate_upload(Some(name), &allowed()),
                Err(ValidationError::InvalidFormat),
                "{name}"
            );
        }
    }

    #[test]
    fn only_the_last_dot_counts() {
        assert_eq!(
            validate_upload(Some("my.photo.jpeg"), &allowed()).unwrap(),
            "my.photo.jpeg"
        );
    }

    #[test]
    fn secure_filename_strips_paths_and_unsafe_characters() {
        assert_eq!(secure_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("My cool drawing.png"), "My_cool_drawing.png");
        assert_eq!(secure_filename("C:\\Users\\kid\\dog.jpg"), "C_Users_kid_dog.jpg");
        assert_eq!(secure_filename("dessin_été.png"), "dessin_ete.png");
        assert_eq!(secure_filename("été.jpg"), "ete.jpg");
        assert_eq!(secure_filename("ﬁsh.png"), "fish.png");
        assert_eq!(secure_filename("  <script>.png"), "script.png");
    }

    #[test]
    fn allowed_extension_is_accepted_whatever_the_stem_sanitizes_to() {
        assert_eq!(validate_upload(Some(".png"), &allowed()).unwrap(), "png");
        assert_eq!(validate_upload(Some("../.jpg"), &allowed()).unwrap(), "jpg");
        assert_eq!(validate_upload(Some("猫.png"), &allowed()).unwrap(), "png");
        assert_eq!(validate_upload(Some("画.jpg"), &allowed()).unwrap(), "jpg");
        assert_eq!(validate_upload(Some("été.jpg"), &allowed()).unwrap(), "ete.jpg");
    }

    #[test]
    fn upload_path_components_are_removed() {
        assert_eq!(
            validate_upload(Some("../../uploads/../cat.png"), &allowed()).unwrap(),
            "uploads_.._cat.png"
        );
    }
}
