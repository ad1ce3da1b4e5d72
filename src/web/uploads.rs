use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::error;
use uuid::Uuid;

/// Document formats accepted for assignment submissions.
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];

/// Metadata describing a stored upload on disk.
#[derive(Debug, Clone)]
pub struct SavedUpload {
    pub original_name: String,
    pub stored_name: String,
    pub stored_path: PathBuf,
    pub file_size: u64,
}

/// Validation or I/O failure while receiving an upload. Carries the flash
/// code the handler redirects with.
#[derive(Debug)]
pub struct UploadError {
    code: &'static str,
}

impl UploadError {
    fn new(code: &'static str) -> Self {
        Self { code }
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "upload rejected: {}", self.code)
    }
}

impl std::error::Error for UploadError {}

/// Receives the `file` field of a multipart form, enforcing the extension
/// allow-list and size ceiling before anything is recorded. On any failure
/// the partially written file is removed, so a rejected upload leaves no
/// trace on disk.
pub async fn save_assignment_upload(
    mut multipart: Multipart,
    dest_dir: &Path,
    max_bytes: u64,
) -> Result<SavedUpload, UploadError> {
    while let Some(mut field) = multipart.next_field().await.map_err(|err| {
        error!(?err, "failed to read multipart form");
        UploadError::new("upload_failed")
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(UploadError::new("no_file")),
        };

        if !is_allowed_extension(&original_name) {
            return Err(UploadError::new("file_type"));
        }

        let stored_name = stored_name_for(&original_name);
        let stored_path = dest_dir.join(&stored_name);
        let mut file = File::create(&stored_path).await.map_err(|err| {
            error!(?err, path = %stored_path.display(), "failed to create upload file");
            UploadError::new("upload_failed")
        })?;

        let mut file_size: u64 = 0;
        loop {
            let chunk = match field.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(err) => {
                    error!(?err, "failed to read upload stream");
                    discard(&stored_path).await;
                    return Err(UploadError::new("upload_failed"));
                }
            };

            file_size += chunk.len() as u64;
            if file_size > max_bytes {
                drop(file);
                discard(&stored_path).await;
                return Err(UploadError::new("file_too_large"));
            }

            if let Err(err) = file.write_all(&chunk).await {
                error!(?err, "failed to write upload chunk");
                drop(file);
                discard(&stored_path).await;
                return Err(UploadError::new("upload_failed"));
            }
        }

        if let Err(err) = file.flush().await {
            error!(?err, "failed to flush upload file");
            discard(&stored_path).await;
            return Err(UploadError::new("upload_failed"));
        }

        return Ok(SavedUpload {
            original_name,
            stored_name,
            stored_path,
            file_size,
        });
    }

    Err(UploadError::new("no_file"))
}

pub fn is_allowed_extension(filename: &str) -> bool {
    ALLOWED_EXTENSIONS.contains(&extension_of(filename).as_str())
}

pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Collision-resistant stored name: a fresh UUID prefixed to the sanitized
/// original filename. Leading dots are stripped so traversal fragments like
/// `../..` cannot survive sanitization as a dotted prefix.
pub fn stored_name_for(original: &str) -> String {
    let mut sanitized = sanitize_filename::sanitize(original)
        .trim_start_matches('.')
        .to_string();
    if sanitized.is_empty() {
        let extension = extension_of(original);
        sanitized = if extension.is_empty() {
            "upload".to_string()
        } else {
            format!("upload.{extension}")
        };
    }
    format!("{}_{}", Uuid::new_v4(), sanitized)
}

async fn discard(path: &Path) {
    if let Err(err) = tokio::fs::remove_file(path).await {
        error!(?err, path = %path.display(), "failed to remove rejected upload");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(extension_of("Report.PDF"), "pdf");
        assert_eq!(extension_of("notes.docx"), "docx");
        assert_eq!(extension_of("no-extension"), "");
    }

    #[test]
    fn allow_list_covers_documents_only() {
        assert!(is_allowed_extension("essay.pdf"));
        assert!(is_allowed_extension("essay.DOC"));
        assert!(!is_allowed_extension("payload.exe"));
        assert!(!is_allowed_extension("archive.zip"));
        assert!(!is_allowed_extension("noext"));
    }

    #[test]
    fn stored_names_keep_the_original_and_never_collide() {
        let first = stored_name_for("essay.pdf");
        let second = stored_name_for("essay.pdf");
        assert!(first.ends_with("_essay.pdf"));
        assert_ne!(first, second);
    }

    #[test]
    fn stored_name_survives_hostile_input() {
        let name = stored_name_for("../../etc/passwd");
        assert!(!name.contains(".."));
        assert!(!name.contains('/'));
        assert!(!name.contains('\\'));
    }

    #[test]
    fn stored_name_for_dots_only_falls_back() {
        let name = stored_name_for("..");
        assert!(name.ends_with("_upload"));
    }
}
