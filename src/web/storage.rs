use std::path::Path;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Response},
};

use crate::web::{AuthUser, models::AssignmentRow, uploads};

/// Ensure the upload storage directory exists.
pub async fn ensure_storage_root(path: &str) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .with_context(|| format!("failed to ensure storage root at {path}"))
}

/// Submissions are private to their owner; admins can reach all of them.
pub fn can_access(assignment: &AssignmentRow, user: &AuthUser) -> bool {
    assignment.user_id == user.id || user.is_admin()
}

/// Read a stored upload and serve it with an attachment disposition under
/// its original filename.
pub async fn stream_file(path: &Path, filename: &str) -> Result<Response> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read stored file {}", path.display()))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(filename)),
    );
    let disposition = format!("attachment; filename=\"{}\"", filename.replace('"', ""));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition).context("invalid download disposition header")?,
    );

    Ok((headers, bytes).into_response())
}

fn content_type_for(filename: &str) -> &'static str {
    match uploads::extension_of(filename).as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn assignment(owner: i64) -> AssignmentRow {
        AssignmentRow {
            id: 1,
            user_id: owner,
            original_name: "essay.pdf".to_string(),
            stored_name: "x_essay.pdf".to_string(),
            uploaded_at: Utc::now(),
            grade: None,
            comments: None,
            graded_by: None,
            graded_at: None,
        }
    }

    fn user(id: i64, role: &str) -> AuthUser {
        AuthUser {
            id,
            name: "Test".to_string(),
            email: "test@uni.edu".to_string(),
            role: role.to_string(),
        }
    }

    #[test]
    fn owner_and_admin_can_access() {
        assert!(can_access(&assignment(7), &user(7, "student")));
        assert!(can_access(&assignment(7), &user(1, "admin")));
        assert!(!can_access(&assignment(7), &user(8, "student")));
    }

    #[test]
    fn content_types_follow_the_allow_list() {
        assert_eq!(content_type_for("a.pdf"), "application/pdf");
        assert_eq!(content_type_for("a.doc"), "application/msword");
        assert_eq!(content_type_for("weird.bin"), "application/octet-stream");
    }
}
