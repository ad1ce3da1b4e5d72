use sqlx::SqlitePool;

use super::models::{
    AnnouncementRow, AssignmentRow, AssignmentWithOwnerRow, FeedbackRow, NotificationRow,
    PortalStats, UserRow,
};

pub async fn fetch_recent_announcements(
    pool: &SqlitePool,
    limit: i64,
) -> sqlx::Result<Vec<AnnouncementRow>> {
    sqlx::query_as::<_, AnnouncementRow>(
        "SELECT announcements.id, title, announcements.message, users.name AS author_name,
                announcements.created_at, announcements.updated_at
         FROM announcements JOIN users ON users.id = announcements.created_by
         ORDER BY announcements.created_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Lists announcements newest first, optionally narrowed to a substring
/// match over title or message.
pub async fn search_announcements(
    pool: &SqlitePool,
    search: Option<&str>,
) -> sqlx::Result<Vec<AnnouncementRow>> {
    match search {
        Some(term) if !term.is_empty() => {
            let pattern = format!("%{}%", like_escape(term));
            sqlx::query_as::<_, AnnouncementRow>(
                "SELECT announcements.id, title, announcements.message, users.name AS author_name,
                        announcements.created_at, announcements.updated_at
                 FROM announcements JOIN users ON users.id = announcements.created_by
                 WHERE title LIKE $1 ESCAPE '\\' OR announcements.message LIKE $1 ESCAPE '\\'
                 ORDER BY announcements.created_at DESC",
            )
            .bind(pattern)
            .fetch_all(pool)
            .await
        }
        _ => {
            sqlx::query_as::<_, AnnouncementRow>(
                "SELECT announcements.id, title, announcements.message, users.name AS author_name,
                        announcements.created_at, announcements.updated_at
                 FROM announcements JOIN users ON users.id = announcements.created_by
                 ORDER BY announcements.created_at DESC",
            )
            .fetch_all(pool)
            .await
        }
    }
}

pub async fn fetch_announcement(
    pool: &SqlitePool,
    id: i64,
) -> sqlx::Result<Option<AnnouncementRow>> {
    sqlx::query_as::<_, AnnouncementRow>(
        "SELECT announcements.id, title, announcements.message, users.name AS author_name,
                announcements.created_at, announcements.updated_at
         FROM announcements JOIN users ON users.id = announcements.created_by
         WHERE announcements.id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_assignments_for_user(
    pool: &SqlitePool,
    user_id: i64,
) -> sqlx::Result<Vec<AssignmentRow>> {
    sqlx::query_as::<_, AssignmentRow>(
        "SELECT id, user_id, original_name, stored_name, uploaded_at, grade, comments, graded_by, graded_at
         FROM assignments WHERE user_id = $1 ORDER BY uploaded_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn fetch_assignment(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<AssignmentRow>> {
    sqlx::query_as::<_, AssignmentRow>(
        "SELECT id, user_id, original_name, stored_name, uploaded_at, grade, comments, graded_by, graded_at
         FROM assignments WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_all_assignments(
    pool: &SqlitePool,
    limit: Option<i64>,
) -> sqlx::Result<Vec<AssignmentWithOwnerRow>> {
    let base = "SELECT assignments.id, assignments.user_id, original_name, uploaded_at, grade,
                       users.name AS owner_name, users.email AS owner_email
                FROM assignments JOIN users ON users.id = assignments.user_id
                ORDER BY uploaded_at DESC";
    match limit {
        Some(limit) => {
            sqlx::query_as::<_, AssignmentWithOwnerRow>(&format!("{base} LIMIT $1"))
                .bind(limit)
                .fetch_all(pool)
                .await
        }
        None => {
            sqlx::query_as::<_, AssignmentWithOwnerRow>(base)
                .fetch_all(pool)
                .await
        }
    }
}

pub async fn count_assignments_for_user(pool: &SqlitePool, user_id: i64) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM assignments WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

pub async fn fetch_notifications_for_user(
    pool: &SqlitePool,
    user_id: i64,
) -> sqlx::Result<Vec<NotificationRow>> {
    sqlx::query_as::<_, NotificationRow>(
        "SELECT id, user_id, message, is_read, created_at
         FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn count_unread_notifications(pool: &SqlitePool, user_id: i64) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = 0")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

pub async fn fetch_students(pool: &SqlitePool) -> sqlx::Result<Vec<UserRow>> {
    sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, department, year, role, last_login, created_at
         FROM users WHERE role = 'student' ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await
}

pub async fn fetch_student(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<UserRow>> {
    sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, department, year, role, last_login, created_at
         FROM users WHERE id = $1 AND role = 'student'",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_user(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<UserRow>> {
    sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, department, year, role, last_login, created_at
         FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_feedback(
    pool: &SqlitePool,
    rating: Option<i64>,
    limit: Option<i64>,
) -> sqlx::Result<Vec<FeedbackRow>> {
    let mut sql = String::from(
        "SELECT feedback.id, feedback.user_id, subject, feedback.message, rating,
                users.name AS author_name, feedback.created_at
         FROM feedback JOIN users ON users.id = feedback.user_id",
    );
    if rating.is_some() {
        sql.push_str(" WHERE rating = $1");
    }
    sql.push_str(" ORDER BY feedback.created_at DESC");
    if limit.is_some() {
        sql.push_str(if rating.is_some() { " LIMIT $2" } else { " LIMIT $1" });
    }

    let mut query = sqlx::query_as::<_, FeedbackRow>(&sql);
    if let Some(rating) = rating {
        query = query.bind(rating);
    }
    if let Some(limit) = limit {
        query = query.bind(limit);
    }
    query.fetch_all(pool).await
}

pub async fn fetch_feedback_for_user(
    pool: &SqlitePool,
    user_id: i64,
) -> sqlx::Result<Vec<FeedbackRow>> {
    sqlx::query_as::<_, FeedbackRow>(
        "SELECT feedback.id, feedback.user_id, subject, feedback.message, rating,
                users.name AS author_name, feedback.created_at
         FROM feedback JOIN users ON users.id = feedback.user_id
         WHERE feedback.user_id = $1 ORDER BY feedback.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn fetch_portal_stats(pool: &SqlitePool) -> sqlx::Result<PortalStats> {
    sqlx::query_as::<_, PortalStats>(
        "SELECT
            (SELECT COUNT(*) FROM users WHERE role = 'student') AS total_students,
            (SELECT COUNT(*) FROM assignments) AS total_assignments,
            (SELECT COUNT(*) FROM assignments WHERE grade IS NULL) AS ungraded_assignments,
            (SELECT COUNT(*) FROM announcements) AS total_announcements,
            (SELECT COUNT(*) FROM feedback) AS total_feedback",
    )
    .fetch_one(pool)
    .await
}

/// Escapes LIKE wildcards so user input is matched literally.
fn like_escape(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_escape_neutralizes_wildcards() {
        assert_eq!(like_escape("100%_done\\"), "100\\%\\_done\\\\");
        assert_eq!(like_escape("plain"), "plain");
    }
}
