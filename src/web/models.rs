use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub department: String,
    pub year: i64,
    pub role: String,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, FromRow)]
pub struct AssignmentRow {
    pub id: i64,
    pub user_id: i64,
    pub original_name: String,
    pub stored_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub grade: Option<String>,
    pub comments: Option<String>,
    pub graded_by: Option<i64>,
    pub graded_at: Option<DateTime<Utc>>,
}

impl AssignmentRow {
    pub fn is_graded(&self) -> bool {
        self.grade.is_some()
    }
}

/// Assignment joined with its owner, for admin listings.
#[derive(Clone, FromRow)]
pub struct AssignmentWithOwnerRow {
    pub id: i64,
    pub user_id: i64,
    pub original_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub grade: Option<String>,
    pub owner_name: String,
    pub owner_email: String,
}

#[derive(Clone, FromRow)]
pub struct AnnouncementRow {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, FromRow)]
pub struct FeedbackRow {
    pub id: i64,
    pub user_id: i64,
    pub subject: String,
    pub message: String,
    pub rating: i64,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, FromRow)]
pub struct NotificationRow {
    pub id: i64,
    pub user_id: i64,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Aggregate counters shown on the admin dashboard.
#[derive(Clone, Copy, Default, FromRow)]
pub struct PortalStats {
    pub total_students: i64,
    pub total_assignments: i64,
    pub ungraded_assignments: i64,
    pub total_announcements: i64,
    pub total_feedback: i64,
}
