mod announcements;
mod assignments;
mod auth;
mod dashboard;
mod feedback;
mod notifications;
mod students;

pub use announcements::{
    create_announcement, create_page, delete_announcement, edit_page, list as announcement_list,
    update_announcement,
};
pub use assignments::{grade, grade_page, list as assignment_list};
pub use auth::require_admin_user;
pub use dashboard::dashboard;
pub use feedback::list as feedback_list;
pub use notifications::{send_notification, send_page};
pub use students::{student_detail, student_list};
