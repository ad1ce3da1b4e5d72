use chrono::{DateTime, Datelike, Utc};

use crate::web::AuthUser;

const BASE_STYLES: &str = r#"
        :root { color-scheme: light; }
        body { font-family: "Helvetica Neue", Arial, sans-serif; margin: 0; background: #f8fafc; color: #0f172a; }
        header { background: #ffffff; padding: 1.5rem; border-bottom: 1px solid #e2e8f0; }
        .header-bar { display: flex; justify-content: space-between; align-items: center; flex-wrap: wrap; gap: 1rem; }
        .header-bar h1 { margin: 0; font-size: 1.5rem; }
        nav { display: flex; gap: 0.5rem; flex-wrap: wrap; align-items: center; }
        nav a { color: #1d4ed8; text-decoration: none; font-weight: 600; background: #e0f2fe; padding: 0.45rem 0.9rem; border-radius: 999px; border: 1px solid #bfdbfe; }
        nav a:hover { background: #bfdbfe; }
        main { padding: 2rem 1.5rem; max-width: 960px; margin: 0 auto; box-sizing: border-box; }
        .panel { background: #ffffff; border-radius: 12px; border: 1px solid #e2e8f0; padding: 1.5rem; margin-bottom: 1.5rem; box-shadow: 0 18px 40px rgba(15, 23, 42, 0.08); }
        .panel h2 { margin-top: 0; }
        label { display: block; margin-top: 1rem; font-weight: 600; }
        input, select, textarea { width: 100%; padding: 0.75rem; margin-top: 0.4rem; border-radius: 8px; border: 1px solid #cbd5f5; background: #f8fafc; color: #0f172a; box-sizing: border-box; font-size: 1rem; }
        textarea { min-height: 7rem; }
        button { margin-top: 1.25rem; padding: 0.8rem 1.2rem; border: none; border-radius: 8px; background: #2563eb; color: #ffffff; font-weight: 600; cursor: pointer; }
        button:hover { background: #1d4ed8; }
        .inline-form { display: inline; }
        .inline-form button { margin-top: 0; padding: 0.4rem 0.8rem; font-size: 0.9rem; }
        .danger button { background: #dc2626; }
        .danger button:hover { background: #b91c1c; }
        table { width: 100%; border-collapse: collapse; margin-top: 1rem; background: #ffffff; }
        th, td { padding: 0.7rem 0.9rem; border-bottom: 1px solid #e2e8f0; text-align: left; }
        th { background: #f1f5f9; }
        .flash { padding: 0.85rem 1.1rem; border-radius: 10px; margin-bottom: 1.25rem; font-weight: 600; }
        .flash.success { background: #dcfce7; color: #166534; }
        .flash.error { background: #fee2e2; color: #b91c1c; }
        .badge { display: inline-block; padding: 0.2rem 0.65rem; border-radius: 999px; font-size: 0.85rem; font-weight: 600; }
        .badge.graded { background: #dcfce7; color: #166534; }
        .badge.pending { background: #fef3c7; color: #92400e; }
        .badge.unread { background: #e0f2fe; color: #1d4ed8; }
        .stat-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(160px, 1fr)); gap: 1rem; }
        .stat { background: #ffffff; border: 1px solid #e2e8f0; border-radius: 12px; padding: 1.1rem; text-align: center; }
        .stat strong { display: block; font-size: 1.6rem; }
        .note { color: #475569; font-size: 0.95rem; }
        .app-footer { margin-top: 3rem; text-align: center; font-size: 0.85rem; color: #94a3b8; }
"#;

/// Wraps page content in the shared chrome: header with role-aware nav,
/// flash slot, footer.
pub fn render_page(title: &str, user: &AuthUser, flash: &str, body: &str) -> String {
    let nav = if user.is_admin() {
        r#"<a href="/admin/dashboard">Dashboard</a>
           <a href="/admin/students">Students</a>
           <a href="/admin/assignments">Assignments</a>
           <a href="/admin/announcements">Announcements</a>
           <a href="/admin/feedback">Feedback</a>
           <a href="/admin/notifications">Notify</a>"#
    } else {
        r#"<a href="/dashboard">Dashboard</a>
           <a href="/assignments">Assignments</a>
           <a href="/assignments/upload">Upload</a>
           <a href="/announcements">Announcements</a>
           <a href="/feedback">Feedback</a>
           <a href="/notifications">Notifications</a>
           <a href="/profile">Profile</a>"#
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title} · Student Portal</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="robots" content="noindex,nofollow">
    <style>
{styles}
    </style>
</head>
<body>
    <header>
        <div class="header-bar">
            <h1>{title}</h1>
            <nav>
                {nav}
                <form class="inline-form" method="post" action="/logout"><button type="submit">Log out ({name})</button></form>
            </nav>
        </div>
    </header>
    <main>
        {flash}
{body}
        {footer}
    </main>
</body>
</html>"#,
        title = title,
        styles = BASE_STYLES,
        nav = nav,
        name = escape_html(&user.name),
        flash = flash,
        body = body,
        footer = render_footer(),
    )
}

pub fn render_login_page(flash: &str) -> String {
    render_auth_page(
        "Sign in",
        flash,
        r#"<form method="post" action="/login">
                <label for="email">Email</label>
                <input id="email" name="email" type="email" required>
                <label for="password">Password</label>
                <input id="password" type="password" name="password" required>
                <button type="submit">Sign in</button>
            </form>
            <p class="note">New student? <a href="/signup">Create an account</a>.</p>"#,
    )
}

pub fn render_signup_page(flash: &str) -> String {
    render_auth_page(
        "Create account",
        flash,
        r#"<form method="post" action="/signup">
                <label for="name">Full name</label>
                <input id="name" name="name" required>
                <label for="email">Email</label>
                <input id="email" name="email" type="email" required>
                <label for="department">Department</label>
                <input id="department" name="department" required>
                <label for="year">Year of study</label>
                <input id="year" name="year" type="number" min="1" max="7" required>
                <label for="password">Password</label>
                <input id="password" type="password" name="password" required>
                <label for="confirm_password">Confirm password</label>
                <input id="confirm_password" type="password" name="confirm_password" required>
                <button type="submit">Register</button>
            </form>
            <p class="note">Already registered? <a href="/login">Sign in</a>.</p>"#,
    )
}

fn render_auth_page(heading: &str, flash: &str, form_html: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{heading} · Student Portal</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="robots" content="noindex,nofollow">
    <style>
        :root {{ color-scheme: light; }}
        body {{ font-family: "Helvetica Neue", Arial, sans-serif; display: flex; flex-direction: column; align-items: center; justify-content: center; min-height: 100vh; margin: 0; background: #f1f5f9; color: #0f172a; padding: 1.5rem; box-sizing: border-box; }}
        main {{ width: 100%; max-width: 480px; }}
        .panel {{ background: #ffffff; padding: 2.5rem 2.25rem; border-radius: 18px; box-shadow: 0 20px 60px rgba(15, 23, 42, 0.08); border: 1px solid #e2e8f0; box-sizing: border-box; }}
        h1 {{ margin: 0 0 1rem; font-size: 1.7rem; text-align: center; }}
        label {{ display: block; margin-top: 1.1rem; font-weight: 600; }}
        input {{ width: 100%; padding: 0.85rem; margin-top: 0.5rem; border-radius: 10px; border: 1px solid #cbd5f5; background: #f8fafc; font-size: 1rem; box-sizing: border-box; }}
        button {{ margin-top: 1.75rem; width: 100%; padding: 0.95rem; border: none; border-radius: 10px; background: #2563eb; color: #ffffff; font-weight: 600; font-size: 1.05rem; cursor: pointer; }}
        button:hover {{ background: #1d4ed8; }}
        .flash {{ padding: 0.85rem 1.1rem; border-radius: 10px; margin-bottom: 1rem; font-weight: 600; }}
        .flash.success {{ background: #dcfce7; color: #166534; }}
        .flash.error {{ background: #fee2e2; color: #b91c1c; }}
        .note {{ text-align: center; color: #475569; margin-top: 1.25rem; }}
        .app-footer {{ margin-top: 2rem; text-align: center; font-size: 0.85rem; color: #64748b; }}
    </style>
</head>
<body>
    <main>
        <section class="panel">
            <h1>{heading}</h1>
            {flash}
            {form_html}
        </section>
        {footer}
    </main>
</body>
</html>"#,
        heading = heading,
        flash = flash,
        form_html = form_html,
        footer = render_footer(),
    )
}

pub fn render_footer() -> String {
    let current_year = Utc::now().year();
    format!(r#"<footer class="app-footer">© {current_year} Student Portal</footer>"#)
}

/// Compose a flash message HTML snippet for known status or error codes.
pub fn compose_flash(status: Option<&str>, error: Option<&str>) -> String {
    if let Some(status) = status {
        let message = match status {
            "registered" => "Registration successful! Please sign in.",
            "logged_out" => "You have been signed out.",
            "uploaded" => "File uploaded successfully.",
            "deleted" => "Assignment deleted.",
            "graded" => "Assignment graded.",
            "announcement_created" => "Announcement published.",
            "announcement_updated" => "Announcement updated.",
            "announcement_deleted" => "Announcement deleted.",
            "feedback_sent" => "Thank you, your feedback has been submitted.",
            "profile_updated" => "Profile updated.",
            "password_changed" => "Password changed.",
            "notification_sent" => "Notification sent.",
            _ => "",
        };

        if !message.is_empty() {
            return format!(r#"<div class="flash success">{message}</div>"#);
        }
    }

    if let Some(error) = error {
        let message = match error {
            "missing_credentials" => "Email and password are required.",
            "invalid_credentials" => "Invalid email or password.",
            "not_authorized" => "Access denied. Admin privileges required.",
            "missing_fields" => "All fields are required.",
            "invalid_year" => "Please enter a valid year of study.",
            "invalid_email" => "Please enter a valid email address.",
            "email_taken" => "Email already registered.",
            "password_mismatch" => "Passwords do not match.",
            "password_short" => "Password must be at least 8 characters long.",
            "password_upper" => "Password must contain at least one uppercase letter.",
            "password_lower" => "Password must contain at least one lowercase letter.",
            "password_digit" => "Password must contain at least one digit.",
            "wrong_password" => "Current password is incorrect.",
            "no_file" => "No file selected.",
            "file_type" => "Invalid file type. Only PDF, DOC and DOCX files are allowed.",
            "file_too_large" => "File exceeds the upload size limit.",
            "upload_failed" => "Error uploading file, please try again.",
            "file_missing" => "File not found.",
            "not_found" => "The requested record was not found.",
            "graded_locked" => "Graded assignments can no longer be deleted.",
            "missing_title" => "Title and message are required.",
            "missing_message" => "Message is required.",
            "invalid_rating" => "Rating must be between 1 and 5.",
            "missing_student" => "Please choose a student.",
            _ => "Something went wrong, please try again.",
        };

        return format!(r#"<div class="flash error">{message}</div>"#);
    }

    String::new()
}

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_handles_markup() {
        assert_eq!(
            escape_html(r#"<b>"x" & 'y'</b>"#),
            "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn flash_prefers_status_over_error() {
        let html = compose_flash(Some("registered"), Some("email_taken"));
        assert!(html.contains("success"));
        assert!(html.contains("Registration successful"));
    }

    #[test]
    fn unknown_error_code_falls_back_to_generic() {
        let html = compose_flash(None, Some("bogus"));
        assert!(html.contains("Something went wrong"));
    }

    #[test]
    fn no_codes_renders_nothing() {
        assert!(compose_flash(None, None).is_empty());
    }
}
