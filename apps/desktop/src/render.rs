//! Plain-text rendering of dashboard views.

use std::fmt::Write as _;

use client_core::{
    result_view::{TopicLink, NO_RESULT},
    test_listing::{format_due_date, status_label, EMPTY_LISTING},
    NoticeKind, ResultView, SessionSnapshot, SubmissionState, TestListing,
};
use shared::protocol::{PhysicalTest, Subject};

pub fn listing(view: &TestListing) -> String {
    let mut out = String::new();
    if let Some(error) = view.error() {
        let _ = writeln!(out, "error: {error}");
    }
    let Some(rows) = view.visible() else {
        return out;
    };
    if rows.is_empty() {
        let _ = writeln!(out, "{EMPTY_LISTING}");
        return out;
    }

    let _ = writeln!(
        out,
        "{:<26} {:<28} {:<14} {:>6} {:>8} {:<10} {}",
        "ID", "NAME", "SUBJECT", "MARKS", "MINUTES", "DUE", "STATUS"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:<26} {:<28} {:<14} {:>6} {:>8} {:<10} {}",
            row.id,
            row.name,
            row.subject_name.as_deref().unwrap_or("-"),
            row.total_marks
                .map(|marks| marks.to_string())
                .unwrap_or_else(|| "-".into()),
            row.time_duration.as_deref().unwrap_or("-"),
            format_due_date(row.due_date.as_ref()),
            status_label(row),
        );
    }
    out
}

pub fn subjects(subjects: &[Subject]) -> String {
    if subjects.is_empty() {
        return "No subjects found.\n".to_string();
    }
    subjects
        .iter()
        .map(|subject| format!("{}  {}\n", subject.id, subject.name))
        .collect()
}

pub fn test_details(test: &PhysicalTest) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", test.name);
    let _ = writeln!(out, "Due: {}", format_due_date(test.due_date.as_ref()));
    if let Some(name) = test.teacher.as_ref().and_then(|t| t.full_name.as_deref()) {
        let _ = writeln!(out, "Teacher: {name}");
    }
    let _ = writeln!(out, "Total score: {}", test.total_score());
    for (index, question) in test.questions.iter().enumerate() {
        let _ = writeln!(
            out,
            "  Q{}. {} ({} marks)",
            index + 1,
            question.question,
            question.score
        );
    }
    out
}

pub fn session(snapshot: &SessionSnapshot) -> String {
    let mut out = String::new();
    match &snapshot.test {
        Some(test) => out.push_str(&test_details(test)),
        None => out.push_str("Test details unavailable.\n"),
    }

    if snapshot.pending_files.is_empty() {
        let _ = writeln!(out, "No files selected.");
    } else {
        let _ = writeln!(out, "Selected files:");
        for (index, name) in snapshot.pending_files.iter().enumerate() {
            let _ = writeln!(out, "  [{}] {name}", index + 1);
        }
    }

    let submit = match snapshot.state {
        SubmissionState::Uploading => "Uploading...",
        _ if snapshot.submit_enabled => "Submit",
        _ => "Submit (disabled)",
    };
    let _ = writeln!(out, "{submit}");

    if let Some(notice) = &snapshot.notice {
        out.push_str(&notice_line(notice.kind, &notice.message));
    }
    if let Some(error) = &snapshot.error {
        let _ = writeln!(out, "error: {error}");
    }
    out
}

pub fn notice_line(kind: NoticeKind, message: &str) -> String {
    match kind {
        NoticeKind::Info => format!("note: {message}\n"),
        NoticeKind::Success => format!("ok: {message}\n"),
    }
}

pub fn result(view: &ResultView) -> String {
    let Some(result) = view.result() else {
        return format!("{NO_RESULT}\n");
    };

    let mut out = String::new();
    let _ = writeln!(out, "Student: {}", result.student.full_name);
    let _ = writeln!(out, "Teacher: {}", result.teacher.full_name);
    let _ = writeln!(out, "Score: {} / {}", result.score, result.test.score);
    if let Some(grade) = &result.grade {
        let _ = writeln!(out, "Grade: {grade}");
    }
    if let Some(feedback) = &result.feedback {
        let _ = writeln!(out, "Feedback: {feedback}");
    }
    if let Some(pdf) = &result.pdf_path {
        let _ = writeln!(out, "Answer sheet: {pdf}");
    }
    let links = view.topic_links();
    if !links.is_empty() {
        let _ = writeln!(out, "Recommended topics:");
        for TopicLink { name, path } in links {
            let _ = writeln!(out, "  {name} -> {path}");
        }
    }
    out
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
