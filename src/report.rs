use std::cmp::Reverse;
use std::fmt::Write;

use crate::models::{parse_date, MonthlyStats, SemesterStats, Stats, Student};
use crate::standing::{self, AttendanceAlert};

pub const RECENT_ACTIVITY_LIMIT: usize = 20;

fn or_na(value: Option<&str>) -> &str {
    value.unwrap_or("N/A")
}

/// Renders a dated activity as e.g. `Wed, 10 Jan 2024`.
pub fn format_activity_date(raw: &str) -> String {
    match parse_date(raw) {
        Some(date) => date.format("%a, %-d %b %Y").to_string(),
        None => "Invalid Date".to_string(),
    }
}

/// Semesters ordered by number, latest first.
pub fn semesters_latest_first(stats: &Stats) -> Vec<&SemesterStats> {
    let mut semesters: Vec<&SemesterStats> = stats.semesters.values().collect();
    semesters.sort_by_key(|semester| Reverse(semester.number().unwrap_or(0)));
    semesters
}

/// Months ordered chronologically, latest first.
pub fn months_latest_first(stats: &Stats) -> Vec<&MonthlyStats> {
    let mut months: Vec<&MonthlyStats> = stats.monthly.values().collect();
    months.sort_by_key(|month| Reverse(month.first_day()));
    months
}

pub fn build_report(
    student: Option<&Student>,
    stats: &Stats,
    semester: Option<u32>,
    threshold: f64,
) -> String {
    let mut output = String::new();
    let scope = semester
        .map(|n| format!("Semester {n}"))
        .unwrap_or_else(|| "all semesters".to_string());

    let _ = writeln!(output, "# Attendance Report");
    let _ = writeln!(
        output,
        "Generated for {} ({scope})",
        student.map(Student::display_name).unwrap_or("Student")
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## Student");
    let _ = writeln!(
        output,
        "- Roll No.: {}",
        or_na(student.and_then(|s| s.roll_no.as_deref()))
    );
    let _ = writeln!(
        output,
        "- Name: {}",
        or_na(student.and_then(|s| s.full_name.as_deref()))
    );
    let _ = writeln!(
        output,
        "- Email: {}",
        or_na(student.and_then(|s| s.email.as_deref()))
    );
    let class_name = student.and_then(|s| s.class_name.as_deref());
    let _ = writeln!(output, "- Class: {}", or_na(class_name));
    let _ = writeln!(
        output,
        "- Semesters offered: {}",
        standing::course_duration(class_name)
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## Overall Attendance");
    match &stats.overall {
        Some(overall) => {
            let standing = standing::classify(overall.percentage, threshold);
            let _ = writeln!(
                output,
                "{:.1}% ({})",
                overall.percentage,
                standing.label()
            );
            let _ = writeln!(
                output,
                "- Total classes: {}\n- Attended: {}\n- Missed: {}",
                overall.total_classes, overall.attended, overall.missed
            );
            if let Some(alert) = AttendanceAlert::evaluate(overall, threshold) {
                let _ = writeln!(output);
                let _ = writeln!(
                    output,
                    "> **Attendance warning:** below {}% (current {:.1}%). Attend the next {} classes consecutively to meet the requirement.",
                    alert.threshold, alert.percentage, alert.classes_needed
                );
            }
        }
        None => {
            let _ = writeln!(output, "No attendance records yet.");
        }
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## Subjects");
    if stats.subjects.is_empty() {
        let _ = writeln!(output, "No attendance records yet.");
    } else {
        let _ = writeln!(output, "| Subject | Present | Absent | Total | % |");
        let _ = writeln!(output, "|---|---|---|---|---|");
        for subject in stats.subjects.values() {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {:.1} |",
                subject.name, subject.present, subject.absent, subject.total, subject.percentage
            );
        }
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## Semesters");
    let semesters = semesters_latest_first(stats);
    if semesters.is_empty() {
        let _ = writeln!(output, "No semester data.");
    } else {
        for semester in semesters {
            let _ = writeln!(
                output,
                "- {}: {:.1}% ({}/{} classes, {} subjects)",
                semester.semester,
                semester.percentage,
                semester.present,
                semester.total,
                semester.subjects
            );
        }
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## Monthly");
    let months = months_latest_first(stats);
    if months.is_empty() {
        let _ = writeln!(output, "No monthly data.");
    } else {
        for month in months {
            let _ = writeln!(
                output,
                "- {}: {:.1}% ({}/{}, {} missed)",
                month.month,
                month.percentage,
                month.present,
                month.total,
                month.absent()
            );
        }
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## Recent Activity");
    if stats.recent_activity.is_empty() {
        let _ = writeln!(output, "No attendance activity.");
    } else {
        for activity in stats.recent_activity.iter().take(RECENT_ACTIVITY_LIMIT) {
            let _ = writeln!(
                output,
                "- {} {}: {}",
                format_activity_date(&activity.date),
                activity.subject,
                activity.status.label()
            );
        }
    }

    output
}
