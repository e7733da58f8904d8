use std::cmp::Reverse;
use std::io::Write;

use crate::models::AttendanceRecord;
use crate::stats::percentage;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub present: u32,
    pub total: u32,
    pub percentage: f64,
}

/// Percentage band used when listing past sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTier {
    High,
    Medium,
    Low,
}

impl SessionTier {
    pub fn label(self) -> &'static str {
        match self {
            SessionTier::High => "high",
            SessionTier::Medium => "med",
            SessionTier::Low => "low",
        }
    }
}

pub const HISTORY_LIMIT: usize = 20;

impl SessionSummary {
    pub fn tier(&self) -> SessionTier {
        if self.percentage >= 80.0 {
            SessionTier::High
        } else if self.percentage >= 60.0 {
            SessionTier::Medium
        } else {
            SessionTier::Low
        }
    }

    pub fn of(record: &AttendanceRecord) -> Self {
        let roster = record.attendance.as_deref().unwrap_or_default();
        let present = roster.iter().filter(|entry| entry.is_present()).count() as u32;
        let total = roster.len() as u32;
        Self {
            present,
            total,
            percentage: percentage(present, total),
        }
    }
}

/// Sessions ordered newest first, the order the export index refers to.
pub fn sessions_newest_first(records: &[AttendanceRecord]) -> Vec<&AttendanceRecord> {
    let mut sessions: Vec<&AttendanceRecord> = records.iter().collect();
    sessions.sort_by_key(|record| Reverse(record.parsed_date()));
    sessions
}

/// `attendance_{date}_{subject}.csv` with the subject reduced to
/// `[A-Za-z0-9_-]`.
pub fn default_file_name(record: &AttendanceRecord) -> String {
    let date = record
        .parsed_date()
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string());
    let subject: String = record
        .subject
        .as_deref()
        .unwrap_or("attendance")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("attendance_{date}_{subject}.csv")
}

/// Writes the session metadata block, a blank line, then the roster table.
pub fn write_roster<W: Write>(record: &AttendanceRecord, mut out: W) -> anyhow::Result<()> {
    let meta = [
        ("Course", record.course.as_deref()),
        ("Batch", record.batch.as_deref()),
        ("Semester", record.semester.as_deref()),
        ("Subject", record.subject.as_deref()),
        ("Date", Some(record.date.as_str())),
    ];
    {
        let mut writer = csv::Writer::from_writer(&mut out);
        for (label, value) in meta {
            writer.write_record([label, value.unwrap_or("")])?;
        }
        writer.flush()?;
    }
    out.write_all(b"\n")?;

    let mut writer = csv::Writer::from_writer(&mut out);
    writer.write_record(["Roll No.", "Student Name", "Status"])?;
    for entry in record.attendance.as_deref().unwrap_or_default() {
        writer.write_record([
            entry.roll_no.as_deref().unwrap_or(""),
            entry.name.as_deref().unwrap_or(""),
            entry.status.as_deref().unwrap_or(""),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
