use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The logged-in student as returned by the backend.
///
/// Backend casing is inconsistent, so decoding goes through [`RawStudent`]
/// and every alias is resolved once here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "RawStudent")]
pub struct Student {
    pub roll_no: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub class_name: Option<String>,
}

impl Student {
    pub fn with_roll_no(roll_no: impl Into<String>) -> Self {
        Self {
            roll_no: Some(roll_no.into()),
            ..Self::default()
        }
    }

    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or("Student")
    }
}

#[derive(Deserialize)]
struct RawStudent {
    #[serde(default, rename = "rollNo", deserialize_with = "lenient_string")]
    roll_no: Option<String>,
    #[serde(default, rename = "RollNo", deserialize_with = "lenient_string")]
    roll_no_pascal: Option<String>,
    #[serde(default, rename = "fullName", deserialize_with = "lenient_string")]
    full_name: Option<String>,
    #[serde(default, rename = "FullName", deserialize_with = "lenient_string")]
    full_name_pascal: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    email: Option<String>,
    #[serde(default, rename = "Email", deserialize_with = "lenient_string")]
    email_pascal: Option<String>,
    #[serde(default, rename = "className", deserialize_with = "lenient_string")]
    class_name: Option<String>,
    #[serde(default, rename = "ClassName", deserialize_with = "lenient_string")]
    class_name_pascal: Option<String>,
}

impl From<RawStudent> for Student {
    fn from(raw: RawStudent) -> Self {
        Self {
            roll_no: raw.roll_no.or(raw.roll_no_pascal),
            full_name: raw.full_name.or(raw.full_name_pascal).or(raw.name),
            email: raw.email.or(raw.email_pascal),
            class_name: raw.class_name.or(raw.class_name_pascal),
        }
    }
}

/// One student's mark within a class session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceEntry {
    #[serde(default, rename = "rollNo", deserialize_with = "lenient_string")]
    pub roll_no: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
}

impl AttendanceEntry {
    pub fn is_present(&self) -> bool {
        self.status.as_deref() == Some("P")
    }
}

/// One class session's roster.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceRecord {
    #[serde(default, deserialize_with = "lenient_string_or_default")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub subject: Option<String>,
    /// Falsy semester values (`0`, `""`, `null`, `false`) decode as `None`.
    #[serde(default, deserialize_with = "lenient_string")]
    pub semester: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub course: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub batch: Option<String>,
    /// `None` when the payload carried no roster or a non-array roster.
    #[serde(default, deserialize_with = "lenient_roster")]
    pub attendance: Option<Vec<AttendanceEntry>>,
}

pub const UNKNOWN_SUBJECT: &str = "Unknown";
pub const INVALID_DATE: &str = "Invalid Date";

impl AttendanceRecord {
    /// Decodes a history payload. Anything other than a JSON array yields an
    /// empty list, and array elements that are not records are dropped.
    pub fn list_from_value(value: Value) -> Vec<AttendanceRecord> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .filter(Value::is_object)
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Roster entry for `roll_no`, compared as an exact string.
    pub fn entry_for(&self, roll_no: &str) -> Option<&AttendanceEntry> {
        self.attendance
            .as_deref()?
            .iter()
            .find(|entry| entry.roll_no.as_deref().unwrap_or("") == roll_no)
    }

    pub fn subject_name(&self) -> &str {
        self.subject.as_deref().unwrap_or(UNKNOWN_SUBJECT)
    }

    /// Absent semesters fall into `"Semester 1"`, same as an explicit `1`.
    pub fn semester_key(&self) -> String {
        semester_key(self.semester.as_deref().unwrap_or("1"))
    }

    pub fn parsed_date(&self) -> Option<NaiveDateTime> {
        parse_date(&self.date)
    }

    pub fn month_key(&self) -> String {
        match self.parsed_date() {
            Some(date) => date.format("%B %Y").to_string(),
            None => INVALID_DATE.to_string(),
        }
    }
}

pub fn semester_key(semester: impl std::fmt::Display) -> String {
    format!("Semester {semester}")
}

/// Accepts RFC 3339 timestamps (normalised to UTC), naive timestamps, and
/// plain `YYYY-MM-DD` dates.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc).naive_utc());
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(date);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
    pub total_classes: u32,
    pub attended: u32,
    pub missed: u32,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectStats {
    pub name: String,
    pub present: u32,
    pub absent: u32,
    pub total: u32,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemesterStats {
    pub semester: String,
    pub present: u32,
    pub total: u32,
    pub percentage: f64,
    /// Number of distinct subjects seen in the semester.
    pub subjects: usize,
}

impl SemesterStats {
    pub fn absent(&self) -> u32 {
        self.total - self.present
    }

    /// Numeric part of the `"Semester {n}"` label, if any.
    pub fn number(&self) -> Option<u32> {
        let digits: String = self
            .semester
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(char::is_ascii_digit)
            .collect();
        digits.parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyStats {
    pub month: String,
    pub present: u32,
    pub total: u32,
    pub percentage: f64,
}

impl MonthlyStats {
    pub fn absent(&self) -> u32 {
        self.total - self.present
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&format!("1 {}", self.month), "%d %B %Y").ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Present,
    Absent,
}

impl ActivityStatus {
    pub fn label(self) -> &'static str {
        match self {
            ActivityStatus::Present => "Present",
            ActivityStatus::Absent => "Absent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub date: String,
    pub subject: String,
    pub status: ActivityStatus,
}

/// Derived attendance snapshot for one student.
///
/// `overall` is `None` only for the empty snapshot produced when there is
/// no student to aggregate for.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub overall: Option<OverallStats>,
    pub subjects: BTreeMap<String, SubjectStats>,
    pub semesters: BTreeMap<String, SemesterStats>,
    pub monthly: BTreeMap<String, MonthlyStats>,
    pub recent_activity: Vec<Activity>,
}

impl Stats {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Stringifies a scalar the way a template literal would, treating falsy
/// values as absent. Integral floats drop their `.0`.
fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => number_to_string(&n),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

fn number_to_string(n: &serde_json::Number) -> Option<String> {
    if let Some(int) = n.as_i64() {
        return (int != 0).then(|| int.to_string());
    }
    if let Some(int) = n.as_u64() {
        return Some(int.to_string());
    }
    let float = n.as_f64()?;
    if float == 0.0 || float.is_nan() {
        None
    } else if float.fract() == 0.0 && float.abs() < 1e15 {
        Some((float as i64).to_string())
    } else {
        Some(float.to_string())
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_string(Value::deserialize(deserializer)?))
}

fn lenient_string_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}

fn lenient_roster<'de, D>(deserializer: D) -> Result<Option<Vec<AttendanceEntry>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(Some(
            items
                .into_iter()
                .filter(Value::is_object)
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
        )),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn student_resolves_alternate_casing() {
        let student: Student = serde_json::from_value(json!({
            "RollNo": 42,
            "FullName": "Avery Lee",
            "name": "ignored",
            "email": "avery@example.com",
            "className": "B.Tech CSE 2021-2025"
        }))
        .unwrap();

        assert_eq!(student.roll_no.as_deref(), Some("42"));
        assert_eq!(student.full_name.as_deref(), Some("Avery Lee"));
        assert_eq!(student.class_name.as_deref(), Some("B.Tech CSE 2021-2025"));
    }

    #[test]
    fn student_accepts_both_casings_at_once() {
        let student: Student = serde_json::from_value(json!({
            "rollNo": "R1",
            "email": "a@x.com",
            "Email": "b@x.com",
            "ClassName": "MCA 2024-2026",
            "className": "BCA 2022-2025"
        }))
        .unwrap();

        assert_eq!(student.email.as_deref(), Some("a@x.com"));
        assert_eq!(student.class_name.as_deref(), Some("BCA 2022-2025"));

        let student: Student =
            serde_json::from_value(json!({ "Email": "b@x.com", "ClassName": "MCA" })).unwrap();
        assert_eq!(student.email.as_deref(), Some("b@x.com"));
        assert_eq!(student.class_name.as_deref(), Some("MCA"));
    }

    #[test]
    fn student_falls_back_to_name() {
        let student: Student =
            serde_json::from_value(json!({ "rollNo": "R1", "name": "Jules" })).unwrap();
        assert_eq!(student.display_name(), "Jules");
        assert_eq!(Student::default().display_name(), "Student");
    }

    #[test]
    fn falsy_semesters_decode_as_absent() {
        for semester in [json!(null), json!(0), json!(""), json!(false)] {
            let record: AttendanceRecord =
                serde_json::from_value(json!({ "date": "2024-01-10", "semester": semester }))
                    .unwrap();
            assert_eq!(record.semester, None);
            assert_eq!(record.semester_key(), "Semester 1");
        }

        let record: AttendanceRecord =
            serde_json::from_value(json!({ "date": "2024-01-10", "semester": 3 })).unwrap();
        assert_eq!(record.semester_key(), "Semester 3");
    }

    #[test]
    fn semester_numbers_render_like_template_strings() {
        let key = |semester: serde_json::Value| {
            serde_json::from_value::<AttendanceRecord>(json!({ "semester": semester }))
                .unwrap()
                .semester_key()
        };
        assert_eq!(key(json!(2.0)), "Semester 2");
        assert_eq!(key(json!(2.5)), "Semester 2.5");
        assert_eq!(key(json!(0.0)), "Semester 1");
        assert_eq!(key(json!("4")), "Semester 4");
        assert_eq!(key(json!(true)), "Semester true");
    }

    #[test]
    fn non_array_roster_is_absent() {
        let record: AttendanceRecord =
            serde_json::from_value(json!({ "date": "2024-01-10", "attendance": "oops" }))
                .unwrap();
        assert!(record.attendance.is_none());
        assert!(record.entry_for("R1").is_none());
    }

    #[test]
    fn roster_roll_numbers_compare_as_strings() {
        let record: AttendanceRecord = serde_json::from_value(json!({
            "date": "2024-01-10",
            "attendance": [{ "rollNo": 101, "status": "P" }, { "status": "A" }]
        }))
        .unwrap();

        assert!(record.entry_for("101").is_some_and(AttendanceEntry::is_present));
        assert!(record.entry_for("").is_some_and(|entry| !entry.is_present()));
    }

    #[test]
    fn history_payload_must_be_an_array() {
        assert!(AttendanceRecord::list_from_value(json!({ "records": [] })).is_empty());

        let records = AttendanceRecord::list_from_value(json!([
            { "date": "2024-01-10", "subject": "Math" },
            "garbage",
            42
        ]));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].subject_name(), "Math");
    }

    #[test]
    fn month_keys_use_long_month_names() {
        let record = AttendanceRecord {
            date: "2024-01-10".to_string(),
            ..AttendanceRecord::default()
        };
        assert_eq!(record.month_key(), "January 2024");

        let record = AttendanceRecord {
            date: "2024-03-31T23:30:00-02:00".to_string(),
            ..AttendanceRecord::default()
        };
        assert_eq!(record.month_key(), "April 2024");

        let record = AttendanceRecord {
            date: "not a date".to_string(),
            ..AttendanceRecord::default()
        };
        assert_eq!(record.month_key(), INVALID_DATE);
    }

    #[test]
    fn semester_number_is_extracted_from_label() {
        let semester = SemesterStats {
            semester: "Semester 12".to_string(),
            present: 1,
            total: 2,
            percentage: 50.0,
            subjects: 1,
        };
        assert_eq!(semester.number(), Some(12));
        assert_eq!(semester.absent(), 1);
    }
}
