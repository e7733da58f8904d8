use std::borrow::Cow;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};

use crate::models::{
    parse_date, semester_key, Activity, ActivityStatus, AttendanceRecord, MonthlyStats,
    OverallStats, SemesterStats, Stats, Student, SubjectStats,
};

/// `present / total` as a percentage with one decimal place, `0` for an
/// empty bucket.
pub fn percentage(present: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (f64::from(present) / f64::from(total) * 1000.0).round() / 10.0
}

#[derive(Default)]
struct Tally {
    present: u32,
    total: u32,
}

impl Tally {
    fn record(&mut self, is_present: bool) {
        self.total += 1;
        if is_present {
            self.present += 1;
        }
    }

    fn absent(&self) -> u32 {
        self.total - self.present
    }

    fn percentage(&self) -> f64 {
        percentage(self.present, self.total)
    }
}

#[derive(Default)]
struct SemesterTally {
    tally: Tally,
    subjects: HashSet<String>,
}

/// Folds the attendance history into a statistics snapshot for `student`.
///
/// Records without a roster entry for the student are ignored. Without a
/// student the snapshot is empty and carries no `overall` block at all.
/// Recent activity is newest first; records sharing a timestamp keep their
/// input order and unparsable dates sort last.
pub fn build(records: &[AttendanceRecord], student: Option<&Student>) -> Stats {
    let Some(student) = student else {
        return Stats::empty();
    };

    let mut overall = Tally::default();
    let mut subjects: BTreeMap<String, Tally> = BTreeMap::new();
    let mut semesters: BTreeMap<String, SemesterTally> = BTreeMap::new();
    let mut monthly: BTreeMap<String, Tally> = BTreeMap::new();
    let mut recent_activity = Vec::new();

    for record in records {
        let Some(entry) = student
            .roll_no
            .as_deref()
            .and_then(|roll_no| record.entry_for(roll_no))
        else {
            continue;
        };

        let is_present = entry.is_present();
        let subject = record.subject_name();

        overall.record(is_present);
        subjects
            .entry(subject.to_string())
            .or_default()
            .record(is_present);

        let semester = semesters.entry(record.semester_key()).or_default();
        semester.tally.record(is_present);
        semester.subjects.insert(subject.to_string());

        monthly
            .entry(record.month_key())
            .or_default()
            .record(is_present);

        recent_activity.push(Activity {
            date: record.date.clone(),
            subject: subject.to_string(),
            status: if is_present {
                ActivityStatus::Present
            } else {
                ActivityStatus::Absent
            },
        });
    }

    recent_activity.sort_by_key(|activity| Reverse(parse_date(&activity.date)));

    Stats {
        overall: Some(OverallStats {
            total_classes: overall.total,
            attended: overall.present,
            missed: overall.absent(),
            percentage: overall.percentage(),
        }),
        subjects: subjects
            .into_iter()
            .map(|(name, tally)| {
                let stats = SubjectStats {
                    name: name.clone(),
                    present: tally.present,
                    absent: tally.absent(),
                    total: tally.total,
                    percentage: tally.percentage(),
                };
                (name, stats)
            })
            .collect(),
        semesters: semesters
            .into_iter()
            .map(|(key, semester)| {
                let stats = SemesterStats {
                    semester: key.clone(),
                    present: semester.tally.present,
                    total: semester.tally.total,
                    percentage: semester.tally.percentage(),
                    subjects: semester.subjects.len(),
                };
                (key, stats)
            })
            .collect(),
        monthly: monthly
            .into_iter()
            .map(|(month, tally)| {
                let stats = MonthlyStats {
                    month: month.clone(),
                    present: tally.present,
                    total: tally.total,
                    percentage: tally.percentage(),
                };
                (month, stats)
            })
            .collect(),
        recent_activity,
    }
}

/// Scopes a snapshot to one semester.
///
/// `None` hands back the snapshot itself. Otherwise subject totals are
/// recounted from `records`, while monthly totals pass through unscoped.
/// Recent activity is matched back to its record by date alone; the first
/// record with that date decides the semester.
pub fn filter_by_semester<'a>(
    stats: &'a Stats,
    records: &[AttendanceRecord],
    student: Option<&Student>,
    semester: Option<u32>,
) -> Cow<'a, Stats> {
    let Some(semester) = semester else {
        return Cow::Borrowed(stats);
    };
    let key = semester_key(semester);
    let roll_no = student.and_then(|student| student.roll_no.as_deref());

    let mut subjects = BTreeMap::new();
    for subject in stats.subjects.values() {
        let mut tally = Tally::default();
        let in_semester = records.iter().filter(|record| {
            record.semester_key() == key && record.subject.as_deref() == Some(subject.name.as_str())
        });
        for record in in_semester {
            if let Some(entry) = roll_no.and_then(|roll_no| record.entry_for(roll_no)) {
                tally.record(entry.is_present());
            }
        }

        if tally.total > 0 {
            subjects.insert(
                subject.name.clone(),
                SubjectStats {
                    name: subject.name.clone(),
                    present: tally.present,
                    absent: tally.absent(),
                    total: tally.total,
                    percentage: tally.percentage(),
                },
            );
        }
    }

    let overall = match stats.semesters.get(&key) {
        Some(bucket) => OverallStats {
            total_classes: bucket.total,
            attended: bucket.present,
            missed: bucket.absent(),
            percentage: bucket.percentage,
        },
        None => OverallStats::default(),
    };

    let semesters = stats
        .semesters
        .get(&key)
        .map(|bucket| (key.clone(), bucket.clone()))
        .into_iter()
        .collect();

    let recent_activity = stats
        .recent_activity
        .iter()
        .filter(|activity| {
            records
                .iter()
                .find(|record| record.date == activity.date)
                .is_some_and(|record| record.semester_key() == key)
        })
        .cloned()
        .collect();

    Cow::Owned(Stats {
        overall: Some(overall),
        subjects,
        semesters,
        monthly: stats.monthly.clone(),
        recent_activity,
    })
}
