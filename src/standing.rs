use crate::models::OverallStats;

pub const DEFAULT_THRESHOLD: f64 = 75.0;

/// Below this percentage a student is at risk regardless of the threshold.
pub const AT_RISK_BELOW: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    Good,
    Warning,
    Critical,
}

impl Standing {
    pub fn label(self) -> &'static str {
        match self {
            Standing::Good => "Good Standing",
            Standing::Warning => "Below Requirement",
            Standing::Critical => "At Risk",
        }
    }
}

pub fn classify(percentage: f64, threshold: f64) -> Standing {
    if percentage >= threshold {
        Standing::Good
    } else if percentage >= AT_RISK_BELOW {
        Standing::Warning
    } else {
        Standing::Critical
    }
}

/// Consecutive presences needed to lift `present / total` to `threshold`,
/// clamped at zero.
///
/// Works from the raw counts, so a rounded `_percentage` that already shows
/// the threshold can still need classes. Callers decide whether to surface
/// it; see [`AttendanceAlert::evaluate`].
pub fn classes_needed(_percentage: f64, present: u32, total: u32, threshold: f64) -> u32 {
    if threshold >= 100.0 {
        return 0;
    }
    let deficit = threshold * f64::from(total) - 100.0 * f64::from(present);
    let needed = (deficit / (100.0 - threshold)).ceil();
    if needed.is_finite() && needed > 0.0 {
        needed as u32
    } else {
        0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceAlert {
    pub threshold: f64,
    pub percentage: f64,
    pub classes_needed: u32,
}

impl AttendanceAlert {
    /// An alert is raised only for a non-empty history below `threshold`.
    pub fn evaluate(overall: &OverallStats, threshold: f64) -> Option<Self> {
        if overall.total_classes == 0 || overall.percentage >= threshold {
            return None;
        }
        Some(Self {
            threshold,
            percentage: overall.percentage,
            classes_needed: classes_needed(
                overall.percentage,
                overall.attended,
                overall.total_classes,
                threshold,
            ),
        })
    }
}

/// Semesters offered by the course named in the first word of `class_name`.
pub fn course_duration(class_name: Option<&str>) -> u32 {
    let course = class_name
        .and_then(|name| name.split_whitespace().next())
        .unwrap_or_default();
    match course {
        "B.Tech" => 8,
        "BCA" => 6,
        "MCA" | "M.Tech" => 4,
        _ => 8,
    }
}
