use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

mod api;
mod config;
mod export;
mod models;
mod report;
mod standing;
mod stats;
mod validation;

use config::{Config, Source, SourceArgs};
use models::{AttendanceRecord, Student};

#[derive(Parser)]
#[command(name = "attendance-insights")]
#[command(about = "Student attendance statistics from the Smart Attendance backend", long_about = None)]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the attendance summary for the student
    Profile {
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        semester: Option<u32>,
        /// Print the full statistics snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown attendance report
    Report {
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        semester: Option<u32>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// List the latest class sessions with their attendance percentage
    History {
        #[arg(long, default_value_t = export::HISTORY_LIMIT)]
        limit: usize,
    },
    /// Export one class session's roster as CSV
    Export {
        /// Session position in the history, newest first
        #[arg(long, default_value_t = 0)]
        index: usize,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check a student registration form (JSON) against the form rules
    ValidateRegistration {
        #[arg(long)]
        form: PathBuf,
        #[arg(long, env = "ATTENDANCE_COLLEGE_DOMAIN", default_value = validation::DEFAULT_COLLEGE_DOMAIN)]
        college_domain: String,
    },
    /// Check login fields: a teacher email, or the student --roll-no
    ValidateLogin {
        #[arg(long)]
        teacher_email: Option<String>,
        #[arg(long, env = "ATTENDANCE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        #[arg(long, env = "ATTENDANCE_COLLEGE_DOMAIN", default_value = validation::DEFAULT_COLLEGE_DOMAIN)]
        college_domain: String,
    },
}

async fn load_inputs(source: &Source) -> anyhow::Result<(Option<Student>, Vec<AttendanceRecord>)> {
    match source {
        Source::Api { base_url, token } => {
            let client = api::ApiClient::new(base_url.clone(), token.clone());
            Ok(client.fetch_profile().await)
        }
        Source::File { path, roll_no } => {
            validation::validate_login_roll_no(roll_no)?;
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let value: serde_json::Value = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not valid JSON", path.display()))?;
            Ok((
                Some(Student::with_roll_no(roll_no.clone())),
                AttendanceRecord::list_from_value(value),
            ))
        }
    }
}

fn report_problems(problems: &[validation::ValidationError]) -> anyhow::Result<()> {
    if problems.is_empty() {
        println!("All fields valid.");
        return Ok(());
    }
    for problem in problems {
        println!("- {problem}");
    }
    anyhow::bail!("{} field(s) failed validation", problems.len());
}

fn check_semester(student: Option<&Student>, semester: Option<u32>) -> anyhow::Result<()> {
    let Some(semester) = semester else {
        return Ok(());
    };
    let duration = standing::course_duration(student.and_then(|s| s.class_name.as_deref()));
    if semester > duration {
        anyhow::bail!("semester {semester} is outside this course's {duration} semesters");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("attendance_insights=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::ValidateRegistration {
            form,
            college_domain,
        } => {
            let raw = std::fs::read_to_string(form)
                .with_context(|| format!("failed to read {}", form.display()))?;
            let form: validation::RegistrationForm = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a registration form", form.display()))?;
            return report_problems(&form.validate(college_domain));
        }
        Commands::ValidateLogin {
            teacher_email,
            password,
            college_domain,
        } => {
            let password = password.as_deref().unwrap_or_default();
            let identity = match teacher_email {
                Some(email) => validation::validate_teacher_email(email, college_domain),
                None => validation::validate_login_roll_no(
                    cli.source.roll_no.as_deref().unwrap_or_default(),
                ),
            };
            let problems: Vec<_> = [identity, validation::validate_login_password(password)]
                .into_iter()
                .filter_map(Result::err)
                .collect();
            return report_problems(&problems);
        }
        _ => {}
    }

    let config = Config::from(cli.source);

    let (student, records) = load_inputs(&config.source).await?;
    if student.is_none() {
        tracing::warn!("failed to load student data");
    }
    tracing::info!(records = records.len(), "attendance history loaded");

    match cli.command {
        Commands::Profile { semester, json } => {
            check_semester(student.as_ref(), semester)?;
            let all = stats::build(&records, student.as_ref());
            let scoped = stats::filter_by_semester(&all, &records, student.as_ref(), semester);

            if json {
                println!("{}", serde_json::to_string_pretty(scoped.as_ref())?);
                return Ok(());
            }

            let Some(overall) = &scoped.overall else {
                println!("No attendance records yet.");
                return Ok(());
            };
            let standing = standing::classify(overall.percentage, config.threshold);
            println!(
                "{} ({}): {:.1}% {}",
                student.as_ref().map(Student::display_name).unwrap_or("Student"),
                student
                    .as_ref()
                    .and_then(|s| s.roll_no.as_deref())
                    .unwrap_or("N/A"),
                overall.percentage,
                standing.label()
            );
            println!(
                "Attended {} of {} classes, missed {}.",
                overall.attended, overall.total_classes, overall.missed
            );
            if let Some(alert) = standing::AttendanceAlert::evaluate(overall, config.threshold) {
                println!(
                    "Attendance below {}%: attend the next {} classes consecutively to meet the requirement.",
                    alert.threshold, alert.classes_needed
                );
            }
        }
        Commands::Report { semester, out } => {
            check_semester(student.as_ref(), semester)?;
            let all = stats::build(&records, student.as_ref());
            let scoped = stats::filter_by_semester(&all, &records, student.as_ref(), semester);
            let report =
                report::build_report(student.as_ref(), &scoped, semester, config.threshold);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::History { limit } => {
            let sessions = export::sessions_newest_first(&records);
            if sessions.is_empty() {
                println!("No attendance records found.");
                return Ok(());
            }
            for (position, record) in sessions.iter().take(limit).enumerate() {
                let summary = export::SessionSummary::of(record);
                println!(
                    "{:>2}. {} {} {} {}: {}/{} {:.1}% [{}]",
                    position + 1,
                    report::format_activity_date(&record.date),
                    record.course.as_deref().unwrap_or(""),
                    record.semester.as_deref().unwrap_or(""),
                    record.subject.as_deref().unwrap_or(""),
                    summary.present,
                    summary.total,
                    summary.percentage,
                    summary.tier().label()
                );
            }
        }
        Commands::Export { index, out } => {
            let sessions = export::sessions_newest_first(&records);
            let record = sessions.get(index).with_context(|| {
                format!(
                    "no session at index {index} ({} sessions available)",
                    sessions.len()
                )
            })?;
            let out = out.unwrap_or_else(|| PathBuf::from(export::default_file_name(record)));
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            export::write_roster(record, file)?;

            let summary = export::SessionSummary::of(record);
            println!(
                "Exported {} ({} present of {}, {:.1}%) to {}.",
                record.subject_name(),
                summary.present,
                summary.total,
                summary.percentage,
                out.display()
            );
        }
        Commands::ValidateRegistration { .. } | Commands::ValidateLogin { .. } => {}
    }

    Ok(())
}
