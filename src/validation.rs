//! Registration and login form rules.
//!
//! Each rule is a pure check returning the message shown next to the field.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

pub const DEFAULT_COLLEGE_DOMAIN: &str = "@bciit.ac.in";

/// Longest local part accepted in front of the college domain.
const MAX_EMAIL_LOCAL_LEN: usize = 100;

static REGISTRATION_ROLL_NO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]{5,20}$").unwrap());
static FULL_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z\s]{3,50}$").unwrap());
static EMAIL_LOCAL_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+$").unwrap());

const PASSWORD_SYMBOLS: &str = "!@#$%^&*";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Roll No. is required.")]
    RollNoRequired,
    #[error("Password is required.")]
    PasswordRequired,
    #[error("Full Name must be 3-50 characters, letters and spaces only.")]
    FullName,
    #[error("Email must be valid and end with {domain}, max 100 chars before domain.")]
    RegistrationEmail { domain: String },
    #[error("Email must be valid and end with {domain}.")]
    Email { domain: String },
    #[error("Roll No. must be alphanumeric, 5-20 characters.")]
    RegistrationRollNo,
    #[error("Please select a course.")]
    CourseRequired,
    #[error("Please select a course and batch.")]
    CourseAndBatchRequired,
    #[error("Invalid batch format.")]
    BatchFormat,
    #[error("Invalid batch years.")]
    BatchYears,
    #[error("Selected batch ({batch}) is not valid for {course} (expected {expected}-year duration).")]
    BatchDuration {
        batch: String,
        course: String,
        expected: i32,
    },
    #[error("Password does not meet all requirements.")]
    WeakPassword,
    #[error("Passwords do not match.")]
    PasswordMismatch,
}

pub fn validate_login_roll_no(roll_no: &str) -> Result<(), ValidationError> {
    if roll_no.trim().is_empty() {
        return Err(ValidationError::RollNoRequired);
    }
    Ok(())
}

pub fn validate_login_password(password: &str) -> Result<(), ValidationError> {
    if password.trim().is_empty() {
        return Err(ValidationError::PasswordRequired);
    }
    Ok(())
}

pub fn validate_full_name(name: &str) -> Result<(), ValidationError> {
    if !FULL_NAME.is_match(name) {
        return Err(ValidationError::FullName);
    }
    Ok(())
}

pub fn validate_registration_roll_no(roll_no: &str) -> Result<(), ValidationError> {
    if !REGISTRATION_ROLL_NO.is_match(roll_no) {
        return Err(ValidationError::RegistrationRollNo);
    }
    Ok(())
}

fn local_part<'a>(email: &'a str, domain: &str) -> Option<&'a str> {
    email
        .strip_suffix(domain)
        .filter(|local| EMAIL_LOCAL_PART.is_match(local))
}

/// Registration email: a college address with a bounded local part.
pub fn validate_registration_email(email: &str, domain: &str) -> Result<(), ValidationError> {
    match local_part(email, domain) {
        Some(local) if local.len() <= MAX_EMAIL_LOCAL_LEN => Ok(()),
        _ => Err(ValidationError::RegistrationEmail {
            domain: domain.to_string(),
        }),
    }
}

/// Teacher login email: any college address.
pub fn validate_teacher_email(email: &str, domain: &str) -> Result<(), ValidationError> {
    match local_part(email, domain) {
        Some(_) => Ok(()),
        None => Err(ValidationError::Email {
            domain: domain.to_string(),
        }),
    }
}

/// Which password requirements are met, one flag per checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordStrength {
    pub uppercase: bool,
    pub lowercase: bool,
    pub number: bool,
    pub symbol: bool,
    pub length: bool,
}

impl PasswordStrength {
    pub fn of(password: &str) -> Self {
        let length = password.chars().count();
        Self {
            uppercase: password.chars().any(|c| c.is_ascii_uppercase()),
            lowercase: password.chars().any(|c| c.is_ascii_lowercase()),
            number: password.chars().any(|c| c.is_ascii_digit()),
            symbol: password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)),
            length: (8..=128).contains(&length),
        }
    }

    pub fn is_strong(&self) -> bool {
        self.uppercase && self.lowercase && self.number && self.symbol && self.length
    }
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if !PasswordStrength::of(password).is_strong() {
        return Err(ValidationError::WeakPassword);
    }
    Ok(())
}

pub fn validate_confirm_password(password: &str, confirm: &str) -> Result<(), ValidationError> {
    if confirm != password || confirm.trim().is_empty() {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

/// Programme length in years for the registration course list.
pub fn course_years(course: &str) -> i32 {
    match course {
        "B.Tech CSE" | "B.Tech IT" => 4,
        "BCA" => 3,
        "MCA" | "MBA" => 2,
        _ => 4,
    }
}

/// A batch `YYYY-YYYY` must span exactly the course's length in years.
pub fn validate_batch_for_course(course: &str, batch: &str) -> Result<(), ValidationError> {
    if course.is_empty() || batch.is_empty() {
        return Err(ValidationError::CourseAndBatchRequired);
    }
    let Some((start, end)) = batch.split_once('-').filter(|(_, end)| !end.contains('-')) else {
        return Err(ValidationError::BatchFormat);
    };
    let (Ok(start), Ok(end)) = (start.trim().parse::<i32>(), end.trim().parse::<i32>()) else {
        return Err(ValidationError::BatchYears);
    };
    let expected = course_years(course);
    if end - start != expected {
        return Err(ValidationError::BatchDuration {
            batch: batch.to_string(),
            course: course.to_string(),
            expected,
        });
    }
    Ok(())
}

/// A filled-in student registration form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationForm {
    pub full_name: String,
    pub email: String,
    pub roll_no: String,
    pub course: String,
    pub batch: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    /// Every failing rule, in form order. Empty means the form can be
    /// submitted.
    pub fn validate(&self, domain: &str) -> Vec<ValidationError> {
        let batch = if self.batch.is_empty() {
            Err(ValidationError::CourseAndBatchRequired)
        } else {
            validate_batch_for_course(&self.course, &self.batch)
        };
        let course = if self.course.is_empty() {
            Err(ValidationError::CourseRequired)
        } else {
            Ok(())
        };

        [
            validate_full_name(&self.full_name),
            validate_registration_email(&self.email, domain),
            validate_registration_roll_no(&self.roll_no),
            course,
            batch,
            validate_password(&self.password),
            validate_confirm_password(&self.password, &self.confirm_password),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect()
    }
}
