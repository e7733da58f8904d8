use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use tracing::instrument;

use crate::models::{AttendanceRecord, Student};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("no bearer token configured")]
    MissingToken,
    #[error("invalid auth header: {0}")]
    InvalidToken(#[from] reqwest::header::InvalidHeaderValue),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} responded with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Client for the attendance backend.
///
/// Every public fetch degrades to an empty value on failure so callers can
/// always aggregate.
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "http client setup failed, requests have no timeout");
                reqwest::Client::new()
            });
        Self {
            base_url: base_url.into(),
            token,
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn auth_headers(&self) -> Result<HeaderMap, ApiError> {
        let token = self.token.as_deref().ok_or(ApiError::MissingToken)?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
        Ok(headers)
    }

    #[instrument(name = "api_get_json", skip(self))]
    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let headers = self.auth_headers()?;
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .headers(headers)
            .send()
            .await
            .map_err(|source| ApiError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { url, status });
        }

        response
            .json::<Value>()
            .await
            .map_err(|source| ApiError::Decode { url, source })
    }

    /// The logged-in student, or `None` if it cannot be loaded.
    pub async fn fetch_student(&self) -> Option<Student> {
        match self.get_json("student/me").await {
            Ok(value @ Value::Object(_)) => match serde_json::from_value(value) {
                Ok(student) => Some(student),
                Err(err) => {
                    tracing::warn!(error = %err, "failed to decode student");
                    None
                }
            },
            Ok(_) => {
                tracing::warn!("student response was not an object");
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to fetch student data");
                None
            }
        }
    }

    /// The attendance history, or an empty list if it cannot be loaded.
    pub async fn fetch_attendance_history(&self) -> Vec<AttendanceRecord> {
        match self.get_json("attendance/history").await {
            Ok(value) => {
                let records = AttendanceRecord::list_from_value(value);
                tracing::debug!(count = records.len(), "fetched attendance history");
                records
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to fetch attendance history");
                Vec::new()
            }
        }
    }

    /// Fetches the student and the history together; both are needed before
    /// aggregation can start.
    pub async fn fetch_profile(&self) -> (Option<Student>, Vec<AttendanceRecord>) {
        tokio::join!(self.fetch_student(), self.fetch_attendance_history())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_paths_onto_base_url() {
        let client = ApiClient::new("http://localhost:5014/api/", None);
        assert_eq!(
            client.url("/student/me"),
            "http://localhost:5014/api/student/me"
        );
        assert_eq!(
            client.url("attendance/history"),
            "http://localhost:5014/api/attendance/history"
        );
    }

    #[test]
    fn missing_token_is_reported_before_any_request() {
        let client = ApiClient::new("http://localhost:5014/api", None);
        assert!(matches!(client.auth_headers(), Err(ApiError::MissingToken)));

        let client = ApiClient::new("http://localhost:5014/api", Some("abc".to_string()));
        let headers = client.auth_headers().unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer abc");
    }

    #[tokio::test]
    async fn fetches_degrade_without_token() {
        let client = ApiClient::new("http://localhost:5014/api", None);
        let (student, records) = client.fetch_profile().await;
        assert!(student.is_none());
        assert!(records.is_empty());
    }
}
