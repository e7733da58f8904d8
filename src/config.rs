use std::path::PathBuf;

use clap::Args;

use crate::standing::DEFAULT_THRESHOLD;

pub const DEFAULT_API_BASE: &str = "http://localhost:5014/api";

/// Where the student and the attendance history come from.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Base URL of the attendance backend
    #[arg(long, env = "ATTENDANCE_API_BASE", default_value = DEFAULT_API_BASE, global = true)]
    pub api_base: String,
    /// Bearer token for the backend
    #[arg(long, env = "ATTENDANCE_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,
    /// Read the attendance history from a JSON file instead of the backend
    #[arg(long, requires = "roll_no", global = true)]
    pub records: Option<PathBuf>,
    /// Roll number to aggregate for when reading from a file
    #[arg(long, global = true)]
    pub roll_no: Option<String>,
    /// Minimum acceptable attendance percentage
    #[arg(long, default_value_t = DEFAULT_THRESHOLD, value_parser = parse_threshold, global = true)]
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Api {
        base_url: String,
        token: Option<String>,
    },
    File {
        path: PathBuf,
        roll_no: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub source: Source,
    pub threshold: f64,
}

impl From<SourceArgs> for Config {
    fn from(args: SourceArgs) -> Self {
        let source = match (args.records, args.roll_no) {
            (Some(path), Some(roll_no)) => Source::File { path, roll_no },
            _ => Source::Api {
                base_url: args.api_base,
                token: args.token.filter(|token| !token.is_empty()),
            },
        };
        Self {
            source,
            threshold: args.threshold,
        }
    }
}

fn parse_threshold(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("`{raw}` is not a number"))?;
    if value > 0.0 && value < 100.0 {
        Ok(value)
    } else {
        Err("threshold must be between 0 and 100 (exclusive)".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> SourceArgs {
        SourceArgs {
            api_base: DEFAULT_API_BASE.to_string(),
            token: Some(String::new()),
            records: None,
            roll_no: None,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    #[test]
    fn empty_token_counts_as_missing() {
        let config = Config::from(args());
        assert_eq!(
            config.source,
            Source::Api {
                base_url: DEFAULT_API_BASE.to_string(),
                token: None,
            }
        );
    }

    #[test]
    fn records_file_selects_offline_source() {
        let config = Config::from(SourceArgs {
            records: Some(PathBuf::from("history.json")),
            roll_no: Some("R1".to_string()),
            ..args()
        });
        assert!(matches!(config.source, Source::File { ref roll_no, .. } if roll_no == "R1"));
    }

    #[test]
    fn threshold_must_be_a_percentage() {
        assert_eq!(parse_threshold("80"), Ok(80.0));
        assert!(parse_threshold("0").is_err());
        assert!(parse_threshold("100").is_err());
        assert!(parse_threshold("high").is_err());
    }
}
