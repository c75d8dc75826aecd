//! Parsing of JSON log lines, as written by JSON log formatters.
//!
//! A line is one JSON object. `level` and `msg` (or `message`) are required,
//! `time` is optional RFC 3339; every other key becomes payload.

use crate::record::{Level, LogRecord, ParseLevelError};
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LineError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object")]
    NotAnObject,

    #[error("missing or non-string \"{0}\" key")]
    MissingKey(&'static str),

    #[error(transparent)]
    Level(#[from] ParseLevelError),

    #[error("invalid time {0:?}: {1}")]
    Time(String, chrono::ParseError),
}

pub fn parse_line(line: &str) -> Result<LogRecord, LineError> {
    let Value::Object(mut data) = serde_json::from_str::<Value>(line)? else {
        return Err(LineError::NotAnObject);
    };

    let level: Level = match data.remove("level") {
        Some(Value::String(level)) => level.parse()?,
        _ => return Err(LineError::MissingKey("level")),
    };

    let message = match data.remove("msg").or_else(|| data.remove("message")) {
        Some(Value::String(message)) => message,
        _ => return Err(LineError::MissingKey("msg")),
    };

    let time = match data.remove("time") {
        Some(Value::String(time)) => DateTime::parse_from_rfc3339(&time)
            .map_err(|e| LineError::Time(time.clone(), e))?
            .with_timezone(&Utc),
        Some(_) => return Err(LineError::MissingKey("time")),
        None => Utc::now(),
    };

    Ok(LogRecord::new(level, message).with_time(time).with_data(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_parse_line_splits_known_keys_from_payload() {
        let record = parse_line(
            r#"{"level":"error","msg":"disk full","time":"2024-05-01T10:00:00Z","host":"db1","used":97}"#,
        )
        .unwrap();

        assert_eq!(record.level, Level::Error);
        assert_eq!(record.message, "disk full");
        assert_eq!(record.time, Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
        assert_eq!(record.data.len(), 2);
        assert_eq!(record.data["host"], json!("db1"));
        assert_eq!(record.data["used"], json!(97));
    }

    #[test]
    fn test_parse_line_accepts_message_key() {
        let record = parse_line(r#"{"level":"warn","message":"slow"}"#).unwrap();
        assert_eq!(record.level, Level::Warn);
        assert_eq!(record.message, "slow");
        assert!(record.data.is_empty());
    }

    #[test]
    fn test_parse_line_rejects_bad_input() {
        assert!(matches!(parse_line("not json"), Err(LineError::Json(_))));
        assert!(matches!(parse_line("[1]"), Err(LineError::NotAnObject)));
        assert!(matches!(
            parse_line(r#"{"msg":"x"}"#),
            Err(LineError::MissingKey("level"))
        ));
        assert!(matches!(
            parse_line(r#"{"level":"shout","msg":"x"}"#),
            Err(LineError::Level(_))
        ));
        assert!(matches!(
            parse_line(r#"{"level":"info","msg":"x","time":"yesterday"}"#),
            Err(LineError::Time(..))
        ));
    }
}
