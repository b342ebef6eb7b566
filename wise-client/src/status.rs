//! Job status messages the Builder publishes on its broker.
//!
//! Only decoding lives here; subscribing is left to whatever MQTT client
//! the application already runs. Topics look like
//! `{topic}/{sender}/{job}/status`.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Status codes carried in the `status` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Submitted,
    Started,
    ScenarioStarted,
    ScenarioCompleted,
    ScenarioFailed,
    Complete,
    Failed,
    Error,
    Information,
    ShutdownRequested,
    Unknown(u8),
}

impl From<u8> for StatusCode {
    fn from(code: u8) -> Self {
        match code {
            0 => StatusCode::Submitted,
            1 => StatusCode::Started,
            2 => StatusCode::ScenarioStarted,
            3 => StatusCode::ScenarioCompleted,
            4 => StatusCode::ScenarioFailed,
            5 => StatusCode::Complete,
            6 => StatusCode::Failed,
            7 => StatusCode::Error,
            8 => StatusCode::Information,
            9 => StatusCode::ShutdownRequested,
            other => StatusCode::Unknown(other),
        }
    }
}

/// Payload as published.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusPayload {
    pub status: u8,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub stats: Option<Map<String, Value>>,
    #[serde(default)]
    pub time: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Complete {
        job: String,
    },
    ScenarioFailed {
        job: String,
        reason: String,
    },
    /// Per-timestep statistics while a scenario runs.
    TimestepStats {
        job: String,
        time: Option<String>,
        stats: Map<String, Value>,
    },
    Status {
        job: String,
        code: StatusCode,
        message: String,
    },
}

const ERROR_PREFIX: &str = "Error:";

impl JobEvent {
    pub fn from_payload(job: &str, payload: StatusPayload) -> JobEvent {
        let job = job.to_string();
        match StatusCode::from(payload.status) {
            StatusCode::Complete => JobEvent::Complete { job },
            StatusCode::ScenarioFailed => {
                let reason = match payload.message.find(ERROR_PREFIX) {
                    Some(at) => payload.message[at + ERROR_PREFIX.len()..].trim().to_string(),
                    None => payload.message,
                };
                JobEvent::ScenarioFailed { job, reason }
            }
            code => match payload.stats {
                Some(stats) if !stats.is_empty() => JobEvent::TimestepStats {
                    job,
                    time: payload.time,
                    stats,
                },
                _ => JobEvent::Status {
                    job,
                    code,
                    message: payload.message,
                },
            },
        }
    }

    pub fn job(&self) -> &str {
        match self {
            JobEvent::Complete { job }
            | JobEvent::ScenarioFailed { job, .. }
            | JobEvent::TimestepStats { job, .. }
            | JobEvent::Status { job, .. } => job,
        }
    }
}

/// Decode a raw broker message for `job`.
pub fn decode(job: &str, payload: &[u8]) -> serde_json::Result<JobEvent> {
    let payload: StatusPayload = serde_json::from_slice(payload)?;
    Ok(JobEvent::from_payload(job, payload))
}

/// Subscription filter for a job's status messages from any sender.
pub fn status_topic(topic: &str, job: &str) -> String {
    format!("{topic}/+/{job}/status")
}

/// Subscription filter for a job's validation messages.
pub fn validate_topic(topic: &str, job: &str) -> String {
    format!("{topic}/+/{job}/validate")
}

/// Job name segment of a concrete topic.
pub fn job_from_topic(topic: &str) -> Option<&str> {
    topic.split('/').nth(2).filter(|job| !job.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topics() {
        assert_eq!(status_topic("wise", "job_1"), "wise/+/job_1/status");
        assert_eq!(validate_topic("wise", "job_1"), "wise/+/job_1/validate");
        assert_eq!(job_from_topic("wise/builder/job_1/status"), Some("job_1"));
        assert_eq!(job_from_topic("wise"), None);
    }

    #[test]
    fn test_complete() {
        let event = decode("job_1", br#"{"status": 5, "message": "done"}"#).unwrap();
        assert_eq!(
            event,
            JobEvent::Complete {
                job: "job_1".into()
            }
        );
    }

    #[test]
    fn test_scenario_failed_reason() {
        let event = decode(
            "job_1",
            br#"{"status": 4, "message": "scen0 Error: no primary weather stream"}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            JobEvent::ScenarioFailed {
                job: "job_1".into(),
                reason: "no primary weather stream".into(),
            }
        );
        let plain = decode("job_1", br#"{"status": 4, "message": "out of memory"}"#).unwrap();
        assert!(matches!(plain, JobEvent::ScenarioFailed { reason, .. } if reason == "out of memory"));
    }

    #[test]
    fn test_timestep_stats() {
        let event = decode(
            "job_1",
            br#"{"status": 8, "message": "", "time": "2019-01-01T14:00:00", "stats": {"area": 12.5}}"#,
        )
        .unwrap();
        match event {
            JobEvent::TimestepStats { time, stats, .. } => {
                assert_eq!(time.as_deref(), Some("2019-01-01T14:00:00"));
                assert_eq!(stats.get("area"), Some(&Value::from(12.5)));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_plain_status() {
        let event = decode("job_1", br#"{"status": 1, "message": "started", "stats": {}}"#).unwrap();
        assert_eq!(
            event,
            JobEvent::Status {
                job: "job_1".into(),
                code: StatusCode::Started,
                message: "started".into(),
            }
        );
        assert_eq!(event.job(), "job_1");
        assert!(decode("job_1", b"not json").is_err());
    }
}
