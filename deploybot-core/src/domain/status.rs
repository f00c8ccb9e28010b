//! Status enums for pipelines and tasks
//!
//! Both enums are closed: the wire representation is the variant name and
//! anything else is rejected when parsing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    InProgress,
    Done,
    Failed,
    Canceled,
}

impl TaskStatus {
    /// Done, Failed and Canceled stop the task clock.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Done | TaskStatus::Failed | TaskStatus::Canceled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "InProgress",
            TaskStatus::Done => "Done",
            TaskStatus::Failed => "Failed",
            TaskStatus::Canceled => "Canceled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(TaskStatus::Pending),
            "InProgress" => Ok(TaskStatus::InProgress),
            "Done" => Ok(TaskStatus::Done),
            "Failed" => Ok(TaskStatus::Failed),
            "Canceled" => Ok(TaskStatus::Canceled),
            other => Err(ParseStatusError::new("task", other)),
        }
    }
}

/// Aggregate pipeline status
///
/// A coarse "is anything currently executing" flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineStatus {
    Idle,
    Busy,
}

impl PipelineStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStatus::Idle => "Idle",
            PipelineStatus::Busy => "Busy",
        }
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Idle" => Ok(PipelineStatus::Idle),
            "Busy" => Ok(PipelineStatus::Busy),
            other => Err(ParseStatusError::new("pipeline", other)),
        }
    }
}

/// How the lifecycle timestamps move alongside a status write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockStamp {
    /// executedAt = now, stoppedAt cleared
    Started,
    /// stoppedAt = now
    Stopped,
    /// Timestamps untouched
    Unchanged,
}

impl ClockStamp {
    pub fn for_task(status: TaskStatus) -> Self {
        match status {
            TaskStatus::InProgress => ClockStamp::Started,
            TaskStatus::Done | TaskStatus::Failed | TaskStatus::Canceled => ClockStamp::Stopped,
            TaskStatus::Pending => ClockStamp::Unchanged,
        }
    }

    pub fn for_pipeline(status: PipelineStatus) -> Self {
        match status {
            PipelineStatus::Busy => ClockStamp::Started,
            PipelineStatus::Idle => ClockStamp::Stopped,
        }
    }
}

/// Returned when a status string is not one of the known variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
}

impl ParseStatusError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} status: '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParseStatusError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_parses_wire_names() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::InProgress,
            TaskStatus::Done,
            TaskStatus::Failed,
            TaskStatus::Canceled,
        ] {
            assert_eq!(status.as_str().parse::<TaskStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_task_status_rejects_unknown() {
        let err = "Running".parse::<TaskStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid task status: 'Running'");
        assert!("done".parse::<TaskStatus>().is_err());
        assert!("".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_pipeline_status_parsing() {
        assert_eq!("Idle".parse::<PipelineStatus>(), Ok(PipelineStatus::Idle));
        assert_eq!("Busy".parse::<PipelineStatus>(), Ok(PipelineStatus::Busy));
        assert!("Running".parse::<PipelineStatus>().is_err());
    }

    #[test]
    fn test_serde_matches_display() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"InProgress\"");
        let json = serde_json::to_string(&PipelineStatus::Idle).unwrap();
        assert_eq!(json, "\"Idle\"");
    }

    #[test]
    fn test_clock_stamp_for_task() {
        assert_eq!(
            ClockStamp::for_task(TaskStatus::InProgress),
            ClockStamp::Started
        );
        assert_eq!(ClockStamp::for_task(TaskStatus::Done), ClockStamp::Stopped);
        assert_eq!(ClockStamp::for_task(TaskStatus::Failed), ClockStamp::Stopped);
        assert_eq!(
            ClockStamp::for_task(TaskStatus::Canceled),
            ClockStamp::Stopped
        );
        assert_eq!(
            ClockStamp::for_task(TaskStatus::Pending),
            ClockStamp::Unchanged
        );
    }

    #[test]
    fn test_clock_stamp_for_pipeline() {
        assert_eq!(
            ClockStamp::for_pipeline(PipelineStatus::Busy),
            ClockStamp::Started
        );
        assert_eq!(
            ClockStamp::for_pipeline(PipelineStatus::Idle),
            ClockStamp::Stopped
        );
    }

    #[test]
    fn test_is_terminal() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::InProgress.is_terminal());
        assert!(TaskStatus::Done.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Canceled.is_terminal());
    }
}
