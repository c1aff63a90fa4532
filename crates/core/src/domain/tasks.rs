use anyhow::{bail, ensure};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Board column for an optimization task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Backlog,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Backlog => "backlog",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }

    /// Column ordering used when listing a board left to right.
    pub fn column_order(&self) -> i32 {
        match self {
            TaskStatus::Backlog => 0,
            TaskStatus::InProgress => 1,
            TaskStatus::Done => 2,
        }
    }
}

impl FromStr for TaskStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backlog" => Ok(TaskStatus::Backlog),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => bail!("unknown task status: {other}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationTask {
    pub id: Uuid,
    pub client_id: Uuid,
    pub title: String,
    pub notes: Option<String>,
    pub status: TaskStatus,
    /// Position within the column, 0-based.
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create-request payload. New tasks always land at the end of Backlog.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewTask {
    pub fn validate(self) -> anyhow::Result<Self> {
        let title = self.title.trim().to_string();
        ensure!(!title.is_empty(), "task title must be non-empty");
        ensure!(
            title.len() <= 200,
            "task title must be at most 200 characters (got {})",
            title.len()
        );

        let notes = self
            .notes
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Self { title, notes })
    }
}

/// Move-request payload: change column, position within a column, or both.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskMove {
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub position: Option<i32>,
}

impl TaskMove {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.status.is_some() || self.position.is_some(),
            "task move must change status or position"
        );
        if let Some(pos) = self.position {
            ensure!(pos >= 0, "task position must be >= 0 (got {pos})");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_trims_and_requires_title() {
        let ok = NewTask {
            title: "  Pause losing ad sets  ".to_string(),
            notes: Some("   ".to_string()),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.title, "Pause losing ad sets");
        assert_eq!(ok.notes, None);

        let err = NewTask {
            title: "   ".to_string(),
            notes: None,
        }
        .validate();
        assert!(err.is_err());
    }

    #[test]
    fn task_move_must_change_something() {
        let noop = TaskMove {
            status: None,
            position: None,
        };
        assert!(noop.validate().is_err());

        let reposition = TaskMove {
            status: None,
            position: Some(2),
        };
        assert!(reposition.validate().is_ok());

        let negative = TaskMove {
            status: Some(TaskStatus::Done),
            position: Some(-1),
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn status_round_trips_through_str() {
        for s in [TaskStatus::Backlog, TaskStatus::InProgress, TaskStatus::Done] {
            assert_eq!(s.as_str().parse::<TaskStatus>().unwrap(), s);
        }
    }
}
