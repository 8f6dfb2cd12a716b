//! Job lifecycle state and progress events.
//!
//! A job moves `Running -> Completed` or `Running -> Failed`; terminal
//! states are final. Progress is an ordered, append-only log of
//! structured events. Consumers detect completion via
//! [`ProgressEvent::is_terminal`], never by matching message text.

use serde::{Deserialize, Serialize};

/// Terminal-or-running state of a batch job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Running)
    }
}

/// Outcome of processing one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ImageOutcome {
    /// Date resolved (or the sentinel); `label` is the group it joined.
    Assigned { label: String },
    /// The image could not be read; it was routed to the unknown group.
    Error { reason: String },
}

/// One record of a job's progress log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Job started; emitted once, first.
    Started { total_images: usize },
    /// One image finished, with its position and outcome.
    ImageProcessed {
        name: String,
        index: usize,
        total: usize,
        fraction: f32,
        outcome: ImageOutcome,
    },
    /// All images grouped; document assembly began.
    GeneratingDocument { group_count: usize },
    /// Terminal: document written; `artifact` is the download filename.
    Completed { artifact: String },
    /// Terminal: document assembly or persistence failed.
    Failed { reason: String },
}

impl ProgressEvent {
    /// Structured terminal tag; closes the progress stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::Completed { .. } | ProgressEvent::Failed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_tags() {
        assert!(ProgressEvent::Completed {
            artifact: "a.docx".into()
        }
        .is_terminal());
        assert!(ProgressEvent::Failed {
            reason: "disk full".into()
        }
        .is_terminal());
        assert!(!ProgressEvent::Started { total_images: 3 }.is_terminal());
        assert!(!ProgressEvent::GeneratingDocument { group_count: 1 }.is_terminal());
    }

    #[test]
    fn events_serialize_with_tag() {
        let ev = ProgressEvent::ImageProcessed {
            name: "r1.png".into(),
            index: 1,
            total: 4,
            fraction: 0.25,
            outcome: ImageOutcome::Assigned {
                label: "June 10, 2024".into(),
            },
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "image_processed");
        assert_eq!(json["outcome"]["result"], "assigned");
        assert_eq!(json["outcome"]["label"], "June 10, 2024");
    }

    #[test]
    fn state_terminality() {
        assert!(!JobState::Running.is_terminal());
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
    }
}
