//! Task domain model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::attachment::FileAttachment;
use crate::calendar;
use crate::record::{RecordId, collections, impl_record};
use crate::{CoreError, Result};

/// An assignment or to-do tied to a class by the class's title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub task_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_description: Option<String>,
    /// Title of the owning class (a reference by value, not by identity)
    pub class: String,
    #[serde(with = "calendar::deadline")]
    pub deadline: PrimitiveDateTime,
    /// A blank string on the wire means no workload was picked
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "blank_workload"
    )]
    pub workload: Option<Workload>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(flatten)]
    pub file: Option<FileAttachment>,
}

impl_record!(TaskRecord, collections::TASKS);

impl TaskRecord {
    pub fn new(
        task_title: impl Into<String>,
        class: impl Into<String>,
        deadline: PrimitiveDateTime,
    ) -> Self {
        Self {
            id: None,
            task_title: task_title.into(),
            task_description: None,
            class: class.into(),
            deadline,
            workload: None,
            notes: String::new(),
            completed: false,
            created_at: OffsetDateTime::now_utc(),
            file: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.task_description = Some(description.into());
        self
    }

    pub fn with_workload(mut self, workload: Workload) -> Self {
        self.workload = Some(workload);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_attachment(mut self, file: FileAttachment) -> Self {
        self.file = Some(file);
        self
    }

    /// Past its deadline and still pending
    pub fn is_overdue(&self, now: PrimitiveDateTime) -> bool {
        !self.completed && self.deadline < now
    }

    pub fn validate(&self) -> Result<()> {
        if self.task_title.trim().is_empty() {
            return Err(CoreError::MissingField("taskTitle"));
        }
        if self.class.trim().is_empty() {
            return Err(CoreError::MissingField("class"));
        }
        Ok(())
    }
}

/// Expected effort for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Workload {
    Light,
    Moderate,
    Heavy,
    #[serde(rename = "Very Heavy")]
    VeryHeavy,
}

impl Workload {
    pub const ALL: [Workload; 4] = [
        Workload::Light,
        Workload::Moderate,
        Workload::Heavy,
        Workload::VeryHeavy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Workload::Light => "Light",
            Workload::Moderate => "Moderate",
            Workload::Heavy => "Heavy",
            Workload::VeryHeavy => "Very Heavy",
        }
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Workload {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().replace(['-', '_'], " ");
        Workload::ALL
            .into_iter()
            .find(|w| w.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| CoreError::UnknownWorkload(s.to_string()))
    }
}

fn blank_workload<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<Workload>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => {
            raw.parse().map(Some).map_err(serde::de::Error::custom)
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::FileContent;
    use time::macros::datetime;

    fn sample() -> TaskRecord {
        TaskRecord::new("Problem Set 3", "Algebra II", datetime!(2025-03-01 23:59))
    }

    #[test]
    fn test_defaults() {
        let task = sample();
        assert!(!task.completed);
        assert!(task.file.is_none());
        assert!(task.validate().is_ok());
    }

    #[test]
    fn test_wire_round_trip_without_file() {
        let task = sample().with_workload(Workload::VeryHeavy);
        let json = serde_json::to_value(&task).unwrap();

        assert_eq!(json["taskTitle"], "Problem Set 3");
        assert_eq!(json["class"], "Algebra II");
        assert_eq!(json["deadline"], "2025-03-01T23:59");
        assert_eq!(json["workload"], "Very Heavy");
        assert_eq!(json["completed"], false);
        assert!(json.get("fileName").is_none());

        let back: TaskRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn test_flattened_attachment() {
        let task = sample().with_attachment(FileAttachment {
            name: "ps3.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size: 3,
            checksum: None,
            content: FileContent::Inline {
                data: "data:application/pdf;base64,YWJj".to_string(),
            },
        });

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["fileName"], "ps3.pdf");
        assert_eq!(json["fileData"], "data:application/pdf;base64,YWJj");

        let back: TaskRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back.file, task.file);
    }

    #[test]
    fn test_overdue() {
        let mut task = sample();
        assert!(task.is_overdue(datetime!(2025-03-02 00:00)));
        assert!(!task.is_overdue(datetime!(2025-03-01 12:00)));

        task.completed = true;
        assert!(!task.is_overdue(datetime!(2025-03-02 00:00)));
    }

    #[test]
    fn test_workload_parsing() {
        assert_eq!("very heavy".parse::<Workload>().unwrap(), Workload::VeryHeavy);
        assert_eq!("very-heavy".parse::<Workload>().unwrap(), Workload::VeryHeavy);
        assert_eq!("Light".parse::<Workload>().unwrap(), Workload::Light);
        assert!("Crushing".parse::<Workload>().is_err());
    }

    #[test]
    fn test_form_shape_with_blank_workload() {
        let json = serde_json::json!({
            "taskTitle": "Problem Set 3",
            "taskDescription": "",
            "class": "Algebra II",
            "deadline": "2025-03-01T23:59",
            "workload": "",
            "notes": "",
            "completed": false,
            "createdAt": "2025-02-20T10:00:00.000Z"
        });

        let task: TaskRecord = serde_json::from_value(json).unwrap();
        assert_eq!(task.workload, None);
        assert!(task.file.is_none());

        let json = serde_json::json!({
            "taskTitle": "Essay",
            "class": "History",
            "deadline": "2025-03-01T09:00",
            "workload": null,
            "createdAt": "2025-02-20T10:00:00Z"
        });
        let task: TaskRecord = serde_json::from_value(json).unwrap();
        assert_eq!(task.workload, None);
    }

    #[test]
    fn test_unknown_workload_still_rejected() {
        let json = serde_json::json!({
            "taskTitle": "Essay",
            "class": "History",
            "deadline": "2025-03-01T09:00",
            "workload": "Crushing",
            "createdAt": "2025-02-20T10:00:00Z"
        });
        assert!(serde_json::from_value::<TaskRecord>(json).is_err());
    }
}
