//! Row shapes used by the hosted backend and their mapping to local records
//!
//! The hosted tables use snake_case columns and carry an owning `user_id`;
//! local records use camelCase. Conversions live here so callers only ever
//! see one canonical record shape.

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::attachment::{FileAttachment, FileContent};
use crate::calendar::{self, Day};
use crate::class::ClassRecord;
use crate::document::DocumentRecord;
use crate::record::RecordId;
use crate::task::{TaskRecord, Workload};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub user_id: Option<String>,
    pub course_title: String,
    #[serde(default)]
    pub course_description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub days: Vec<Day>,
    #[serde(default)]
    pub time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub user_id: Option<String>,
    pub task_title: String,
    #[serde(default)]
    pub task_description: Option<String>,
    pub class: String,
    #[serde(with = "calendar::deadline")]
    pub deadline: PrimitiveDateTime,
    #[serde(default)]
    pub workload: Option<Workload>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub user_id: Option<String>,
    pub document_title: String,
    pub document_type: String,
    pub class: String,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

impl From<ClassRow> for ClassRecord {
    fn from(row: ClassRow) -> Self {
        Self {
            id: row.id,
            course_title: row.course_title,
            course_description: row.course_description,
            days: row.days,
            time: row.time,
            color: row.color,
            user_id: row.user_id,
        }
    }
}

impl From<ClassRecord> for ClassRow {
    fn from(record: ClassRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            course_title: record.course_title,
            course_description: record.course_description,
            color: record.color,
            days: record.days,
            time: record.time,
        }
    }
}

impl From<TaskRow> for TaskRecord {
    fn from(row: TaskRow) -> Self {
        let file = match (row.file_name, row.file_path) {
            (Some(name), Some(path)) => Some(FileAttachment {
                name,
                mime_type: row.file_type.unwrap_or_default(),
                size: row.file_size.unwrap_or_default(),
                checksum: None,
                content: FileContent::Stored {
                    path,
                    url: row.file_url,
                },
            }),
            _ => None,
        };

        Self {
            id: row.id,
            task_title: row.task_title,
            task_description: row.task_description,
            class: row.class,
            deadline: row.deadline,
            workload: row.workload,
            notes: row.notes.unwrap_or_default(),
            completed: row.completed,
            created_at: row.created_at.unwrap_or_else(OffsetDateTime::now_utc),
            file,
        }
    }
}

/// Inline attachments keep their metadata but have no hosted path until uploaded
impl From<TaskRecord> for TaskRow {
    fn from(record: TaskRecord) -> Self {
        let (file_name, file_type, file_size, file_path, file_url) = match record.file {
            Some(file) => {
                let (path, url) = match file.content {
                    FileContent::Stored { path, url } => (Some(path), url),
                    FileContent::Inline { .. } => (None, None),
                };
                (Some(file.name), Some(file.mime_type), Some(file.size), path, url)
            }
            None => (None, None, None, None, None),
        };

        Self {
            id: record.id,
            user_id: None,
            task_title: record.task_title,
            task_description: record.task_description,
            class: record.class,
            deadline: record.deadline,
            workload: record.workload,
            notes: Some(record.notes).filter(|notes| !notes.is_empty()),
            completed: record.completed,
            created_at: Some(record.created_at),
            file_path,
            file_url,
            file_name,
            file_type,
            file_size,
        }
    }
}

impl From<DocumentRow> for DocumentRecord {
    fn from(row: DocumentRow) -> Self {
        Self {
            id: row.id,
            document_title: row.document_title,
            document_type: row.document_type,
            upload_date: row.created_at.unwrap_or_else(OffsetDateTime::now_utc),
            class: row.class,
            file_size: row.file_size,
            file_checksum: None,
            content: FileContent::Stored {
                path: row.file_path.unwrap_or_default(),
                url: row.file_url,
            },
        }
    }
}

impl From<DocumentRecord> for DocumentRow {
    fn from(record: DocumentRecord) -> Self {
        let (file_path, file_url) = match record.content {
            FileContent::Stored { path, url } => (Some(path), url),
            FileContent::Inline { .. } => (None, None),
        };

        Self {
            id: record.id,
            user_id: None,
            document_title: record.document_title,
            document_type: record.document_type,
            class: record.class,
            file_path,
            file_url,
            file_size: record.file_size,
            created_at: Some(record.upload_date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_class_row_uses_snake_case() {
        let row: ClassRow = serde_json::from_value(serde_json::json!({
            "id": 7,
            "user_id": "u-1",
            "course_title": "Chemistry",
            "days": ["Tuesday", "Thursday"],
            "time": "10:30",
            "created_at": "2025-01-10T08:00:00Z"
        }))
        .unwrap();

        let record = ClassRecord::from(row.clone());
        assert_eq!(record.id, Some(7));
        assert_eq!(record.course_title, "Chemistry");
        assert_eq!(record.days, vec![Day::Tuesday, Day::Thursday]);
        assert_eq!(ClassRow::from(record), row);
    }

    #[test]
    fn test_task_row_file_pointer() {
        let row: TaskRow = serde_json::from_value(serde_json::json!({
            "task_title": "Lab report",
            "class": "Chemistry",
            "deadline": "2025-04-02T17:00",
            "completed": true,
            "file_name": "lab.docx",
            "file_type": "application/msword",
            "file_size": 2048,
            "file_path": "u-1/tasks/lab.docx",
            "file_url": "https://example.invalid/lab.docx"
        }))
        .unwrap();

        let record = TaskRecord::from(row);
        assert_eq!(record.task_title, "Lab report");
        assert_eq!(record.deadline, datetime!(2025-04-02 17:00));
        assert!(record.completed);

        let file = record.file.as_ref().unwrap();
        assert_eq!(file.size, 2048);
        assert!(!file.is_inline());

        let back = TaskRow::from(record);
        assert_eq!(back.file_path.as_deref(), Some("u-1/tasks/lab.docx"));
        assert_eq!(back.notes, None);
    }

    #[test]
    fn test_inline_document_has_no_hosted_path() {
        let record = DocumentRecord {
            id: Some(3),
            document_title: "notes.txt".to_string(),
            document_type: "text/plain".to_string(),
            upload_date: datetime!(2025-02-01 12:00 UTC),
            class: "History".to_string(),
            file_size: 2,
            file_checksum: None,
            content: FileContent::Inline {
                data: "data:text/plain;base64,aGk=".to_string(),
            },
        };

        let row = DocumentRow::from(record);
        assert_eq!(row.file_path, None);
        assert_eq!(row.created_at, Some(datetime!(2025-02-01 12:00 UTC)));
    }
}
