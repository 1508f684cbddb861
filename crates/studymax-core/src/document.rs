//! Document domain model

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::attachment::{FileAttachment, FileContent};
use crate::record::{RecordId, collections, impl_record};
use crate::{CoreError, Result};

/// A file uploaded against a class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub document_title: String,
    /// MIME type of the content
    pub document_type: String,
    #[serde(with = "time::serde::rfc3339")]
    pub upload_date: OffsetDateTime,
    /// Title of the owning class (a reference by value, not by identity)
    pub class: String,
    pub file_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_checksum: Option<String>,
    #[serde(flatten)]
    pub content: FileContent,
}

impl_record!(DocumentRecord, collections::DOCUMENTS);

impl DocumentRecord {
    /// Build a document from an encoded attachment, filed under `class`
    pub fn from_attachment(file: FileAttachment, class: impl Into<String>) -> Self {
        Self {
            id: None,
            document_title: file.name,
            document_type: file.mime_type,
            upload_date: OffsetDateTime::now_utc(),
            class: class.into(),
            file_size: file.size,
            file_checksum: file.checksum,
            content: file.content,
        }
    }

    /// View the document's content as an attachment for decoding
    pub fn attachment(&self) -> FileAttachment {
        FileAttachment {
            name: self.document_title.clone(),
            mime_type: self.document_type.clone(),
            size: self.file_size,
            checksum: self.file_checksum.clone(),
            content: self.content.clone(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.document_title.trim().is_empty() {
            return Err(CoreError::MissingField("documentTitle"));
        }
        if self.class.trim().is_empty() {
            return Err(CoreError::MissingField("class"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_conversion() {
        let file = FileAttachment {
            name: "syllabus.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size: 4,
            checksum: Some("abcd".to_string()),
            content: FileContent::Inline {
                data: "data:application/pdf;base64,AAAAAA==".to_string(),
            },
        };

        let doc = DocumentRecord::from_attachment(file.clone(), "Biology");
        assert_eq!(doc.document_title, "syllabus.pdf");
        assert_eq!(doc.class, "Biology");
        assert_eq!(doc.attachment(), file);

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["documentType"], "application/pdf");
        assert_eq!(json["fileData"], "data:application/pdf;base64,AAAAAA==");
        assert!(json["uploadDate"].is_string());
    }
}
