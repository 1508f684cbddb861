use serde::{Deserialize, Serialize};

/// File metadata carried on a task, flattened into the task's fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAttachment {
    #[serde(rename = "fileName")]
    pub name: String,
    #[serde(rename = "fileType")]
    pub mime_type: String,
    #[serde(rename = "fileSize")]
    pub size: u64,
    /// BLAKE3 hex digest of the raw bytes, present for inline content
    #[serde(rename = "fileChecksum", default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(flatten)]
    pub content: FileContent,
}

/// Where the bytes of an attachment live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileContent {
    /// Self-contained `data:` URI stored in the record itself
    Inline {
        #[serde(rename = "fileData")]
        data: String,
    },
    /// Pointer into hosted object storage
    Stored {
        #[serde(rename = "filePath")]
        path: String,
        #[serde(rename = "fileUrl", default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
}

impl FileAttachment {
    pub fn is_inline(&self) -> bool {
        matches!(self.content, FileContent::Inline { .. })
    }

    /// Inline data URI, if the bytes are stored locally
    pub fn data_uri(&self) -> Option<&str> {
        match &self.content {
            FileContent::Inline { data } => Some(data),
            FileContent::Stored { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_wire_shape() {
        let attachment = FileAttachment {
            name: "notes.txt".to_string(),
            mime_type: "text/plain".to_string(),
            size: 2,
            checksum: None,
            content: FileContent::Inline {
                data: "data:text/plain;base64,aGk=".to_string(),
            },
        };

        let json = serde_json::to_value(&attachment).unwrap();
        assert_eq!(json["fileName"], "notes.txt");
        assert_eq!(json["fileData"], "data:text/plain;base64,aGk=");
        assert!(json.get("fileChecksum").is_none());
    }

    #[test]
    fn test_stored_pointer_parses() {
        let json = serde_json::json!({
            "fileName": "essay.pdf",
            "fileType": "application/pdf",
            "fileSize": 1024,
            "filePath": "user/tasks/essay.pdf",
            "fileUrl": "https://example.invalid/essay.pdf"
        });

        let attachment: FileAttachment = serde_json::from_value(json).unwrap();
        assert!(!attachment.is_inline());
        assert_eq!(attachment.data_uri(), None);
    }
}
