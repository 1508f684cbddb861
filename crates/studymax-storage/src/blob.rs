//! Attachment encoding: raw file bytes to a `data:` URI stored on the record

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use studymax_core::{FileAttachment, FileContent};

use crate::{Result, StorageError};

/// Largest file accepted as an attachment (10 MiB)
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

const DEFAULT_MIME: &str = "application/octet-stream";

/// Encodes files into self-contained attachments and decodes them back.
///
/// The size ceiling is checked before any encoding work, so oversized input
/// never reaches a record.
#[derive(Debug, Clone, Copy)]
pub struct AttachmentCodec {
    max_size: u64,
}

/// Decoded attachment bytes, ready to be saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBlob {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl AttachmentCodec {
    pub fn new(max_size: u64) -> Self {
        Self { max_size }
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    pub fn check_size(&self, size: u64) -> Result<()> {
        if size > self.max_size {
            return Err(StorageError::BlobTooLarge {
                size,
                limit: self.max_size,
            });
        }
        Ok(())
    }

    pub fn encode(&self, name: &str, mime_type: &str, bytes: &[u8]) -> Result<FileAttachment> {
        let size = bytes.len() as u64;
        self.check_size(size)?;

        let mime_type = if mime_type.trim().is_empty() {
            DEFAULT_MIME
        } else {
            mime_type.trim()
        };
        let data = format!("data:{};base64,{}", mime_type, BASE64.encode(bytes));

        Ok(FileAttachment {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            size,
            checksum: Some(blake3::hash(bytes).to_hex().to_string()),
            content: FileContent::Inline { data },
        })
    }

    /// Read and encode a file from disk, guessing its type from the extension
    /// when none is given. The size is checked before the file is read.
    pub async fn encode_file(&self, path: &Path, mime_type: Option<&str>) -> Result<FileAttachment> {
        let metadata = tokio::fs::metadata(path).await?;
        self.check_size(metadata.len())?;

        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "attachment".to_string());
        let mime_type = match mime_type {
            Some(mime_type) => mime_type.to_string(),
            None => mime_for_path(path),
        };

        self.encode(&name, &mime_type, &bytes)
    }

    /// Parse a base64 `data:` URI
    pub fn decode(&self, data_uri: &str) -> Result<DecodedBlob> {
        let rest = data_uri
            .strip_prefix("data:")
            .ok_or_else(|| StorageError::Blob("not a data URI".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| StorageError::Blob("data URI has no payload".to_string()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| StorageError::Blob("only base64 data URIs are supported".to_string()))?;

        let bytes = BASE64
            .decode(payload)
            .map_err(|e| StorageError::Blob(format!("bad base64 payload: {e}")))?;

        Ok(DecodedBlob {
            mime_type: if mime_type.is_empty() {
                DEFAULT_MIME.to_string()
            } else {
                mime_type.to_string()
            },
            bytes,
        })
    }

    /// Decode an inline attachment and check it against its recorded size and checksum
    pub fn decode_attachment(&self, file: &FileAttachment) -> Result<DecodedBlob> {
        let data_uri = file.data_uri().ok_or_else(|| {
            StorageError::Blob(format!("'{}' is stored remotely, not inline", file.name))
        })?;
        let blob = self.decode(data_uri)?;

        if blob.bytes.len() as u64 != file.size {
            return Err(StorageError::Blob(format!(
                "'{}' decoded to {} bytes, expected {}",
                file.name,
                blob.bytes.len(),
                file.size
            )));
        }
        if let Some(expected) = &file.checksum {
            let actual = blake3::hash(&blob.bytes).to_hex();
            if actual.as_str() != expected.as_str() {
                return Err(StorageError::Blob(format!("'{}' failed checksum", file.name)));
            }
        }
        Ok(blob)
    }
}

impl Default for AttachmentCodec {
    fn default() -> Self {
        Self::new(MAX_FILE_SIZE)
    }
}

impl DecodedBlob {
    pub async fn write_to(&self, path: &Path) -> Result<()> {
        tokio::fs::write(path, &self.bytes).await?;
        Ok(())
    }
}

/// MIME type guessed from the file extension, `application/octet-stream` if unknown
pub fn mime_for_path(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}
