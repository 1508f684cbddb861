pub mod class;
pub mod document;
pub mod info;
pub mod task;

use std::path::PathBuf;

use studymax_config::Config;
use studymax_storage::{
    AttachmentCodec, ConnectionManager, ForeignRefPolicy, OpenRequest, default_database_path,
};
use time::{OffsetDateTime, PrimitiveDateTime};

/// Database file in effect: command-line override, then config, then the platform default
pub fn database_path(config: &Config, db_override: Option<PathBuf>) -> PathBuf {
    db_override
        .or_else(|| config.storage.path.clone())
        .unwrap_or_else(default_database_path)
}

pub fn connection_manager(config: &Config, db_override: Option<PathBuf>) -> ConnectionManager {
    let request = OpenRequest::file(
        config.storage.name.clone(),
        config.storage.version,
        database_path(config, db_override),
    );
    ConnectionManager::studymax(
        request,
        ForeignRefPolicy::from_unique_flag(config.storage.unique_class_reference),
    )
}

pub fn attachment_codec(config: &Config) -> AttachmentCodec {
    AttachmentCodec::new(config.attachments.max_file_size)
}

/// Wall-clock time without offset, comparable with stored deadlines
pub fn local_now() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    PrimitiveDateTime::new(now.date(), now.time())
}

/// Human-readable byte count
pub fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let bytes_f = bytes as f64;
    if bytes_f >= KIB * KIB {
        format!("{:.1} MB", bytes_f / (KIB * KIB))
    } else if bytes_f >= KIB {
        format!("{:.1} KB", bytes_f / KIB)
    } else {
        format!("{bytes} B")
    }
}
