use std::path::PathBuf;

use anyhow::Result;
use studymax_config::Config;
use studymax_core::DocumentRecord;
use studymax_storage::{AttachmentCodec, ConnectionManager, ErrorKind};

use super::{attachment_codec, format_size};
use crate::cli::DocumentCommands;

pub async fn handle(
    cmd: DocumentCommands,
    manager: &ConnectionManager,
    config: &Config,
) -> Result<()> {
    let codec = attachment_codec(config);
    match cmd {
        DocumentCommands::Add {
            path,
            class,
            title,
            mime,
        } => add(manager, &codec, path, class, title, mime).await,
        DocumentCommands::List { class } => list(manager, class).await,
        DocumentCommands::Download { id, output } => download(manager, &codec, id, output).await,
        DocumentCommands::Remove { id } => remove(manager, id).await,
    }
}

async fn add(
    manager: &ConnectionManager,
    codec: &AttachmentCodec,
    path: PathBuf,
    class: String,
    title: Option<String>,
    mime: Option<String>,
) -> Result<()> {
    // Encoding checks the size limit before anything is written
    let file = codec.encode_file(&path, mime.as_deref()).await?;

    let mut document = DocumentRecord::from_attachment(file, class);
    if let Some(title) = title {
        document.document_title = title;
    }
    document.validate()?;

    let storage = manager.handle().await?;
    let id = match storage.insert_record(&document).await {
        Ok(id) => id,
        Err(err) if err.kind() == ErrorKind::Constraint => anyhow::bail!(
            "Class '{}' already has a document and storage.unique_class_reference is enabled",
            document.class
        ),
        Err(err) => return Err(err.into()),
    };

    println!("✓ Uploaded document: {}", document.document_title);
    println!("  ID: {}", id);
    println!("  Type: {}", document.document_type);
    println!("  Size: {}", format_size(document.file_size));
    Ok(())
}

async fn list(manager: &ConnectionManager, class: Option<String>) -> Result<()> {
    let storage = manager.handle().await?;
    let documents: Vec<DocumentRecord> = match &class {
        Some(class) => {
            storage
                .find_records(|doc: &DocumentRecord| &doc.class == class)
                .await?
        }
        None => storage.all_records().await?,
    };

    if documents.is_empty() {
        println!("No documents found.");
        return Ok(());
    }

    println!("Documents:");
    for doc in documents {
        println!(
            "  [{}] {} ({})",
            doc.id.unwrap_or_default(),
            doc.document_title,
            doc.class
        );
        println!(
            "    {} · {} · uploaded {}",
            doc.document_type,
            format_size(doc.file_size),
            doc.upload_date.date()
        );
    }

    Ok(())
}

async fn download(
    manager: &ConnectionManager,
    codec: &AttachmentCodec,
    id: i64,
    output: Option<PathBuf>,
) -> Result<()> {
    let storage = manager.handle().await?;
    let Some(document) = storage.get_record::<DocumentRecord>(id).await? else {
        anyhow::bail!("No document with ID {}", id);
    };

    let blob = codec.decode_attachment(&document.attachment())?;
    let target = output.unwrap_or_else(|| PathBuf::from(&document.document_title));
    blob.write_to(&target).await?;

    println!("✓ Saved {} to {}", document.document_title, target.display());
    Ok(())
}

async fn remove(manager: &ConnectionManager, id: i64) -> Result<()> {
    let storage = manager.handle().await?;
    let Some(document) = storage.get_record::<DocumentRecord>(id).await? else {
        anyhow::bail!("No document with ID {}", id);
    };

    storage.remove_record::<DocumentRecord>(id).await?;
    println!("✓ Removed document: {}", document.document_title);
    Ok(())
}
