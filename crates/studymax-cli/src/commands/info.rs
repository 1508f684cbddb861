use anyhow::Result;
use studymax_config::Config;
use studymax_storage::{ConnectionManager, ForeignRefPolicy, Location};

use super::format_size;

pub async fn handle(manager: &ConnectionManager, config: &Config) -> Result<()> {
    println!("Config: {}", Config::config_path().display());
    if let Location::File(path) = &manager.request().location {
        println!("Database: {}", path.display());
    }

    let storage = manager.handle().await?;
    println!("Name: {}", storage.name());
    println!("Version: {}", storage.version());
    // Indexes are only rebuilt by an upgrade, so the stored state may lag the config
    let configured = ForeignRefPolicy::from_unique_flag(config.storage.unique_class_reference);
    let stored = storage.class_reference_policy();
    println!("Class references: {}", policy_label(stored));
    if stored != Some(configured) {
        tracing::warn!(
            "storage.unique_class_reference asks for {} class references but the database has {}",
            policy_label(Some(configured)),
            policy_label(stored)
        );
    }
    println!(
        "Attachment limit: {}",
        format_size(config.attachments.max_file_size)
    );

    println!("\nCollections:");
    for name in storage.collection_names() {
        let count = storage.count(name).await?;
        let indexes = storage
            .schema(name)
            .map(|schema| {
                schema
                    .indexes
                    .iter()
                    .map(|index| {
                        if index.unique {
                            format!("{} (unique)", index.name)
                        } else {
                            index.name.clone()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        println!("  {} ({} records)", name, count);
        println!("    Indexes: {}", indexes);
    }

    Ok(())
}

fn policy_label(policy: Option<ForeignRefPolicy>) -> &'static str {
    match policy {
        Some(ForeignRefPolicy::Unique) => "unique",
        Some(ForeignRefPolicy::NonUnique) => "shared",
        None => "mixed or missing",
    }
}
