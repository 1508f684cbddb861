use anyhow::Result;
use studymax_core::agenda::{classes_on, tasks_for_class};
use studymax_core::{ClassRecord, DocumentRecord, TaskRecord};
use studymax_storage::{ConnectionManager, ErrorKind};

use crate::cli::ClassCommands;

pub async fn handle(cmd: ClassCommands, manager: &ConnectionManager) -> Result<()> {
    match cmd {
        ClassCommands::Add {
            title,
            description,
            days,
            time,
            color,
        } => {
            let mut class = ClassRecord::new(title).with_days(days);
            class.course_description = description;
            class.time = time;
            class.color = color;
            add(manager, class).await
        }
        ClassCommands::List { day } => list(manager, day).await,
        ClassCommands::Remove { id, cascade } => remove(manager, id, cascade).await,
    }
}

async fn add(manager: &ConnectionManager, class: ClassRecord) -> Result<()> {
    class.validate()?;
    let storage = manager.handle().await?;

    let id = match storage.insert_record(&class).await {
        Ok(id) => id,
        Err(err) if err.kind() == ErrorKind::Constraint => {
            anyhow::bail!("A class named '{}' already exists", class.course_title)
        }
        Err(err) => return Err(err.into()),
    };

    println!("✓ Added class: {}", class.course_title);
    println!("  ID: {}", id);
    Ok(())
}

async fn list(manager: &ConnectionManager, day: Option<studymax_core::Day>) -> Result<()> {
    let storage = manager.handle().await?;
    let classes: Vec<ClassRecord> = storage.all_records().await?;
    let selected: Vec<&ClassRecord> = match day {
        Some(day) => classes_on(&classes, day),
        None => classes.iter().collect(),
    };

    if selected.is_empty() {
        println!("No classes found.");
        return Ok(());
    }

    println!("Classes:");
    for class in selected {
        println!(
            "  [{}] {}",
            class.id.unwrap_or_default(),
            class.course_title
        );
        if !class.days.is_empty() || class.time.is_some() {
            let days: Vec<&str> = class.days.iter().map(|d| d.as_str()).collect();
            println!(
                "    Meets: {} {}",
                days.join(", "),
                class.time.as_deref().unwrap_or("")
            );
        }
        if let Some(description) = &class.course_description {
            println!("    {}", description);
        }
    }

    Ok(())
}

async fn remove(manager: &ConnectionManager, id: i64, cascade: bool) -> Result<()> {
    let storage = manager.handle().await?;
    let Some(class) = storage.get_record::<ClassRecord>(id).await? else {
        anyhow::bail!("No class with ID {}", id);
    };

    let tasks: Vec<TaskRecord> = storage.all_records().await?;
    let owned_tasks = tasks_for_class(&tasks, &class.course_title);
    let documents: Vec<DocumentRecord> = storage
        .find_records(|doc: &DocumentRecord| doc.class == class.course_title)
        .await?;

    if cascade {
        for task in &owned_tasks {
            if let Some(task_id) = task.id {
                storage.remove_record::<TaskRecord>(task_id).await?;
            }
        }
        for doc in &documents {
            if let Some(doc_id) = doc.id {
                storage.remove_record::<DocumentRecord>(doc_id).await?;
            }
        }
    }

    storage.remove_record::<ClassRecord>(id).await?;
    println!("✓ Removed class: {}", class.course_title);

    if cascade {
        println!(
            "  Also removed {} tasks and {} documents",
            owned_tasks.len(),
            documents.len()
        );
    } else if !owned_tasks.is_empty() || !documents.is_empty() {
        println!(
            "  {} tasks and {} documents still name this class (use --cascade to remove them)",
            owned_tasks.len(),
            documents.len()
        );
    }

    Ok(())
}
