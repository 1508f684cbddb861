use anyhow::Result;
use studymax_config::Config;
use studymax_core::agenda::agenda;
use studymax_core::calendar::{format_deadline, parse_deadline};
use studymax_core::{ClassRecord, TaskFilter, TaskRecord};
use studymax_storage::{ConnectionManager, ErrorKind};

use super::{attachment_codec, format_size, local_now};
use crate::cli::TaskCommands;

pub async fn handle(cmd: TaskCommands, manager: &ConnectionManager, config: &Config) -> Result<()> {
    match cmd {
        TaskCommands::Add {
            title,
            class,
            deadline,
            description,
            workload,
            notes,
            file,
        } => {
            let mut task = TaskRecord::new(title, class, parse_deadline(&deadline)?);
            task.task_description = description;
            task.workload = workload;
            task.notes = notes.unwrap_or_default();
            if let Some(path) = file {
                let attachment = attachment_codec(config).encode_file(&path, None).await?;
                task = task.with_attachment(attachment);
            }
            add(manager, task).await
        }
        TaskCommands::List { status, class } => list(manager, status.into(), class).await,
        TaskCommands::Complete { id, undo } => complete(manager, id, !undo).await,
        TaskCommands::Remove { id } => remove(manager, id).await,
    }
}

async fn add(manager: &ConnectionManager, task: TaskRecord) -> Result<()> {
    task.validate()?;
    let storage = manager.handle().await?;

    let classes: Vec<ClassRecord> = storage
        .find_records(|class: &ClassRecord| class.course_title == task.class)
        .await?;
    if classes.is_empty() {
        tracing::warn!("No class named '{}' exists yet", task.class);
    }

    let id = match storage.insert_record(&task).await {
        Ok(id) => id,
        Err(err) if err.kind() == ErrorKind::Constraint => anyhow::bail!(
            "Class '{}' already has a task and storage.unique_class_reference is enabled",
            task.class
        ),
        Err(err) => return Err(err.into()),
    };

    println!("✓ Added task: {}", task.task_title);
    println!("  ID: {}", id);
    println!("  Class: {}", task.class);
    println!("  Deadline: {}", format_deadline(&task.deadline));
    if let Some(file) = &task.file {
        println!("  Attachment: {} ({})", file.name, format_size(file.size));
    }
    Ok(())
}

async fn list(manager: &ConnectionManager, filter: TaskFilter, class: Option<String>) -> Result<()> {
    let storage = manager.handle().await?;
    let mut tasks: Vec<TaskRecord> = storage.all_records().await?;
    if let Some(class) = &class {
        tasks.retain(|task| &task.class == class);
    }

    let selected = agenda(&tasks, filter);
    if selected.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    let now = local_now();
    println!("Tasks:");
    for task in selected {
        let mark = if task.completed {
            "✓"
        } else if task.is_overdue(now) {
            "!"
        } else {
            " "
        };
        println!(
            "  {} [{}] {} ({})",
            mark,
            task.id.unwrap_or_default(),
            task.task_title,
            task.class
        );
        print!("    Due: {}", format_deadline(&task.deadline));
        if let Some(workload) = task.workload {
            print!("  Workload: {}", workload);
        }
        println!();
        if let Some(file) = &task.file {
            println!("    Attachment: {}", file.name);
        }
    }

    Ok(())
}

async fn complete(manager: &ConnectionManager, id: i64, completed: bool) -> Result<()> {
    let storage = manager.handle().await?;
    let task = match storage
        .update_record::<TaskRecord, _>(id, |task| task.completed = completed)
        .await
    {
        Ok(task) => task,
        Err(err) if err.kind() == ErrorKind::NotFound => anyhow::bail!("No task with ID {}", id),
        Err(err) => return Err(err.into()),
    };

    if completed {
        println!("✓ Completed: {}", task.task_title);
    } else {
        println!("✓ Marked pending: {}", task.task_title);
    }
    Ok(())
}

async fn remove(manager: &ConnectionManager, id: i64) -> Result<()> {
    let storage = manager.handle().await?;
    let Some(task) = storage.get_record::<TaskRecord>(id).await? else {
        anyhow::bail!("No task with ID {}", id);
    };

    storage.remove_record::<TaskRecord>(id).await?;
    println!("✓ Removed task: {}", task.task_title);
    Ok(())
}
