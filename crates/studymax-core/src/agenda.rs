//! Filtering and ordering over records already loaded into memory

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::calendar::Day;
use crate::class::ClassRecord;
use crate::task::TaskRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl TaskFilter {
    pub fn matches(&self, task: &TaskRecord) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Pending => !task.completed,
            TaskFilter::Completed => task.completed,
        }
    }
}

/// Pending tasks first, each group by earliest deadline
pub fn agenda_order(a: &TaskRecord, b: &TaskRecord) -> Ordering {
    a.completed
        .cmp(&b.completed)
        .then_with(|| a.deadline.cmp(&b.deadline))
        .then_with(|| a.id.cmp(&b.id))
}

/// Apply `filter` and sort the survivors into agenda order
pub fn agenda(tasks: &[TaskRecord], filter: TaskFilter) -> Vec<&TaskRecord> {
    let mut selected: Vec<_> = tasks.iter().filter(|task| filter.matches(task)).collect();
    selected.sort_by(|a, b| agenda_order(a, b));
    selected
}

pub fn classes_on(classes: &[ClassRecord], day: Day) -> Vec<&ClassRecord> {
    classes.iter().filter(|class| class.meets_on(day)).collect()
}

pub fn tasks_due_on(tasks: &[TaskRecord], date: Date) -> Vec<&TaskRecord> {
    tasks
        .iter()
        .filter(|task| task.deadline.date() == date)
        .collect()
}

/// Tasks whose `class` field names the given class title
pub fn tasks_for_class<'a>(tasks: &'a [TaskRecord], class_title: &str) -> Vec<&'a TaskRecord> {
    tasks.iter().filter(|task| task.class == class_title).collect()
}
