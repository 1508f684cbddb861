//! Class domain model

use serde::{Deserialize, Serialize};

use crate::calendar::Day;
use crate::record::{RecordId, collections, impl_record};
use crate::{CoreError, Result};

/// A course the student attends on a weekly schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Unique within the collection; tasks and documents refer to it by value
    pub course_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_description: Option<String>,
    #[serde(default)]
    pub days: Vec<Day>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl_record!(ClassRecord, collections::CLASSES);

impl ClassRecord {
    pub fn new(course_title: impl Into<String>) -> Self {
        Self {
            id: None,
            course_title: course_title.into(),
            course_description: None,
            days: Vec::new(),
            time: None,
            color: None,
            user_id: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.course_description = Some(description.into());
        self
    }

    /// Set the meeting days; duplicates are dropped, first occurrence wins
    pub fn with_days(mut self, days: impl IntoIterator<Item = Day>) -> Self {
        self.days.clear();
        for day in days {
            if !self.days.contains(&day) {
                self.days.push(day);
            }
        }
        self
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn meets_on(&self, day: Day) -> bool {
        self.days.contains(&day)
    }

    pub fn validate(&self) -> Result<()> {
        if self.course_title.trim().is_empty() {
            return Err(CoreError::MissingField("courseTitle"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let class = ClassRecord::new("Algebra II")
            .with_days([Day::Monday, Day::Wednesday, Day::Monday])
            .with_time("09:00");

        let json = serde_json::to_value(&class).unwrap();
        assert_eq!(json["courseTitle"], "Algebra II");
        assert_eq!(json["days"], serde_json::json!(["Monday", "Wednesday"]));
        assert_eq!(json["time"], "09:00");
        assert!(json.get("id").is_none());
        assert!(json.get("courseDescription").is_none());
    }

    #[test]
    fn test_blank_title_rejected() {
        let class = ClassRecord::new("   ");
        assert!(matches!(
            class.validate(),
            Err(CoreError::MissingField("courseTitle"))
        ));
    }
}
