//! Personal goals, skills, and the growth score

use super::id_from_string_or_number;
use crate::errors::{AppError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoalStatus {
    Pending,
    Complete,
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalStatus::Pending => f.pad("Pending"),
            GoalStatus::Complete => f.pad("Complete"),
        }
    }
}

/// A goal owned by the signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub name: String,
    /// Planned length in days
    pub duration: u32,
    pub status: GoalStatus,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct NewGoal {
    #[validate(length(min = 1, message = "goal name is required"))]
    pub name: String,
    #[validate(range(min = 1, message = "duration must be at least one day"))]
    pub duration: u32,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalUpdate {
    pub name: String,
    pub status: GoalStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillStatus {
    Pending,
    Completed,
}

impl fmt::Display for SkillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkillStatus::Pending => f.pad("pending"),
            SkillStatus::Completed => f.pad("completed"),
        }
    }
}

impl std::str::FromStr for SkillStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SkillStatus::Pending),
            "completed" => Ok(SkillStatus::Completed),
            other => Err(format!("unknown skill status '{}'", other)),
        }
    }
}

/// Skill still in progress, as listed by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    #[serde(rename = "skill ID", deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(rename = "skill Name")]
    pub name: String,
    #[serde(rename = "skill Description", default)]
    pub description: Option<String>,
    #[serde(rename = "skill Status")]
    pub status: SkillStatus,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct NewSkill {
    #[validate(length(min = 1, message = "skill name is required"))]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillUpdate {
    pub name: String,
    pub status: SkillStatus,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SkillSummary {
    #[serde(rename = "Total Skills")]
    pub total: u32,
    #[serde(rename = "Completed Skills")]
    pub completed: u32,
    #[serde(rename = "Pending Skills")]
    pub pending: u32,
}

/// Growth score: weighted attendance and goal completion, computed by the service
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GrowthReport {
    pub growth_percentage: f64,
    pub message: String,
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub user_id: String,
}

impl GrowthReport {
    pub fn decode(body: &[u8]) -> Result<Self> {
        let report: GrowthReport = super::decode("growth report", body)?;
        if !report.growth_percentage.is_finite() || report.growth_percentage < 0.0 {
            return Err(AppError::decode(
                "growth report",
                format!("growth percentage {} is not a valid score", report.growth_percentage),
            ));
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_decode_ignores_owner() {
        let body = br#"[{"id":3,"name":"Ship v2","duration":14,"status":"Pending",
            "user_id":1,"start_date":"2025-03-01","end_date":"2025-03-15"}]"#;
        let goals: Vec<Goal> = crate::models::decode("active goals", body).unwrap();
        assert_eq!(goals[0].id, "3");
        assert_eq!(goals[0].status, GoalStatus::Pending);
        assert_eq!(goals[0].end_date, NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
    }

    #[test]
    fn test_goal_unknown_status_fails() {
        let body = br#"[{"id":3,"name":"Ship v2","duration":14,"status":"Done",
            "end_date":"2025-03-15"}]"#;
        let result: Result<Vec<Goal>> = crate::models::decode("active goals", body);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_goal_validation() {
        let goal = NewGoal {
            name: String::new(),
            duration: 0,
            end_date: NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
        };
        let errors = goal.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
        assert!(errors.field_errors().contains_key("duration"));
    }

    #[test]
    fn test_skill_wire_names() {
        let body = br#"[{"skill Name":"Rust","skill Description":null,
            "skill Status":"pending","skill ID":9}]"#;
        let skills: Vec<Skill> = crate::models::decode("active skills", body).unwrap();
        assert_eq!(skills[0].name, "Rust");
        assert_eq!(skills[0].description, None);
        assert_eq!(skills[0].status, SkillStatus::Pending);

        let update = SkillUpdate { name: "Rust".into(), status: SkillStatus::Completed };
        assert_eq!(serde_json::to_value(&update).unwrap()["status"], "completed");
    }

    #[test]
    fn test_growth_rejects_negative_score() {
        let ok = br#"{"growth_percentage":42.5,"message":"Growth data added successfully","user_id":1}"#;
        assert_eq!(GrowthReport::decode(ok).unwrap().growth_percentage, 42.5);

        let bad = br#"{"growth_percentage":-1.0,"message":"x","user_id":1}"#;
        assert!(GrowthReport::decode(bad).is_err());
    }
}
