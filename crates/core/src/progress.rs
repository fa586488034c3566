//! Goals, skills, growth, and face enrollment for the signed-in user

use crate::admin::required_name;
use officehub_common::errors::{AppError, Result};
use officehub_common::models::{
    Confirmation, Goal, GoalStatus, GoalUpdate, GrowthReport, NewGoal, NewSkill, Skill,
    SkillStatus, SkillSummary, SkillUpdate, StillImage,
};
use officehub_common::RemoteService;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

/// Fewest reference images the service accepts for face verification
pub const MIN_ENROLLMENT_IMAGES: usize = 3;

pub struct ProgressTracker {
    service: Arc<dyn RemoteService>,
}

impl ProgressTracker {
    pub fn new(service: Arc<dyn RemoteService>) -> Self {
        Self { service }
    }

    pub async fn active_goals(&self) -> Result<Vec<Goal>> {
        self.service.fetch_active_goals().await
    }

    #[instrument(skip_all, fields(name = %goal.name))]
    pub async fn add_goal(&self, goal: &NewGoal) -> Result<Confirmation> {
        goal.validate()?;

        let confirmation = self.service.create_goal(goal).await?;
        info!(end_date = %goal.end_date, "Goal created");
        Ok(confirmation)
    }

    #[instrument(skip(self))]
    pub async fn complete_goal(&self, name: &str) -> Result<Confirmation> {
        let update = GoalUpdate {
            name: required_name(name)?.to_string(),
            status: GoalStatus::Complete,
        };
        self.service.update_goal(&update).await
    }

    /// Recompute the growth score; every call stores a new score on the service
    pub async fn growth(&self) -> Result<GrowthReport> {
        self.service.fetch_growth().await
    }

    pub async fn active_skills(&self) -> Result<Vec<Skill>> {
        self.service.fetch_active_skills().await
    }

    pub async fn skill_summary(&self) -> Result<SkillSummary> {
        self.service.fetch_skill_summary().await
    }

    #[instrument(skip_all, fields(name = %skill.name))]
    pub async fn add_skill(&self, skill: &NewSkill) -> Result<Confirmation> {
        skill.validate()?;

        let skill = NewSkill {
            name: required_name(&skill.name)?.to_string(),
            description: skill
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
        };
        let confirmation = self.service.create_skill(&skill).await?;
        info!("Skill added");
        Ok(confirmation)
    }

    #[instrument(skip(self))]
    pub async fn set_skill_status(&self, name: &str, status: SkillStatus) -> Result<Confirmation> {
        let update = SkillUpdate {
            name: required_name(name)?.to_string(),
            status,
        };
        self.service.update_skill(&update).await
    }
}

/// Upload reference face images for the signed-in user
#[instrument(skip_all, fields(count = images.len()))]
pub async fn enroll_faces(service: &dyn RemoteService, images: &[StillImage]) -> Result<Confirmation> {
    if images.len() < MIN_ENROLLMENT_IMAGES {
        return Err(AppError::Validation {
            message: format!("at least {} face images are required", MIN_ENROLLMENT_IMAGES),
            field: Some("images".to_string()),
        });
    }
    if images.iter().any(StillImage::is_empty) {
        return Err(AppError::Validation {
            message: "face images must not be empty".to_string(),
            field: Some("images".to_string()),
        });
    }

    let confirmation = service.upload_face_images(images).await?;
    info!("Face images enrolled");
    Ok(confirmation)
}
