//! Admin record management
//!
//! Every operation checks the admin role locally before touching the
//! network; the service enforces the same rule again.

use officehub_common::auth::{require_admin, SessionStore};
use officehub_common::errors::{AppError, Result};
use officehub_common::models::{
    Confirmation, LoginUser, NewUser, RegisterCompanyRequest, SiteLocation, UserAttendanceReport,
    UserGoalReport, UserProfile,
};
use officehub_common::RemoteService;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

pub struct AdminConsole {
    service: Arc<dyn RemoteService>,
    session: Arc<SessionStore>,
}

impl AdminConsole {
    pub fn new(service: Arc<dyn RemoteService>, session: Arc<SessionStore>) -> Self {
        Self { service, session }
    }

    fn authorize(&self) -> Result<()> {
        require_admin(&self.session.current_session())
    }

    #[instrument(skip_all, fields(email = %user.email, role = %user.role))]
    pub async fn add_user(&self, user: &NewUser) -> Result<LoginUser> {
        self.authorize()?;
        user.validate()?;

        let created = self.service.create_user(user).await?;
        info!(user_id = %created.id, "User created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn search_user(&self, name: &str) -> Result<UserProfile> {
        self.authorize()?;
        let name = required_name(name)?;
        self.service.search_user(name).await
    }

    /// Goal counters and names for one user; `None` when they have no goals
    #[instrument(skip(self))]
    pub async fn user_goals(&self, name: &str) -> Result<Option<UserGoalReport>> {
        self.authorize()?;
        let name = required_name(name)?;
        self.service.search_user_goals(name).await
    }

    /// Attendance counters for one user; `None` when nothing is recorded
    #[instrument(skip(self))]
    pub async fn user_attendance(&self, name: &str) -> Result<Option<UserAttendanceReport>> {
        self.authorize()?;
        let name = required_name(name)?;
        self.service.search_user_attendance(name).await
    }

    #[instrument(skip(self))]
    pub async fn remove_user(&self, name: &str) -> Result<Confirmation> {
        self.authorize()?;
        let name = required_name(name)?;

        let confirmation = self.service.remove_user(name).await?;
        info!(name, "User removed");
        Ok(confirmation)
    }

    #[instrument(skip(self))]
    pub async fn remove_user_goals(&self, name: &str) -> Result<Confirmation> {
        self.authorize()?;
        let name = required_name(name)?;

        let confirmation = self.service.remove_user_goals(name).await?;
        info!(name, "User goals removed");
        Ok(confirmation)
    }

    #[instrument(skip(self))]
    pub async fn remove_user_attendance(&self, name: &str) -> Result<Confirmation> {
        self.authorize()?;
        let name = required_name(name)?;

        let confirmation = self.service.remove_user_attendance(name).await?;
        info!(name, "User attendance removed");
        Ok(confirmation)
    }

    /// Delete a user's enrolled face images
    #[instrument(skip(self))]
    pub async fn remove_user_images(&self, name: &str) -> Result<Confirmation> {
        self.authorize()?;
        let name = required_name(name)?;

        let confirmation = self.service.remove_user_images(name).await?;
        info!(name, "User face images removed");
        Ok(confirmation)
    }

    #[instrument(skip(self))]
    pub async fn set_site_location(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: f64,
    ) -> Result<Confirmation> {
        self.authorize()?;

        if ![latitude, longitude, radius_meters].iter().all(|v| v.is_finite()) {
            return Err(AppError::Validation {
                message: "site coordinates and radius must be finite".to_string(),
                field: None,
            });
        }

        let site = SiteLocation {
            latitude,
            longitude,
            radius_meters,
        };
        site.validate()?;
        self.service.set_site_location(&site).await
    }
}

/// Register a new organization and its first admin; no session required
#[instrument(skip_all, fields(company = %request.company_name, domain = %request.email_domain))]
pub async fn register_organization(
    service: &dyn RemoteService,
    request: &RegisterCompanyRequest,
) -> Result<Confirmation> {
    request.validate()?;

    let confirmation = service.register_organization(request).await?;
    info!("Organization registered");
    Ok(confirmation)
}

pub(crate) fn required_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation {
            message: "name is required".to_string(),
            field: Some("name".to_string()),
        });
    }
    Ok(name)
}
