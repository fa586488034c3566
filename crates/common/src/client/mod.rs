//! Record service client
//!
//! Provides a single abstraction over the remote record-keeping service:
//! - `RemoteService`: one async method per remote operation
//! - `HttpRemoteService`: reqwest-backed implementation over the service's JSON API
//!
//! Every call maps non-success statuses to [`AppError`] and decodes bodies
//! against explicit schemas.

use crate::auth::SessionStore;
use crate::config::ServiceConfig;
use crate::errors::{AppError, ErrorResponse, Result};
use crate::metrics::RequestMetrics;
use crate::models::{
    self, AttendanceRecord, AttendanceSummary, CheckInReceipt, CheckInSubmission, Confirmation,
    Credentials, Goal, GoalStats, GoalUpdate, GrowthReport, LoginResponse, LoginUser, NewGoal,
    NewSkill, NewUser, RegisterCompanyRequest, SiteLocation, Skill, SkillSummary, SkillUpdate,
    StillImage, UserAttendanceReport, UserGoalReport, UserProfile,
};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Request correlation header
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Operations offered by the record service
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Exchange credentials for a bearer token and identity
    async fn authenticate(&self, credentials: &Credentials) -> Result<LoginResponse>;

    async fn register_organization(&self, request: &RegisterCompanyRequest) -> Result<Confirmation>;

    /// Create a user inside the caller's organization
    async fn create_user(&self, user: &NewUser) -> Result<LoginUser>;

    /// Record one check-in from an image and the coordinates it was taken at
    async fn submit_check_in(&self, submission: &CheckInSubmission) -> Result<CheckInReceipt>;

    async fn fetch_summary(&self) -> Result<AttendanceSummary>;

    /// Check-in history, in service order
    async fn fetch_records(&self) -> Result<Vec<AttendanceRecord>>;

    async fn fetch_profile(&self) -> Result<UserProfile>;

    async fn fetch_goal_stats(&self) -> Result<GoalStats>;

    /// Store reference face images for the signed-in user
    async fn upload_face_images(&self, images: &[StillImage]) -> Result<Confirmation>;

    // === Goals and growth ===
    /// Goals whose end date has not passed
    async fn fetch_active_goals(&self) -> Result<Vec<Goal>>;

    async fn create_goal(&self, goal: &NewGoal) -> Result<Confirmation>;

    async fn update_goal(&self, update: &GoalUpdate) -> Result<Confirmation>;

    /// Compute and store a fresh growth score
    async fn fetch_growth(&self) -> Result<GrowthReport>;

    /// Skills not yet completed
    async fn fetch_active_skills(&self) -> Result<Vec<Skill>>;

    async fn create_skill(&self, skill: &NewSkill) -> Result<Confirmation>;

    async fn update_skill(&self, update: &SkillUpdate) -> Result<Confirmation>;

    async fn fetch_skill_summary(&self) -> Result<SkillSummary>;

    // === Admin record management ===
    async fn search_user(&self, name: &str) -> Result<UserProfile>;

    /// `None` when the user has no goals
    async fn search_user_goals(&self, name: &str) -> Result<Option<UserGoalReport>>;

    /// `None` when the user has no attendance marks
    async fn search_user_attendance(&self, name: &str) -> Result<Option<UserAttendanceReport>>;

    async fn remove_user(&self, name: &str) -> Result<Confirmation>;

    async fn remove_user_goals(&self, name: &str) -> Result<Confirmation>;

    async fn remove_user_attendance(&self, name: &str) -> Result<Confirmation>;

    async fn remove_user_images(&self, name: &str) -> Result<Confirmation>;

    async fn set_site_location(&self, site: &SiteLocation) -> Result<Confirmation>;
}

#[derive(Serialize)]
struct NameQuery<'a> {
    name: &'a str,
}

#[derive(Deserialize)]
struct CreatedUserEnvelope {
    user: LoginUser,
}

/// HTTP client for the record service
pub struct HttpRemoteService {
    client: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl HttpRemoteService {
    /// Create a client; bearer tokens are read from `session` on every call
    pub fn new(config: &ServiceConfig, session: Arc<SessionStore>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string())
    }

    /// Request carrying the current bearer token; fails before any I/O when anonymous
    fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let token = self.session.bearer_token()?;
        Ok(self.request(method, path).bearer_auth(token))
    }

    /// Send, map the status, and decode the body
    async fn execute<T>(
        &self,
        operation: &'static str,
        method: &'static str,
        builder: RequestBuilder,
        decode: impl FnOnce(&[u8]) -> Result<T> + Send,
    ) -> Result<T> {
        let metrics = RequestMetrics::start(method, operation);

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                metrics.finish(0);
                warn!(operation, error = %e, "Record service unreachable");
                return Err(e.into());
            }
        };

        let status = response.status();
        let body = response.bytes().await;
        metrics.finish(status.as_u16());
        let body = body?;

        if !status.is_success() {
            let message = ErrorResponse::message_from_body(status, &String::from_utf8_lossy(&body));
            warn!(operation, status = status.as_u16(), message = %message, "Record service rejected request");
            return Err(AppError::from_status(status, message));
        }

        debug!(operation, status = status.as_u16(), bytes = body.len(), "Record service responded");
        decode(&body)
    }

    /// Admin deletion keyed by user name
    async fn remove_by_name(
        &self,
        operation: &'static str,
        path: &str,
        name: &str,
    ) -> Result<Confirmation> {
        let builder = self
            .authorized(Method::POST, path)?
            .json(&NameQuery { name });
        self.execute(operation, "POST", builder, |body| {
            models::decode("removal confirmation", body)
        })
        .await
    }
}

#[async_trait]
impl RemoteService for HttpRemoteService {
    async fn authenticate(&self, credentials: &Credentials) -> Result<LoginResponse> {
        let builder = self.request(Method::POST, "/auth/login").json(credentials);
        self.execute("authenticate", "POST", builder, |body| {
            models::decode("login response", body)
        })
        .await
    }

    async fn register_organization(&self, request: &RegisterCompanyRequest) -> Result<Confirmation> {
        let builder = self.request(Method::POST, "/auth/register-company").json(request);
        self.execute("register_organization", "POST", builder, |body| {
            models::decode("registration confirmation", body)
        })
        .await
    }

    async fn create_user(&self, user: &NewUser) -> Result<LoginUser> {
        let builder = self.authorized(Method::POST, "/auth/signup-user")?.json(user);
        self.execute("create_user", "POST", builder, |body| {
            models::decode::<CreatedUserEnvelope>("created user", body).map(|env| env.user)
        })
        .await
    }

    async fn submit_check_in(&self, submission: &CheckInSubmission) -> Result<CheckInReceipt> {
        let image = Part::bytes(submission.image.bytes.clone())
            .file_name(submission.image.file_name())
            .mime_str(&submission.image.mime)?;

        let form = Form::new()
            .part("image", image)
            .text("latitude", submission.latitude.to_string())
            .text("longitude", submission.longitude.to_string());

        let builder = self
            .authorized(Method::POST, "/attendance/attendance")?
            .multipart(form);
        self.execute("submit_check_in", "POST", builder, |body| {
            models::decode("check-in receipt", body)
        })
        .await
    }

    async fn fetch_summary(&self) -> Result<AttendanceSummary> {
        let builder = self.authorized(Method::GET, "/dashboard/attendance-stats")?;
        self.execute("fetch_summary", "GET", builder, AttendanceSummary::decode)
            .await
    }

    async fn fetch_records(&self) -> Result<Vec<AttendanceRecord>> {
        let builder = self.authorized(Method::GET, "/dashboard/attendance-record")?;
        self.execute("fetch_records", "GET", builder, AttendanceRecord::decode_list)
            .await
    }

    async fn fetch_profile(&self) -> Result<UserProfile> {
        let builder = self.authorized(Method::GET, "/dashboard/user-info")?;
        self.execute("fetch_profile", "GET", builder, |body| {
            models::decode("user profile", body)
        })
        .await
    }

    async fn fetch_goal_stats(&self) -> Result<GoalStats> {
        let builder = self.authorized(Method::GET, "/dashboard/Goal-stats")?;
        self.execute("fetch_goal_stats", "GET", builder, |body| {
            models::decode("goal stats", body)
        })
        .await
    }

    async fn upload_face_images(&self, images: &[StillImage]) -> Result<Confirmation> {
        let mut form = Form::new();
        for (index, image) in images.iter().enumerate() {
            // The service stores each upload under its file name.
            let part = Part::bytes(image.bytes.clone())
                .file_name(format!("face_{}.{}", index + 1, image.extension()))
                .mime_str(&image.mime)?;
            form = form.part("files", part);
        }

        let builder = self
            .authorized(Method::POST, "/dashboard/upload-images")?
            .multipart(form);
        self.execute("upload_face_images", "POST", builder, |body| {
            models::decode("upload confirmation", body)
        })
        .await
    }

    async fn fetch_active_goals(&self) -> Result<Vec<Goal>> {
        let builder = self.authorized(Method::GET, "/goal/active-goals")?;
        self.execute("fetch_active_goals", "GET", builder, |body| {
            models::decode("active goals", body)
        })
        .await
    }

    async fn create_goal(&self, goal: &NewGoal) -> Result<Confirmation> {
        let builder = self.authorized(Method::POST, "/goal/goals")?.json(goal);
        self.execute("create_goal", "POST", builder, |body| {
            models::decode("goal confirmation", body)
        })
        .await
    }

    async fn update_goal(&self, update: &GoalUpdate) -> Result<Confirmation> {
        let builder = self.authorized(Method::PUT, "/goal/update-goal")?.json(update);
        self.execute("update_goal", "PUT", builder, |body| {
            models::decode("goal confirmation", body)
        })
        .await
    }

    async fn fetch_growth(&self) -> Result<GrowthReport> {
        let builder = self.authorized(Method::GET, "/growth/growth-per")?;
        self.execute("fetch_growth", "GET", builder, GrowthReport::decode)
            .await
    }

    async fn fetch_active_skills(&self) -> Result<Vec<Skill>> {
        let builder = self.authorized(Method::GET, "/growth/active-skills")?;
        self.execute("fetch_active_skills", "GET", builder, |body| {
            models::decode("active skills", body)
        })
        .await
    }

    async fn create_skill(&self, skill: &NewSkill) -> Result<Confirmation> {
        let builder = self.authorized(Method::POST, "/growth/skills")?.json(skill);
        self.execute("create_skill", "POST", builder, |body| {
            models::decode("skill confirmation", body)
        })
        .await
    }

    async fn update_skill(&self, update: &SkillUpdate) -> Result<Confirmation> {
        let builder = self.authorized(Method::PUT, "/growth/update-skill")?.json(update);
        self.execute("update_skill", "PUT", builder, |body| {
            models::decode("skill confirmation", body)
        })
        .await
    }

    async fn fetch_skill_summary(&self) -> Result<SkillSummary> {
        let builder = self.authorized(Method::GET, "/growth/skill-summary")?;
        self.execute("fetch_skill_summary", "GET", builder, |body| {
            models::decode("skill summary", body)
        })
        .await
    }

    async fn search_user(&self, name: &str) -> Result<UserProfile> {
        let builder = self
            .authorized(Method::POST, "/dashboard/search-user")?
            .json(&NameQuery { name });
        self.execute("search_user", "POST", builder, |body| {
            models::decode("user profile", body)
        })
        .await
    }

    async fn search_user_goals(&self, name: &str) -> Result<Option<UserGoalReport>> {
        let builder = self
            .authorized(Method::POST, "/dashboard/search-user-goals")?
            .json(&NameQuery { name });
        self.execute("search_user_goals", "POST", builder, UserGoalReport::decode)
            .await
    }

    async fn search_user_attendance(&self, name: &str) -> Result<Option<UserAttendanceReport>> {
        let builder = self
            .authorized(Method::POST, "/dashboard/search-user-attendance")?
            .json(&NameQuery { name });
        self.execute(
            "search_user_attendance",
            "POST",
            builder,
            UserAttendanceReport::decode,
        )
        .await
    }

    async fn remove_user(&self, name: &str) -> Result<Confirmation> {
        self.remove_by_name("remove_user", "/dashboard/remove-user", name)
            .await
    }

    async fn remove_user_goals(&self, name: &str) -> Result<Confirmation> {
        self.remove_by_name("remove_user_goals", "/dashboard/remove-user-goals", name)
            .await
    }

    async fn remove_user_attendance(&self, name: &str) -> Result<Confirmation> {
        self.remove_by_name(
            "remove_user_attendance",
            "/dashboard/remove-user-attendance",
            name,
        )
        .await
    }

    async fn remove_user_images(&self, name: &str) -> Result<Confirmation> {
        self.remove_by_name("remove_user_images", "/dashboard/remove-user-images", name)
            .await
    }

    async fn set_site_location(&self, site: &SiteLocation) -> Result<Confirmation> {
        let builder = self
            .authorized(Method::POST, "/dashboard/set-office-location")?
            .json(site);
        self.execute("set_site_location", "POST", builder, |body| {
            models::decode("site location confirmation", body)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemorySessionStorage;

    fn service(base_url: &str) -> HttpRemoteService {
        let config = ServiceConfig {
            base_url: base_url.to_string(),
            ..ServiceConfig::default()
        };
        let session = Arc::new(SessionStore::open(Arc::new(MemorySessionStorage::new())));
        HttpRemoteService::new(&config, session).unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        assert_eq!(service("http://records.local/").base_url(), "http://records.local");
    }

    #[tokio::test]
    async fn test_anonymous_calls_fail_before_network() {
        // Nothing listens on this port; reaching the network would be a transport error.
        let client = service("http://127.0.0.1:9");

        let err = client.fetch_summary().await.unwrap_err();
        assert!(matches!(err, AppError::NotAuthenticated));

        let err = client.remove_user("Bo").await.unwrap_err();
        assert!(matches!(err, AppError::NotAuthenticated));
    }
}
