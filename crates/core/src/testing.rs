//! Recording in-memory record service for tests

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use officehub_common::errors::{AppError, Result};
use officehub_common::models::{
    AttendanceRecord, AttendanceStatus, AttendanceSummary, CheckInReceipt, CheckInSubmission,
    Confirmation, Credentials, Goal, GoalStats, GoalStatus, GoalUpdate, GrowthReport, LoginResponse,
    LoginUser, NewGoal, NewSkill, NewUser, RegisterCompanyRequest, Role, SiteLocation, Skill,
    SkillStatus, SkillSummary, SkillUpdate, StillImage, UserAttendanceReport, UserGoalReport,
    UserProfile,
};
use officehub_common::RemoteService;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::Barrier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Authenticate,
    RegisterOrganization,
    CreateUser,
    SubmitCheckIn,
    FetchSummary,
    FetchRecords,
    FetchProfile,
    FetchGoalStats,
    UploadFaceImages,
    FetchActiveGoals,
    CreateGoal,
    UpdateGoal,
    FetchGrowth,
    FetchActiveSkills,
    CreateSkill,
    UpdateSkill,
    FetchSkillSummary,
    SearchUser,
    SearchUserGoals,
    SearchUserAttendance,
    RemoveUser,
    RemoveUserGoals,
    RemoveUserAttendance,
    RemoveUserImages,
    SetSiteLocation,
}

pub fn sample_summary() -> AttendanceSummary {
    AttendanceSummary {
        present: 3,
        absent: 1,
        pending: 1,
        total: 5,
        present_rate: 75.0,
        absent_rate: 25.0,
    }
}

pub fn sample_records() -> Vec<AttendanceRecord> {
    vec![AttendanceRecord {
        id: "7".to_string(),
        date: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
        time: NaiveTime::from_hms_opt(9, 15, 2).unwrap(),
        status: AttendanceStatus::Present,
        latitude: 12.34,
        longitude: 56.78,
        resolved_address: Some("Main St".to_string()),
    }]
}

/// Records as the service returns them after one more check-in
pub fn records_after_check_in() -> Vec<AttendanceRecord> {
    let mut records = sample_records();
    records.push(AttendanceRecord {
        id: "42".to_string(),
        date: NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
        time: NaiveTime::from_hms_opt(9, 2, 40).unwrap(),
        status: AttendanceStatus::Present,
        latitude: 12.34,
        longitude: 56.78,
        resolved_address: Some("Main St".to_string()),
    });
    records
}

pub fn sample_receipt() -> CheckInReceipt {
    CheckInReceipt {
        message: "Attendance marked".to_string(),
        status: AttendanceStatus::Present,
        attendance_id: "42".to_string(),
        address: Some("Main St".to_string()),
        distance_from_office_m: Some(12.5),
        confidence: Some(0.93),
        location_verified: true,
        face_verified: true,
    }
}

fn injected(op: Op) -> AppError {
    AppError::Upstream {
        status: 503,
        message: format!("injected failure for {:?}", op),
    }
}

#[derive(Default)]
pub struct MockRemoteService {
    calls: Mutex<Vec<Op>>,
    submissions: Mutex<Vec<CheckInSubmission>>,
    uploaded_images: Mutex<Vec<StillImage>>,
    goal_updates: Mutex<Vec<(String, GoalStatus)>>,
    skill_updates: Mutex<Vec<(String, SkillStatus)>>,
    failing: Mutex<HashSet<Op>>,
    summary: Mutex<Option<AttendanceSummary>>,
    records: Mutex<Option<Vec<AttendanceRecord>>>,
    fetch_gate: Mutex<Option<Arc<Barrier>>>,
}

impl MockRemoteService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call to `op` fail with a 503
    pub fn fail(&self, op: Op) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn set_summary(&self, summary: AttendanceSummary) {
        *self.summary.lock().unwrap() = Some(summary);
    }

    pub fn set_records(&self, records: Vec<AttendanceRecord>) {
        *self.records.lock().unwrap() = Some(records);
    }

    /// Summary and records fetches each wait for the other to start
    pub fn gate_fetches(&self) {
        *self.fetch_gate.lock().unwrap() = Some(Arc::new(Barrier::new(2)));
    }

    pub fn calls(&self) -> Vec<Op> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, op: Op) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == op).count()
    }

    pub fn submissions(&self) -> Vec<CheckInSubmission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn uploaded_images(&self) -> Vec<StillImage> {
        self.uploaded_images.lock().unwrap().clone()
    }

    pub fn goal_updates(&self) -> Vec<(String, GoalStatus)> {
        self.goal_updates.lock().unwrap().clone()
    }

    pub fn skill_updates(&self) -> Vec<(String, SkillStatus)> {
        self.skill_updates.lock().unwrap().clone()
    }

    fn record(&self, op: Op) -> Result<()> {
        self.calls.lock().unwrap().push(op);
        if self.failing.lock().unwrap().contains(&op) {
            Err(injected(op))
        } else {
            Ok(())
        }
    }

    async fn wait_for_peer_fetch(&self) {
        let gate = self.fetch_gate.lock().unwrap().clone();
        if let Some(barrier) = gate {
            barrier.wait().await;
        }
    }
}

fn profile(name: &str) -> UserProfile {
    UserProfile {
        id: "2".to_string(),
        name: name.to_string(),
        email: "bo@corp.com".to_string(),
        role: Role::Employee,
        position: "Engineer".to_string(),
        age: 30,
    }
}

fn confirmation(message: &str) -> Confirmation {
    Confirmation {
        message: message.to_string(),
    }
}

#[async_trait]
impl RemoteService for MockRemoteService {
    async fn authenticate(&self, credentials: &Credentials) -> Result<LoginResponse> {
        self.record(Op::Authenticate)?;
        Ok(LoginResponse {
            access_token: "t1".to_string(),
            token_type: Some("bearer".to_string()),
            user: LoginUser {
                id: "1".to_string(),
                email: credentials.email.clone(),
                role: Role::Admin,
                name: "Ann".to_string(),
            },
        })
    }

    async fn register_organization(&self, _request: &RegisterCompanyRequest) -> Result<Confirmation> {
        self.record(Op::RegisterOrganization)?;
        Ok(confirmation("Company and admin registered successfully"))
    }

    async fn create_user(&self, user: &NewUser) -> Result<LoginUser> {
        self.record(Op::CreateUser)?;
        Ok(LoginUser {
            id: "3".to_string(),
            email: user.email.clone(),
            role: user.role,
            name: user.name.clone(),
        })
    }

    async fn submit_check_in(&self, submission: &CheckInSubmission) -> Result<CheckInReceipt> {
        self.record(Op::SubmitCheckIn)?;
        self.submissions.lock().unwrap().push(submission.clone());
        Ok(sample_receipt())
    }

    async fn fetch_summary(&self) -> Result<AttendanceSummary> {
        self.wait_for_peer_fetch().await;
        self.record(Op::FetchSummary)?;
        Ok(self.summary.lock().unwrap().clone().unwrap_or_else(sample_summary))
    }

    async fn fetch_records(&self) -> Result<Vec<AttendanceRecord>> {
        self.wait_for_peer_fetch().await;
        self.record(Op::FetchRecords)?;
        Ok(self.records.lock().unwrap().clone().unwrap_or_else(sample_records))
    }

    async fn fetch_profile(&self) -> Result<UserProfile> {
        self.record(Op::FetchProfile)?;
        Ok(profile("Ann"))
    }

    async fn fetch_goal_stats(&self) -> Result<GoalStats> {
        self.record(Op::FetchGoalStats)?;
        Ok(GoalStats {
            total: 4,
            completed: 1,
            pending: 3,
        })
    }

    async fn upload_face_images(&self, images: &[StillImage]) -> Result<Confirmation> {
        self.record(Op::UploadFaceImages)?;
        self.uploaded_images.lock().unwrap().extend_from_slice(images);
        Ok(confirmation("Images uploaded successfully"))
    }

    async fn fetch_active_goals(&self) -> Result<Vec<Goal>> {
        self.record(Op::FetchActiveGoals)?;
        Ok(vec![Goal {
            id: "3".to_string(),
            name: "Ship v2".to_string(),
            duration: 14,
            status: GoalStatus::Pending,
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
        }])
    }

    async fn create_goal(&self, _goal: &NewGoal) -> Result<Confirmation> {
        self.record(Op::CreateGoal)?;
        Ok(confirmation("Goal created"))
    }

    async fn update_goal(&self, update: &GoalUpdate) -> Result<Confirmation> {
        self.record(Op::UpdateGoal)?;
        self.goal_updates
            .lock()
            .unwrap()
            .push((update.name.clone(), update.status));
        Ok(confirmation("Goal Completed"))
    }

    async fn fetch_growth(&self) -> Result<GrowthReport> {
        self.record(Op::FetchGrowth)?;
        Ok(GrowthReport {
            growth_percentage: 42.5,
            message: "Growth data added successfully".to_string(),
            user_id: "1".to_string(),
        })
    }

    async fn fetch_active_skills(&self) -> Result<Vec<Skill>> {
        self.record(Op::FetchActiveSkills)?;
        Ok(vec![Skill {
            id: "9".to_string(),
            name: "Rust".to_string(),
            description: None,
            status: SkillStatus::Pending,
        }])
    }

    async fn create_skill(&self, _skill: &NewSkill) -> Result<Confirmation> {
        self.record(Op::CreateSkill)?;
        Ok(confirmation("Skill added successfully"))
    }

    async fn update_skill(&self, update: &SkillUpdate) -> Result<Confirmation> {
        self.record(Op::UpdateSkill)?;
        self.skill_updates
            .lock()
            .unwrap()
            .push((update.name.clone(), update.status));
        Ok(confirmation("Skill status updated successfully"))
    }

    async fn fetch_skill_summary(&self) -> Result<SkillSummary> {
        self.record(Op::FetchSkillSummary)?;
        Ok(SkillSummary {
            total: 2,
            completed: 1,
            pending: 1,
        })
    }

    async fn search_user(&self, name: &str) -> Result<UserProfile> {
        self.record(Op::SearchUser)?;
        Ok(profile(name))
    }

    async fn search_user_goals(&self, _name: &str) -> Result<Option<UserGoalReport>> {
        self.record(Op::SearchUserGoals)?;
        Ok(Some(UserGoalReport {
            total: 2,
            completed: 1,
            pending: 1,
            names: vec!["Ship v2".to_string(), "Learn Rust".to_string()],
        }))
    }

    async fn search_user_attendance(&self, _name: &str) -> Result<Option<UserAttendanceReport>> {
        self.record(Op::SearchUserAttendance)?;
        Ok(None)
    }

    async fn remove_user(&self, _name: &str) -> Result<Confirmation> {
        self.record(Op::RemoveUser)?;
        Ok(confirmation("User removed successfully"))
    }

    async fn remove_user_goals(&self, _name: &str) -> Result<Confirmation> {
        self.record(Op::RemoveUserGoals)?;
        Ok(confirmation("User goals removed successfully"))
    }

    async fn remove_user_attendance(&self, _name: &str) -> Result<Confirmation> {
        self.record(Op::RemoveUserAttendance)?;
        Ok(confirmation("User attendance removed successfully"))
    }

    async fn remove_user_images(&self, _name: &str) -> Result<Confirmation> {
        self.record(Op::RemoveUserImages)?;
        Ok(confirmation("User images removed successfully"))
    }

    async fn set_site_location(&self, _site: &SiteLocation) -> Result<Confirmation> {
        self.record(Op::SetSiteLocation)?;
        Ok(confirmation("Office location set successfully"))
    }
}
