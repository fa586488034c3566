//! Wire models for the record service
//!
//! Every response type has an explicit schema; decoding fails fast with
//! [`AppError::Decode`](crate::errors::AppError::Decode) instead of
//! substituting placeholder values.

mod attendance;
mod organization;
mod progress;
mod report;
mod user;

pub use attendance::{
    AttendanceRecord, AttendanceStatus, AttendanceSummary, CheckInReceipt, CheckInSubmission,
    StillImage,
};
pub use organization::{Confirmation, GoalStats, RegisterCompanyRequest, SiteLocation};
pub use progress::{
    Goal, GoalStatus, GoalUpdate, GrowthReport, NewGoal, NewSkill, Skill, SkillStatus, SkillSummary,
    SkillUpdate,
};
pub use report::{UserAttendanceReport, UserGoalReport};
pub use user::{Credentials, LoginResponse, LoginUser, NewUser, Role, UserProfile};

use serde::{Deserialize, Deserializer};

/// Identifiers arrive as JSON integers or strings; both normalise to a string.
pub(crate) fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Text(s) if !s.is_empty() => Ok(s),
        RawId::Text(_) => Err(serde::de::Error::custom("identifier is empty")),
        RawId::Number(n) => Ok(n.to_string()),
    }
}

/// Decode a response body into `T`, tagging failures with the response name.
pub fn decode<T: serde::de::DeserializeOwned>(
    what: &'static str,
    body: &[u8],
) -> crate::errors::Result<T> {
    serde_json::from_slice(body).map_err(|e| crate::errors::AppError::decode(what, e))
}
