//! Per-user reports read by administrators

use crate::errors::{AppError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Goal counters and goal names for one user
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserGoalReport {
    #[serde(rename = "Total Goals")]
    pub total: u32,
    #[serde(rename = "Success Goals")]
    pub completed: u32,
    #[serde(rename = "Pending Goals")]
    pub pending: u32,
    #[serde(rename = " Name", alias = "Name")]
    pub names: Vec<String>,
}

/// Attendance counters for one user
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserAttendanceReport {
    #[serde(rename = "Total Working Days")]
    pub working_days: u32,
    #[serde(rename = "Present Days")]
    pub present: u32,
    #[serde(rename = "Absent Days")]
    pub absent: u32,
    #[serde(rename = "Present Rate")]
    pub present_rate: f64,
    #[serde(rename = "Absent Rate")]
    pub absent_rate: f64,
}

/// Reports come back as `[]` when the user has nothing recorded yet.
fn decode_report<T: DeserializeOwned>(what: &'static str, body: &[u8]) -> Result<Option<T>> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| AppError::decode(what, e))?;

    match value {
        serde_json::Value::Array(items) if items.is_empty() => Ok(None),
        other => serde_json::from_value(other)
            .map(Some)
            .map_err(|e| AppError::decode(what, e)),
    }
}

impl UserGoalReport {
    pub fn decode(body: &[u8]) -> Result<Option<Self>> {
        decode_report("user goal report", body)
    }
}

impl UserAttendanceReport {
    pub fn decode(body: &[u8]) -> Result<Option<Self>> {
        let report: Option<Self> = decode_report("user attendance report", body)?;
        if let Some(report) = &report {
            for rate in [report.present_rate, report.absent_rate] {
                if !rate.is_finite() || !(0.0..=100.0).contains(&rate) {
                    return Err(AppError::decode(
                        "user attendance report",
                        format!("rate {} outside [0, 100]", rate),
                    ));
                }
            }
        }
        Ok(report)
    }
}
