//! Attendance read models and the check-in write model

use super::id_from_string_or_number;
use crate::errors::{AppError, Result};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a single attendance mark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Pending,
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::Pending => "Pending",
        };
        f.pad(label)
    }
}

/// One check-in history entry, authored by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AttendanceStatus,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub resolved_address: Option<String>,
}

impl AttendanceRecord {
    /// Address when the service resolved one, coordinates otherwise
    pub fn location_label(&self) -> String {
        match self.resolved_address.as_deref() {
            Some(addr) if !addr.trim().is_empty() => addr.to_string(),
            _ => format!("{:.4}, {:.4}", self.latitude, self.longitude),
        }
    }
}

#[derive(Deserialize)]
struct RecordEnvelope {
    attendance_record: Vec<AttendanceRecord>,
}

impl AttendanceRecord {
    /// Decode the record list, with or without the `attendance_record` envelope
    pub fn decode_list(body: &[u8]) -> Result<Vec<AttendanceRecord>> {
        let value: serde_json::Value =
            serde_json::from_slice(body).map_err(|e| AppError::decode("attendance records", e))?;

        let records = if value.is_array() {
            serde_json::from_value::<Vec<AttendanceRecord>>(value)
        } else {
            serde_json::from_value::<RecordEnvelope>(value).map(|env| env.attendance_record)
        };

        records.map_err(|e| AppError::decode("attendance records", e))
    }
}

/// Aggregate counters for the signed-in user.
///
/// `present + absent + pending = total` is the service's invariant; the client
/// does not recompute or correct it. Rates are displayed as sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    #[serde(rename = "Present", alias = "present")]
    pub present: u32,
    #[serde(rename = "Absent", alias = "absent")]
    pub absent: u32,
    #[serde(rename = "Pending", alias = "pending")]
    pub pending: u32,
    #[serde(rename = "Total", alias = "total")]
    pub total: u32,
    #[serde(rename = "Present Rate", alias = "presentRate")]
    pub present_rate: f64,
    #[serde(rename = "Absent Rate", alias = "absentRate")]
    pub absent_rate: f64,
}

impl AttendanceSummary {
    /// Decode and range-check a summary body
    pub fn decode(body: &[u8]) -> Result<Self> {
        let summary: AttendanceSummary = super::decode("attendance summary", body)?;
        summary.check_rates()?;
        Ok(summary)
    }

    fn check_rates(&self) -> Result<()> {
        for (name, rate) in [("present rate", self.present_rate), ("absent rate", self.absent_rate)] {
            if !rate.is_finite() || !(0.0..=100.0).contains(&rate) {
                return Err(AppError::decode(
                    "attendance summary",
                    format!("{} {} outside [0, 100]", name, rate),
                ));
            }
        }
        Ok(())
    }
}

/// Encoded still image as produced by a capture device
#[derive(Clone, PartialEq, Eq)]
pub struct StillImage {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl StillImage {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            _ => "jpg",
        }
    }

    /// File name used for the check-in upload part
    pub fn file_name(&self) -> String {
        format!("checkin.{}", self.extension())
    }
}

// Image payloads are large and personal; never dump them into logs.
impl fmt::Debug for StillImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StillImage")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A single check-in write: image plus the coordinates it was taken at
#[derive(Debug, Clone, PartialEq)]
pub struct CheckInSubmission {
    pub image: StillImage,
    pub latitude: f64,
    pub longitude: f64,
}

/// Service confirmation of a recorded check-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInReceipt {
    pub message: String,
    pub status: AttendanceStatus,
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub attendance_id: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub distance_from_office_m: Option<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub location_verified: bool,
    #[serde(default)]
    pub face_verified: bool,
}
