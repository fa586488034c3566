//! Organization registration, site location, and dashboard goal counters

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Organization registration request
#[derive(Debug, Clone, Serialize, Validate)]
#[validate(schema(function = "admin_email_in_domain"))]
pub struct RegisterCompanyRequest {
    #[validate(length(min = 1, message = "company name is required"))]
    pub company_name: String,
    /// Bare domain, e.g. `techcorp.com`
    #[validate(length(min = 3, message = "email domain is required"))]
    pub email_domain: String,
    #[validate(length(min = 1, message = "admin name is required"))]
    pub admin_name: String,
    #[validate(email)]
    pub admin_email: String,
    #[validate(length(min = 1, message = "admin password is required"))]
    pub admin_password: String,
    #[validate(length(min = 1, message = "position is required"))]
    pub position: String,
    #[validate(range(min = 1, message = "age must be positive"))]
    pub age: u32,
}

fn admin_email_in_domain(req: &RegisterCompanyRequest) -> Result<(), ValidationError> {
    let suffix = format!("@{}", req.email_domain);
    if req.admin_email.ends_with(&suffix) {
        Ok(())
    } else {
        let mut err = ValidationError::new("admin_email_domain");
        err.message = Some("admin email domain must match company domain".into());
        Err(err)
    }
}

/// Office site used by the service to verify check-in distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SiteLocation {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[serde(rename = "radius_meter", alias = "radiusMeters")]
    #[validate(range(exclusive_min = 0.0, message = "radius must be positive"))]
    pub radius_meters: f64,
}

/// Generic `{message}` acknowledgement
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Confirmation {
    #[serde(alias = "Message")]
    pub message: String,
}

/// Goal counters shown on the dashboard
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GoalStats {
    #[serde(rename = "Total Goals")]
    pub total: u32,
    #[serde(rename = "Completed Goals")]
    pub completed: u32,
    #[serde(rename = "Pending Goals")]
    pub pending: u32,
}
