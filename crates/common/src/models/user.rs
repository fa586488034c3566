//! User, role, and authentication exchange models

use super::id_from_string_or_number;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Authorization role held by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "employee" => Ok(Role::Employee),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Login request body
#[derive(Clone, Serialize, Validate)]
pub struct Credentials {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Login response
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: LoginUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginUser {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub email: String,
    pub role: Role,
    pub name: String,
}

/// Full user record as returned by profile and search endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub position: String,
    pub age: u32,
}

/// Admin-created user
#[derive(Clone, Serialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
    pub role: Role,
    #[validate(length(min = 1, message = "position is required"))]
    pub position: String,
    #[validate(range(min = 1, message = "age must be positive"))]
    pub age: u32,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("position", &self.position)
            .field("age", &self.age)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("employee".parse::<Role>().unwrap(), Role::Employee);
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_login_response_decode() {
        let body = br#"{"access_token":"t1","token_type":"bearer",
            "user":{"id":1,"email":"ann@corp.com","role":"admin","name":"Ann"}}"#;
        let resp: LoginResponse = crate::models::decode("login response", body).unwrap();
        assert_eq!(resp.user.id, "1");
        assert_eq!(resp.user.role, Role::Admin);
    }

    #[test]
    fn test_login_response_unknown_role_fails() {
        let body = br#"{"access_token":"t1",
            "user":{"id":1,"email":"ann@corp.com","role":"owner","name":"Ann"}}"#;
        let result: crate::errors::Result<LoginResponse> =
            crate::models::decode("login response", body);
        assert!(result.is_err());
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("ann@corp.com", "hunter2");
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("ann@corp.com"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_new_user_validation() {
        let user = NewUser {
            name: "Bo".into(),
            email: "not-an-email".into(),
            password: "pw".into(),
            role: Role::Employee,
            position: "Engineer".into(),
            age: 0,
        };
        let errors = user.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("age"));
    }
}
