//! Session ownership and authorization
//!
//! Provides:
//! - The authenticated identity and its all-or-nothing invariant
//! - `SessionStore`, the single writer of persisted session keys
//! - Remote sign-in on top of the store
//! - Role-based route gating (see [`gate`])

pub mod gate;
mod storage;

pub use gate::{can_access, landing_route, require_admin, visible_routes, RouteDescriptor};
pub use storage::{FileSessionStorage, MemorySessionStorage, SessionStorage};

use crate::client::RemoteService;
use crate::errors::{AppError, Result};
use crate::models::{Credentials, Role};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};
use validator::Validate;

/// Storage keys, one per identity field
pub mod keys {
    pub const TOKEN: &str = "token";
    pub const ROLE: &str = "role";
    pub const USER_ID: &str = "userId";
    pub const NAME: &str = "name";

    pub const ALL: [&str; 4] = [TOKEN, ROLE, USER_ID, NAME];
}

/// Authenticated material: every field present, none empty
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub token: String,
    pub role: Role,
    pub user_id: String,
    pub display_name: String,
}

impl Identity {
    pub fn new(
        token: impl Into<String>,
        role: Role,
        user_id: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            role,
            user_id: user_id.into(),
            display_name: display_name.into(),
        }
    }

    fn check_complete(&self) -> Result<()> {
        for (field, value) in [
            ("token", &self.token),
            ("userId", &self.user_id),
            ("name", &self.display_name),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::MissingField {
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("role", &self.role)
            .field("user_id", &self.user_id)
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}

/// Snapshot of who is signed in
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated(Identity),
}

#[derive(Deserialize)]
struct TokenClaims {
    exp: Option<i64>,
}

impl Session {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Session::Authenticated(identity) => Some(identity),
            Session::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }

    pub fn token(&self) -> Option<&str> {
        self.identity().map(|i| i.token.as_str())
    }

    pub fn role(&self) -> Option<Role> {
        self.identity().map(|i| i.role)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.identity().map(|i| i.user_id.as_str())
    }

    pub fn display_name(&self) -> Option<&str> {
        self.identity().map(|i| i.display_name.as_str())
    }

    /// Expiry read from the bearer token's `exp` claim.
    ///
    /// The signature is not checked; the service remains the authority.
    pub fn token_expiry(&self) -> Option<DateTime<Utc>> {
        let token = self.token()?;

        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation).ok()?;
        DateTime::from_timestamp(data.claims.exp?, 0)
    }

    /// True when the token carries an `exp` claim that is already in the past
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.token_expiry().is_some_and(|exp| exp <= now)
    }
}

/// Owner of the authenticated identity.
///
/// One instance per process, handed by reference to the components that read
/// it. Storage is written before memory so a reload never resurrects a session
/// that was only held in memory.
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    current: RwLock<Session>,
}

impl SessionStore {
    /// Rehydrate from durable storage.
    ///
    /// Partial or unreadable storage yields an anonymous session.
    pub fn open(storage: Arc<dyn SessionStorage>) -> Self {
        let current = match Self::rehydrate(storage.as_ref()) {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable persisted session");
                Session::Anonymous
            }
        };

        if let Some(identity) = current.identity() {
            info!(user_id = %identity.user_id, role = %identity.role, "Session restored");
        }

        Self {
            storage,
            current: RwLock::new(current),
        }
    }

    fn rehydrate(storage: &dyn SessionStorage) -> Result<Session> {
        let token = storage.get(keys::TOKEN)?;
        let role = storage.get(keys::ROLE)?;
        let user_id = storage.get(keys::USER_ID)?;
        let name = storage.get(keys::NAME)?;

        match (token, role, user_id, name) {
            (None, None, None, None) => Ok(Session::Anonymous),
            (Some(token), Some(role), Some(user_id), Some(name)) => {
                let role = role.parse::<Role>().map_err(|message| AppError::Storage { message })?;
                let identity = Identity::new(token, role, user_id, name);
                identity.check_complete()?;
                Ok(Session::Authenticated(identity))
            }
            _ => Err(AppError::Storage {
                message: "persisted session is missing keys".to_string(),
            }),
        }
    }

    /// Store already-authenticated material. No network traffic.
    pub fn login(&self, identity: Identity) -> Result<Session> {
        identity.check_complete()?;

        self.storage.set_all(&[
            (keys::TOKEN, identity.token.as_str()),
            (keys::ROLE, identity.role.as_str()),
            (keys::USER_ID, identity.user_id.as_str()),
            (keys::NAME, identity.display_name.as_str()),
        ])?;

        info!(user_id = %identity.user_id, role = %identity.role, "Signed in");

        let session = Session::Authenticated(identity);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = session.clone();
        Ok(session)
    }

    /// Clear memory and storage. Logging out while anonymous is a no-op.
    ///
    /// Memory is cleared even when wiping storage fails; the storage error is
    /// still returned.
    pub fn logout(&self) -> Result<()> {
        let cleared = self.storage.clear();

        let previous = std::mem::take(&mut *self.current.write().unwrap_or_else(PoisonError::into_inner));
        if let Some(identity) = previous.identity() {
            info!(user_id = %identity.user_id, "Signed out");
        }

        cleared
    }

    /// Current snapshot; never blocks on I/O
    pub fn current_session(&self) -> Session {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn role(&self) -> Option<Role> {
        self.current_session().role()
    }

    pub fn display_name(&self) -> Option<String> {
        self.current_session().display_name().map(str::to_string)
    }

    /// Bearer token for outgoing requests
    pub fn bearer_token(&self) -> Result<String> {
        self.current_session()
            .token()
            .map(str::to_string)
            .ok_or(AppError::NotAuthenticated)
    }
}

/// Authenticate against the service, then record the session.
///
/// A rejected login leaves the store exactly as it was.
pub async fn sign_in(
    service: &dyn RemoteService,
    store: &SessionStore,
    credentials: &Credentials,
) -> Result<Session> {
    credentials.validate()?;

    let response = service.authenticate(credentials).await?;
    let user = response.user;

    store.login(Identity::new(
        response.access_token,
        user.role,
        user.id,
        user.name,
    ))
}
