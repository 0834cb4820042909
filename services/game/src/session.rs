//! Identity session lifecycle
//!
//! Binds credentials issued by the identity provider to the HTTP session
//! artifact and resolves the local profile projection. Every operation takes
//! the token explicitly; nothing here reads ambient request state.

use std::sync::Arc;

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;
use tracing::{error, info};

use crate::{
    error::ApiError,
    identity::{IdentityError, IdentityProvider},
    models::{NewUser, User},
    repositories::UserRepository,
    validation,
};

/// Session cookie name
pub const SESSION_COOKIE: &str = "session";
/// Hard session lifetime; not renewed on activity
const SESSION_TTL_DAYS: i64 = 7;

/// Outcome of a session validation
#[derive(Debug, Clone)]
pub struct SessionCheck {
    /// Resolved user, when both the token and the profile are good
    pub user: Option<User>,
    /// Whether the caller should drop a stale cookie
    pub purge_token: bool,
}

impl SessionCheck {
    fn no_user(purge_token: bool) -> Self {
        Self {
            user: None,
            purge_token,
        }
    }
}

/// Session manager binding the identity provider to local profiles
#[derive(Clone)]
pub struct SessionManager {
    identity: Arc<dyn IdentityProvider>,
    users: UserRepository,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(identity: Arc<dyn IdentityProvider>, users: UserRepository) -> Self {
        Self { identity, users }
    }

    /// Authenticate with email and password.
    ///
    /// Local validation runs first to avoid a network round-trip on malformed
    /// input. Either both the identity and the profile resolve, or the whole
    /// call fails; callers never see a half-authenticated state.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(User, String), ApiError> {
        validation::validate_email(email).map_err(ApiError::Validation)?;
        validation::validate_login_password(password).map_err(ApiError::Validation)?;

        info!("Authenticating {email}");
        let signed_in = self.identity.sign_in_with_password(email, password).await?;

        match self.users.find_by_id(signed_in.user.id).await {
            Ok(Some(user)) => Ok((user, signed_in.access_token)),
            Ok(None) => Err(ApiError::Auth("Failed to retrieve user data".to_string())),
            Err(err) => {
                error!("Profile lookup failed after sign-in: {err}");
                Err(ApiError::Auth("Failed to retrieve user data".to_string()))
            }
        }
    }

    /// Register a new user and create the profile projection.
    ///
    /// The token is `None` when the provider defers the session until email
    /// confirmation; that is still a successful registration. A profile insert
    /// failure after the credential was created leaves an orphaned credential:
    /// an accepted inconsistency window, reported as a duplicate email.
    pub async fn register(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        password: &str,
    ) -> Result<(User, Option<String>), ApiError> {
        validation::validate_email(email).map_err(ApiError::Validation)?;
        validation::validate_name(first_name, "First name").map_err(ApiError::Validation)?;
        validation::validate_name(last_name, "Last name").map_err(ApiError::Validation)?;
        validation::validate_registration_password(password).map_err(ApiError::Validation)?;

        info!("Registering {email}");
        let signed_up = self.identity.sign_up(email, password).await?;

        let profile = NewUser {
            id: signed_up.user.id,
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        };

        match self.users.create(&profile).await {
            Ok(user) => Ok((user, signed_up.access_token)),
            Err(err) => {
                error!("Profile insert failed for {email}: {err}");
                Err(ApiError::Conflict(
                    "Failed to create user profile. Duplicate email found.".to_string(),
                ))
            }
        }
    }

    /// Invalidate the provider-side session, best-effort.
    ///
    /// A provider failure is logged and swallowed so the caller still ends up
    /// locally logged out once the cookie is cleared.
    pub async fn terminate(&self, token: &str) {
        info!("Terminating session");
        if let Err(err) = self.identity.sign_out(token).await {
            error!("Provider sign-out failed: {err}");
        }
    }

    /// Exchange a bearer token for the full user profile.
    ///
    /// Any failure resolves to "no user", never an error. `purge_token` marks
    /// tokens the provider itself rejected so the stale cookie can be dropped;
    /// transient provider outages leave the cookie alone.
    pub async fn validate(&self, token: Option<&str>) -> SessionCheck {
        let Some(token) = token else {
            return SessionCheck::no_user(false);
        };

        let identity = match self.identity.get_user(token).await {
            Ok(identity) => identity,
            Err(IdentityError::Rejected(reason)) => {
                info!("Stale session token: {reason}");
                return SessionCheck::no_user(true);
            }
            Err(IdentityError::Unavailable(detail)) => {
                error!("Session validation unavailable: {detail}");
                return SessionCheck::no_user(false);
            }
        };

        match self.users.find_by_id(identity.id).await {
            Ok(Some(user)) => SessionCheck {
                user: Some(user),
                purge_token: false,
            },
            Ok(None) => {
                info!("No profile row for identity {}", identity.email);
                SessionCheck::no_user(false)
            }
            Err(err) => {
                error!("Profile lookup failed during validation: {err}");
                SessionCheck::no_user(false)
            }
        }
    }
}

/// Session cookie bound to the bearer token
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::days(SESSION_TTL_DAYS))
        .build()
}

/// Removal cookie for a terminated or stale session
pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}
