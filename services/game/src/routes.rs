//! Game-action surface
//!
//! Plain JSON request/response handlers over the core operations. Every
//! operation that needs the session receives the token explicitly from the
//! cookie jar; nothing reads ambient global state.

use axum::{
    Json, Router,
    extract::{Path, State},
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState, database,
    error::{ApiError, ApiResult},
    gate,
    models::{Prize, User, WinRecord},
    session, wheel,
};

/// Request for user login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request for user registration
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

/// Response for login and registration
#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: User,
    /// Absent when registration succeeded but the provider deferred the
    /// session until email confirmation
    pub redirect_to: Option<String>,
}

/// Response for logout
#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub redirect_to: String,
}

/// Response for session validation
#[derive(Serialize)]
pub struct SessionResponse {
    pub user: Option<User>,
}

/// Game view payload: the authenticated user plus a fresh catalog read
#[derive(Serialize)]
pub struct GameView {
    pub user: User,
    pub prizes: Vec<Prize>,
}

/// Request for a spin; the client tracks its cumulative wheel rotation
#[derive(Deserialize)]
pub struct SpinRequest {
    #[serde(default)]
    pub current_rotation: f64,
}

/// Response for a spin
#[derive(Serialize)]
pub struct SpinResponse {
    pub prize: Prize,
    /// Cumulative rotation the wheel should animate to
    pub rotation: f64,
    /// Recorded win with its redemption code; `None` for the no-win outcome
    pub win: Option<WinRecord>,
}

/// Response for a claim
#[derive(Serialize)]
pub struct ClaimResponse {
    pub success: bool,
}

/// Create the router for the game service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing))
        .route("/health", get(health_check))
        .route("/game", get(game_view))
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
        .route("/auth/session", get(current_session))
        .route("/prizes", get(list_prizes))
        .route("/spin", post(spin))
        .route("/wins", get(list_wins))
        .route("/wins/:id/claim", post(claim))
        .fallback(not_found)
        .layer(middleware::from_fn(gate::route_gate))
        .with_state(state)
}

/// Fallback for unknown paths
async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Public landing route
pub async fn landing() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "game",
        "status": "ok"
    }))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database_up = database::health_check(&state.db_pool).await.unwrap_or(false);
    Json(serde_json::json!({
        "status": if database_up { "ok" } else { "degraded" },
        "service": "game"
    }))
}

/// Resolve the session's user for a protected operation
async fn current_user(state: &AppState, jar: &CookieJar) -> ApiResult<User> {
    let token = jar
        .get(session::SESSION_COOKIE)
        .map(|c| c.value().to_string());
    let check = state.sessions.validate(token.as_deref()).await;
    check.user.ok_or(ApiError::Unauthorized)
}

/// Protected game view: validated user plus the prize catalog
pub async fn game_view(State(state): State<AppState>, jar: CookieJar) -> Response {
    let token = jar
        .get(session::SESSION_COOKIE)
        .map(|c| c.value().to_string());
    let check = state.sessions.validate(token.as_deref()).await;

    let Some(user) = check.user else {
        // The gate only checks cookie presence; a stale token lands here.
        // Drop it and send the caller back to the landing page.
        let jar = if check.purge_token {
            jar.remove(session::clear_session_cookie())
        } else {
            jar
        };
        return (jar, Redirect::temporary(gate::LANDING_ROUTE)).into_response();
    };

    match state.prizes.list().await {
        Ok(prizes) => (jar, Json(GameView { user, prizes })).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Response> {
    info!("Login attempt for {}", payload.email);

    let (user, token) = state
        .sessions
        .authenticate(&payload.email, &payload.password)
        .await?;

    let jar = jar.add(session::session_cookie(token, state.secure_cookies));
    let response = AuthResponse {
        success: true,
        user,
        redirect_to: Some(gate::GAME_ROUTE.to_string()),
    };

    Ok((jar, Json(response)).into_response())
}

/// User registration endpoint
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Response> {
    info!("Registration attempt for {}", payload.email);

    let (user, token) = state
        .sessions
        .register(
            &payload.email,
            &payload.first_name,
            &payload.last_name,
            &payload.password,
        )
        .await?;

    let redirect_to = token.is_some().then(|| gate::GAME_ROUTE.to_string());
    let jar = match token {
        Some(token) => jar.add(session::session_cookie(token, state.secure_cookies)),
        None => jar,
    };

    let response = AuthResponse {
        success: true,
        user,
        redirect_to,
    };

    Ok((jar, Json(response)).into_response())
}

/// Logout endpoint; clears the cookie even when the provider call fails
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(session::SESSION_COOKIE) {
        state.sessions.terminate(cookie.value()).await;
    }

    let jar = jar.remove(session::clear_session_cookie());
    let response = LogoutResponse {
        success: true,
        redirect_to: gate::LANDING_ROUTE.to_string(),
    };

    (jar, Json(response)).into_response()
}

/// Session validation endpoint; drops the cookie when the token is stale
pub async fn current_session(State(state): State<AppState>, jar: CookieJar) -> Response {
    let token = jar
        .get(session::SESSION_COOKIE)
        .map(|c| c.value().to_string());
    let check = state.sessions.validate(token.as_deref()).await;

    let jar = if check.purge_token {
        jar.remove(session::clear_session_cookie())
    } else {
        jar
    };

    (jar, Json(SessionResponse { user: check.user })).into_response()
}

/// Prize catalog endpoint
pub async fn list_prizes(State(state): State<AppState>) -> ApiResult<Json<Vec<Prize>>> {
    Ok(Json(state.prizes.list().await?))
}

/// Spin endpoint: draw one outcome, compute the animation target, and persist
/// the win unless the no-win sentinel came up
pub async fn spin(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<SpinRequest>,
) -> ApiResult<Json<SpinResponse>> {
    let user = current_user(&state, &jar).await?;

    let catalog = state.prizes.list().await?;
    let index = wheel::select(&catalog, &mut rand::thread_rng())?;
    let rotation = wheel::spin_rotation(index, catalog.len(), payload.current_rotation);
    let prize = catalog[index].clone();

    let win = if prize.is_no_win() {
        None
    } else {
        Some(
            state
                .wins
                .record_win(user.id, prize.id, &prize.name)
                .await?,
        )
    };

    info!(
        "User {} spun {} ({})",
        user.id,
        prize.name,
        if win.is_some() { "win" } else { "no win" }
    );

    Ok(Json(SpinResponse {
        prize,
        rotation,
        win,
    }))
}

/// Win history endpoint, newest first
pub async fn list_wins(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<Json<Vec<WinRecord>>> {
    let user = current_user(&state, &jar).await?;
    Ok(Json(state.wins.list_wins(user.id).await?))
}

/// Claim endpoint, scoped to the session's user
pub async fn claim(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(win_id): Path<Uuid>,
) -> ApiResult<Json<ClaimResponse>> {
    let user = current_user(&state, &jar).await?;
    let success = state.wins.claim(win_id, user.id).await?;
    Ok(Json(ClaimResponse { success }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use sqlx::PgPool;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        identity::{IdentityError, IdentityProvider, IdentityUser, SignIn, SignUp},
        repositories::{PrizeRepository, UserRepository, WinRepository},
        session::SessionManager,
    };
    use async_trait::async_trait;

    struct RejectingProvider;

    #[async_trait]
    impl IdentityProvider for RejectingProvider {
        async fn sign_in_with_password(
            &self,
            _email: &str,
            _password: &str,
        ) -> Result<SignIn, IdentityError> {
            Err(IdentityError::Rejected(
                "Invalid login credentials".to_string(),
            ))
        }

        async fn sign_up(&self, _email: &str, _password: &str) -> Result<SignUp, IdentityError> {
            Err(IdentityError::Rejected("Signup disabled".to_string()))
        }

        async fn sign_out(&self, _token: &str) -> Result<(), IdentityError> {
            Ok(())
        }

        async fn get_user(&self, _token: &str) -> Result<IdentityUser, IdentityError> {
            Err(IdentityError::Rejected("invalid token".to_string()))
        }
    }

    fn test_router() -> Router {
        // Lazy pool: every asserted path resolves before touching the store
        let pool = PgPool::connect_lazy("postgres://localhost/game_test").unwrap();
        let sessions = SessionManager::new(
            Arc::new(RejectingProvider),
            UserRepository::new(pool.clone()),
        );
        create_router(AppState {
            db_pool: pool.clone(),
            sessions,
            prizes: PrizeRepository::new(pool.clone()),
            wins: WinRepository::new(pool),
            secure_cookies: false,
        })
    }

    #[tokio::test]
    async fn gate_redirects_game_routes_without_cookie() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/game/anything")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
    }

    #[tokio::test]
    async fn gate_redirects_landing_with_cookie() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::COOKIE, "session=some-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/game");
    }

    #[tokio::test]
    async fn unknown_paths_fall_through_to_not_found() {
        let response = test_router()
            .oneshot(Request::builder().uri("/other").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn spin_without_session_is_unauthorized() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/spin")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_with_malformed_email_is_rejected_without_cookie() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"email": "not-an-email", "password": "Secret123!"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn session_check_without_cookie_reports_no_user() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/auth/session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
