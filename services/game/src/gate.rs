//! Session gate for navigation requests
//!
//! Pure redirect policy on cookie presence only. It never validates the token;
//! authenticity is checked by the session manager on first protected-page load.
//! Runs on every request, so it must stay free of external calls.

use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::session::SESSION_COOKIE;

/// Protected game route prefix
pub const GAME_ROUTE: &str = "/game";
/// Public landing route
pub const LANDING_ROUTE: &str = "/";

/// Outcome of the gate for one navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(&'static str),
}

/// Game route matcher: the route itself or any subpath under it, but not
/// sibling paths sharing the prefix (`/gamepad`)
fn is_game_route(path: &str) -> bool {
    match path.strip_prefix(GAME_ROUTE) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Decide whether a navigation may proceed.
///
/// Unauthenticated callers are bounced off the game routes; callers already
/// carrying a session token are bounced off the landing page.
pub fn decide(path: &str, has_session_token: bool) -> RouteDecision {
    if is_game_route(path) && !has_session_token {
        RouteDecision::Redirect(LANDING_ROUTE)
    } else if path == LANDING_ROUTE && has_session_token {
        RouteDecision::Redirect(GAME_ROUTE)
    } else {
        RouteDecision::Allow
    }
}

/// Gate middleware, layered over the whole router
pub async fn route_gate(jar: CookieJar, req: Request<Body>, next: Next) -> Response {
    let has_token = jar.get(SESSION_COOKIE).is_some();
    match decide(req.uri().path(), has_token) {
        RouteDecision::Allow => next.run(req).await,
        RouteDecision::Redirect(target) => Redirect::temporary(target).into_response(),
    }
}
