use crate::config::ApiConfig;
use crate::helpers::client_ip::client_ip;
use crate::helpers::pin;
use crate::helpers::rate_limit::RateLimiter;
use crate::helpers::session::SessionManager;
use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use shared_types::{LoginRequest, LoginResponse};
use std::sync::Arc;

const LOGIN_LIMIT: u32 = 5;
const LOGIN_WINDOW_SECS: i64 = 60;

pub async fn login(
    req: HttpRequest,
    config: web::Data<Arc<ApiConfig>>,
    sessions: web::Data<Arc<SessionManager>>,
    limiter: web::Data<Arc<RateLimiter>>,
    body: web::Json<LoginRequest>,
) -> ActixResult<HttpResponse> {
    let ip = client_ip(&req);
    if !limiter.check("login", &ip, LOGIN_LIMIT, LOGIN_WINDOW_SECS).await {
        return Err(actix_web::error::ErrorTooManyRequests(
            "too many login attempts",
        ));
    }

    let Some(admin) = config.admin.as_ref() else {
        tracing::error!("login attempted but no admin PIN is configured");
        return Err(actix_web::error::ErrorInternalServerError(
            "admin access not configured",
        ));
    };

    if !pin::verify_pin(&admin.pin_hash, body.pin.trim()) {
        tracing::warn!(%ip, "failed login attempt");
        return Err(actix_web::error::ErrorUnauthorized("invalid PIN"));
    }

    let (token, expires_at) = sessions.create().await;
    tracing::info!("admin login");

    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        expires_at: expires_at.timestamp(),
    }))
}

pub async fn logout(
    req: HttpRequest,
    sessions: web::Data<Arc<SessionManager>>,
) -> ActixResult<HttpResponse> {
    if let Some(token) = bearer_token(&req) {
        sessions.revoke(token).await;
        tracing::info!("admin logout");
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })))
}

/// Guard for the admin endpoints: a valid bearer token is required.
pub async fn require_admin(req: &HttpRequest, sessions: &SessionManager) -> ActixResult<()> {
    match bearer_token(req) {
        Some(token) if sessions.is_valid(token).await => Ok(()),
        _ => Err(actix_web::error::ErrorUnauthorized(
            "authentication required",
        )),
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}
