use crate::helpers::client_ip::client_ip;
use crate::helpers::rate_limit::RateLimiter;
use crate::ingest::NotificationIngestor;
use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use extractors::MAX_TEXT_LEN;
use shared_types::WebhookPayload;
use std::sync::Arc;

const WEBHOOK_LIMIT: u32 = 100;
const WEBHOOK_WINDOW_SECS: i64 = 3600;

/// Receives free-text payment notifications from the banking bots. The body
/// is either JSON (`{"mensaje": "..."}`) or the raw notification text.
pub async fn receive_notification(
    req: HttpRequest,
    ingestor: web::Data<Arc<NotificationIngestor>>,
    limiter: web::Data<Arc<RateLimiter>>,
    body: web::Bytes,
) -> ActixResult<HttpResponse> {
    let ip = client_ip(&req);
    if !limiter
        .check("webhook", &ip, WEBHOOK_LIMIT, WEBHOOK_WINDOW_SECS)
        .await
    {
        return Err(actix_web::error::ErrorTooManyRequests("too many requests"));
    }

    let text = match serde_json::from_slice::<WebhookPayload>(&body) {
        Ok(payload) => payload.message.unwrap_or_default(),
        Err(_) => String::from_utf8_lossy(&body).into_owned(),
    };
    let text = text.trim();

    if text.chars().count() > MAX_TEXT_LEN {
        tracing::warn!(%ip, "webhook rejected for excessive size");
        return Ok(HttpResponse::BadRequest().body("message too large"));
    }

    let outcome = ingestor.ingest(text).await;
    if outcome.inserted > 0 || outcome.duplicates > 0 {
        tracing::info!(
            inserted = outcome.inserted,
            duplicates = outcome.duplicates,
            "webhook processed"
        );
    }

    // The sending bot treats any non-2xx as a delivery failure and retries,
    // so unrecognized text still acknowledges with 200.
    Ok(HttpResponse::Ok().body("OK"))
}
