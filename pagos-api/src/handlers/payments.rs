use crate::config::ApiConfig;
use crate::database::{payments as payments_db, Database};
use crate::handlers::{auth, storage_error};
use crate::helpers::client_ip::client_ip;
use crate::helpers::pin;
use crate::helpers::session::SessionManager;
use crate::helpers::vet;
use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use extractors::validation;
use serde::Deserialize;
use shared_types::{
    ListPaymentsRequest, ListPaymentsResponse, PageInfo, PaymentRecord, PinActionRequest,
};
use std::sync::Arc;

const DEFAULT_PER_PAGE: u32 = 50;
const PER_PAGE_CHOICES: [u32; 4] = [25, 50, 100, 200];
const EXPORT_LIMIT: u32 = 5000;

pub async fn list_payments(
    req: HttpRequest,
    db: web::Data<Arc<Database>>,
    sessions: web::Data<Arc<SessionManager>>,
    query: web::Query<ListPaymentsRequest>,
) -> ActixResult<HttpResponse> {
    auth::require_admin(&req, &sessions).await?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query
        .per_page
        .filter(|p| PER_PAGE_CHOICES.contains(p))
        .unwrap_or(DEFAULT_PER_PAGE);
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let total_records = payments_db::count_payments(db.async_connection.clone(), search)
        .await
        .map_err(storage_error)?;
    let total_pages = if total_records > 0 {
        (total_records + per_page as u64 - 1) / per_page as u64
    } else {
        1
    };

    let offset = (page as u64 - 1) * per_page as u64;
    let payments = payments_db::list_payments(db.async_connection.clone(), search, per_page, offset)
        .await
        .map_err(storage_error)?;

    let pagination = PageInfo {
        page,
        per_page,
        total_records,
        total_pages,
        has_previous: page > 1,
        has_next: (page as u64) < total_pages,
        first_record: if total_records > 0 { offset + 1 } else { 0 },
        last_record: (offset + per_page as u64).min(total_records),
        search: search.map(str::to_string),
    };

    Ok(HttpResponse::Ok().json(ListPaymentsResponse {
        payments,
        pagination,
    }))
}

#[derive(Deserialize)]
pub struct SummaryQuery {
    search: Option<String>,
}

/// Totals over every matching record, not just one page.
pub async fn get_summary(
    req: HttpRequest,
    db: web::Data<Arc<Database>>,
    sessions: web::Data<Arc<SessionManager>>,
    query: web::Query<SummaryQuery>,
) -> ActixResult<HttpResponse> {
    auth::require_admin(&req, &sessions).await?;

    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let totals = payments_db::payment_totals(db.async_connection.clone(), search)
        .await
        .map_err(storage_error)?;

    Ok(HttpResponse::Ok().json(totals))
}

pub async fn export_payments(
    req: HttpRequest,
    db: web::Data<Arc<Database>>,
    sessions: web::Data<Arc<SessionManager>>,
) -> ActixResult<HttpResponse> {
    auth::require_admin(&req, &sessions).await?;

    let payments = payments_db::list_payments(db.async_connection.clone(), None, EXPORT_LIMIT, 0)
        .await
        .map_err(storage_error)?;

    let data = render_csv(&payments).map_err(storage_error)?;
    let filename = format!("payments_report_{}.csv", vet::now().format("%Y%m%d_%H%M%S"));

    tracing::info!(records = payments.len(), "export generated");

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{filename}\""),
        ))
        .body(data))
}

pub async fn release_payment(
    req: HttpRequest,
    db: web::Data<Arc<Database>>,
    sessions: web::Data<Arc<SessionManager>>,
    config: web::Data<Arc<ApiConfig>>,
    path: web::Path<String>,
    body: web::Json<PinActionRequest>,
) -> ActixResult<HttpResponse> {
    auth::require_admin(&req, &sessions).await?;
    confirm_pin(&req, &config, &body.pin)?;

    let reference = path.into_inner();
    if !validation::validate_reference(&reference) {
        return Err(actix_web::error::ErrorBadRequest("invalid reference"));
    }

    let released = payments_db::release_payment(db.async_connection.clone(), &reference)
        .await
        .map_err(storage_error)?;
    if !released {
        return Err(actix_web::error::ErrorNotFound("reference not found"));
    }

    tracing::info!(%reference, "payment released");
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "released",
        "reference": reference
    })))
}

pub async fn delete_payment(
    req: HttpRequest,
    db: web::Data<Arc<Database>>,
    sessions: web::Data<Arc<SessionManager>>,
    config: web::Data<Arc<ApiConfig>>,
    path: web::Path<String>,
    body: web::Json<PinActionRequest>,
) -> ActixResult<HttpResponse> {
    auth::require_admin(&req, &sessions).await?;
    confirm_pin(&req, &config, &body.pin)?;

    let reference = path.into_inner();
    if !validation::validate_reference(&reference) {
        return Err(actix_web::error::ErrorBadRequest("invalid reference"));
    }

    let deleted = payments_db::delete_payment(db.async_connection.clone(), &reference)
        .await
        .map_err(storage_error)?;
    if !deleted {
        return Err(actix_web::error::ErrorNotFound("reference not found"));
    }

    tracing::info!(%reference, "payment deleted");
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "deleted",
        "reference": reference
    })))
}

/// Release and delete re-confirm the PIN even with a valid session.
fn confirm_pin(req: &HttpRequest, config: &ApiConfig, pin_input: &str) -> ActixResult<()> {
    let Some(admin) = config.admin.as_ref() else {
        return Err(actix_web::error::ErrorInternalServerError(
            "admin access not configured",
        ));
    };
    if !pin::verify_pin(&admin.pin_hash, pin_input.trim()) {
        tracing::warn!(ip = %client_ip(req), "destructive action with wrong PIN");
        return Err(actix_web::error::ErrorUnauthorized("invalid PIN"));
    }
    Ok(())
}

fn render_csv(payments: &[PaymentRecord]) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "id",
        "received_date",
        "received_time",
        "sender",
        "amount",
        "reference",
        "full_message",
        "bank",
        "state",
        "order_code",
        "redeemed_at",
        "redeemed_ip",
    ])?;

    for p in payments {
        writer.write_record([
            p.id.to_string().as_str(),
            p.received_date.as_str(),
            p.received_time.as_str(),
            p.sender.as_str(),
            p.amount.as_str(),
            p.reference.as_str(),
            p.full_message.as_str(),
            p.bank.as_str(),
            p.state.as_str(),
            p.order_code.as_deref().unwrap_or(""),
            p.redeemed_at.as_deref().unwrap_or(""),
            p.redeemed_ip.as_deref().unwrap_or(""),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("csv flush failed: {e}"))
}
