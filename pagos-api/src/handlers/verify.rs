use crate::database::{payments as payments_db, Database};
use crate::handlers::storage_error;
use crate::helpers::client_ip::client_ip;
use crate::helpers::rate_limit::RateLimiter;
use crate::helpers::vet;
use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use extractors::validation;
use shared_types::{PaymentState, RedeemedDetails, VerificationOutcome, VerifyRequest};
use std::sync::Arc;

const VERIFY_LIMIT: u32 = 10;
const VERIFY_WINDOW_SECS: i64 = 60;

/// Customer-facing verification: match a reference (full or 6-digit suffix)
/// and bind it to an order code.
pub async fn verify_payment(
    req: HttpRequest,
    db: web::Data<Arc<Database>>,
    limiter: web::Data<Arc<RateLimiter>>,
    body: web::Json<VerifyRequest>,
) -> ActixResult<HttpResponse> {
    let ip = client_ip(&req);
    if !limiter.check("verify", &ip, VERIFY_LIMIT, VERIFY_WINDOW_SECS).await {
        return Err(actix_web::error::ErrorTooManyRequests("too many requests"));
    }

    let reference = body.reference.trim().to_string();
    let order_code = body.order_code.trim().to_string();

    if reference.len() < 6 {
        return Ok(
            HttpResponse::BadRequest().json(VerificationOutcome::InvalidInput {
                message: "reference must be at least 6 characters".to_string(),
            }),
        );
    }
    if !validation::validate_order_code(&order_code) {
        return Ok(
            HttpResponse::BadRequest().json(VerificationOutcome::InvalidInput {
                message: "order code is not valid".to_string(),
            }),
        );
    }

    let matches = payments_db::find_matches(db.async_connection.clone(), &reference)
        .await
        .map_err(storage_error)?;

    let outcome = match matches.as_slice() {
        [] => VerificationOutcome::NotFound,
        [payment] => {
            if payment.state == PaymentState::Redeemed {
                VerificationOutcome::AlreadyRedeemed
            } else {
                let redeemed_at = vet::action_stamp();
                let redeemed = payments_db::redeem_payment(
                    db.async_connection.clone(),
                    payment.id,
                    &order_code,
                    &redeemed_at,
                    &ip,
                )
                .await
                .map_err(storage_error)?;

                if redeemed {
                    tracing::info!(
                        reference = %payment.reference,
                        order_code = %order_code,
                        "payment redeemed"
                    );
                    VerificationOutcome::Redeemed {
                        payment: RedeemedDetails {
                            bank: payment.bank.clone(),
                            amount: payment.amount.clone(),
                            reference: payment.reference.clone(),
                            order_code,
                            redeemed_at,
                            redeemed_ip: ip,
                        },
                    }
                } else {
                    // Lost the race: a concurrent verification redeemed it
                    // between the lookup and the conditional update.
                    VerificationOutcome::AlreadyRedeemed
                }
            }
        }
        many => VerificationOutcome::Ambiguous {
            matches: many.len(),
        },
    };

    Ok(HttpResponse::Ok().json(outcome))
}
