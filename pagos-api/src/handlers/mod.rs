pub mod auth;
pub mod payments;
pub mod verify;
pub mod webhook;

/// Storage and other infrastructure failures surface to callers as a generic
/// 500; the detail goes to the log only.
pub(crate) fn storage_error(e: anyhow::Error) -> actix_web::Error {
    tracing::error!(error = %e, "storage failure");
    actix_web::error::ErrorInternalServerError("error processing request")
}
