//! Field validators shared by the extractor and the administrative endpoints.
//!
//! All functions here are total: any malformed input yields `false`/`None`,
//! never an error.

const MIN_AMOUNT: f64 = 0.01;
const MAX_AMOUNT: f64 = 999_999_999.99;

/// A payment reference: trimmed, 6-20 characters, ASCII alphanumeric only.
pub fn validate_reference(reference: &str) -> bool {
    let reference = reference.trim();
    if reference.len() < 6 || reference.len() > 20 {
        return false;
    }
    reference.chars().all(|c| c.is_ascii_alphanumeric())
}

/// An order code ("comanda"): trimmed, 1-50 characters, alphanumeric plus
/// `-` and `#`.
pub fn validate_order_code(code: &str) -> bool {
    let code = code.trim();
    if code.is_empty() || code.len() > 50 {
        return false;
    }
    code.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '#')
}

/// Parses a local-format amount: `.` is a thousands separator and is removed,
/// `,` is the decimal separator.
pub fn parse_amount(amount: &str) -> Option<f64> {
    let normalized = amount.trim().replace('.', "").replace(',', ".");
    normalized.parse::<f64>().ok()
}

/// True iff the amount normalizes to a number in [0.01, 999999999.99].
pub fn validate_amount(amount: &str) -> bool {
    match parse_amount(amount) {
        Some(value) => (MIN_AMOUNT..=MAX_AMOUNT).contains(&value),
        None => false,
    }
}

/// Parses an amount the way the totals aggregation reads stored rows: local
/// format when the string carries a `,` decimal separator, plain decimal
/// otherwise.
pub fn parse_stored_amount(amount: &str) -> Option<f64> {
    let amount = amount.trim();
    if amount.contains(',') {
        parse_amount(amount)
    } else {
        amount.parse::<f64>().ok()
    }
}
