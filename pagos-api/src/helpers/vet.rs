use chrono::{DateTime, FixedOffset, Utc};

/// Venezuela does not observe DST; a fixed UTC-4 offset is exact.
fn vet_offset() -> FixedOffset {
    FixedOffset::west_opt(4 * 3600).expect("UTC-4 is a valid offset")
}

pub fn now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&vet_offset())
}

/// (date, time) pair stored with a freshly received payment.
pub fn reception_stamps() -> (String, String) {
    let now = now();
    (
        now.format("%d/%m/%Y").to_string(),
        now.format("%I:%M %p").to_string(),
    )
}

/// Combined stamp recorded when a payment is redeemed.
pub fn action_stamp() -> String {
    now().format("%d/%m/%Y %I:%M %p").to_string()
}
