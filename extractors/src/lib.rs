//! Extractors Crate
//!
//! Turns raw bank notification text into validated structured payment
//! candidates. Parsing is driven by a declarative per-bank pattern table;
//! everything here is pure and performs no I/O.
//!
//! # Architecture
//!
//! - **Types**: `PaymentCandidate` and the bank tags live in the
//!   `shared-types` crate
//! - **Implementations**: the pattern table and extractor live here
//!
//! # Example
//!
//! ```rust,ignore
//! use extractors::PaymentNotificationExtractor;
//!
//! let extractor = PaymentNotificationExtractor::new();
//! let candidates = extractor.extract(notification_text);
//! ```

pub mod payment_patterns;
pub mod validation;

// Re-export commonly used types
pub use payment_patterns::{PatternSpec, PaymentNotificationExtractor, MAX_TEXT_LEN};
