use crate::payment_patterns::{create_bank_patterns, BankPattern, PatternSpec};
use crate::validation::{validate_amount, validate_reference};
use shared_types::PaymentCandidate;

/// Hard cap on sanitized input length; anything longer is dropped wholesale.
pub const MAX_TEXT_LEN: usize = 5000;

/// Stored excerpt of the original notification text.
const EXCERPT_LEN: usize = 500;

/// Sentinel sender when the profile's sender pattern finds nothing.
const UNKNOWN_SENDER: &str = "S/D";

/// Amount substituted when the profile's amount pattern finds nothing. It
/// never survives validation, so an amount-less notification yields no
/// candidate.
const ZERO_AMOUNT: &str = "0,00";

/// Matches free-text payment notifications against the bank profile table and
/// returns the candidates that pass field validation.
///
/// Pure and synchronous: no I/O, no shared state, safe to call from any
/// number of tasks. A malformed field drops that profile's candidate; it
/// never aborts evaluation of the remaining profiles.
pub struct PaymentNotificationExtractor {
    patterns: Vec<BankPattern>,
}

impl PaymentNotificationExtractor {
    pub fn new() -> Self {
        Self {
            patterns: create_bank_patterns(),
        }
    }

    /// Built-in profiles followed by `extra`, preserving declaration order.
    pub fn with_extra_patterns(extra: &[PatternSpec]) -> anyhow::Result<Self> {
        let mut patterns = create_bank_patterns();
        for spec in extra {
            patterns.push(BankPattern::compile(spec)?);
        }
        Ok(Self { patterns })
    }

    /// Extracts zero or more payment candidates from `text`, one per matching
    /// bank profile, in profile table order.
    pub fn extract(&self, text: &str) -> Vec<PaymentCandidate> {
        let clean = sanitize(text);
        if clean.chars().count() > MAX_TEXT_LEN {
            return Vec::new();
        }

        let mut candidates = Vec::new();
        for pattern in &self.patterns {
            if !pattern.key.is_match(&clean) {
                continue;
            }

            // A profile that cannot produce a reference yields nothing.
            let reference = match pattern
                .reference
                .captures(&clean)
                .and_then(|caps| caps.get(1))
            {
                Some(m) => m.as_str().trim().to_string(),
                None => continue,
            };
            if !validate_reference(&reference) {
                continue;
            }

            let amount = pattern
                .amount
                .captures(&clean)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| ZERO_AMOUNT.to_string());
            if !validate_amount(&amount) {
                continue;
            }

            let sender = pattern
                .sender
                .captures(&clean)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_else(|| UNKNOWN_SENDER.to_string());

            candidates.push(PaymentCandidate {
                bank: pattern.bank,
                sender,
                amount,
                reference,
                raw_excerpt: truncate_chars(&clean, EXCERPT_LEN),
            });
        }

        candidates
    }
}

impl Default for PaymentNotificationExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Strips quote characters, collapses literal and escaped newlines to spaces
/// and trims the result.
fn sanitize(text: &str) -> String {
    text.replace('"', "")
        .replace("\\n", " ")
        .replace('\n', " ")
        .trim()
        .to_string()
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::Bank;

    #[test]
    fn extracts_bdv_pagomovil_notification() {
        let extractor = PaymentNotificationExtractor::new();
        let text = "Pagomovil BDV: Le informamos que recibió un pago de Bs. 150,50 \
                    desde el tlf 04121234567. Ref: 123456789012";

        let candidates = extractor.extract(text);

        assert_eq!(candidates.len(), 1);
        let candidate = &candidates[0];
        assert_eq!(candidate.bank, Bank::Bdv);
        assert_eq!(candidate.amount, "150,50");
        assert_eq!(candidate.reference, "123456789012");
        assert_eq!(candidate.sender, "04121234567");
    }

    #[test]
    fn extracts_binance_order() {
        let extractor = PaymentNotificationExtractor::new();
        let text = "Binance P2P: received 25.50 USDT from mariap Order: 20038475660";

        let candidates = extractor.extract(text);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].bank, Bank::Binance);
        assert_eq!(candidates[0].reference, "20038475660");
    }

    #[test]
    fn oversized_input_yields_nothing() {
        let extractor = PaymentNotificationExtractor::new();
        let mut text = String::from("BDV pago Bs. 150,50 tlf 04125556677 Ref: 123456789 ");
        text.push_str(&"x".repeat(MAX_TEXT_LEN));

        assert!(extractor.extract(&text).is_empty());
    }

    #[test]
    fn missing_reference_yields_nothing() {
        let extractor = PaymentNotificationExtractor::new();
        let text = "BDV pago de Bs. 150,50 desde el tlf 04121234567";

        assert!(extractor.extract(text).is_empty());
    }

    #[test]
    fn short_or_malformed_reference_is_rejected() {
        let extractor = PaymentNotificationExtractor::new();

        // 5 digits: below the minimum length.
        assert!(extractor
            .extract("BDV pago Bs. 150,50 tlf 04121234567 Ref: 12345")
            .is_empty());
        // 21 digits: above the maximum length.
        assert!(extractor
            .extract("BDV pago Bs. 150,50 tlf 04121234567 Ref: 123456789012345678901")
            .is_empty());
    }

    #[test]
    fn out_of_range_amount_is_rejected() {
        let extractor = PaymentNotificationExtractor::new();
        let text = "BDV pago de Bs. 1000000000,00 tlf 04121234567 Ref: 123456789";

        assert!(extractor.extract(text).is_empty());
    }

    #[test]
    fn absent_amount_falls_back_to_zero_and_is_rejected() {
        let extractor = PaymentNotificationExtractor::new();
        let text = "Banesco te informa: transferencia recibida tlf 04141112233 Ref: 99887766";

        assert!(extractor.extract(text).is_empty());
    }

    #[test]
    fn multi_bank_text_emits_one_candidate_per_profile() {
        let extractor = PaymentNotificationExtractor::new();
        let text = "Aviso BDV Banesco Monto: 250,00 tlf 04145556677 Ref: 555666777";

        let candidates = extractor.extract(text);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].bank, Bank::Bdv);
        assert_eq!(candidates[1].bank, Bank::Banesco);
        assert_eq!(candidates[0].reference, candidates[1].reference);
    }

    #[test]
    fn extraction_is_idempotent() {
        let extractor = PaymentNotificationExtractor::new();
        let text = "Pagomovil BDV Bs. 420,00 desde el tlf 04268889900 Ref: 775533119";

        let first = extractor.extract(text);
        let second = extractor.extract(text);

        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn sanitizes_quotes_and_newlines() {
        let extractor = PaymentNotificationExtractor::new();
        let text = "\"BDV pago\\npor Bs. 88,20\ntlf 04160001122 Ref: 246813579\"";

        let candidates = extractor.extract(text);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].amount, "88,20");
        assert!(!candidates[0].raw_excerpt.contains('"'));
        assert!(!candidates[0].raw_excerpt.contains('\n'));
    }

    #[test]
    fn excerpt_is_bounded() {
        let extractor = PaymentNotificationExtractor::new();
        let mut text = String::from("BDV pago Bs. 150,50 tlf 04125556677 Ref: 123456789 ");
        text.push_str(&"relleno ".repeat(200));

        let candidates = extractor.extract(&text);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].raw_excerpt.chars().count(), 500);
    }

    #[test]
    fn missing_sender_uses_sentinel() {
        let extractor = PaymentNotificationExtractor::new();
        let text = "SOFITASA abono Bs. 300,00 Ref: 112233445";

        let candidates = extractor.extract(text);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].sender, "S/D");
    }

    #[test]
    fn extra_patterns_extend_the_table() {
        let spec = PatternSpec {
            bank: Bank::Nequi,
            key: "Nequi".into(),
            sender: r"de\s+(\d+)".into(),
            amount: r"\$\s*([\d,.]+)".into(),
            reference: r"Ref[:\s]*(\d+)".into(),
        };
        let extractor = PaymentNotificationExtractor::with_extra_patterns(&[spec]).unwrap();
        let text = "Nequi: recibiste $ 45.000 de 3001234567 Ref: 887766554";

        let candidates = extractor.extract(text);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].bank, Bank::Nequi);
        assert_eq!(candidates[0].sender, "3001234567");
    }
}
