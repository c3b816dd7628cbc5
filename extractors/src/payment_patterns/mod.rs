mod extractor;

pub use extractor::{PaymentNotificationExtractor, MAX_TEXT_LEN};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use shared_types::Bank;

/// A compiled bank profile. The key pattern decides whether the profile
/// applies to a piece of text; the other three each carry exactly one capture
/// group for the field they extract.
pub struct BankPattern {
    pub bank: Bank,
    pub key: Regex,
    pub sender: Regex,
    pub amount: Regex,
    pub reference: Regex,
}

/// Declarative form of a bank profile, e.g. supplied through the API config.
/// Extra profiles are evaluated after the built-in table, in declaration
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSpec {
    pub bank: Bank,
    pub key: String,
    pub sender: String,
    pub amount: String,
    pub reference: String,
}

impl BankPattern {
    pub fn compile(spec: &PatternSpec) -> anyhow::Result<Self> {
        Ok(Self {
            bank: spec.bank,
            key: case_insensitive(&spec.key)?,
            sender: case_insensitive(&spec.sender)?,
            amount: case_insensitive(&spec.amount)?,
            reference: case_insensitive(&spec.reference)?,
        })
    }
}

fn case_insensitive(pattern: &str) -> anyhow::Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| anyhow::anyhow!("invalid pattern {pattern:?}: {e}"))
}

fn profile(bank: Bank, key: &str, sender: &str, amount: &str, reference: &str) -> BankPattern {
    BankPattern {
        bank,
        key: case_insensitive(key).unwrap(),
        sender: case_insensitive(sender).unwrap(),
        amount: case_insensitive(amount).unwrap(),
        reference: case_insensitive(reference).unwrap(),
    }
}

/// The built-in bank profile table, in evaluation order. Adding a bank means
/// adding one entry here (or one `[[patterns]]` entry in the API config).
pub(crate) fn create_bank_patterns() -> Vec<BankPattern> {
    vec![
        profile(
            Bank::Bdv,
            r"BDV|PagomovilBDV",
            r"(?:del|tlf|desde el tlf)\s*(\d+)",
            r"(?:por|Bs\.?|Monto:)\s*([\d.]+,\d{2})",
            r"Ref:\s*(\d+)",
        ),
        profile(
            Bank::Banesco,
            r"Banesco",
            r"(?:de|desde|tlf)\s*(\d+)",
            r"(?:Bs\.?|Monto:?)\s*([\d.]+,\d{2})",
            r"Ref:\s*(\d+)",
        ),
        profile(
            Bank::Sofitasa,
            r"SOFITASA",
            r"Telf\.?([\d*]+)",
            r"Bs\.?\s*([\d,.]+)",
            r"Ref[:\s]*(\d+)",
        ),
        profile(
            Bank::Binance,
            r"Binance",
            r"(?:from|de)\s+(.*?)\s",
            r"([\d.]+)\s*USDT",
            r"(?:ID|Order)[:\s]+(\d+)",
        ),
        profile(
            Bank::Plaza,
            r"Plaza",
            r"Celular\s+([\d]+)",
            r"(?:BS\.?|por)\s*([\d,.]+)",
            r"Ref[\.:]\s*(\d+)",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_profiles_compile() {
        let patterns = create_bank_patterns();
        assert_eq!(patterns.len(), 5);
        assert_eq!(patterns[0].bank, Bank::Bdv);
        assert_eq!(patterns[4].bank, Bank::Plaza);
    }

    #[test]
    fn key_patterns_are_case_insensitive() {
        let patterns = create_bank_patterns();
        assert!(patterns[0].key.is_match("pagomovilbdv"));
        assert!(patterns[1].key.is_match("BANESCO te informa"));
        assert!(patterns[3].key.is_match("binance p2p"));
    }

    #[test]
    fn spec_compile_rejects_bad_regex() {
        let spec = PatternSpec {
            bank: Bank::Nequi,
            key: "Nequi".into(),
            sender: "(".into(),
            amount: r"\$([\d,.]+)".into(),
            reference: r"Ref[:\s]*(\d+)".into(),
        };
        assert!(BankPattern::compile(&spec).is_err());
    }
}
