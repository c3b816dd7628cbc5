use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Banks recognized by the notification patterns. `Nequi` and `Bancolombia`
/// carry no built-in pattern; they exist because stored records can hold them
/// and the totals aggregation buckets them as COP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Bank {
    Bdv,
    Banesco,
    Sofitasa,
    Binance,
    Plaza,
    Nequi,
    Bancolombia,
}

/// Currency bucket a bank's amounts are aggregated under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Ves,
    Usd,
    Cop,
}

impl Bank {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bank::Bdv => "BDV",
            Bank::Banesco => "BANESCO",
            Bank::Sofitasa => "SOFITASA",
            Bank::Binance => "BINANCE",
            Bank::Plaza => "PLAZA",
            Bank::Nequi => "NEQUI",
            Bank::Bancolombia => "BANCOLOMBIA",
        }
    }

    /// Hardcoded bank-to-currency mapping carried over from production:
    /// Binance settles in USDT, the Colombian banks in COP, everything else
    /// in bolivars.
    pub fn currency(&self) -> Currency {
        match self {
            Bank::Binance => Currency::Usd,
            Bank::Nequi | Bank::Bancolombia => Currency::Cop,
            _ => Currency::Ves,
        }
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown bank: {0}")]
pub struct ParseBankError(pub String);

impl FromStr for Bank {
    type Err = ParseBankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BDV" => Ok(Bank::Bdv),
            "BANESCO" => Ok(Bank::Banesco),
            "SOFITASA" => Ok(Bank::Sofitasa),
            "BINANCE" => Ok(Bank::Binance),
            "PLAZA" => Ok(Bank::Plaza),
            "NEQUI" => Ok(Bank::Nequi),
            "BANCOLOMBIA" => Ok(Bank::Bancolombia),
            other => Err(ParseBankError(other.to_string())),
        }
    }
}

/// Lifecycle state of a stored payment: received-but-unclaimed vs claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentState {
    Free,
    Redeemed,
}

impl PaymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Free => "FREE",
            PaymentState::Redeemed => "REDEEMED",
        }
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown payment state: {0}")]
pub struct ParsePaymentStateError(pub String);

impl FromStr for PaymentState {
    type Err = ParsePaymentStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "FREE" => Ok(PaymentState::Free),
            "REDEEMED" => Ok(PaymentState::Redeemed),
            other => Err(ParsePaymentStateError(other.to_string())),
        }
    }
}

/// A payment extracted from notification text, prior to the uniqueness check
/// performed at the storage layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentCandidate {
    pub bank: Bank,
    /// Sender phone/account, or the `"S/D"` sentinel when the profile's
    /// sender pattern found nothing.
    pub sender: String,
    /// Amount string as captured, local format (`.` thousands, `,` decimals).
    pub amount: String,
    /// Alphanumeric, 6-20 chars; the natural key of the payment.
    pub reference: String,
    /// Sanitized notification text, truncated to a bounded length.
    pub raw_excerpt: String,
}

/// A persisted payment row. Reception and redemption stamps are stored as
/// pre-formatted Caracas-local strings, matching what operators see.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: i64,
    pub received_date: String,
    pub received_time: String,
    pub sender: String,
    pub amount: String,
    pub reference: String,
    pub full_message: String,
    /// Stored as text: legacy rows can carry bank tags the enum predates.
    pub bank: String,
    pub state: PaymentState,
    pub order_code: Option<String>,
    pub redeemed_at: Option<String>,
    pub redeemed_ip: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub reference: String,
    pub order_code: String,
}

/// Fields echoed back to the customer on a successful redemption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemedDetails {
    pub bank: String,
    pub amount: String,
    pub reference: String,
    pub order_code: String,
    pub redeemed_at: String,
    pub redeemed_ip: String,
}

/// Domain-level result of a verification attempt. Infrastructure failures are
/// never expressed here; they surface as a generic HTTP error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum VerificationOutcome {
    Redeemed { payment: RedeemedDetails },
    NotFound,
    /// Several records share the supplied suffix; the caller must retry with
    /// the full reference. No state was changed.
    Ambiguous { matches: usize },
    AlreadyRedeemed,
    InvalidInput { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPaymentsRequest {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: u32,
    pub per_page: u32,
    pub total_records: u64,
    pub total_pages: u64,
    pub has_previous: bool,
    pub has_next: bool,
    /// 1-based index of the first/last record on this page; both 0 when the
    /// listing is empty.
    pub first_record: u64,
    pub last_record: u64,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPaymentsResponse {
    pub payments: Vec<PaymentRecord>,
    pub pagination: PageInfo,
}

/// Sum of stored amounts per currency bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentTotals {
    pub bs: f64,
    pub usd: f64,
    pub cop: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Bank::Bdv).unwrap(), "\"BDV\"");
        assert_eq!(
            serde_json::to_string(&Bank::Bancolombia).unwrap(),
            "\"BANCOLOMBIA\""
        );
    }

    #[test]
    fn bank_round_trips_through_str() {
        for bank in [
            Bank::Bdv,
            Bank::Banesco,
            Bank::Sofitasa,
            Bank::Binance,
            Bank::Plaza,
            Bank::Nequi,
            Bank::Bancolombia,
        ] {
            assert_eq!(bank.as_str().parse::<Bank>().unwrap(), bank);
        }
        assert!("MERCANTIL".parse::<Bank>().is_err());
    }

    #[test]
    fn currency_buckets() {
        assert_eq!(Bank::Binance.currency(), Currency::Usd);
        assert_eq!(Bank::Nequi.currency(), Currency::Cop);
        assert_eq!(Bank::Bancolombia.currency(), Currency::Cop);
        assert_eq!(Bank::Bdv.currency(), Currency::Ves);
        assert_eq!(Bank::Plaza.currency(), Currency::Ves);
    }

    #[test]
    fn state_parses_case_insensitively() {
        assert_eq!("free".parse::<PaymentState>().unwrap(), PaymentState::Free);
        assert_eq!(
            "REDEEMED".parse::<PaymentState>().unwrap(),
            PaymentState::Redeemed
        );
        assert!("CANCELLED".parse::<PaymentState>().is_err());
    }
}
