use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Micro-units per whole currency unit (1 ALGO = 1_000_000 microAlgos).
pub const MICRO_UNITS: u64 = 1_000_000;

const AMOUNT_DECIMALS: usize = 6;

/// Identifier the contract assigns to an oracle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub u64);

/// Identifier the contract assigns to a conditional clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClauseId(pub u64);

macro_rules! numeric_id {
    ($ty:ident, $what:literal) => {
        impl $ty {
            pub fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                s.trim()
                    .parse::<u64>()
                    .map($ty)
                    .map_err(|_| Error::InvalidInput(format!("invalid {}: {s:?}", $what)))
            }
        }

        impl From<u64> for $ty {
            fn from(v: u64) -> Self {
                $ty(v)
            }
        }
    };
}

numeric_id!(EventId, "event id");
numeric_id!(ClauseId, "clause id");

/// An oracle-reported real-world fact.
///
/// `resolution` only carries meaning once `pending` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub description: String,
    pub oracle_address: String,
    pub pending: bool,
    pub resolution: bool,
}

impl Event {
    pub fn new(description: impl Into<String>, oracle_address: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            oracle_address: oracle_address.into(),
            pending: true,
            resolution: false,
        }
    }

    /// `None` while pending, otherwise the reported outcome.
    pub fn outcome(&self) -> Option<bool> {
        if self.pending {
            None
        } else {
            Some(self.resolution)
        }
    }
}

/// A donation tied to one event, paid to one of two recipients on release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalClause {
    pub event_id: EventId,
    pub donor_address: String,
    /// Smallest currency unit.
    pub payout_amount: u64,
    pub recipient_yes: String,
    pub recipient_no: String,
    pub executed: bool,
}

impl ConditionalClause {
    /// The recipient selected by a resolved outcome.
    pub fn payee(&self, resolution: bool) -> &str {
        if resolution {
            &self.recipient_yes
        } else {
            &self.recipient_no
        }
    }
}

/// Validated arguments for a single `create_clause` contract call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClauseRequest {
    pub event_id: EventId,
    pub recipient_yes: String,
    pub recipient_no: String,
    pub payout_amount: u64,
}

/// Parse a decimal whole-unit amount ("1.25") into micro-units.
pub fn parse_amount(input: &str) -> Result<u64> {
    let s = input.trim();
    if s.is_empty() {
        return Err(Error::InvalidAmount("empty amount".into()));
    }
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if frac.len() > AMOUNT_DECIMALS {
        return Err(Error::InvalidAmount(format!(
            "{s}: at most {AMOUNT_DECIMALS} decimal places"
        )));
    }
    let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
        return Err(Error::InvalidAmount(format!("{s}: not a positive decimal")));
    }

    let whole_units: u64 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| Error::InvalidAmount(format!("{s}: out of range")))?
    };
    let frac_units: u64 = if frac.is_empty() {
        0
    } else {
        format!("{frac:0<width$}", width = AMOUNT_DECIMALS)
            .parse()
            .map_err(|_| Error::InvalidAmount(format!("{s}: bad fraction")))?
    };

    whole_units
        .checked_mul(MICRO_UNITS)
        .and_then(|v| v.checked_add(frac_units))
        .ok_or_else(|| Error::InvalidAmount(format!("{s}: out of range")))
}

/// Format micro-units as a whole-unit decimal without trailing zeros.
pub fn format_amount(micro: u64) -> String {
    let whole = micro / MICRO_UNITS;
    let frac = micro % MICRO_UNITS;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:06}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_parse_from_route_strings() {
        assert_eq!("42".parse::<EventId>().unwrap(), EventId(42));
        assert_eq!(" 7 ".parse::<ClauseId>().unwrap(), ClauseId(7));
        assert!("abc".parse::<EventId>().is_err());
        assert!("-1".parse::<EventId>().is_err());
        assert_eq!(EventId(9).to_string(), "9");
    }

    #[test]
    fn outcome_hidden_while_pending() {
        let mut event = Event::new("Hurricane hits Miami", "ORACLE");
        event.resolution = true;
        assert_eq!(event.outcome(), None);
        event.pending = false;
        assert_eq!(event.outcome(), Some(true));
    }

    #[test]
    fn payee_follows_resolution() {
        let clause = ConditionalClause {
            event_id: EventId(1),
            donor_address: "DONOR".into(),
            payout_amount: 5,
            recipient_yes: "CHARITY".into(),
            recipient_no: "DONOR".into(),
            executed: false,
        };
        assert_eq!(clause.payee(true), "CHARITY");
        assert_eq!(clause.payee(false), "DONOR");
    }

    #[test]
    fn parse_amount_accepts_decimals() {
        assert_eq!(parse_amount("1").unwrap(), 1_000_000);
        assert_eq!(parse_amount("0.001").unwrap(), 1_000);
        assert_eq!(parse_amount("2.5").unwrap(), 2_500_000);
        assert_eq!(parse_amount(".5").unwrap(), 500_000);
        assert_eq!(parse_amount("3.").unwrap(), 3_000_000);
        assert_eq!(parse_amount("0.000001").unwrap(), 1);
    }

    #[test]
    fn parse_amount_rejects_garbage() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount(".").is_err());
        assert!(parse_amount("-1").is_err());
        assert!(parse_amount("1e6").is_err());
        assert!(parse_amount("0.0000001").is_err());
        assert!(parse_amount("99999999999999999999").is_err());
    }

    #[test]
    fn format_amount_trims_zeros() {
        assert_eq!(format_amount(1_000_000), "1");
        assert_eq!(format_amount(1_500_000), "1.5");
        assert_eq!(format_amount(1_000), "0.001");
        assert_eq!(format_amount(0), "0");
    }

    #[test]
    fn event_serializes_camel_case() {
        let json = serde_json::to_value(Event::new("x", "O")).unwrap();
        assert_eq!(json["oracleAddress"], "O");
        assert_eq!(json["pending"], true);
    }
}
