//! Verification attempt records — the abuse-analysis audit trail.
//!
//! Every call to `verify` produces exactly one [`AttemptRecord`], whether or
//! not the submitted code matched a real voucher. Records are immutable
//! facts: created once, never updated, never deleted.
//!
//! There is deliberately no foreign key back to a voucher — only the raw
//! submitted code string. An enumeration attempt against a code that was
//! never minted must still be resolvable in the trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AttemptId;

/// The classified result of one verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttemptOutcome {
    /// Credentials matched and a lease was issued.
    Valid,
    /// The code exists but the PIN did not match.
    InvalidPin,
    /// No voucher with that code (also recorded for revoked vouchers, which
    /// are never disclosed as existing).
    NotFound,
    /// The validity window had passed, or the voucher was already expired.
    Expired,
    /// The voucher was already consumed.
    Used,
    /// Optimistic transition retries were exhausted under contention.
    Conflict,
}

impl std::fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Valid => write!(f, "Valid"),
            Self::InvalidPin => write!(f, "Invalid Pin"),
            Self::NotFound => write!(f, "Not Found"),
            Self::Expired => write!(f, "Expired"),
            Self::Used => write!(f, "Used"),
            Self::Conflict => write!(f, "Conflict"),
        }
    }
}

/// Network origin of a verification call, as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientOrigin {
    /// Requester network address.
    pub ip: String,
    /// Requester client descriptor (user agent or equivalent).
    pub user_agent: String,
}

impl ClientOrigin {
    #[must_use]
    pub fn new(ip: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            user_agent: user_agent.into(),
        }
    }
}

/// One immutable verification attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Unique record identifier.
    pub id: AttemptId,
    /// The raw code string as submitted — preserved verbatim even when it
    /// matched nothing.
    pub code_entered: String,
    /// Where the attempt came from.
    pub origin: ClientOrigin,
    /// Classified outcome.
    pub outcome: AttemptOutcome,
    /// When the attempt was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl AttemptRecord {
    #[must_use]
    pub fn new(
        code_entered: impl Into<String>,
        origin: ClientOrigin,
        outcome: AttemptOutcome,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AttemptId::new(),
            code_entered: code_entered.into(),
            origin,
            outcome,
            recorded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_display_matches_reporting_labels() {
        assert_eq!(AttemptOutcome::Valid.to_string(), "Valid");
        assert_eq!(AttemptOutcome::InvalidPin.to_string(), "Invalid Pin");
        assert_eq!(AttemptOutcome::NotFound.to_string(), "Not Found");
        assert_eq!(AttemptOutcome::Expired.to_string(), "Expired");
        assert_eq!(AttemptOutcome::Used.to_string(), "Used");
        assert_eq!(AttemptOutcome::Conflict.to_string(), "Conflict");
    }

    #[test]
    fn record_preserves_unknown_code_verbatim() {
        let rec = AttemptRecord::new(
            "0000000000",
            ClientOrigin::new("203.0.113.9", "curl/8.4"),
            AttemptOutcome::NotFound,
            Utc::now(),
        );
        assert_eq!(rec.code_entered, "0000000000");
        assert_eq!(rec.outcome, AttemptOutcome::NotFound);
    }

    #[test]
    fn record_ids_unique() {
        let origin = ClientOrigin::new("198.51.100.1", "test");
        let a = AttemptRecord::new("1", origin.clone(), AttemptOutcome::Valid, Utc::now());
        let b = AttemptRecord::new("1", origin, AttemptOutcome::Valid, Utc::now());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn serde_roundtrip() {
        let rec = AttemptRecord::new(
            "1234567890",
            ClientOrigin::new("192.0.2.44", "Mozilla/5.0"),
            AttemptOutcome::InvalidPin,
            Utc::now(),
        );
        let json = serde_json::to_string(&rec).unwrap();
        let back: AttemptRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(rec, back);
    }
}
