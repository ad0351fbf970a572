//! Contract parties

use serde::{Deserialize, Serialize};

/// Role a party plays, enumerated per domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyRole {
    Employer,
    Employee,
    Landlord,
    Tenant,
    Discloser,
    Recipient,
    Provider,
    Client,
    PartyA,
    PartyB,
}

impl PartyRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employer => "employer",
            Self::Employee => "employee",
            Self::Landlord => "landlord",
            Self::Tenant => "tenant",
            Self::Discloser => "discloser",
            Self::Recipient => "recipient",
            Self::Provider => "provider",
            Self::Client => "client",
            Self::PartyA => "party_a",
            Self::PartyB => "party_b",
        }
    }
}

/// A party named in the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub role: PartyRole,
    /// Display label as written in the document
    pub label: String,
}

impl Party {
    pub fn new(role: PartyRole, label: impl Into<String>) -> Self {
        Self {
            role,
            label: label.into(),
        }
    }

    /// Deduplication key: role plus case- and whitespace-folded label
    pub fn dedup_key(&self) -> (PartyRole, String) {
        let label = self
            .label
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        (self.role, label)
    }
}
