use serde::{Deserialize, Serialize};
use std::fmt;

use super::money::Money;

/// Identifier of a destination account in the remote ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub i64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account identifier as it appears inside an export file (`ACCTID`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceAccountId(pub String);

impl SourceAccountId {
    pub fn new(id: impl Into<String>) -> Self {
        SourceAccountId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Account number with all but the last four characters hidden.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 4 {
            return self.0.clone();
        }
        let visible: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{visible}", "*".repeat(chars.len() - 4))
    }
}

impl fmt::Display for SourceAccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceAccountId {
    fn from(s: &str) -> Self {
        SourceAccountId(s.to_string())
    }
}

/// A destination account as the remote ledger reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerAccount {
    pub id: AccountId,
    pub name: String,
    pub display_name: Option<String>,
    pub institution_name: Option<String>,
    pub type_name: Option<String>,
    pub subtype_name: Option<String>,
    pub balance: Money,
    pub currency: Option<String>,
}

impl LedgerAccount {
    pub fn new(id: AccountId, name: &str, balance: Money) -> Self {
        LedgerAccount {
            id,
            name: name.to_string(),
            display_name: None,
            institution_name: None,
            type_name: None,
            subtype_name: None,
            balance,
            currency: None,
        }
    }

    /// `name (institution)`, falling back to the bare name.
    pub fn label(&self) -> String {
        let name = self.display_name.as_deref().unwrap_or(&self.name);
        match self.institution_name.as_deref() {
            Some(inst) if !inst.is_empty() => format!("{name} ({inst})"),
            _ => name.to_string(),
        }
    }

    /// `type/subtype`, or whichever half is present.
    pub fn kind(&self) -> Option<String> {
        match (self.type_name.as_deref(), self.subtype_name.as_deref()) {
            (Some(t), Some(s)) if !s.is_empty() => Some(format!("{t}/{s}")),
            (Some(t), _) => Some(t.to_string()),
            (None, Some(s)) => Some(s.to_string()),
            (None, None) => None,
        }
    }
}
