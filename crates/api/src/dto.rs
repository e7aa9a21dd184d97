//! Wire shapes of the ledger's v1 REST API.
//!
//! The API reports transaction amounts expense-positive and accepts them
//! debit-negative when `debit_as_negative` is set. [`Transaction::into_remote`]
//! negates amounts on read; writes already use the debit-negative convention.

use chrono::NaiveDate;
use ledgersync_core::{AccountId, ExternalId, LedgerAccount, Money, RemoteTransaction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct MeResponse {
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub budget_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssetsResponse {
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: i64,
    pub name: String,
    pub display_name: Option<String>,
    pub institution_name: Option<String>,
    pub type_name: Option<String>,
    pub subtype_name: Option<String>,
    pub balance: Decimal,
    pub currency: Option<String>,
}

impl From<Asset> for LedgerAccount {
    fn from(asset: Asset) -> Self {
        LedgerAccount {
            id: AccountId(asset.id),
            name: asset.name,
            display_name: asset.display_name.filter(|s| !s.is_empty()),
            institution_name: asset.institution_name.filter(|s| !s.is_empty()),
            type_name: asset.type_name,
            subtype_name: asset.subtype_name,
            balance: Money::from_decimal(asset.balance),
            currency: asset.currency,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TransactionsPage {
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub date: NaiveDate,
    pub payee: Option<String>,
    pub amount: Decimal,
    pub asset_id: Option<i64>,
    pub external_id: Option<String>,
}

impl Transaction {
    pub fn into_remote(self, account: AccountId) -> RemoteTransaction {
        RemoteTransaction {
            id: self.id,
            account: self.asset_id.map(AccountId).unwrap_or(account),
            date: self.date,
            // expense-positive on the wire
            amount: -Money::from_decimal(self.amount),
            payee: self.payee.unwrap_or_default(),
            external_id: self
                .external_id
                .filter(|s| !s.is_empty())
                .map(ExternalId),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NewTransaction<'a> {
    pub date: NaiveDate,
    pub amount: String,
    pub payee: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<&'a str>,
    pub asset_id: i64,
    pub external_id: &'a str,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct InsertRequest<'a> {
    pub transactions: Vec<NewTransaction<'a>>,
    pub apply_rules: bool,
    pub skip_duplicates: bool,
    pub check_for_recurring: bool,
    pub debit_as_negative: bool,
    pub skip_balance_update: bool,
}

#[derive(Debug, Deserialize)]
pub struct InsertResponse {
    #[serde(default)]
    pub ids: Vec<i64>,
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct BalanceUpdate {
    pub balance: String,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: Option<serde_json::Value>,
    pub message: Option<String>,
}

impl ErrorBody {
    /// Best human-readable message from an error payload.
    pub fn describe(raw: &str) -> String {
        match serde_json::from_str::<ErrorBody>(raw) {
            Ok(ErrorBody { message: Some(m), .. }) => m,
            Ok(ErrorBody { error: Some(e), .. }) => flatten_error(&e),
            _ => raw.trim().to_string(),
        }
    }
}

pub(crate) fn flatten_error(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items.iter().map(flatten_error).collect::<Vec<_>>().join("; "),
        other => other.to_string(),
    }
}
