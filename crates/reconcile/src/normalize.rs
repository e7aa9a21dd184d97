use chrono::NaiveDate;
use ledgersync_core::{
    parse_date, AccountId, ExternalId, Money, NormalizedTransaction, RawTransaction,
    SourceAccountId,
};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use crate::error::MalformedReason;

const FIELD_SEP: &[u8] = b"\x1f";

/// Direction a source transaction type implies, independent of the sign the
/// file wrote the amount with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Outflow,
    Inflow,
    /// No implied direction; the source sign (outflow negative) is kept.
    AsIs,
}

impl Flow {
    /// Fixed mapping from OFX `TRNTYPE` values.
    pub fn for_kind(kind: Option<&str>) -> Flow {
        match kind.map(|k| k.trim().to_ascii_uppercase()).as_deref() {
            Some(
                "DEBIT" | "PAYMENT" | "FEE" | "SRVCHG" | "ATM" | "POS" | "CHECK" | "DIRECTDEBIT"
                | "CASH" | "REPEATPMT",
            ) => Flow::Outflow,
            Some("CREDIT" | "DEP" | "DIRECTDEP" | "INT" | "DIV") => Flow::Inflow,
            _ => Flow::AsIs,
        }
    }

    /// Puts `amount` into the ledger convention: outflows negative.
    pub fn apply(self, amount: Money) -> Money {
        match self {
            Flow::Outflow => -amount.abs(),
            Flow::Inflow => amount.abs(),
            Flow::AsIs => amount,
        }
    }
}

/// Derives the duplicate-detection fingerprint.
///
/// With a source reference the id covers (account, date, amount, reference).
/// Without one it covers (account, date, amount, payee, ordinal), where the
/// ordinal separates records that are otherwise identical within one file.
pub fn external_id(
    source: &SourceAccountId,
    date: NaiveDate,
    amount: Money,
    reference: Option<&str>,
    payee: &str,
    ordinal: u32,
) -> ExternalId {
    let date = date.format("%Y-%m-%d").to_string();
    let amount = amount.to_plain_string();
    let ordinal = ordinal.to_string();

    let parts: Vec<&[u8]> = match reference {
        Some(reference) => vec![
            b"ref".as_slice(),
            source.as_str().as_bytes(),
            date.as_bytes(),
            amount.as_bytes(),
            reference.as_bytes(),
        ],
        None => vec![
            b"seq".as_slice(),
            source.as_str().as_bytes(),
            date.as_bytes(),
            amount.as_bytes(),
            payee.as_bytes(),
            ordinal.as_bytes(),
        ],
    };

    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update(FIELD_SEP);
        }
        hasher.update(part);
    }

    ExternalId(hex::encode(hasher.finalize()))
}

/// Turns raw records into canonical ones.
///
/// One normalizer must see a whole source-account group in file order: it
/// counts repeats of (date, amount, payee) to keep identical records apart.
#[derive(Debug, Default)]
pub struct Normalizer {
    seen: HashMap<(SourceAccountId, NaiveDate, Money, String), u32>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalize(
        &mut self,
        raw: &RawTransaction,
        account: AccountId,
    ) -> Result<NormalizedTransaction, MalformedReason> {
        let date = parse_date(&raw.date).ok_or_else(|| MalformedReason::Date(raw.date.clone()))?;
        // amounts must fit in i64 cents so sums over a file cannot overflow
        let amount = Money::parse(&raw.amount)
            .filter(|m| m.to_cents().is_some())
            .ok_or_else(|| MalformedReason::Amount(raw.amount.clone()))?;
        let amount = Flow::for_kind(raw.kind.as_deref()).apply(amount);

        let name = non_blank(raw.name.as_deref());
        let memo = non_blank(raw.memo.as_deref());
        let payee = name.or(memo).unwrap_or("Unknown").to_string();

        let notes = match (name, memo) {
            (Some(_), Some(memo)) if memo != payee => Some(memo.to_string()),
            _ => non_blank(raw.check_number.as_deref()).map(|n| format!("Check #{n}")),
        };

        let reference = non_blank(raw.reference.as_deref());
        let ordinal = if reference.is_some() {
            0
        } else {
            let counter = self
                .seen
                .entry((raw.source_account.clone(), date, amount, payee.clone()))
                .or_insert(0);
            let ordinal = *counter;
            *counter += 1;
            ordinal
        };

        Ok(NormalizedTransaction {
            account,
            source_account: raw.source_account.clone(),
            date,
            amount,
            external_id: external_id(&raw.source_account, date, amount, reference, &payee, ordinal),
            payee,
            notes,
        })
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
