use ledgersync_core::{parse_date, Money, ParsedBatch, RawTransaction, SourceAccountId, StatedBalance};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfxTransaction {
    pub kind: Option<String>,
    pub posted: Option<String>,
    pub amount: Option<String>,
    pub fit_id: Option<String>,
    pub name: Option<String>,
    pub memo: Option<String>,
    pub check_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfxAccount {
    pub account_id: String,
    pub bank_id: Option<String>,
    pub account_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfxBalance {
    pub amount: Option<String>,
    pub as_of: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfxStatement {
    pub account: OfxAccount,
    pub currency: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub transactions: Vec<OfxTransaction>,
    pub ledger_balance: Option<OfxBalance>,
    pub available_balance: Option<OfxBalance>,
}

/// Every bank (`STMTRS`) and credit card (`CCSTMTRS`) statement in a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfxDocument {
    pub statements: Vec<OfxStatement>,
}

/// Which OFX balance aggregate counts as the statement's ending balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceSource {
    #[default]
    Available,
    Ledger,
}

#[derive(Error, Debug)]
pub enum OfxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse OFX: {0}")]
    ParseError(String),
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("No accounts found in file")]
    NoStatements,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BalanceKind {
    Ledger,
    Available,
}

pub struct OfxParser;

impl OfxParser {
    /// Parses OFX 1.x SGML or OFX 2.x XML. Tags are matched case-insensitively
    /// and line breaks carry no meaning, so single-line XML exports work too.
    pub fn parse(data: &str) -> Result<OfxDocument, OfxError> {
        let mut statements = Vec::new();

        let mut current: Option<OfxStatement> = None;
        let mut current_trx: Option<OfxTransaction> = None;
        let mut balance: Option<(BalanceKind, OfxBalance)> = None;
        let mut in_trnlist = false;
        let mut saw_ofx_root = false;

        for segment in data.split('<').skip(1) {
            let Some((tag, value)) = segment.split_once('>') else {
                return Err(OfxError::ParseError(format!(
                    "unterminated tag near '<{}'",
                    segment.chars().take(20).collect::<String>()
                )));
            };
            let tag = tag.trim();
            if tag.starts_with('?') || tag.starts_with('!') {
                continue;
            }
            let tag_name = tag
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_ascii_uppercase();
            let value = decode_entities(value.trim());
            let value = if value.is_empty() { None } else { Some(value) };

            match tag_name.as_str() {
                "OFX" => saw_ofx_root = true,
                "STMTRS" | "CCSTMTRS" => {
                    if let Some(stmt) = current.take() {
                        statements.push(finish_statement(stmt)?);
                    }
                    current = Some(OfxStatement::default());
                }
                "/STMTRS" | "/CCSTMTRS" => {
                    if let Some(stmt) = current.take() {
                        statements.push(finish_statement(stmt)?);
                    }
                }
                "BANKTRANLIST" => in_trnlist = true,
                "/BANKTRANLIST" => in_trnlist = false,
                "STMTTRN" => current_trx = Some(OfxTransaction::default()),
                "/STMTTRN" => {
                    if let (Some(trx), Some(stmt)) = (current_trx.take(), current.as_mut()) {
                        stmt.transactions.push(trx);
                    }
                }
                "LEDGERBAL" => balance = Some((BalanceKind::Ledger, OfxBalance::default())),
                "AVAILBAL" => balance = Some((BalanceKind::Available, OfxBalance::default())),
                "/LEDGERBAL" | "/AVAILBAL" => {
                    if let (Some((kind, bal)), Some(stmt)) = (balance.take(), current.as_mut()) {
                        match kind {
                            BalanceKind::Ledger => stmt.ledger_balance = Some(bal),
                            BalanceKind::Available => stmt.available_balance = Some(bal),
                        }
                    }
                }
                name if name.starts_with('/') => {}
                name => {
                    if let Some(ref mut trx) = current_trx {
                        // Transfer aggregates inside a transaction carry their own
                        // ACCTID, so account tags are ignored here.
                        match name {
                            "TRNTYPE" => trx.kind = value.map(|v| v.to_ascii_uppercase()),
                            "DTPOSTED" => trx.posted = value,
                            "TRNAMT" => trx.amount = value,
                            "FITID" => trx.fit_id = value,
                            "NAME" => trx.name = value,
                            "MEMO" => trx.memo = value,
                            "CHECKNUM" => trx.check_number = value,
                            _ => {}
                        }
                    } else if let Some((_, ref mut bal)) = balance {
                        match name {
                            "BALAMT" => bal.amount = value,
                            "DTASOF" => bal.as_of = value,
                            _ => {}
                        }
                    } else if let Some(ref mut stmt) = current {
                        match name {
                            "ACCTID" => {
                                if let Some(v) = value {
                                    stmt.account.account_id = v;
                                }
                            }
                            "BANKID" => stmt.account.bank_id = value,
                            "ACCTTYPE" => stmt.account.account_type = value,
                            "CURDEF" => stmt.currency = value,
                            "DTSTART" if in_trnlist => stmt.start_date = value,
                            "DTEND" if in_trnlist => stmt.end_date = value,
                            _ => {}
                        }
                    }
                }
            }
        }

        // SGML exports occasionally end without closing the last statement.
        if let Some(stmt) = current.take() {
            statements.push(finish_statement(stmt)?);
        }

        if statements.is_empty() {
            return Err(if saw_ofx_root {
                OfxError::NoStatements
            } else {
                OfxError::ParseError("no <OFX> element found".to_string())
            });
        }

        debug!(statements = statements.len(), "parsed OFX document");
        Ok(OfxDocument { statements })
    }
}

fn finish_statement(stmt: OfxStatement) -> Result<OfxStatement, OfxError> {
    if stmt.account.account_id.is_empty() {
        return Err(OfxError::MissingField("ACCTID".to_string()));
    }
    Ok(stmt)
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

impl OfxStatement {
    /// Ending balance per `source`, falling back to the other aggregate when
    /// the preferred one is absent.
    pub fn stated_balance(&self, source: BalanceSource) -> Option<&OfxBalance> {
        let (first, second) = match source {
            BalanceSource::Available => (&self.available_balance, &self.ledger_balance),
            BalanceSource::Ledger => (&self.ledger_balance, &self.available_balance),
        };
        first
            .as_ref()
            .filter(|b| b.amount.is_some())
            .or_else(|| second.as_ref().filter(|b| b.amount.is_some()))
    }
}

impl OfxDocument {
    /// Flattens the statements into the boundary shape: raw records in file
    /// order, each tagged with its statement's `ACCTID`.
    pub fn into_batch(self, balance_source: BalanceSource) -> ParsedBatch {
        let mut batch = ParsedBatch::default();

        for stmt in self.statements {
            let source = SourceAccountId::new(stmt.account.account_id.clone());

            if batch.currency.is_none() {
                batch.currency = stmt.currency.clone();
            }

            if let Some(bal) = stmt.stated_balance(balance_source) {
                let raw_amount = bal.amount.as_deref().unwrap_or_default();
                match Money::parse(raw_amount) {
                    Some(amount) => batch.stated_balances.push(StatedBalance {
                        source_account: source.clone(),
                        amount,
                        as_of: bal.as_of.as_deref().and_then(parse_date),
                    }),
                    None => warn!(
                        account = %source.masked(),
                        "ignoring unparseable statement balance '{raw_amount}'"
                    ),
                }
            }

            batch
                .transactions
                .extend(stmt.transactions.into_iter().map(|trx| RawTransaction {
                    source_account: source.clone(),
                    kind: trx.kind,
                    date: trx.posted.unwrap_or_default(),
                    amount: trx.amount.unwrap_or_default(),
                    name: trx.name,
                    memo: trx.memo,
                    reference: trx.fit_id,
                    check_number: trx.check_number,
                }));
        }

        batch
    }
}

pub fn parse(data: &[u8]) -> Result<OfxDocument, OfxError> {
    let content = String::from_utf8_lossy(data);
    OfxParser::parse(&content)
}
